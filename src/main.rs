use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use insurance_certificates::{
    logger, AppConfig, Certificate, CertificateService, CertificateSubmission, IssueError,
    SqliteStore, PRICING_TIERS,
};
use rust_decimal::Decimal;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "insurance-certificates")]
#[command(about = "Issue and list insurance certificates")]
struct Cli {
    /// Config file (defaults to $CERTIFICATES_CONFIG or ./certificates.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true, help = "Enable verbose output")]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Issue a new certificate
    Issue {
        #[arg(long)]
        name: String,

        /// Date of birth, YYYY-MM-DD
        #[arg(long)]
        dob: NaiveDate,

        #[arg(long)]
        item: String,

        #[arg(long)]
        sum: Decimal,

        /// Creation instant (RFC 3339), defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },

    /// List all certificates
    List,

    /// Replace stored certificates with the demo certificate
    Seed,

    /// Show pricing tiers
    Tiers,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init_logger(cli.verbose);

    let config = AppConfig::load(cli.config.as_deref())?;

    match cli.command {
        Command::Tiers => {
            for tier in PRICING_TIERS.iter() {
                println!("{:>18}  →  {:.2}", tier.describe(), tier.premium);
            }
            Ok(())
        }
        Command::Issue {
            name,
            dob,
            item,
            sum,
            at,
        } => {
            let service = open_service(&config)?;
            let submission = CertificateSubmission {
                customer_name: Some(name),
                customer_date_of_birth: Some(dob),
                insured_item: Some(item),
                insured_sum: Some(sum),
            };

            match service.issue_at(&submission, at.unwrap_or_else(Utc::now)) {
                Ok(certificate) => {
                    print_certificate(&certificate);
                    Ok(())
                }
                Err(IssueError::Rejected(rejection)) => {
                    eprintln!("❌ {}: {}", rejection.kind().as_str(), rejection);
                    std::process::exit(2);
                }
                Err(e) => Err(e.into()),
            }
        }
        Command::List => {
            let certificates = open_service(&config)?.list()?;
            if certificates.is_empty() {
                println!("No certificates issued yet");
            }
            for certificate in &certificates {
                print_certificate(certificate);
            }
            Ok(())
        }
        Command::Seed => {
            let certificate = open_service(&config)?.seed_demo_certificates(Utc::now())?;
            println!("✓ Seeded demo certificate {}", certificate.number);
            Ok(())
        }
    }
}

fn open_service(config: &AppConfig) -> Result<CertificateService<SqliteStore>> {
    let store = match &config.database.path {
        Some(path) => SqliteStore::open(path)?,
        None => SqliteStore::open_in_memory()?,
    };
    Ok(CertificateService::new(store, config.zone()?))
}

fn print_certificate(certificate: &Certificate) {
    println!(
        "{}  {}  {} ({})  {}  insured {:.2}  premium {:.2}  valid {} → {}",
        certificate.number,
        certificate.creation_date.format("%Y-%m-%d %H:%M"),
        certificate.customer.name,
        certificate.customer.date_of_birth,
        certificate.insured_item,
        certificate.insured_sum,
        certificate.certificate_sum,
        certificate.valid_from.to_rfc3339(),
        certificate.valid_to.to_rfc3339(),
    );
}
