// Insurance Certificates - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod certificate;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod logger;
pub mod pricing;
pub mod schema;
pub mod service;
pub mod temporal;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use certificate::{Certificate, CertificateRequest, Customer};
pub use config::{AppConfig, ConfigError};
pub use db::{CertificateStore, Event, SqliteStore};
pub use engine::{
    age_on, issue_certificate, next_certificate_number, validate_customer_age, MINIMUM_AGE,
};
pub use error::{IssueError, Rejection, RejectionBody, RejectionKind};
pub use pricing::{validate_and_price_insured_sum, PricingTier, PRICING_TIERS};
pub use schema::{CertificateSubmission, SchemaValidator, ValidationError};
pub use service::CertificateService;
pub use temporal::{compute_validity_window, ValidityWindow};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
