// 🧾 Certificate Service - issuance protocol around the pure engine
//
// schema → age → insured sum → validity window → number → persist

use crate::certificate::{Certificate, CertificateRequest};
use crate::db::CertificateStore;
use crate::engine::issue_certificate;
use crate::error::IssueError;
use crate::schema::{CertificateSubmission, SchemaValidator};
use crate::temporal::compute_validity_window;
use anyhow::{anyhow, Context};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use rust_decimal::Decimal;
use std::sync::Mutex;

pub struct CertificateService<S: CertificateStore> {
    store: S,
    zone: Tz,
    validator: SchemaValidator,
    /// Held across "read last number, append"
    issuance: Mutex<()>,
}

impl<S: CertificateStore> CertificateService<S> {
    pub fn new(store: S, zone: Tz) -> Self {
        CertificateService {
            store,
            zone,
            validator: SchemaValidator::new(),
            issuance: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Issues a certificate created now
    pub fn issue(&self, submission: &CertificateSubmission) -> Result<Certificate, IssueError> {
        self.issue_at(submission, Utc::now())
    }

    /// Issues a certificate created at `created_at`.
    ///
    /// A rejection leaves storage untouched and the counter where it was.
    pub fn issue_at(
        &self,
        submission: &CertificateSubmission,
        created_at: DateTime<Utc>,
    ) -> Result<Certificate, IssueError> {
        let request = self.validator.validate(submission).map_err(|rejection| {
            tracing::warn!("Rejected malformed request: {}", rejection);
            rejection
        })?;

        self.issue_request_at(&request, created_at)
    }

    fn issue_request_at(
        &self,
        request: &CertificateRequest,
        created_at: DateTime<Utc>,
    ) -> Result<Certificate, IssueError> {
        let _guard = self
            .issuance
            .lock()
            .map_err(|_| anyhow!("issuance lock poisoned"))?;

        let last_number = self
            .store
            .last_issued_number()
            .context("Failed to read last certificate number")?;

        let certificate = issue_certificate(request, created_at, last_number, &self.zone)
            .map_err(|rejection| {
                tracing::warn!(
                    kind = rejection.kind().as_str(),
                    "Rejected certificate request: {}",
                    rejection
                );
                rejection
            })?;

        self.store.append(&certificate)?;

        tracing::info!(
            number = %certificate.number,
            certificate_sum = %certificate.certificate_sum,
            valid_to = %certificate.valid_to,
            "Issued certificate"
        );

        Ok(certificate)
    }

    pub fn list(&self) -> Result<Vec<Certificate>, IssueError> {
        Ok(self.store.list_all()?)
    }

    /// Replaces stored certificates with the demo certificate "00001"
    pub fn seed_demo_certificates(&self, created_at: DateTime<Utc>) -> Result<Certificate, IssueError> {
        let _guard = self
            .issuance
            .lock()
            .map_err(|_| anyhow!("issuance lock poisoned"))?;

        self.store.clear().context("Failed to clear certificates")?;

        let window = compute_validity_window(created_at, &self.zone);
        let request = CertificateRequest::new(
            "Customer 1",
            NaiveDate::from_ymd_opt(1990, 1, 1).ok_or_else(|| anyhow!("invalid demo date"))?,
            "Apple iPhone 14 PRO",
            Decimal::from(150),
        );

        let certificate = Certificate {
            number: "00001".to_string(),
            creation_date: created_at,
            valid_from: window.valid_from,
            valid_to: window.valid_to,
            customer: request.customer(),
            insured_item: request.insured_item,
            insured_sum: request.insured_sum,
            certificate_sum: Decimal::from(25),
        };

        self.store.append(&certificate)?;
        tracing::info!("Seeded demo certificate {}", certificate.number);

        Ok(certificate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SqliteStore;
    use crate::error::RejectionKind;
    use chrono::TimeZone;

    fn service() -> CertificateService<SqliteStore> {
        CertificateService::new(SqliteStore::open_in_memory().unwrap(), Tz::UTC)
    }

    fn submission(dob: NaiveDate, sum: Decimal) -> CertificateSubmission {
        CertificateRequest::new("Alice", dob, "Phone", sum).into()
    }

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2022, 9, 1, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_issue_numbers_sequentially() {
        let service = service();
        let dob = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();

        let first = service.issue_at(&submission(dob, Decimal::from(30)), created()).unwrap();
        let second = service.issue_at(&submission(dob, Decimal::from(75)), created()).unwrap();

        assert_eq!(first.number, "00001");
        assert_eq!(first.certificate_sum, Decimal::from(8));
        assert_eq!(second.number, "00002");
        assert_eq!(second.certificate_sum, Decimal::from(15));
        assert_eq!(service.list().unwrap().len(), 2);
    }

    #[test]
    fn test_rejection_does_not_advance_counter() {
        let service = service();
        let minor = NaiveDate::from_ymd_opt(2005, 1, 1).unwrap();

        let err = service.issue_at(&submission(minor, Decimal::from(150)), created()).unwrap_err();
        assert_eq!(err.rejection().map(|r| r.kind()), Some(RejectionKind::AgeBelowMinimum));
        assert!(service.list().unwrap().is_empty());
        assert_eq!(service.store().last_issued_number().unwrap(), 0);
    }

    #[test]
    fn test_malformed_submission() {
        let err = service()
            .issue_at(&CertificateSubmission::default(), created())
            .unwrap_err();

        assert_eq!(err.rejection().map(|r| r.kind()), Some(RejectionKind::Malformed));
    }

    #[test]
    fn test_seed_replaces_existing_certificates() {
        let service = service();
        let dob = NaiveDate::from_ymd_opt(1990, 1, 1).unwrap();
        service.issue_at(&submission(dob, Decimal::from(30)), created()).unwrap();
        service.issue_at(&submission(dob, Decimal::from(30)), created()).unwrap();

        let seeded = service.seed_demo_certificates(created()).unwrap();
        let all = service.list().unwrap();

        assert_eq!(all, vec![seeded.clone()]);
        assert_eq!(seeded.number, "00001");
        assert_eq!(seeded.customer.name, "Customer 1");
        assert_eq!(seeded.valid_to, Utc.with_ymd_and_hms(2023, 9, 1, 0, 0, 0).unwrap());

        let next = service.issue_at(&submission(dob, Decimal::from(30)), created()).unwrap();
        assert_eq!(next.number, "00002");
    }
}
