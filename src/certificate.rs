// 📜 Certificate Model - requests in, certificates out
// Wire names follow the public API (camelCase)

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// REQUEST
// ============================================================================

/// A structurally valid issuance request.
///
/// Built by `SchemaValidator` from a raw submission, so every field is
/// present and the text fields are non-blank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRequest {
    pub customer_name: String,
    pub customer_date_of_birth: NaiveDate,
    pub insured_item: String,
    pub insured_sum: Decimal,
}

impl CertificateRequest {
    pub fn new(
        customer_name: &str,
        customer_date_of_birth: NaiveDate,
        insured_item: &str,
        insured_sum: Decimal,
    ) -> Self {
        CertificateRequest {
            customer_name: customer_name.to_string(),
            customer_date_of_birth,
            insured_item: insured_item.to_string(),
            insured_sum,
        }
    }

    /// Customer owned by the certificate built from this request
    pub fn customer(&self) -> Customer {
        Customer {
            name: self.customer_name.clone(),
            date_of_birth: self.customer_date_of_birth,
        }
    }
}

// ============================================================================
// CUSTOMER
// ============================================================================

/// Customer embedded in exactly one certificate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    #[serde(rename = "customerName")]
    pub name: String,

    #[serde(rename = "customerDateOfBirth")]
    pub date_of_birth: NaiveDate,
}

// ============================================================================
// CERTIFICATE
// ============================================================================

/// An issued certificate. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificate {
    /// Sequential number, zero-padded to at least 5 digits
    pub number: String,

    pub creation_date: DateTime<Utc>,

    /// Always equal to `creation_date`
    pub valid_from: DateTime<Utc>,

    /// Local midnight of the anniversary date, exclusive
    pub valid_to: DateTime<Utc>,

    #[serde(flatten)]
    pub customer: Customer,

    pub insured_item: String,
    pub insured_sum: Decimal,

    /// Premium from the matching pricing tier
    pub certificate_sum: Decimal,
}

impl Certificate {
    /// Numeric value of the certificate number, if it parses
    pub fn sequence(&self) -> Option<u32> {
        self.number.parse().ok()
    }

    /// Whether the certificate is in force at `instant`
    pub fn is_in_force_at(&self, instant: DateTime<Utc>) -> bool {
        self.valid_from <= instant && instant < self.valid_to
    }
}
