// 📐 Shape Layer - Structural validation of raw submissions
// Turns wire input into a CertificateRequest or a Malformed rejection

use crate::certificate::CertificateRequest;
use crate::error::Rejection;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ============================================================================
// SUBMISSION
// ============================================================================

/// A request as submitted by a client. Any field may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateSubmission {
    #[serde(default)]
    pub customer_name: Option<String>,

    #[serde(default)]
    pub customer_date_of_birth: Option<NaiveDate>,

    #[serde(default)]
    pub insured_item: Option<String>,

    #[serde(default)]
    pub insured_sum: Option<Decimal>,
}

impl From<CertificateRequest> for CertificateSubmission {
    fn from(request: CertificateRequest) -> Self {
        CertificateSubmission {
            customer_name: Some(request.customer_name),
            customer_date_of_birth: Some(request.customer_date_of_birth),
            insured_item: Some(request.insured_item),
            insured_sum: Some(request.insured_sum),
        }
    }
}

// ============================================================================
// VALIDATION ERRORS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: &str) -> Self {
        ValidationError {
            field: field.to_string(),
            message: message.to_string(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Folds field errors into a single Malformed rejection
pub fn malformed(errors: &[ValidationError]) -> Rejection {
    let details = errors
        .iter()
        .map(ValidationError::to_string)
        .collect::<Vec<_>>()
        .join("; ");
    Rejection::Malformed(details)
}

// ============================================================================
// SCHEMA VALIDATOR
// ============================================================================

pub struct SchemaValidator;

impl SchemaValidator {
    pub fn new() -> Self {
        SchemaValidator
    }

    /// Collects every structural problem in `submission`
    pub fn check(&self, submission: &CertificateSubmission) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        if is_blank(&submission.customer_name) {
            errors.push(ValidationError::new("customerName", "Required field is empty"));
        }

        if submission.customer_date_of_birth.is_none() {
            errors.push(ValidationError::new("customerDateOfBirth", "Required field is missing"));
        }

        if is_blank(&submission.insured_item) {
            errors.push(ValidationError::new("insuredItem", "Required field is empty"));
        }

        match submission.insured_sum {
            None => errors.push(ValidationError::new("insuredSum", "Required field is missing")),
            Some(sum) if sum.is_sign_negative() && !sum.is_zero() => {
                errors.push(ValidationError::new("insuredSum", "Must not be negative"))
            }
            Some(_) => {}
        }

        errors
    }

    /// Validated request with trimmed text fields, or a Malformed rejection
    pub fn validate(&self, submission: &CertificateSubmission) -> Result<CertificateRequest, Rejection> {
        let errors = self.check(submission);
        if !errors.is_empty() {
            return Err(malformed(&errors));
        }

        match submission {
            CertificateSubmission {
                customer_name: Some(name),
                customer_date_of_birth: Some(date_of_birth),
                insured_item: Some(item),
                insured_sum: Some(sum),
            } => Ok(CertificateRequest::new(name.trim(), *date_of_birth, item.trim(), *sum)),
            _ => Err(Rejection::Malformed("Incomplete certificate request".to_string())),
        }
    }
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new()
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |text| text.trim().is_empty())
}

// ============================================================================
// TESTS
// ============================================================================
