// ⚠️ Rejections and issuance errors
//
// Rejections are ordinary outcomes of validating a request. Storage failures
// are infrastructure errors and never appear as a rejection.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a request did not produce a certificate
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Rejection {
    /// Missing or structurally invalid input
    #[error("{0}")]
    Malformed(String),

    #[error("Customer must be at least {minimum} years old. Current age: {age}")]
    AgeBelowMinimum { age: i32, minimum: i32 },

    #[error(
        "Insured sum ${:.2} is not within any valid pricing range. Valid ranges: {}",
        to_cents(.sum),
        .ranges
    )]
    SumOutOfRange { sum: Decimal, ranges: String },
}

/// Cents, midpoints away from zero (200.005 → 200.01)
fn to_cents(amount: &Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

impl Rejection {
    pub fn kind(&self) -> RejectionKind {
        match self {
            Rejection::Malformed(_) => RejectionKind::Malformed,
            Rejection::AgeBelowMinimum { .. } => RejectionKind::AgeBelowMinimum,
            Rejection::SumOutOfRange { .. } => RejectionKind::SumOutOfRange,
        }
    }

    /// Structured form handed to the presentation layer
    pub fn to_body(&self) -> RejectionBody {
        RejectionBody {
            kind: self.kind(),
            message: self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectionKind {
    AgeBelowMinimum,
    SumOutOfRange,
    Malformed,
}

impl RejectionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionKind::AgeBelowMinimum => "AgeBelowMinimum",
            RejectionKind::SumOutOfRange => "SumOutOfRange",
            RejectionKind::Malformed => "Malformed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectionBody {
    pub kind: RejectionKind,
    pub message: String,
}

/// Failure of the composed issuance call
#[derive(Debug, Error)]
pub enum IssueError {
    #[error(transparent)]
    Rejected(#[from] Rejection),

    /// Source and Display delegate to the storage error
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl IssueError {
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            IssueError::Rejected(rejection) => Some(rejection),
            IssueError::Storage(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_message_includes_age() {
        let rejection = Rejection::AgeBelowMinimum { age: 17, minimum: 18 };

        assert_eq!(
            rejection.to_string(),
            "Customer must be at least 18 years old. Current age: 17"
        );
        assert_eq!(rejection.kind(), RejectionKind::AgeBelowMinimum);
    }

    #[test]
    fn test_sum_message_formats_two_decimals() {
        let rejection = Rejection::SumOutOfRange {
            sum: Decimal::from(15),
            ranges: "$20.00-$50.00".to_string(),
        };

        assert_eq!(
            rejection.to_string(),
            "Insured sum $15.00 is not within any valid pricing range. Valid ranges: $20.00-$50.00"
        );
    }

    #[test]
    fn test_body_serializes_kind_by_name() {
        let body = Rejection::Malformed("customerName: Required field is empty".to_string()).to_body();
        let json = serde_json::to_value(&body).unwrap();

        assert_eq!(json["kind"], "Malformed");
        assert_eq!(json["message"], "customerName: Required field is empty");
    }

    #[test]
    fn test_issue_error_exposes_rejection() {
        let err: IssueError = Rejection::Malformed("x".to_string()).into();
        assert!(err.rejection().is_some());

        let err: IssueError = anyhow::anyhow!("disk full").into();
        assert!(err.rejection().is_none());
        assert_eq!(err.to_string(), "disk full");
    }
}
