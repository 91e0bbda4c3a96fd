// ⚙️ Validation & Pricing Engine
//
// Pure business rules: request + creation instant + last issued number in,
// priced, dated and numbered certificate (or a rejection) out. No I/O.

use crate::certificate::{Certificate, CertificateRequest};
use crate::error::Rejection;
use crate::pricing::validate_and_price_insured_sum;
use crate::temporal::compute_validity_window;
use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

/// Minimum customer age in completed years
pub const MINIMUM_AGE: i32 = 18;

/// Certificate numbers are zero-padded to this many digits
pub const NUMBER_WIDTH: usize = 5;

// ============================================================================
// AGE
// ============================================================================

/// Age in completed years on `reference_date`.
///
/// A Feb 29 birthday is reached on Mar 1 in non-leap years. Negative when
/// `date_of_birth` lies in the future.
pub fn age_on(date_of_birth: NaiveDate, reference_date: NaiveDate) -> i32 {
    let mut age = reference_date.year() - date_of_birth.year();

    if (reference_date.month(), reference_date.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }

    age
}

pub fn validate_customer_age(
    date_of_birth: NaiveDate,
    reference_date: NaiveDate,
) -> Result<(), Rejection> {
    let age = age_on(date_of_birth, reference_date);

    if age < MINIMUM_AGE {
        return Err(Rejection::AgeBelowMinimum {
            age,
            minimum: MINIMUM_AGE,
        });
    }

    Ok(())
}

// ============================================================================
// NUMBERING
// ============================================================================

/// Number following `last_number`: 0 → "00001".
///
/// Past 99999 the width grows ("100000") instead of wrapping.
pub fn next_certificate_number(last_number: u32) -> String {
    format!("{:0width$}", u64::from(last_number) + 1, width = NUMBER_WIDTH)
}

// ============================================================================
// ISSUANCE PIPELINE
// ============================================================================

/// Runs the issuance protocol on a structurally valid request.
///
/// Checks run in a fixed order and stop at the first failure: age, then
/// insured sum. The customer's age is taken on `created_at`'s UTC calendar
/// date; only the validity window is computed in `zone`.
pub fn issue_certificate<Z: TimeZone>(
    request: &CertificateRequest,
    created_at: DateTime<Utc>,
    last_number: u32,
    zone: &Z,
) -> Result<Certificate, Rejection> {
    validate_customer_age(request.customer_date_of_birth, created_at.date_naive())?;

    let certificate_sum = validate_and_price_insured_sum(request.insured_sum)?;

    let window = compute_validity_window(created_at, zone);

    Ok(Certificate {
        number: next_certificate_number(last_number),
        creation_date: created_at,
        valid_from: window.valid_from,
        valid_to: window.valid_to,
        customer: request.customer(),
        insured_item: request.insured_item.clone(),
        insured_sum: request.insured_sum,
        certificate_sum,
    })
}

// ============================================================================
// TESTS
// ============================================================================
