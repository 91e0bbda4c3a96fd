// ⏰ Validity Window - one year, ending at local midnight
//
// The issuer's time zone is an explicit argument. Nothing here reads the
// host's local time zone.

use chrono::{DateTime, Duration, LocalResult, Months, NaiveDate, NaiveTime, TimeZone};

/// Half-open period [valid_from, valid_to) during which a certificate is in force
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidityWindow<Tz: TimeZone> {
    pub valid_from: DateTime<Tz>,
    pub valid_to: DateTime<Tz>,
}

impl<Tz: TimeZone> ValidityWindow<Tz> {
    pub fn is_in_force_at(&self, instant: &DateTime<Tz>) -> bool {
        self.valid_from <= *instant && *instant < self.valid_to
    }
}

/// Calendar date one year after `date`.
///
/// Feb 29 maps to Feb 28 of the following year.
pub fn anniversary(date: NaiveDate) -> NaiveDate {
    date.checked_add_months(Months::new(12))
        .unwrap_or(NaiveDate::MAX)
}

/// First instant of the local calendar day `date` in `zone`.
///
/// Midnight inside a DST fold resolves to the earlier instant; midnight inside
/// a DST gap moves forward to the first local hour that exists.
pub fn start_of_local_day<Z: TimeZone>(date: NaiveDate, zone: &Z) -> DateTime<Z> {
    let midnight = date.and_time(NaiveTime::MIN);

    for hour in 0..24 {
        match zone.from_local_datetime(&(midnight + Duration::hours(hour))) {
            LocalResult::Single(instant) => return instant,
            LocalResult::Ambiguous(earliest, _) => return earliest,
            LocalResult::None => continue,
        }
    }

    // Unreachable for real zones: no gap spans a whole day
    zone.from_utc_datetime(&midnight)
}

/// Validity window for a certificate created at `created_at`.
///
/// `valid_from` is `created_at` unchanged. `valid_to` is the start of the
/// anniversary of `created_at`'s calendar date in `zone`, expressed in the
/// same time representation as `created_at`.
pub fn compute_validity_window<Tz, Z>(created_at: DateTime<Tz>, zone: &Z) -> ValidityWindow<Tz>
where
    Tz: TimeZone,
    Z: TimeZone,
{
    let local_date = created_at.with_timezone(zone).date_naive();
    let valid_to = start_of_local_day(anniversary(local_date), zone)
        .with_timezone(&created_at.timezone());

    ValidityWindow {
        valid_from: created_at,
        valid_to,
    }
}

// ============================================================================
// TESTS
// ============================================================================
