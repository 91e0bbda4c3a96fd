// 🏷️ Pricing Tiers - Rules as Data
// Fixed premium per insured-sum range, ranges inclusive on both ends

use crate::error::Rejection;
use rust_decimal::Decimal;
use serde::Serialize;

// ============================================================================
// TIER DEFINITION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingTier {
    /// Lowest insured sum covered by this tier
    pub min: Decimal,

    /// Highest insured sum covered by this tier
    pub max: Decimal,

    /// Certificate sum charged for this tier
    pub premium: Decimal,
}

impl PricingTier {
    pub fn contains(&self, insured_sum: Decimal) -> bool {
        insured_sum >= self.min && insured_sum <= self.max
    }

    /// "$20.00-$50.00"
    pub fn describe(&self) -> String {
        format!("${:.2}-${:.2}", self.min, self.max)
    }
}

const fn cents(amount: u32) -> Decimal {
    Decimal::from_parts(amount, 0, 0, false, 2)
}

/// Contiguous, disjoint tiers covering [20.00, 200.00]
pub const PRICING_TIERS: [PricingTier; 3] = [
    PricingTier {
        min: cents(2000),
        max: cents(5000),
        premium: cents(800),
    },
    PricingTier {
        min: cents(5001),
        max: cents(10000),
        premium: cents(1500),
    },
    PricingTier {
        min: cents(10001),
        max: cents(20000),
        premium: cents(2500),
    },
];

// ============================================================================
// LOOKUP
// ============================================================================

/// Tier containing `insured_sum`, if any
pub fn find_tier(insured_sum: Decimal) -> Option<&'static PricingTier> {
    PRICING_TIERS.iter().find(|tier| tier.contains(insured_sum))
}

/// "$20.00-$50.00, $50.01-$100.00, $100.01-$200.00"
pub fn describe_ranges() -> String {
    PRICING_TIERS
        .iter()
        .map(PricingTier::describe)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Premium for `insured_sum`, or `SumOutOfRange` when no tier covers it
pub fn validate_and_price_insured_sum(insured_sum: Decimal) -> Result<Decimal, Rejection> {
    find_tier(insured_sum)
        .map(|tier| tier.premium)
        .ok_or_else(|| Rejection::SumOutOfRange {
            sum: insured_sum,
            ranges: describe_ranges(),
        })
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RejectionKind;

    #[test]
    fn test_tier_boundaries() {
        let cases = [
            (cents(2000), 8),
            (cents(5000), 8),
            (cents(5001), 15),
            (cents(10000), 15),
            (cents(10001), 25),
            (cents(20000), 25),
        ];

        for (sum, premium) in cases {
            assert_eq!(
                validate_and_price_insured_sum(sum).unwrap(),
                Decimal::from(premium),
                "premium for {}",
                sum
            );
        }
    }

    #[test]
    fn test_out_of_range() {
        for sum in [cents(1999), cents(20001), Decimal::ZERO, Decimal::from(-50)] {
            let err = validate_and_price_insured_sum(sum).unwrap_err();
            assert_eq!(err.kind(), RejectionKind::SumOutOfRange);
        }
    }

    #[test]
    fn test_gap_between_tiers_is_rejected() {
        // 50.005 sits between the first and second tier
        let sum = Decimal::new(50005, 3);
        assert!(validate_and_price_insured_sum(sum).is_err());
    }

    #[test]
    fn test_message_rounds_midpoint_away_from_tier_bounds() {
        let err = validate_and_price_insured_sum(Decimal::new(50005, 3)).unwrap_err();
        assert!(err.to_string().starts_with("Insured sum $50.01 is not within"));

        let err = validate_and_price_insured_sum(Decimal::new(200005, 3)).unwrap_err();
        assert!(err.to_string().starts_with("Insured sum $200.01 is not within"));
    }

    #[test]
    fn test_scale_does_not_matter() {
        assert_eq!(
            validate_and_price_insured_sum(Decimal::from(150)).unwrap(),
            Decimal::from(25)
        );
        assert_eq!(
            validate_and_price_insured_sum(Decimal::new(500, 1)).unwrap(),
            Decimal::from(8)
        );
    }

    #[test]
    fn test_message_lists_ranges() {
        let err = validate_and_price_insured_sum(cents(1500)).unwrap_err();

        assert_eq!(
            err.to_string(),
            "Insured sum $15.00 is not within any valid pricing range. \
             Valid ranges: $20.00-$50.00, $50.01-$100.00, $100.01-$200.00"
        );
    }

    #[test]
    fn test_tiers_are_disjoint_and_contiguous() {
        for pair in PRICING_TIERS.windows(2) {
            assert!(pair[0].max < pair[1].min);
            assert_eq!(pair[1].min - pair[0].max, cents(1));
        }
        assert_eq!(PRICING_TIERS[0].min, Decimal::from(20));
        assert_eq!(PRICING_TIERS[2].max, Decimal::from(200));
    }
}
