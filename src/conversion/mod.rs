//! Fixed-value points arithmetic.
//!
//! Pure functions over a [`Program`]; nothing here validates or clamps the
//! amounts it is given. Callers reject non-positive amounts first. Results
//! that would overflow `Decimal` come back as `AmountOutOfRange`.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::LoyaltyError;
use crate::programs::Program;

/// Rounds to two decimal places, halves away from zero.
pub fn round2(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Points earned per one currency unit of value: `100 / fixedCentsPerPoint`.
pub fn points_per_currency_unit(program: &Program) -> Decimal {
    Decimal::ONE_HUNDRED / Decimal::from(program.fixed_cents_per_point)
}

/// Currency value returned to the customer for a purchase.
pub fn earned_value(purchase_amount: Decimal, program: &Program) -> Result<Decimal, LoyaltyError> {
    purchase_amount
        .checked_mul(program.earn_rate_pct)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(LoyaltyError::AmountOutOfRange {
            amount: purchase_amount,
        })
}

pub fn earned_points(purchase_amount: Decimal, program: &Program) -> Result<Decimal, LoyaltyError> {
    earned_value(purchase_amount, program)?
        .checked_mul(points_per_currency_unit(program))
        .map(round2)
        .ok_or(LoyaltyError::AmountOutOfRange {
            amount: purchase_amount,
        })
}

/// Currency value of `points`. Equal to `points / points_per_currency_unit`,
/// computed as `points * cents / 100` so it stays exact for any cents value.
pub fn redeem_value(points: Decimal, program: &Program) -> Result<Decimal, LoyaltyError> {
    points
        .checked_mul(Decimal::from(program.fixed_cents_per_point))
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .ok_or(LoyaltyError::AmountOutOfRange { amount: points })
}

/// Display-only estimate of what the outstanding balance will actually cost
/// once breakage is taken into account.
pub fn estimated_liability(balance: Decimal, program: &Program) -> Result<Decimal, LoyaltyError> {
    let value = redeem_value(balance, program)?;
    program
        .breakage_pct
        .checked_div(Decimal::ONE_HUNDRED)
        .and_then(|b| Decimal::ONE.checked_sub(b))
        .and_then(|kept| value.checked_mul(kept))
        .ok_or(LoyaltyError::AmountOutOfRange { amount: balance })
}

/// Preview of an issue, shown before the purchase is committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Quote {
    pub purchase_amount: Decimal,
    pub earned_value: Decimal,
    pub points_per_currency_unit: Decimal,
    pub earned_points: Decimal,
}

pub fn quote(purchase_amount: Decimal, program: &Program) -> Result<Quote, LoyaltyError> {
    Ok(Quote {
        purchase_amount,
        earned_value: earned_value(purchase_amount, program)?,
        points_per_currency_unit: points_per_currency_unit(program),
        earned_points: earned_points(purchase_amount, program)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::programs::ProgramId;
    use rust_decimal_macros::dec;

    fn program(cents: u32, earn: Decimal, breakage: Decimal) -> Program {
        Program {
            id: ProgramId::new("p"),
            name: "Test".into(),
            token_symbol: "TST".into(),
            fixed_cents_per_point: cents,
            earn_rate_pct: earn,
            breakage_pct: breakage,
        }
    }

    #[test]
    fn dollar_point_program_earns_one_point_per_dollar_of_value() {
        let p = program(100, dec!(5), dec!(0));
        let q = quote(dec!(120.00), &p).unwrap();
        assert_eq!(q.earned_value, dec!(6.00));
        assert_eq!(q.points_per_currency_unit, dec!(1));
        assert_eq!(q.earned_points, dec!(6.00));
        assert_eq!(redeem_value(dec!(6.00), &p).unwrap(), dec!(6.00));
    }

    #[test]
    fn cent_point_program_scales_points_by_hundred() {
        let p = program(1, dec!(2), dec!(0));
        assert_eq!(points_per_currency_unit(&p), dec!(100));
        assert_eq!(earned_points(dec!(49.99), &p).unwrap(), dec!(99.98));
        assert_eq!(redeem_value(dec!(99.98), &p).unwrap(), dec!(0.9998));
    }

    #[test]
    fn earned_points_rounds_to_two_places() {
        let p = program(3, dec!(5), dec!(0));
        // 1.6665 value * 33.33.. pts/$ = 55.55 pts
        assert_eq!(earned_points(dec!(33.33), &p).unwrap(), dec!(55.55));
        let p = program(100, dec!(5), dec!(0));
        assert_eq!(earned_points(dec!(0.10), &p).unwrap(), dec!(0.01));
        assert_eq!(earned_points(dec!(0.09), &p).unwrap(), dec!(0.00));
    }

    #[test]
    fn redeem_value_inverts_earned_points_up_to_rounding() {
        for cents in [1u32, 3, 7, 10, 33, 100, 250] {
            let p = program(cents, dec!(4.5), dec!(0));
            // half a hundredth of a point, in currency
            let tolerance = dec!(0.005) * Decimal::from(cents) / Decimal::ONE_HUNDRED;
            for purchase in [dec!(0.01), dec!(1), dec!(19.99), dec!(120), dec!(7777.77)] {
                let value = earned_value(purchase, &p).unwrap();
                let back = redeem_value(earned_points(purchase, &p).unwrap(), &p).unwrap();
                assert!(
                    (back - value).abs() <= tolerance,
                    "cents={cents} purchase={purchase} value={value} back={back}"
                );
            }
        }
    }

    #[test]
    fn liability_discounts_breakage() {
        let p = program(100, dec!(5), dec!(20));
        assert_eq!(estimated_liability(dec!(50), &p).unwrap(), dec!(40));
        let p = program(100, dec!(5), dec!(100));
        assert_eq!(estimated_liability(dec!(50), &p).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn overflowing_arithmetic_is_reported_not_panicked() {
        let p = program(1, dec!(2), dec!(0));
        assert_eq!(
            earned_value(Decimal::MAX, &p),
            Err(LoyaltyError::AmountOutOfRange {
                amount: Decimal::MAX
            })
        );
        assert!(earned_points(Decimal::MAX, &p).is_err());
        assert!(quote(Decimal::MAX, &p).is_err());

        let p = program(100, dec!(5), dec!(10));
        assert!(redeem_value(Decimal::MAX, &p).is_err());
        assert!(estimated_liability(Decimal::MAX, &p).is_err());

        let p = program(1, dec!(5), dec!(0));
        assert_eq!(
            redeem_value(Decimal::MAX, &p).unwrap(),
            Decimal::MAX / Decimal::ONE_HUNDRED
        );
    }
}
