//! Amount validation.

use bankroll_shared::types::within_precision;
use rust_decimal::Decimal;

use super::error::LedgerError;

/// Validates a customer-supplied amount.
///
/// Amounts must be strictly positive and fit `NUMERIC(12, 2)`.
pub fn validate_amount(amount: Decimal) -> Result<Decimal, LedgerError> {
    if amount <= Decimal::ZERO {
        return Err(LedgerError::InvalidAmount {
            amount,
            reason: "must be positive",
        });
    }
    if !within_precision(amount) {
        return Err(LedgerError::InvalidAmount {
            amount,
            reason: "at most 12 digits with 2 decimal places",
        });
    }
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(0.01))]
    #[case(dec!(50.00))]
    #[case(dec!(9999999999.99))]
    fn test_accepts_valid_amounts(#[case] amount: Decimal) {
        assert_eq!(validate_amount(amount), Ok(amount));
    }

    #[rstest]
    #[case(dec!(0), "must be positive")]
    #[case(dec!(-5), "must be positive")]
    #[case(dec!(0.001), "at most 12 digits with 2 decimal places")]
    #[case(dec!(10000000000), "at most 12 digits with 2 decimal places")]
    fn test_rejects_invalid_amounts(#[case] amount: Decimal, #[case] expected: &str) {
        match validate_amount(amount) {
            Err(LedgerError::InvalidAmount { reason, .. }) => assert_eq!(reason, expected),
            other => panic!("expected InvalidAmount, got {other:?}"),
        }
    }
}
