//! Amount rules and display formatting.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal`.

use rust_decimal::{Decimal, RoundingStrategy};

/// Maximum number of decimal places an amount may carry.
pub const AMOUNT_SCALE: u32 = 2;

/// Maximum number of significant digits an amount may carry.
pub const AMOUNT_MAX_DIGITS: u32 = 12;

/// Maximum number of significant digits a stored balance may carry.
pub const BALANCE_MAX_DIGITS: u32 = 14;

/// Returns true if the amount fits the `NUMERIC(12, 2)` shape accepted
/// from customers: at most two decimal places and ten integer digits.
#[must_use]
pub fn within_precision(amount: Decimal) -> bool {
    if amount.normalize().scale() > AMOUNT_SCALE {
        return false;
    }
    let integer_limit = Decimal::from(10_i64.pow(AMOUNT_MAX_DIGITS - AMOUNT_SCALE));
    amount.abs().trunc() < integer_limit
}

/// Returns true if a balance fits the `NUMERIC(14, 2)` account column.
#[must_use]
pub fn within_balance_limit(balance: Decimal) -> bool {
    let integer_limit = Decimal::from(10_i64.pow(BALANCE_MAX_DIGITS - AMOUNT_SCALE));
    balance.abs().trunc() < integer_limit
}

/// Formats an amount with two decimals and thousands separators, e.g. `1,234.50`.
#[must_use]
pub fn format_amount(amount: Decimal) -> String {
    let rounded =
        amount.round_dp_with_strategy(AMOUNT_SCALE, RoundingStrategy::MidpointAwayFromZero);
    let plain = format!("{:.2}", rounded.abs());
    let (integer, fraction) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}{grouped}.{fraction}")
}
