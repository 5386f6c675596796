//! Amount extraction for Finnish receipts.

use rust_decimal::Decimal;
use std::str::FromStr;

use super::patterns::{
    AMOUNT_CURRENCY, TOTAL_EUR, TOTAL_LABELED, VAT_LABELED, VAT_PERCENT, VAT_RATE_AMOUNT,
};

/// Extract the grand total, most specific pattern first.
pub fn extract_total(text: &str) -> Option<Decimal> {
    for pattern in [&*TOTAL_EUR, &*TOTAL_LABELED, &*AMOUNT_CURRENCY] {
        if let Some(caps) = pattern.captures(text) {
            if let Some(amount) = parse_finnish_amount(&caps[1]) {
                return Some(amount);
            }
        }
    }
    None
}

/// Extract the VAT (ALV) amount.
pub fn extract_vat(text: &str) -> Option<Decimal> {
    for pattern in [&*VAT_RATE_AMOUNT, &*VAT_LABELED, &*VAT_PERCENT] {
        if let Some(caps) = pattern.captures(text) {
            if let Some(amount) = parse_finnish_amount(&caps[1]) {
                return Some(amount);
            }
        }
    }
    None
}

/// Parse a Finnish-formatted amount: comma decimal separator, optional
/// spaces as group separators ("1 234,56", "850,00", "850.00").
pub fn parse_finnish_amount(s: &str) -> Option<Decimal> {
    let cleaned: String = s
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned.replace(',', ".")).ok()
}
