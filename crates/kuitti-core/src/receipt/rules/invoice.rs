//! Invoice number extraction.

use super::patterns::{INVOICE_6_7_DIGITS, INVOICE_8_DIGITS, INVOICE_LABELED};

/// Extract the invoice number.
///
/// Veho prints a bare 8-digit number; Automajor labels a shorter one with
/// "Laskunro". Bare 6-7 digit runs are the last resort and may collide with
/// odometer readings, which is why they rank below the labeled form.
pub fn extract_invoice_number(text: &str) -> Option<String> {
    for pattern in [&*INVOICE_8_DIGITS, &*INVOICE_LABELED, &*INVOICE_6_7_DIGITS] {
        if let Some(caps) = pattern.captures(text) {
            return Some(caps[1].to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eight_digit_run_wins() {
        assert_eq!(
            extract_invoice_number("Lasku 70547719 Mittarilkm 352832"),
            Some("70547719".to_string())
        );
    }

    #[test]
    fn labeled_number() {
        assert_eq!(
            extract_invoice_number("Laskunro 51447"),
            Some("51447".to_string())
        );
    }

    #[test]
    fn no_digits_yields_none() {
        assert_eq!(extract_invoice_number("kuitti ilman numeroa"), None);
    }
}
