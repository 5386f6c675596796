//! Common regex patterns for Finnish service receipt extraction.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Date patterns
    pub static ref DATE_DMY: Regex = Regex::new(
        r"\b(\d{1,2})\.(\d{1,2})\.(\d{4}|\d{2})\b"
    ).unwrap();

    pub static ref DATE_ISO: Regex = Regex::new(
        r"\b(\d{4})-(\d{2})-(\d{2})\b"
    ).unwrap();

    // Labeled dates (Laskupvm on Automajor invoices, Päivämäärä on Veho)
    pub static ref DATE_LABELED: Regex = Regex::new(
        r"(?i)(?:Laskupvm|Päivämäärä|Pvm\.?)[\s:]*(\d{1,2}\.\d{1,2}\.(?:\d{4}|\d{2}))"
    ).unwrap();

    // Total amount: "Yhteensä: 850,00 EUR" at its most specific
    pub static ref TOTAL_EUR: Regex = Regex::new(
        r"(?i)Yhteensä:\s*(\d+[,.\s]\d{2})\s*EUR"
    ).unwrap();

    pub static ref TOTAL_LABELED: Regex = Regex::new(
        r"(?i)(?:Yhteensä|MAKSETTAVA\s+YHTEENSÄ)[^\n]*?(\d+[,.\s]\d{2})"
    ).unwrap();

    pub static ref AMOUNT_CURRENCY: Regex = Regex::new(
        r"(\d+[,.\s]\d{2})\s*(?:EUR|€)"
    ).unwrap();

    // VAT: "+ALV 22,00 % 36,74" style, percentage before the amount
    pub static ref VAT_RATE_AMOUNT: Regex = Regex::new(
        r"(?i)\+?ALV\s+\d+[,.\s]\d{2}\s*%\s*(\d+[,.\s]\d{2})"
    ).unwrap();

    pub static ref VAT_LABELED: Regex = Regex::new(
        r"(?i)(?:ALV|Arvonlisävero|Vero)[^\n]*?(\d+[,.\s]\d{2})"
    ).unwrap();

    pub static ref VAT_PERCENT: Regex = Regex::new(
        r"(?:24|25\.5)\s*%[^\n]*?(\d+[,.\s]\d{2})"
    ).unwrap();

    // Invoice numbers: Veho prints 8 digits, Automajor labels with Laskunro
    pub static ref INVOICE_8_DIGITS: Regex = Regex::new(
        r"\b(\d{8})\b"
    ).unwrap();

    pub static ref INVOICE_LABELED: Regex = Regex::new(
        r"(?i)(?:Laskunro|Laskun\s*numero|Invoice)[\s:]*(\d+)"
    ).unwrap();

    pub static ref INVOICE_6_7_DIGITS: Regex = Regex::new(
        r"\b(\d{6,7})\b"
    ).unwrap();

    // Odometer readings. The labeled value may land a few lines below the
    // label in OCR output.
    pub static ref ODOMETER_LABEL_BLOCK: Regex = Regex::new(
        r"(?s)Mittarilukema:.*?\n+(\d{6})"
    ).unwrap();

    pub static ref ODOMETER_LABELED: Regex = Regex::new(
        r"(?i)(?:Mittarilukema|Mittarilkm|Mileage)[\s:]*(\d+)"
    ).unwrap();

    pub static ref ODOMETER_OWN_LINE: Regex = Regex::new(
        r"(?m)^(\d{6})$"
    ).unwrap();

    pub static ref ODOMETER_KM_SUFFIX: Regex = Regex::new(
        r"(\d{6,7})\s*km"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_eur_is_most_specific() {
        let caps = TOTAL_EUR.captures("Yhteensä: 850,00 EUR").unwrap();
        assert_eq!(&caps[1], "850,00");
    }

    #[test]
    fn vat_rate_amount_captures_amount_not_rate() {
        let caps = VAT_RATE_AMOUNT.captures("+ALV 22,00 % 36,74").unwrap();
        assert_eq!(&caps[1], "36,74");
    }

    #[test]
    fn odometer_label_spans_lines() {
        let caps = ODOMETER_LABEL_BLOCK
            .captures("Mittarilukema:\n\n387551\n")
            .unwrap();
        assert_eq!(&caps[1], "387551");
    }
}
