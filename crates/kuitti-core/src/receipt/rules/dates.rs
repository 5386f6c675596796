//! Date extraction for Finnish receipts.

use chrono::NaiveDate;

use super::patterns::{DATE_DMY, DATE_ISO, DATE_LABELED};

/// Extract the service date from receipt text.
///
/// A labeled date (Laskupvm, Päivämäärä) wins over the first date-looking
/// token; receipts often carry due dates and print timestamps further down.
pub fn extract_date(text: &str) -> Option<NaiveDate> {
    if let Some(caps) = DATE_LABELED.captures(text) {
        if let Some(date) = parse_dmy_str(&caps[1]) {
            return Some(date);
        }
    }

    // First calendar-valid DD.MM.YYYY occurrence
    for caps in DATE_DMY.captures_iter(text) {
        let day: u32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let year = expand_year(&caps[3]);
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    for caps in DATE_ISO.captures_iter(text) {
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day: u32 = caps[3].parse().ok()?;
        if let Some(date) = NaiveDate::from_ymd_opt(year, month, day) {
            return Some(date);
        }
    }

    None
}

/// Parse a `DD.MM.YYYY` or `DD.MM.YY` string.
pub fn parse_dmy_str(s: &str) -> Option<NaiveDate> {
    let caps = DATE_DMY.captures(s)?;
    let day: u32 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    NaiveDate::from_ymd_opt(expand_year(&caps[3]), month, day)
}

/// Two-digit years: 00-49 are 2000s, 50-99 are 1900s.
fn expand_year(s: &str) -> i32 {
    let year: i32 = s.parse().unwrap_or(0);
    if s.len() == 2 {
        if year < 50 { 2000 + year } else { 1900 + year }
    } else {
        year
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_finnish_date() {
        assert_eq!(
            extract_date("Huolto tehty 04.05.2023"),
            NaiveDate::from_ymd_opt(2023, 5, 4)
        );
    }

    #[test]
    fn extracts_iso_date() {
        assert_eq!(
            extract_date("printed 2023-05-04"),
            NaiveDate::from_ymd_opt(2023, 5, 4)
        );
    }

    #[test]
    fn labeled_date_wins_over_earlier_dates() {
        let text = "Eräpäivä 18.05.2023\nLaskupvm 04.05.23";
        assert_eq!(extract_date(text), NaiveDate::from_ymd_opt(2023, 5, 4));
    }

    #[test]
    fn two_digit_years_expand() {
        assert_eq!(
            extract_date("12.3.07"),
            NaiveDate::from_ymd_opt(2007, 3, 12)
        );
        assert_eq!(
            extract_date("12.3.99"),
            NaiveDate::from_ymd_opt(1999, 3, 12)
        );
    }

    #[test]
    fn invalid_calendar_date_is_skipped() {
        // 31.02 never parses; the next candidate wins
        assert_eq!(
            extract_date("31.02.2023 then 04.05.2023"),
            NaiveDate::from_ymd_opt(2023, 5, 4)
        );
    }
}
