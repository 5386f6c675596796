//! Service provider identification.
//!
//! Providers form a closed lookup table of (pattern set, canonical name);
//! adding an issuer means adding a row, not touching extraction logic.

use lazy_static::lazy_static;
use regex::Regex;

/// One known service provider.
pub struct Provider {
    /// Canonical name emitted for the company field.
    pub canonical: &'static str,
    /// Text patterns that identify the provider, tried in order.
    pub patterns: Vec<Regex>,
}

lazy_static! {
    /// The known provider table, most specific names first.
    pub static ref PROVIDERS: Vec<Provider> = vec![
        provider("Järvenpään Automajor Oy", &[r"(?i)Järvenpään\s+Automajor"]),
        provider("Veho Autotalot Oy", &[r"(?i)\bVeho\b(?:\s+Autotalot)?"]),
        provider("A-Katsastus", &[r"(?i)A-Katsastus"]),
        provider("Sulan Katsastus", &[r"(?i)Sulan\s+Katsastus"]),
        provider("First Stop", &[r"(?i)First\s+Stop"]),
        provider("Euromaster", &[r"(?i)Euromaster"]),
    ];
}

fn provider(canonical: &'static str, patterns: &[&str]) -> Provider {
    Provider {
        canonical,
        patterns: patterns.iter().map(|p| Regex::new(p).unwrap()).collect(),
    }
}

/// Match text against the provider table; first matching row wins.
pub fn extract_company(text: &str) -> Option<String> {
    for provider in PROVIDERS.iter() {
        if provider.patterns.iter().any(|p| p.is_match(text)) {
            return Some(provider.canonical.to_string());
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_known_providers() {
        assert_eq!(
            extract_company("VEHO AUTOTALOT OY AB"),
            Some("Veho Autotalot Oy".to_string())
        );
        assert_eq!(
            extract_company("Järvenpään Automajor\nLaskunro 51447"),
            Some("Järvenpään Automajor Oy".to_string())
        );
        assert_eq!(
            extract_company("A-Katsastus Tuusula"),
            Some("A-Katsastus".to_string())
        );
        assert_eq!(
            extract_company("FIRST STOP rengaspalvelu"),
            Some("First Stop".to_string())
        );
    }

    #[test]
    fn unknown_text_yields_none() {
        assert_eq!(extract_company("K-Market Järvenpää"), None);
    }
}
