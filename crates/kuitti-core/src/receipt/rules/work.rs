//! Work description extraction: recognized Finnish service terms.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Service terms worth surfacing on the timeline, Finnish first.
    static ref SERVICE_TERMS: Vec<Regex> = [
        r"(?i)(Öljynvaihto|Oil change)",
        r"(?i)(Öljynsuodatin|Oil filter)",
        r"(?i)(Ilmansuodatin|Air filter)",
        r"(?i)(Raitisilmasuodatin|Cabin air filter)",
        r"(?i)(Huolto|Service|Maintenance)",
        r"(?i)(Katsastus|Inspection)",
        r"(?i)(Jarru|Brake)",
        r"(?i)(Rengas|Renkaat|Tire|Tyres)",
        r"(?i)(TYÖVELOITUS|Labor)",
        r"(?i)(PIENTARVIKKEET|Small items)",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
}

/// Collect distinct recognized service terms, capped at `max_items`.
pub fn extract_work_description(text: &str, max_items: usize) -> Vec<String> {
    let mut descriptions: Vec<String> = Vec::new();
    for pattern in SERVICE_TERMS.iter() {
        for caps in pattern.captures_iter(text) {
            let term = caps[1].to_string();
            if !descriptions.contains(&term) {
                descriptions.push(term);
            }
            if descriptions.len() >= max_items {
                return descriptions;
            }
        }
    }
    descriptions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_distinct_terms() {
        let text = "Öljynvaihto\nÖljynsuodatin\nTYÖVELOITUS\nÖljynvaihto";
        let work = extract_work_description(text, 10);
        assert_eq!(work, vec!["Öljynvaihto", "Öljynsuodatin", "TYÖVELOITUS"]);
    }

    #[test]
    fn respects_item_cap() {
        let text = "Öljynvaihto Huolto Katsastus Jarru Rengas";
        assert_eq!(extract_work_description(text, 2).len(), 2);
    }

    #[test]
    fn no_terms_yields_empty() {
        assert!(extract_work_description("Lasku 123", 10).is_empty());
    }
}
