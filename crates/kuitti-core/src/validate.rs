//! Validation engine: expectation rules and outcome classification.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::config::ValidationConfig;
use crate::models::record::{Field, FieldValue, ReceiptFields};

/// Per-field severity classification used by validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpectationRules {
    /// Missing one of these fails the outcome.
    #[serde(rename = "required_fields")]
    pub required: Vec<Field>,

    /// Missing one of these is logged, never fatal.
    #[serde(rename = "warning_if_missing")]
    pub warn_if_missing: Vec<Field>,

    /// Missing one of these is informational only.
    #[serde(rename = "optional_fields")]
    pub optional: Vec<Field>,
}

impl ExpectationRules {
    /// Default rule set for the receipt schema.
    pub fn default_schema() -> Self {
        Self {
            required: vec![Field::Date, Field::Amount, Field::Company],
            warn_if_missing: vec![Field::VatAmount, Field::InvoiceNumber, Field::OdometerKm],
            optional: vec![Field::WorkDescription],
        }
    }
}

/// A value disagreement found in self-test mode.
#[derive(Debug, Clone, Serialize)]
pub struct ValueMismatch {
    pub field: Field,
    pub got: String,
    pub expected: String,
}

/// Result of checking a record against expectation rules.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationOutcome {
    /// False when a required field is missing or a value disagrees with
    /// ground truth beyond tolerance.
    pub passed: bool,
    pub missing_required: Vec<Field>,
    pub missing_warning: Vec<Field>,
    pub missing_optional: Vec<Field>,
    pub mismatches: Vec<ValueMismatch>,
}

impl ValidationOutcome {
    pub fn has_warnings(&self) -> bool {
        !self.missing_warning.is_empty()
    }
}

/// The validation engine. Purely computed; mutates nothing.
#[derive(Debug, Clone)]
pub struct Validator {
    rules: ExpectationRules,
    amount_tolerance: Decimal,
}

impl Validator {
    pub fn new(rules: ExpectationRules, amount_tolerance: Decimal) -> Self {
        Self {
            rules,
            amount_tolerance,
        }
    }

    pub fn from_config(config: &ValidationConfig) -> Self {
        Self::new(config.rules.clone(), config.amount_tolerance)
    }

    /// Presence check of a record against the rule set.
    pub fn check(&self, record: &ReceiptFields) -> ValidationOutcome {
        self.check_inner(record, None)
    }

    /// Presence check plus field-type-aware value comparison against a
    /// trusted record (accuracy self-test mode).
    pub fn check_against(&self, record: &ReceiptFields, truth: &ReceiptFields) -> ValidationOutcome {
        self.check_inner(record, Some(truth))
    }

    fn check_inner(
        &self,
        record: &ReceiptFields,
        truth: Option<&ReceiptFields>,
    ) -> ValidationOutcome {
        let missing =
            |fields: &[Field]| -> Vec<Field> {
                fields
                    .iter()
                    .copied()
                    .filter(|f| !record.is_present(*f))
                    .collect()
            };

        let missing_required = missing(&self.rules.required);
        let missing_warning = missing(&self.rules.warn_if_missing);
        let missing_optional = missing(&self.rules.optional);

        let mut mismatches = Vec::new();
        if let Some(truth) = truth {
            for field in Field::ALL {
                let (Some(got), Some(expected)) = (record.get(field), truth.get(field)) else {
                    continue;
                };
                if !self.values_match(&got, &expected) {
                    mismatches.push(ValueMismatch {
                        field,
                        got: got.to_string(),
                        expected: expected.to_string(),
                    });
                }
            }
        }

        ValidationOutcome {
            passed: missing_required.is_empty() && mismatches.is_empty(),
            missing_required,
            missing_warning,
            missing_optional,
            mismatches,
        }
    }

    /// Field-type-aware equality: dates as calendar dates, amounts within
    /// the configured absolute tolerance, strings case-insensitive after
    /// whitespace normalization.
    fn values_match(&self, got: &FieldValue, expected: &FieldValue) -> bool {
        match (got, expected) {
            (FieldValue::Date(a), FieldValue::Date(b)) => a == b,
            (FieldValue::Amount(a), FieldValue::Amount(b)) => {
                (*a - *b).abs() <= self.amount_tolerance
            }
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a == b,
            // odometer-style integers occasionally land as decimals in
            // hand-edited ground truth files
            (FieldValue::Integer(a), FieldValue::Amount(b))
            | (FieldValue::Amount(b), FieldValue::Integer(a)) => {
                (Decimal::from(*a) - *b).abs() <= self.amount_tolerance
            }
            (FieldValue::Text(a), FieldValue::Text(b)) => normalize(a) == normalize(b),
            (FieldValue::List(a), FieldValue::List(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b.iter())
                        .all(|(x, y)| normalize(x) == normalize(y))
            }
            _ => false,
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::from_config(&ValidationConfig::default())
    }
}

fn normalize(s: &str) -> String {
    s.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
