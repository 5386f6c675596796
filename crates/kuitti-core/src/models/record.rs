//! Receipt data model: the fixed field schema, typed values, extraction
//! steps, and the reconciled record persisted per document.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The fixed field schema of a service receipt.
///
/// Every extraction stage reports against this closed set; a record always
/// accounts for all of these fields, present or absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    /// Service/invoice date.
    Date,
    /// Grand total in EUR.
    Amount,
    /// VAT (ALV) amount in EUR.
    VatAmount,
    /// Invoice number as printed.
    InvoiceNumber,
    /// Odometer reading in kilometers.
    OdometerKm,
    /// Service provider name, canonicalized.
    Company,
    /// Recognized work/service line descriptions.
    WorkDescription,
}

impl Field {
    /// All schema fields in canonical order.
    pub const ALL: [Field; 7] = [
        Field::Date,
        Field::Amount,
        Field::VatAmount,
        Field::InvoiceNumber,
        Field::OdometerKm,
        Field::Company,
        Field::WorkDescription,
    ];

    /// Snake-case field name as used in persisted JSON.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Amount => "amount",
            Field::VatAmount => "vat_amount",
            Field::InvoiceNumber => "invoice_number",
            Field::OdometerKm => "odometer_km",
            Field::Company => "company",
            Field::WorkDescription => "work_description",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed field value, used wherever code handles fields generically
/// (merging, overrides, comparisons, reporting).
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Date(NaiveDate),
    Amount(Decimal),
    Integer(i64),
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Date(d) => write!(f, "{}", d),
            FieldValue::Amount(a) => write!(f, "{}", a),
            FieldValue::Integer(n) => write!(f, "{}", n),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::List(items) => f.write_str(&items.join(", ")),
        }
    }
}

/// One value slot per schema field. `None` is the explicit absent marker:
/// the field is serialized as `null`, never omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReceiptFields {
    pub date: Option<NaiveDate>,
    pub amount: Option<Decimal>,
    pub vat_amount: Option<Decimal>,
    pub invoice_number: Option<String>,
    pub odometer_km: Option<i64>,
    pub company: Option<String>,
    pub work_description: Option<Vec<String>>,
}

impl ReceiptFields {
    /// Typed value of a field, if present.
    pub fn get(&self, field: Field) -> Option<FieldValue> {
        match field {
            Field::Date => self.date.map(FieldValue::Date),
            Field::Amount => self.amount.map(FieldValue::Amount),
            Field::VatAmount => self.vat_amount.map(FieldValue::Amount),
            Field::InvoiceNumber => self.invoice_number.clone().map(FieldValue::Text),
            Field::OdometerKm => self.odometer_km.map(FieldValue::Integer),
            Field::Company => self.company.clone().map(FieldValue::Text),
            Field::WorkDescription => self.work_description.clone().map(FieldValue::List),
        }
    }

    /// Set a field from a typed value. Returns false (and leaves the record
    /// untouched) if the value's type does not fit the field.
    pub fn set(&mut self, field: Field, value: FieldValue) -> bool {
        match (field, value) {
            (Field::Date, FieldValue::Date(d)) => self.date = Some(d),
            (Field::Amount, FieldValue::Amount(a)) => self.amount = Some(a),
            (Field::VatAmount, FieldValue::Amount(a)) => self.vat_amount = Some(a),
            (Field::InvoiceNumber, FieldValue::Text(s)) => self.invoice_number = Some(s),
            (Field::OdometerKm, FieldValue::Integer(n)) => self.odometer_km = Some(n),
            (Field::Company, FieldValue::Text(s)) => self.company = Some(s),
            (Field::WorkDescription, FieldValue::List(items)) => {
                self.work_description = Some(items)
            }
            _ => return false,
        }
        true
    }

    pub fn is_present(&self, field: Field) -> bool {
        match field {
            Field::Date => self.date.is_some(),
            Field::Amount => self.amount.is_some(),
            Field::VatAmount => self.vat_amount.is_some(),
            Field::InvoiceNumber => self.invoice_number.is_some(),
            Field::OdometerKm => self.odometer_km.is_some(),
            Field::Company => self.company.is_some(),
            Field::WorkDescription => self.work_description.is_some(),
        }
    }

    /// Fields carrying a value.
    pub fn present(&self) -> BTreeSet<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| self.is_present(*f))
            .collect()
    }

    /// Schema fields without a value.
    pub fn absent(&self) -> BTreeSet<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| !self.is_present(*f))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        Field::ALL.iter().all(|f| !self.is_present(*f))
    }

    /// Copy every present field of `other` over this record, field by field.
    pub fn apply(&mut self, other: &ReceiptFields) {
        for field in Field::ALL {
            if let Some(value) = other.get(field) {
                self.set(field, value);
            }
        }
    }
}

/// Name of a pipeline stage that produced an extraction step.
///
/// The order of the variants is the fixed execution order; reconciliation
/// precedence follows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepName {
    Recognition,
    Pattern,
    ModelFallback,
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            StepName::Recognition => "recognition",
            StepName::Pattern => "pattern",
            StepName::ModelFallback => "model-fallback",
        })
    }
}

/// Explicit failure marker on a step, distinct from "field absent".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum StepFailure {
    /// The model service could not be reached or returned an error.
    ServiceUnavailable(String),
    /// The model service answered but the reply did not parse.
    ParseFailure(String),
}

/// One stage's attempt to produce fields for a document.
///
/// Steps are append-only: a document accumulates them in execution order and
/// none are edited after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionStep {
    /// Which stage ran.
    pub step: StepName,

    /// Fields the stage populated.
    #[serde(default)]
    pub fields: ReceiptFields,

    /// Schema fields the stage could not populate.
    #[serde(default)]
    pub missing: BTreeSet<Field>,

    /// Failure marker, when the stage ran but failed outright.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure: Option<StepFailure>,

    /// Wall-clock duration of the stage.
    pub duration_ms: u64,
}

impl ExtractionStep {
    /// A step that produced fields (possibly none of them).
    pub fn new(step: StepName, fields: ReceiptFields, duration_ms: u64) -> Self {
        let missing = fields.absent();
        Self {
            step,
            fields,
            missing,
            failure: None,
            duration_ms,
        }
    }

    /// A zero-field step carrying an explicit failure marker.
    pub fn failed(step: StepName, failure: StepFailure, duration_ms: u64) -> Self {
        Self {
            step,
            fields: ReceiptFields::default(),
            missing: Field::ALL.into_iter().collect(),
            failure: Some(failure),
            duration_ms,
        }
    }
}

/// The single merged field set for a document, with per-field provenance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReconciledRecord {
    /// Merged fields; every schema field present as value or `null`.
    pub fields: ReceiptFields,

    /// Which stage supplied each accepted value.
    #[serde(default)]
    pub provenance: BTreeMap<Field, StepName>,
}

/// Document-level metadata recorded with every processing pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMeta {
    /// Document identifier, derived from the source file name.
    pub id: String,

    /// Source file name as given.
    pub source_file: String,

    /// Content hash of the source file, `sha256:<hex>`.
    pub file_hash: String,

    /// When this processing pass ran.
    pub processed_at: DateTime<Utc>,

    /// Sum of all step durations.
    pub total_duration_ms: u64,
}

/// The externally visible per-document artifact: append-only step history
/// plus the current reconciled record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub document: DocumentMeta,
    pub steps: Vec<ExtractionStep>,
    pub reconciled: ReconciledRecord,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_rejects_mismatched_type() {
        let mut fields = ReceiptFields::default();
        assert!(!fields.set(Field::Amount, FieldValue::Text("850".into())));
        assert!(fields.amount.is_none());

        assert!(fields.set(Field::Amount, FieldValue::Amount(Decimal::new(85000, 2))));
        assert_eq!(fields.amount, Some(Decimal::new(85000, 2)));
    }

    #[test]
    fn absent_fields_serialize_as_null() {
        let record = ReconciledRecord {
            fields: ReceiptFields {
                amount: Some(Decimal::new(85000, 2)),
                ..Default::default()
            },
            provenance: BTreeMap::from([(Field::Amount, StepName::Pattern)]),
        };

        let json = serde_json::to_value(&record).unwrap();
        let fields = json["fields"].as_object().unwrap();
        for field in Field::ALL {
            assert!(fields.contains_key(field.name()), "{field} key missing");
        }
        assert!(fields["date"].is_null());
        assert_eq!(json["provenance"]["amount"], "pattern");
    }

    #[test]
    fn step_names_round_trip_kebab_case() {
        let json = serde_json::to_string(&StepName::ModelFallback).unwrap();
        assert_eq!(json, "\"model-fallback\"");
        let back: StepName = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StepName::ModelFallback);
    }

    #[test]
    fn failed_step_reports_all_fields_missing() {
        let step = ExtractionStep::failed(
            StepName::ModelFallback,
            StepFailure::ServiceUnavailable("connection refused".into()),
            120,
        );
        assert!(step.fields.is_empty());
        assert_eq!(step.missing.len(), Field::ALL.len());
        assert!(matches!(
            step.failure,
            Some(StepFailure::ServiceUnavailable(_))
        ));
    }
}
