//! Reconciliation: fold the step history into one record per field.

use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::record::{ExtractionStep, Field, ReconciledRecord, StepName};

use super::rules::repair_reading;

/// Merge extraction steps into a single reconciled record.
///
/// Precedence is strictly "first successful stage wins": steps are folded in
/// execution order and a later stage only fills fields earlier stages left
/// absent. Provenance records the supplying stage per field.
///
/// The odometer self-repair heuristic runs after the merge, before the
/// record is finalized.
pub fn reconcile(steps: &[ExtractionStep], config: &ExtractionConfig) -> ReconciledRecord {
    let mut record = ReconciledRecord::default();

    for step in steps {
        for field in Field::ALL {
            if record.fields.is_present(field) {
                continue;
            }
            if let Some(value) = step.fields.get(field) {
                record.fields.set(field, value);
                record.provenance.insert(field, step.step);
            }
        }
    }

    if let Some(km) = record.fields.odometer_km {
        let repaired = repair_reading(km, config.odometer_min_km, config.odometer_max_km);
        if repaired != km {
            debug!(km, repaired, "odometer reading repaired");
            record.fields.odometer_km = Some(repaired);
        }
    }

    record
}

/// Provenance of a single field, if any stage supplied it.
pub fn provenance_of(record: &ReconciledRecord, field: Field) -> Option<StepName> {
    record.provenance.get(&field).copied()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;
    use rust_decimal::Decimal;
    use std::str::FromStr;

    use super::*;
    use crate::models::record::{ReceiptFields, StepFailure};

    fn pattern_step(fields: ReceiptFields) -> ExtractionStep {
        ExtractionStep::new(StepName::Pattern, fields, 3)
    }

    fn fallback_step(fields: ReceiptFields) -> ExtractionStep {
        ExtractionStep::new(StepName::ModelFallback, fields, 2100)
    }

    #[test]
    fn pattern_wins_over_fallback() {
        let steps = vec![
            pattern_step(ReceiptFields {
                amount: Some(Decimal::from_str("850.00").unwrap()),
                ..Default::default()
            }),
            fallback_step(ReceiptFields {
                amount: Some(Decimal::from_str("999.99").unwrap()),
                ..Default::default()
            }),
        ];

        let record = reconcile(&steps, &ExtractionConfig::default());
        assert_eq!(
            record.fields.amount,
            Some(Decimal::from_str("850.00").unwrap())
        );
        assert_eq!(provenance_of(&record, Field::Amount), Some(StepName::Pattern));
    }

    #[test]
    fn fallback_fills_gap() {
        let steps = vec![
            pattern_step(ReceiptFields {
                date: Some(NaiveDate::from_ymd_opt(2023, 5, 4).unwrap()),
                ..Default::default()
            }),
            fallback_step(ReceiptFields {
                amount: Some(Decimal::from_str("240.00").unwrap()),
                ..Default::default()
            }),
        ];

        let record = reconcile(&steps, &ExtractionConfig::default());
        assert_eq!(
            record.fields.amount,
            Some(Decimal::from_str("240.00").unwrap())
        );
        assert_eq!(
            provenance_of(&record, Field::Amount),
            Some(StepName::ModelFallback)
        );
        assert_eq!(provenance_of(&record, Field::Date), Some(StepName::Pattern));
    }

    #[test]
    fn failed_step_contributes_nothing() {
        let steps = vec![
            pattern_step(ReceiptFields {
                amount: Some(Decimal::from_str("54.00").unwrap()),
                ..Default::default()
            }),
            ExtractionStep::failed(
                StepName::ModelFallback,
                StepFailure::ServiceUnavailable("connection refused".into()),
                15_000,
            ),
        ];

        let record = reconcile(&steps, &ExtractionConfig::default());
        assert_eq!(
            record.fields.amount,
            Some(Decimal::from_str("54.00").unwrap())
        );
        assert_eq!(record.provenance.len(), 1);
    }

    #[test]
    fn odometer_repair_runs_after_merge() {
        let steps = vec![pattern_step(ReceiptFields {
            odometer_km: Some(2_387_551),
            ..Default::default()
        })];

        let record = reconcile(&steps, &ExtractionConfig::default());
        assert_eq!(record.fields.odometer_km, Some(387_551));
        // provenance still credits the stage that read the value
        assert_eq!(
            provenance_of(&record, Field::OdometerKm),
            Some(StepName::Pattern)
        );
    }

    #[test]
    fn in_range_odometer_untouched() {
        let steps = vec![pattern_step(ReceiptFields {
            odometer_km: Some(387_551),
            ..Default::default()
        })];
        let record = reconcile(&steps, &ExtractionConfig::default());
        assert_eq!(record.fields.odometer_km, Some(387_551));
    }

    #[test]
    fn every_schema_field_is_accounted_for() {
        let record = reconcile(&[], &ExtractionConfig::default());
        let json = serde_json::to_value(&record).unwrap();
        let fields = json["fields"].as_object().unwrap();
        assert_eq!(fields.len(), Field::ALL.len());
        for field in Field::ALL {
            assert!(fields[field.name()].is_null());
        }
    }
}
