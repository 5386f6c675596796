//! Pattern-based extraction stage: deterministic rules over recognized text.

use std::time::Instant;

use tracing::debug;

use crate::models::config::ExtractionConfig;
use crate::models::record::{ExtractionStep, ReceiptFields, StepName};

use super::rules::{
    extract_company, extract_date, extract_invoice_number, extract_odometer, extract_total,
    extract_vat, extract_work_description,
};

/// Deterministic field extractor for known receipt layouts.
///
/// A pure function of the input text: no I/O, no external calls, identical
/// output for identical input.
#[derive(Debug, Clone)]
pub struct PatternExtractor {
    max_work_items: usize,
}

impl PatternExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            max_work_items: config.max_work_items,
        }
    }

    /// Extract every schema field the rules can find.
    pub fn extract_fields(&self, text: &str) -> ReceiptFields {
        let mut fields = ReceiptFields {
            date: extract_date(text),
            amount: extract_total(text),
            vat_amount: extract_vat(text),
            invoice_number: extract_invoice_number(text),
            odometer_km: extract_odometer(text),
            company: extract_company(text),
            work_description: None,
        };

        let work = extract_work_description(text, self.max_work_items);
        if !work.is_empty() {
            fields.work_description = Some(work);
        }

        fields
    }

    /// Run the stage, producing a timed extraction step.
    pub fn run(&self, text: &str) -> ExtractionStep {
        let start = Instant::now();
        let fields = self.extract_fields(text);
        let step = ExtractionStep::new(
            StepName::Pattern,
            fields,
            start.elapsed().as_millis() as u64,
        );
        debug!(
            extracted = step.fields.present().len(),
            missing = step.missing.len(),
            "pattern extraction done"
        );
        step
    }
}

impl Default for PatternExtractor {
    fn default() -> Self {
        Self::new(&ExtractionConfig::default())
    }
}
