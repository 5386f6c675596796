//! Text recognition adapters.
//!
//! Recognition itself is an external engine consumed as a black box; this
//! module only defines the seam and ships a tesseract-based adapter.

mod tesseract;

pub use tesseract::TesseractRecognizer;

use std::path::Path;

use crate::error::RecognitionError;
use crate::models::record::{ExtractionStep, ReceiptFields, StepName};

/// Raw recognized text plus timing for one document.
#[derive(Debug, Clone)]
pub struct RecognitionOutput {
    /// Recognized text, pages joined with a page-break marker.
    pub text: String,

    /// Number of pages the engine processed.
    pub pages: usize,

    /// Wall-clock duration of the engine run.
    pub duration_ms: u64,
}

impl RecognitionOutput {
    /// Record the recognition pass in the step history. The stage produces
    /// text, not fields, so the step carries only timing.
    pub fn to_step(&self) -> ExtractionStep {
        ExtractionStep::new(
            StepName::Recognition,
            ReceiptFields::default(),
            self.duration_ms,
        )
    }
}

/// A text recognition engine.
///
/// Failures here are the only per-document fatal errors in the pipeline: a
/// document that yields no text cannot proceed to any extraction stage.
pub trait Recognizer {
    fn recognize(&self, path: &Path) -> Result<RecognitionOutput, RecognitionError>;
}
