//! The per-document processing pipeline.
//!
//! Stages run strictly in sequence: recognition, pattern extraction, the
//! conditional model fallback, then reconciliation. Verification/override
//! resolution and validation operate on the persisted output and are
//! mode-independent.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::Utc;
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::error::Result;
use crate::models::config::KuittiConfig;
use crate::models::record::{DocumentMeta, DocumentRecord, ExtractionStep, Field, StepFailure};
use crate::receipt::{FallbackExtractor, LlmClient, PatternExtractor, reconcile};
use crate::recognize::Recognizer;

/// Operating mode: which extraction stages run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Recognition, pattern, fallback when required fields are missing.
    Full,
    /// Recognition only; no field extraction.
    RecognitionOnly,
    /// Recognition plus pattern extraction; fallback never runs.
    PatternOnly,
    /// Recognition plus forced fallback; pattern never runs.
    FallbackOnly,
}

/// One processed document: the persisted record plus the raw text sidecar.
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub record: DocumentRecord,
    pub raw_text: String,
}

/// The extraction pipeline for a single run.
pub struct Pipeline<R, C> {
    config: KuittiConfig,
    recognizer: R,
    pattern: PatternExtractor,
    fallback: FallbackExtractor<C>,
}

impl<R: Recognizer, C: LlmClient> Pipeline<R, C> {
    pub fn new(config: KuittiConfig, recognizer: R, client: C) -> Self {
        let pattern = PatternExtractor::new(&config.extraction);
        let fallback = FallbackExtractor::new(client, &config.llm);
        Self {
            config,
            recognizer,
            pattern,
            fallback,
        }
    }

    /// Process one document. Only recognition failures are terminal; every
    /// later stage degrades into missing fields.
    pub async fn process(&self, path: &Path, mode: Mode) -> Result<ProcessedDocument> {
        let doc_id = document_id(path);
        info!(doc_id = %doc_id, ?mode, "processing document");

        let recognition = self.recognizer.recognize(path)?;
        let raw_text = recognition.text.clone();
        let file_hash = hash_file(path)?;

        let mut steps = vec![recognition.to_step()];

        if matches!(mode, Mode::Full | Mode::PatternOnly) {
            steps.push(self.pattern.run(&raw_text));
        }

        if self.should_run_fallback(mode, &steps) {
            let wanted = self.wanted_fields(&steps);
            let step = self.fallback.run(&raw_text, &wanted).await;
            if let Some(StepFailure::ServiceUnavailable(ref msg)) = step.failure {
                warn!(doc_id = %doc_id, error = %msg, "continuing without fallback fields");
            }
            steps.push(step);
        }

        let reconciled = reconcile(&steps, &self.config.extraction);
        let total_duration_ms = steps.iter().map(|s| s.duration_ms).sum();

        Ok(ProcessedDocument {
            record: DocumentRecord {
                document: DocumentMeta {
                    id: doc_id,
                    source_file: path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default(),
                    file_hash,
                    processed_at: Utc::now(),
                    total_duration_ms,
                },
                steps,
                reconciled,
            },
            raw_text,
        })
    }

    /// The fallback runs when forced by mode, or in full mode when pattern
    /// extraction left required fields missing.
    fn should_run_fallback(&self, mode: Mode, steps: &[ExtractionStep]) -> bool {
        match mode {
            Mode::FallbackOnly => true,
            Mode::Full => {
                let required: BTreeSet<Field> = self
                    .config
                    .validation
                    .rules
                    .required
                    .iter()
                    .copied()
                    .collect();
                !self.wanted_fields(steps).is_disjoint(&required)
            }
            Mode::RecognitionOnly | Mode::PatternOnly => false,
        }
    }

    /// Schema fields no step has populated yet.
    fn wanted_fields(&self, steps: &[ExtractionStep]) -> BTreeSet<Field> {
        Field::ALL
            .into_iter()
            .filter(|f| !steps.iter().any(|s| s.fields.is_present(*f)))
            .collect()
    }
}

/// Document identifier: the source file name.
pub fn document_id(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn hash_file(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("sha256:{:x}", hasher.finalize()))
}
