//! Core library for Finnish car-service receipt extraction.
//!
//! This crate provides:
//! - Text recognition adapters over external OCR engines
//! - Pattern-based field extraction for known provider layouts
//! - Model-fallback extraction via an OpenAI-compatible endpoint
//! - Reconciliation of extractor outputs with per-field provenance
//! - Verified ground truth and manual override resolution
//! - Expectation-rule validation with required/warn/optional severities

pub mod error;
pub mod models;
pub mod pipeline;
pub mod receipt;
pub mod recognize;
pub mod store;
pub mod validate;
pub mod verify;

pub use error::{KuittiError, LlmError, RecognitionError, Result, StoreError};
pub use models::config::KuittiConfig;
pub use models::record::{
    DocumentMeta, DocumentRecord, ExtractionStep, Field, FieldValue, ReceiptFields,
    ReconciledRecord, StepFailure, StepName,
};
pub use pipeline::{Mode, Pipeline, ProcessedDocument, document_id};
pub use receipt::{FallbackExtractor, HttpLlmClient, LlmClient, PatternExtractor, reconcile};
pub use recognize::{RecognitionOutput, Recognizer, TesseractRecognizer};
pub use store::ExtractionStore;
pub use validate::{ExpectationRules, ValidationOutcome, Validator, ValueMismatch};
pub use verify::{FinalOrigin, FinalRecord, GroundTruthRecord, OverrideRecord, VerifiedStore};
