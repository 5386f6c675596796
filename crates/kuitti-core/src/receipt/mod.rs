//! Receipt field extraction: rule stage, model-fallback stage, and the
//! reconciliation that merges their outputs.

pub mod fallback;
pub mod pattern;
pub mod reconcile;
pub mod rules;

pub use fallback::{FallbackExtractor, HttpLlmClient, LlmClient, parse_reply};
pub use pattern::PatternExtractor;
pub use reconcile::{provenance_of, reconcile};
