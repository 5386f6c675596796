//! Configuration structures for the extraction pipeline.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::validate::ExpectationRules;

/// Main configuration for the kuitti pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KuittiConfig {
    /// Text recognition adapter configuration.
    pub recognition: RecognitionConfig,

    /// Model service (fallback extraction) configuration.
    pub llm: LlmConfig,

    /// Field extraction and self-repair configuration.
    pub extraction: ExtractionConfig,

    /// Validation configuration.
    pub validation: ValidationConfig,
}

/// Configuration for the external text recognition engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecognitionConfig {
    /// Tesseract language packs, e.g. "fin+eng".
    pub languages: String,

    /// DPI for rendering PDF pages to images.
    pub render_dpi: u32,

    /// Tesseract executable name or path.
    pub tesseract_cmd: String,

    /// pdftoppm executable name or path (PDF page rendering).
    pub pdftoppm_cmd: String,
}

impl Default for RecognitionConfig {
    fn default() -> Self {
        Self {
            languages: "fin+eng".to_string(),
            render_dpi: 300,
            tesseract_cmd: "tesseract".to_string(),
            pdftoppm_cmd: "pdftoppm".to_string(),
        }
    }
}

/// Configuration for the model service collaborator.
///
/// Any OpenAI-compatible chat completions endpoint works; the default points
/// at a local Ollama instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of the endpoint, without the /chat/completions suffix.
    pub base_url: String,

    /// Model name to request.
    pub model: String,

    /// Bearer token. Local endpoints ignore the value but require one.
    pub api_key: String,

    /// Request timeout in seconds. The service may legitimately take
    /// several seconds per document.
    pub timeout_secs: u64,

    /// Sampling temperature.
    pub temperature: f64,

    /// Maximum characters of recognized text sent in one prompt.
    pub max_prompt_chars: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            model: "qwen2.5:7b".to_string(),
            api_key: "ollama".to_string(),
            timeout_secs: 120,
            temperature: 0.0,
            max_prompt_chars: 12_000,
        }
    }
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Lower bound of the plausible odometer range for this vehicle, km.
    pub odometer_min_km: i64,

    /// Upper bound of the plausible odometer range, km. Readings above it
    /// are candidates for leading-digit repair.
    pub odometer_max_km: i64,

    /// Maximum number of work description lines kept per receipt.
    pub max_work_items: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            odometer_min_km: 1_000,
            odometer_max_km: 1_000_000,
            max_work_items: 10,
        }
    }
}

/// Validation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Absolute tolerance for currency comparisons against ground truth.
    pub amount_tolerance: Decimal,

    /// Default expectation rules, used when a document's ground truth does
    /// not carry its own.
    pub rules: ExpectationRules,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            // Absolute, in EUR. Absorbs rounding differences between
            // extractors; see the validator tests.
            amount_tolerance: Decimal::new(1, 2),
            rules: ExpectationRules::default_schema(),
        }
    }
}

impl KuittiConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string()))?;
        std::fs::write(path, content)
    }
}
