//! CLI subcommands.

pub mod batch;
pub mod process;
pub mod validate;

use std::path::Path;

use console::style;

use kuitti_core::{
    HttpLlmClient, KuittiConfig, Mode, Pipeline, TesseractRecognizer, ValidationOutcome,
};

/// Operating mode on the command line.
#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum ModeArg {
    /// Recognition, pattern extraction, model fallback when needed
    Full,
    /// Recognition only
    Recognition,
    /// Recognition and pattern extraction, no model fallback
    Pattern,
    /// Recognition and forced model fallback, no pattern stage
    Fallback,
}

impl From<ModeArg> for Mode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Full => Mode::Full,
            ModeArg::Recognition => Mode::RecognitionOnly,
            ModeArg::Pattern => Mode::PatternOnly,
            ModeArg::Fallback => Mode::FallbackOnly,
        }
    }
}

/// Load configuration, falling back to defaults when no file is given.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<KuittiConfig> {
    match config_path {
        Some(path) => Ok(KuittiConfig::from_file(Path::new(path))?),
        None => Ok(KuittiConfig::default()),
    }
}

/// Build the production pipeline: tesseract recognition plus the configured
/// model service endpoint.
pub fn build_pipeline(
    config: &KuittiConfig,
) -> anyhow::Result<Pipeline<TesseractRecognizer, HttpLlmClient>> {
    let recognizer = TesseractRecognizer::new(config.recognition.clone());
    let client = HttpLlmClient::new(config.llm.clone())?;
    Ok(Pipeline::new(config.clone(), recognizer, client))
}

/// Print a validation outcome, one line per finding.
pub fn print_outcome(outcome: &ValidationOutcome) {
    for field in &outcome.missing_required {
        println!(
            "  {} required field '{}' missing",
            style("✗").red(),
            field
        );
    }
    for mismatch in &outcome.mismatches {
        println!(
            "  {} {} mismatch: got {}, expected {}",
            style("✗").red(),
            mismatch.field,
            mismatch.got,
            mismatch.expected
        );
    }
    for field in &outcome.missing_warning {
        println!(
            "  {} field '{}' missing",
            style("!").yellow(),
            field
        );
    }
    for field in &outcome.missing_optional {
        println!(
            "  {} optional field '{}' missing",
            style("·").dim(),
            field
        );
    }
}
