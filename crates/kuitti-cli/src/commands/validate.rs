//! Validate command - check persisted records against the verified store.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use kuitti_core::{ExtractionStore, FinalOrigin, Validator, VerifiedStore};

use super::load_config;

/// Arguments for the validate command.
#[derive(Args)]
pub struct ValidateArgs {
    /// Validate a single document id; all persisted documents by default
    doc_id: Option<String>,

    /// Directory of persisted extraction records
    #[arg(short, long, default_value = "extracted")]
    extracted_dir: PathBuf,

    /// Directory of verified ground truth and overrides
    #[arg(long, default_value = "verified")]
    verified_dir: PathBuf,
}

pub async fn run(args: ValidateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let store = ExtractionStore::new(&args.extracted_dir);
    let verified = VerifiedStore::new(&args.verified_dir);

    let doc_ids = match args.doc_id {
        Some(id) => vec![id],
        None => store.document_ids()?,
    };
    if doc_ids.is_empty() {
        anyhow::bail!(
            "no persisted records under {}",
            args.extracted_dir.display()
        );
    }

    let mut errors = 0usize;
    let mut warnings = 0usize;

    for doc_id in &doc_ids {
        let Some(record) = store.load(doc_id)? else {
            println!("{} {} has no persisted record", style("✗").red(), doc_id);
            errors += 1;
            continue;
        };

        let final_record = verified.final_record(doc_id, &record.reconciled)?;
        let validator = match verified.expectation_rules(doc_id)? {
            Some(rules) => Validator::new(rules, config.validation.amount_tolerance),
            None => Validator::from_config(&config.validation),
        };

        // Presence check of the final record; when ground truth exists, also
        // measure extraction accuracy against it (overrides applied).
        let outcome = match final_record.origin {
            FinalOrigin::Verified => {
                validator.check_against(&record.reconciled.fields, &final_record.fields)
            }
            FinalOrigin::Reconciled => validator.check(&final_record.fields),
        };

        info!(doc_id = %doc_id, passed = outcome.passed, "validated");

        let marker = if !outcome.passed {
            style("✗").red()
        } else if outcome.has_warnings() {
            style("!").yellow()
        } else {
            style("✓").green()
        };
        println!("{} {}", marker, doc_id);
        super::print_outcome(&outcome);

        if !outcome.passed {
            errors += 1;
        } else if outcome.has_warnings() {
            warnings += 1;
        }
    }

    println!();
    println!(
        "{} {} document(s): {} error(s), {} warning(s)",
        style("Σ").bold(),
        doc_ids.len(),
        errors,
        warnings
    );

    if errors > 0 {
        anyhow::bail!("{errors} document(s) failed validation");
    }
    Ok(())
}
