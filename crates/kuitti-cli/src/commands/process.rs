//! Process command - run the extraction pipeline on a single receipt.

use std::path::PathBuf;

use clap::Args;
use console::style;
use tracing::info;

use kuitti_core::{
    ExtractionStore, Field, ProcessedDocument, Validator, VerifiedStore, document_id,
};

use super::{ModeArg, build_pipeline, load_config, print_outcome};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Which pipeline stages to run
    #[arg(short, long, value_enum, default_value = "full")]
    mode: ModeArg,

    /// Directory for persisted extraction records
    #[arg(short, long, default_value = "extracted")]
    output_dir: PathBuf,

    /// Directory of verified ground truth and overrides
    #[arg(long, default_value = "verified")]
    verified_dir: PathBuf,

    /// Reprocess even if a persisted record exists
    #[arg(long)]
    force: bool,

    /// Print the full record as JSON instead of a summary
    #[arg(long)]
    json: bool,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("input file not found: {}", args.input.display());
    }

    let store = ExtractionStore::new(&args.output_dir);
    let doc_id = document_id(&args.input);
    if store.is_processed(&doc_id) && !args.force {
        println!(
            "{} {} already processed, use --force to reprocess",
            style("ℹ").blue(),
            doc_id
        );
        return Ok(());
    }

    info!(input = %args.input.display(), "processing receipt");
    let pipeline = build_pipeline(&config)?;
    let processed = pipeline.process(&args.input, args.mode.into()).await?;
    store.save(&processed.record, &processed.raw_text)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&processed.record)?);
        return Ok(());
    }

    print_summary(&processed);

    // Resolve the final record and validate it
    let verified = VerifiedStore::new(&args.verified_dir);
    let final_record = verified.final_record(&doc_id, &processed.record.reconciled)?;
    let validator = match verified.expectation_rules(&doc_id)? {
        Some(rules) => Validator::new(rules, config.validation.amount_tolerance),
        None => Validator::from_config(&config.validation),
    };
    let outcome = validator.check(&final_record.fields);

    println!();
    if !final_record.overridden.is_empty() {
        println!(
            "{} {} field(s) manually corrected{}",
            style("🔧").cyan(),
            final_record.overridden.len(),
            final_record
                .override_reason
                .as_deref()
                .map(|r| format!(" ({r})"))
                .unwrap_or_default()
        );
    }
    if outcome.passed && !outcome.has_warnings() {
        println!("{} validation passed", style("✓").green());
    } else if outcome.passed {
        println!("{} validation passed with warnings", style("!").yellow());
    } else {
        println!("{} validation failed", style("✗").red());
    }
    print_outcome(&outcome);

    Ok(())
}

fn print_summary(processed: &ProcessedDocument) {
    let record = &processed.record;
    println!(
        "{} {} ({} step(s), {} ms)",
        style("✓").green(),
        record.document.id,
        record.steps.len(),
        record.document.total_duration_ms
    );

    for field in Field::ALL {
        match record.reconciled.fields.get(field) {
            Some(value) => {
                let source = record
                    .reconciled
                    .provenance
                    .get(&field)
                    .map(|s| s.to_string())
                    .unwrap_or_default();
                println!("  {:<18} {}  {}", field.to_string(), value, style(source).dim());
            }
            None => println!("  {:<18} {}", field.to_string(), style("absent").dim()),
        }
    }
}
