//! Batch command - process every receipt in a directory.

use std::path::PathBuf;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, warn};

use kuitti_core::{ExtractionStore, KuittiError, Validator, VerifiedStore, document_id};

use super::{ModeArg, build_pipeline, load_config};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input directory or glob pattern
    #[arg(default_value = "receipts")]
    input: String,

    /// Which pipeline stages to run
    #[arg(short, long, value_enum, default_value = "full")]
    mode: ModeArg,

    /// Directory for persisted extraction records
    #[arg(short, long, default_value = "extracted")]
    output_dir: PathBuf,

    /// Directory of verified ground truth and overrides
    #[arg(long, default_value = "verified")]
    verified_dir: PathBuf,

    /// Reprocess documents that already have a persisted record
    #[arg(long)]
    force: bool,
}

/// Per-document outcome tallied for the summary.
enum DocOutcome {
    Passed,
    PassedWithWarnings,
    Failed,
    Fatal(String),
    Skipped,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;

    // A directory argument means "every PDF in it"
    let pattern = if PathBuf::from(&args.input).is_dir() {
        format!("{}/*.pdf", args.input.trim_end_matches('/'))
    } else {
        args.input.clone()
    };

    let files: Vec<PathBuf> = glob(&pattern)?.filter_map(|r| r.ok()).collect();
    if files.is_empty() {
        anyhow::bail!("no matching files for: {}", pattern);
    }

    println!(
        "{} Found {} file(s) to process",
        style("ℹ").blue(),
        files.len()
    );

    let pipeline = build_pipeline(&config)?;
    let store = ExtractionStore::new(&args.output_dir);
    let verified = VerifiedStore::new(&args.verified_dir);

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("=>-"),
    );

    let mut outcomes = Vec::with_capacity(files.len());
    for path in &files {
        let doc_id = document_id(path);
        pb.set_message(doc_id.clone());

        if store.is_processed(&doc_id) && !args.force {
            outcomes.push((doc_id, DocOutcome::Skipped));
            pb.inc(1);
            continue;
        }

        let outcome = match pipeline.process(path, args.mode.into()).await {
            Ok(processed) => {
                store.save(&processed.record, &processed.raw_text)?;
                let final_record = verified.final_record(&doc_id, &processed.record.reconciled)?;
                let validator = match verified.expectation_rules(&doc_id)? {
                    Some(rules) => Validator::new(rules, config.validation.amount_tolerance),
                    None => Validator::from_config(&config.validation),
                };
                let result = validator.check(&final_record.fields);
                if !result.passed {
                    warn!(doc_id = %doc_id, missing = ?result.missing_required, "validation failed");
                    DocOutcome::Failed
                } else if result.has_warnings() {
                    DocOutcome::PassedWithWarnings
                } else {
                    DocOutcome::Passed
                }
            }
            // recognition failures are terminal per document, never for the batch
            Err(KuittiError::Recognition(e)) => {
                error!(doc_id = %doc_id, error = %e, "recognition failed");
                DocOutcome::Fatal(e.to_string())
            }
            Err(e) => return Err(e.into()),
        };

        outcomes.push((doc_id, outcome));
        pb.inc(1);
    }
    pb.finish_and_clear();

    print_batch_summary(&outcomes);
    Ok(())
}

fn print_batch_summary(outcomes: &[(String, DocOutcome)]) {
    let count = |f: fn(&DocOutcome) -> bool| outcomes.iter().filter(|(_, o)| f(o)).count();
    let passed = count(|o| matches!(o, DocOutcome::Passed));
    let warned = count(|o| matches!(o, DocOutcome::PassedWithWarnings));
    let failed = count(|o| matches!(o, DocOutcome::Failed));
    let fatal = count(|o| matches!(o, DocOutcome::Fatal(_)));
    let skipped = count(|o| matches!(o, DocOutcome::Skipped));

    println!();
    println!("{}", style("Batch summary").bold());
    println!(
        "  {} passed, {} with warnings, {} failed validation, {} fatal, {} skipped",
        style(passed).green(),
        style(warned).yellow(),
        style(failed).red(),
        style(fatal).red(),
        style(skipped).dim()
    );

    for (doc_id, outcome) in outcomes {
        match outcome {
            DocOutcome::Failed => {
                println!("  {} {} failed validation", style("✗").red(), doc_id)
            }
            DocOutcome::Fatal(reason) => {
                println!("  {} {}: {}", style("✗").red(), doc_id, reason)
            }
            _ => {}
        }
    }
}
