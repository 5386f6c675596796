//! Verification/override layer: ground truth, manual overrides, and the
//! precedence resolution that produces the final record.
//!
//! Records here are produced by an external verification workflow; this
//! module only reads them and never writes to the store.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::StoreError;
use crate::models::record::{Field, ReceiptFields, ReconciledRecord};
use crate::validate::ExpectationRules;

/// Human- or assisted-verified trusted field values for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroundTruthRecord {
    /// Trusted field values.
    pub ground_truth: ReceiptFields,

    /// Expectation rules for this document, when the verifier pinned them.
    #[serde(default, rename = "expected_extraction")]
    pub expected: Option<ExpectationRules>,

    /// Who or what verified the record.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<String>,
}

/// A targeted correction applied on top of ground truth. Strictly a delta:
/// only the fields it names are touched, and for those it always wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideRecord {
    /// Corrected field values.
    #[serde(rename = "ground_truth")]
    pub fields: ReceiptFields,

    /// Free-text justification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Where the final record's field values came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinalOrigin {
    /// No ground truth exists yet; the reconciled record stands in.
    Reconciled,
    /// Ground truth (possibly with overrides) is authoritative.
    Verified,
}

/// The record the rest of the system consumes: ground truth with overrides
/// merged on top, or the reconciled record when no ground truth exists.
#[derive(Debug, Clone, Serialize)]
pub struct FinalRecord {
    pub fields: ReceiptFields,
    pub origin: FinalOrigin,

    /// Fields whose value comes from an override.
    pub overridden: BTreeSet<Field>,

    /// The override's justification, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub override_reason: Option<String>,
}

/// Resolve the final record. Pure precedence, no extraction logic:
/// ground truth replaces the reconciled fields wholesale, then the override
/// wins field-by-field for every field it names.
pub fn resolve_final(
    reconciled: &ReconciledRecord,
    ground_truth: Option<&GroundTruthRecord>,
    override_record: Option<&OverrideRecord>,
) -> FinalRecord {
    let (mut fields, origin) = match ground_truth {
        Some(truth) => (truth.ground_truth.clone(), FinalOrigin::Verified),
        None => (reconciled.fields.clone(), FinalOrigin::Reconciled),
    };

    let mut overridden = BTreeSet::new();
    let mut override_reason = None;
    if let Some(record) = override_record {
        overridden = record.fields.present();
        override_reason = record.reason.clone();
        fields.apply(&record.fields);
    }

    FinalRecord {
        fields,
        origin,
        overridden,
        override_reason,
    }
}

/// Read-only store of verified ground truth and overrides, laid out as
/// `<root>/<doc-id>/verified.json` plus optional `override.json`.
#[derive(Debug, Clone)]
pub struct VerifiedStore {
    root: PathBuf,
}

impl VerifiedStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn ground_truth(&self, doc_id: &str) -> Result<Option<GroundTruthRecord>, StoreError> {
        self.read_json(&self.root.join(doc_id).join("verified.json"))
    }

    pub fn override_record(&self, doc_id: &str) -> Result<Option<OverrideRecord>, StoreError> {
        self.read_json(&self.root.join(doc_id).join("override.json"))
    }

    /// Resolve the final record for a document.
    pub fn final_record(
        &self,
        doc_id: &str,
        reconciled: &ReconciledRecord,
    ) -> Result<FinalRecord, StoreError> {
        let ground_truth = self.ground_truth(doc_id)?;
        let override_record = match ground_truth {
            // overrides only exist on top of ground truth
            Some(_) => self.override_record(doc_id)?,
            None => None,
        };
        if let Some(ref record) = override_record {
            debug!(
                doc_id,
                fields = record.fields.present().len(),
                "applying override"
            );
        }
        Ok(resolve_final(
            reconciled,
            ground_truth.as_ref(),
            override_record.as_ref(),
        ))
    }

    /// Expectation rules for a document: its own when pinned, else `None`
    /// (callers fall back to the configured default).
    pub fn expectation_rules(&self, doc_id: &str) -> Result<Option<ExpectationRules>, StoreError> {
        Ok(self.ground_truth(doc_id)?.and_then(|t| t.expected))
    }

    /// Document ids present in the store.
    pub fn document_ids(&self) -> Result<Vec<String>, StoreError> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| StoreError::Read {
            path: self.root.display().to_string(),
            source: e,
        })?;

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().join("verified.json").is_file())
            .filter_map(|entry| entry.file_name().into_string().ok())
            .collect();
        ids.sort();
        Ok(ids)
    }

    fn read_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &Path,
    ) -> Result<Option<T>, StoreError> {
        if !path.is_file() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::Read {
            path: path.display().to_string(),
            source: e,
        })?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StoreError::Malformed {
                path: path.display().to_string(),
                source: e,
            })
    }
}
