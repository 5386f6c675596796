//! Tesseract-based recognition adapter.
//!
//! PDFs are rendered to page images with pdftoppm, then each page goes
//! through tesseract; plain images go straight to tesseract. Both engines
//! run as external commands, matching how the rest of the pipeline treats
//! recognition as a collaborator.

use std::path::Path;
use std::process::Command;
use std::time::Instant;

use tracing::{debug, info};

use crate::error::RecognitionError;
use crate::models::config::RecognitionConfig;

use super::{RecognitionOutput, Recognizer};

const PAGE_BREAK: &str = "\n\n--- Page Break ---\n\n";

/// Recognizer shelling out to pdftoppm + tesseract.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    config: RecognitionConfig,
}

impl TesseractRecognizer {
    pub fn new(config: RecognitionConfig) -> Self {
        Self { config }
    }

    fn recognize_image(&self, path: &Path) -> Result<String, RecognitionError> {
        let output = Command::new(&self.config.tesseract_cmd)
            .arg(path)
            .arg("stdout")
            .args(["-l", &self.config.languages])
            .output()
            .map_err(|e| RecognitionError::Engine(format!("{}: {e}", self.config.tesseract_cmd)))?;

        if !output.status.success() {
            return Err(RecognitionError::Engine(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn render_pdf_pages(
        &self,
        path: &Path,
    ) -> Result<(tempfile::TempDir, Vec<std::path::PathBuf>), RecognitionError> {
        let dir = tempfile::tempdir()?;
        let prefix = dir.path().join("page");

        let output = Command::new(&self.config.pdftoppm_cmd)
            .args(["-r", &self.config.render_dpi.to_string(), "-png"])
            .arg(path)
            .arg(&prefix)
            .output()
            .map_err(|e| RecognitionError::Render(format!("{}: {e}", self.config.pdftoppm_cmd)))?;

        if !output.status.success() {
            return Err(RecognitionError::Render(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            ));
        }

        let mut pages: Vec<_> = std::fs::read_dir(dir.path())?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|p| p.extension().is_some_and(|ext| ext == "png"))
            .collect();
        pages.sort();

        if pages.is_empty() {
            return Err(RecognitionError::Render("no pages rendered".to_string()));
        }

        Ok((dir, pages))
    }
}

impl Recognizer for TesseractRecognizer {
    fn recognize(&self, path: &Path) -> Result<RecognitionOutput, RecognitionError> {
        let start = Instant::now();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        let (text, pages) = match extension.as_str() {
            "pdf" => {
                // _dir keeps the rendered pages on disk until OCR is done
                let (_dir, pages) = self.render_pdf_pages(path)?;
                debug!(pages = pages.len(), "rendered PDF pages");
                let mut texts = Vec::with_capacity(pages.len());
                for page in &pages {
                    texts.push(self.recognize_image(page)?);
                }
                let count = texts.len();
                (texts.join(PAGE_BREAK), count)
            }
            "png" | "jpg" | "jpeg" | "tiff" | "bmp" => (self.recognize_image(path)?, 1),
            other => {
                return Err(RecognitionError::UnsupportedFormat(other.to_string()));
            }
        };

        if text.trim().is_empty() {
            return Err(RecognitionError::EmptyText);
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            pages,
            chars = text.len(),
            duration_ms,
            "recognition finished"
        );

        Ok(RecognitionOutput {
            text,
            pages,
            duration_ms,
        })
    }
}
