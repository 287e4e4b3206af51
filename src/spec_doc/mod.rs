//! Specification Document Segmentation
//!
//! Splits the free-text equipment specification into per-failure-mode
//! sections. Headings look like `FM-01: Progressive Turbine Imbalance` at
//! the start of a line; each section runs from its heading to the next
//! heading (exclusive), or to document end.
//!
//! `split_sections` is total over all string inputs: a document with no
//! recognizable heading becomes a single `FM-00` fallback section.

use crate::types::SpecSection;
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Sentinel id used when no heading matches.
pub const FALLBACK_SECTION_ID: &str = "FM-00";

/// Title used for the single fallback section.
pub const FALLBACK_SECTION_TITLE: &str = "engine_spec";

/// Errors loading the specification document.
#[derive(Debug, thiserror::Error)]
pub enum SpecDocError {
    #[error("spec file not found: {0}")]
    NotFound(std::path::PathBuf),

    #[error("failed to read spec file: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure-mode heading pattern: `FM-NN: Title` at line start.
fn heading_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        // Compile-time constant pattern; cannot fail.
        Regex::new(r"(?m)^[ \t]*(FM-\d{2}):[ \t]*([^\n]+)").expect("valid heading regex")
    })
}

/// Read the specification document from disk.
pub fn load_spec_text<P: AsRef<Path>>(path: P) -> Result<String, SpecDocError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(SpecDocError::NotFound(path.to_path_buf()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Split a document into labeled failure-mode sections.
///
/// Never fails: with no heading anywhere, the whole (trimmed) document
/// becomes one `FM-00` section. Section bodies are trimmed but internal
/// content is preserved verbatim, heading line included.
pub fn split_sections(text: &str) -> Vec<SpecSection> {
    let matches: Vec<_> = heading_pattern().captures_iter(text).collect();

    if matches.is_empty() {
        debug!("No failure-mode headings found; using single fallback section");
        return vec![SpecSection {
            id: FALLBACK_SECTION_ID.to_string(),
            title: FALLBACK_SECTION_TITLE.to_string(),
            text: text.trim().to_string(),
        }];
    }

    let mut sections = Vec::with_capacity(matches.len());
    for (i, caps) in matches.iter().enumerate() {
        let start = caps.get(0).map_or(0, |m| m.start());
        let end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());

        sections.push(SpecSection {
            id: caps[1].trim().to_string(),
            title: caps[2].trim().to_string(),
            text: text[start..end].trim().to_string(),
        });
    }

    debug!(sections = sections.len(), "Split specification document");
    sections
}
