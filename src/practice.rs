//! Practice-section marker list.
//!
//! Each non-comment line starts with a bracketed marker, optionally followed
//! by a display name:
//!
//! ```text
//! # comment
//! [prc_k9] "K section 9"
//! ```

use std::fs;
use std::path::Path;
use thiserror::Error;

/// The list shipped with the binary, used when no readable file is given.
pub const DEFAULT_PRACTICE_SECTIONS: &str = include_str!("../data/practice_sections.txt");

#[derive(Debug, Error)]
pub enum PracticeSectionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("line {line} is invalid: '{text}'")]
    InvalidLine { line: usize, text: String },
}

/// Loads practice sections from `path`, falling back to the built-in list
/// if no path is given or the file cannot be read.
///
/// # Errors
///
/// Returns error if the chosen source contains an invalid line
pub fn load(path: Option<&Path>) -> Result<Vec<String>, PracticeSectionError> {
    if let Some(path) = path {
        match load_file(path) {
            Err(PracticeSectionError::Io(e)) => {
                tracing::warn!("Cannot read practice sections from {}: {e}", path.display());
            }
            result => {
                tracing::info!("Using practice sections from {}", path.display());
                return result;
            }
        }
    }

    tracing::info!("Using built-in practice sections");
    parse(DEFAULT_PRACTICE_SECTIONS)
}

/// Reads and parses a practice-section file.
pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, PracticeSectionError> {
    let contents = fs::read_to_string(path)?;
    parse(&contents)
}

pub fn parse(contents: &str) -> Result<Vec<String>, PracticeSectionError> {
    let mut sections = Vec::new();

    for (index, line) in contents.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim().is_empty() || line.starts_with('#') {
            continue;
        }

        let marker = line.split(' ').next().unwrap_or_default();
        if !(marker.starts_with('[') && marker.ends_with(']')) {
            return Err(PracticeSectionError::InvalidLine {
                line: index + 1,
                text: line.to_owned(),
            });
        }
        sections.push(marker.to_owned());
    }

    Ok(sections)
}
