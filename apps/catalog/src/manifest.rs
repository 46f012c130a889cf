//! Manifest maintenance: rebuild `manifest.json` from the exercises directory,
//! newest record first.

use crate::source::{EXERCISES_DIR, MANIFEST_FILE};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("File system error: {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("No exercise files found in {0}")]
    NoExercises(String),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ManifestError + '_ {
    move |source| ManifestError::Io {
        path: path.display().to_string(),
        source,
    }
}

/// One record file and when it was last modified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub file_name: String,
    pub modified: DateTime<Utc>,
}

/// Outcome of a rebuild.
#[derive(Debug, Clone)]
pub struct ManifestReport {
    pub manifest_path: PathBuf,
    /// Entries in manifest order.
    pub entries: Vec<ManifestEntry>,
}

impl ManifestReport {
    /// File names grouped by modification date, newest date first.
    pub fn by_date(&self) -> Vec<(NaiveDate, Vec<&str>)> {
        let mut groups: BTreeMap<NaiveDate, Vec<&str>> = BTreeMap::new();
        for entry in &self.entries {
            groups
                .entry(entry.modified.date_naive())
                .or_default()
                .push(&entry.file_name);
        }
        groups.into_iter().rev().collect()
    }
}

/// List the `*.json` files of a directory, newest first. Equal times sort by name.
pub fn scan(exercises_dir: &Path) -> Result<Vec<ManifestEntry>, ManifestError> {
    let mut entries = Vec::new();
    for dir_entry in fs::read_dir(exercises_dir).map_err(io_error(exercises_dir))? {
        let dir_entry = dir_entry.map_err(io_error(exercises_dir))?;
        let path = dir_entry.path();
        if !path.is_file() || path.extension().map_or(true, |ext| ext != "json") {
            continue;
        }
        let modified = dir_entry
            .metadata()
            .and_then(|m| m.modified())
            .map_err(io_error(&path))?;
        entries.push(ManifestEntry {
            file_name: dir_entry.file_name().to_string_lossy().into_owned(),
            modified: DateTime::<Utc>::from(modified),
        });
    }

    entries.sort_by(|a, b| {
        b.modified
            .cmp(&a.modified)
            .then_with(|| a.file_name.cmp(&b.file_name))
    });
    Ok(entries)
}

/// Manifest text: a JSON array indented by four spaces, with a trailing newline.
pub fn render(entries: &[ManifestEntry]) -> Result<String, ManifestError> {
    let names: Vec<&str> = entries.iter().map(|e| e.file_name.as_str()).collect();
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    names.serialize(&mut ser)?;
    let mut text = String::from_utf8_lossy(&buf).into_owned();
    text.push('\n');
    Ok(text)
}

/// Rewrite `<data_dir>/manifest.json` from `<data_dir>/exercises/`.
pub fn rebuild(data_dir: &Path) -> Result<ManifestReport, ManifestError> {
    let exercises_dir = data_dir.join(EXERCISES_DIR);
    let entries = scan(&exercises_dir)?;
    if entries.is_empty() {
        return Err(ManifestError::NoExercises(
            exercises_dir.display().to_string(),
        ));
    }

    let manifest_path = data_dir.join(MANIFEST_FILE);
    fs::write(&manifest_path, render(&entries)?).map_err(io_error(&manifest_path))?;
    info!(
        "Updated {} with {} exercises",
        manifest_path.display(),
        entries.len()
    );

    Ok(ManifestReport {
        manifest_path,
        entries,
    })
}
