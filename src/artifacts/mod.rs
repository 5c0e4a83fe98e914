//! Persisted artifacts shared between the offline steps and the scoring service
//!
//! Both the Bin Definition Set and the Scorecard Model are written as pretty
//! JSON with a metadata header describing when and how they were produced.

pub mod bins;
pub mod model;

pub use bins::*;
pub use model::*;

use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while reading or writing an artifact file.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// The file could not be read (missing, permissions, ...).
    #[error("failed to read artifact {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file or its parent directory could not be written.
    #[error("failed to write artifact {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file exists but does not decode into the expected structure.
    #[error("artifact {path} is corrupt: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode artifact: {0}")]
    Encode(#[from] serde_json::Error),

    /// The file decodes but its contents are unusable.
    #[error("artifact {path} is invalid: {reason}")]
    Invalid { path: PathBuf, reason: String },
}

/// Provenance header carried by every artifact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    /// Creation time (RFC 3339)
    pub created_at: String,
    /// Version of this crate that produced the artifact
    pub crate_version: String,
    /// Dataset the artifact was computed from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    pub label_column: String,
}

impl ArtifactMetadata {
    pub fn new(source_file: Option<&Path>, label_column: &str) -> Self {
        Self {
            created_at: Utc::now().to_rfc3339(),
            crate_version: env!("CARGO_PKG_VERSION").to_string(),
            source_file: source_file.map(|p| p.display().to_string()),
            label_column: label_column.to_string(),
        }
    }
}

pub(crate) fn write_json<T: Serialize>(value: &T, path: &Path) -> Result<(), ArtifactError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ArtifactError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "artifact written");
    Ok(())
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    serde_json::from_str(&contents).map_err(|source| ArtifactError::Decode {
        path: path.to_path_buf(),
        source,
    })
}
