//! Per-record artifacts.
//!
//! Every stored record is mirrored by two files named after its id: a
//! JSON snapshot of the single record and a PDF receipt.

pub mod receipt;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::Local;
use tracing::debug;

use crate::config::{Config, ReceiptConfig};
use crate::error::{Error, Result};
use crate::record::Record;

pub use receipt::{Receipt, ReceiptField};

/// The two artifact formats kept for each record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Single-record JSON snapshot.
    Json,
    /// Rendered PDF receipt.
    Pdf,
}

impl ArtifactKind {
    /// All kinds, in the order they are written.
    pub const ALL: [Self; 2] = [Self::Json, Self::Pdf];

    /// File extension, without the dot.
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Pdf => "pdf",
        }
    }

    /// MIME type served for this kind.
    #[must_use]
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pdf" => Ok(Self::Pdf),
            other => Err(format!("unknown artifact kind '{other}' (expected json or pdf)")),
        }
    }
}

/// The bytes of one artifact, ready to hand to a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Which format this is.
    pub kind: ArtifactKind,
    /// Suggested download name.
    pub file_name: String,
    /// Raw file content.
    pub bytes: Vec<u8>,
}

impl Artifact {
    /// MIME type of the content.
    #[must_use]
    pub fn mime_type(&self) -> &'static str {
        self.kind.mime_type()
    }
}

/// Renders records into their JSON and PDF artifacts.
#[derive(Debug, Clone)]
pub struct ArtifactGenerator {
    prefix: String,
    receipt: ReceiptConfig,
}

impl Default for ArtifactGenerator {
    fn default() -> Self {
        let config = Config::default();
        Self::new(config.storage.artifact_prefix, config.receipt)
    }
}

impl ArtifactGenerator {
    /// Create a generator that names files `<prefix>_<id>.<ext>`.
    #[must_use]
    pub fn new(prefix: impl Into<String>, receipt: ReceiptConfig) -> Self {
        Self {
            prefix: prefix.into(),
            receipt,
        }
    }

    /// Create a generator from application configuration.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.storage.artifact_prefix.clone(), config.receipt.clone())
    }

    /// File name of an artifact.
    #[must_use]
    pub fn file_name(&self, id: u64, kind: ArtifactKind) -> String {
        format!("{}_{}.{}", self.prefix, id, kind.extension())
    }

    /// Full path of an artifact inside `dir`.
    #[must_use]
    pub fn path_in(&self, dir: &Path, id: u64, kind: ArtifactKind) -> PathBuf {
        dir.join(self.file_name(id, kind))
    }

    /// Write the single-record JSON snapshot, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub async fn write_json(&self, record: &Record, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(record)?;
        write_file(path, json.into_bytes()).await
    }

    /// Render and write the PDF receipt, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering or the write fails.
    pub async fn write_pdf(&self, record: &Record, path: &Path) -> Result<()> {
        let generated_at = Local::now().naive_local();
        let pdf = Receipt::for_record(record, &self.receipt, generated_at).to_pdf()?;
        write_file(path, pdf).await
    }

    /// Write both artifacts for a record into `dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or either
    /// artifact cannot be written.
    pub async fn write_all(&self, record: &Record, dir: &Path) -> Result<()> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| Error::DirectoryCreate {
                path: dir.to_path_buf(),
                source,
            })?;

        self.write_json(record, &self.path_in(dir, record.id, ArtifactKind::Json))
            .await?;
        self.write_pdf(record, &self.path_in(dir, record.id, ArtifactKind::Pdf))
            .await?;
        debug!("Wrote artifacts for record {} in {}", record.id, dir.display());
        Ok(())
    }

    /// Delete both artifacts for an id. Missing files are not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be removed.
    pub async fn remove_all(&self, id: u64, dir: &Path) -> Result<()> {
        for kind in ArtifactKind::ALL {
            let path = self.path_in(dir, id, kind);
            match tokio::fs::remove_file(&path).await {
                Ok(()) => debug!("Removed {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(source) => return Err(Error::FileRemove { path, source }),
            }
        }
        Ok(())
    }
}

async fn write_file(path: &Path, bytes: Vec<u8>) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| Error::FileWrite {
            path: path.to_path_buf(),
            source,
        })
}
