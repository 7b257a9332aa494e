//! Storage layer for matricula.
//!
//! [`RecordStore`] is the service contract callers use; [`JsonFileStore`]
//! implements it on top of a single JSON backing file plus the per-record
//! artifacts produced by [`ArtifactGenerator`].
//!
//! Every mutation is a full read-modify-write of the backing file. Callers
//! must not issue operations concurrently against the same files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Local;
use tracing::{debug, info, warn};

use crate::artifact::{Artifact, ArtifactGenerator, ArtifactKind};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::{records_from_str, Record};

/// The record service contract.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// All records, in stored order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Format`] if the backing data is malformed, or an
    /// I/O error if it cannot be read.
    async fn list(&self) -> Result<Vec<Record>>;

    /// The first record with the given id.
    ///
    /// # Errors
    ///
    /// Same as [`RecordStore::list`].
    async fn get_by_id(&self, id: u64) -> Result<Option<Record>> {
        Ok(self.list().await?.into_iter().find(|r| r.id == id))
    }

    /// Create (`id == 0`) or replace a record and refresh its artifacts.
    ///
    /// Returns the record as stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] when updating an unknown id; in
    /// that case nothing is written.
    async fn save(&self, record: Record) -> Result<Record>;

    /// Remove a record and its artifacts. Returns the removed record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] when the id is unknown.
    async fn delete(&self, id: u64) -> Result<Record>;

    /// Where the artifact of the given kind for `id` lives.
    fn artifact_path(&self, id: u64, kind: ArtifactKind) -> PathBuf;

    /// Read an artifact, regenerating it first if the file is missing.
    ///
    /// Regeneration is a full [`RecordStore::save`] of the stored record,
    /// so both artifacts are rewritten even though one was requested.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RecordNotFound`] when the id is unknown.
    async fn fetch_artifact(&self, id: u64, kind: ArtifactKind) -> Result<Artifact> {
        let record = self
            .get_by_id(id)
            .await?
            .ok_or(Error::RecordNotFound { id })?;

        let path = self.artifact_path(id, kind);
        let exists = tokio::fs::try_exists(&path)
            .await
            .map_err(|source| Error::FileRead {
                path: path.clone(),
                source,
            })?;
        if !exists {
            warn!("Artifact {} is missing, regenerating", path.display());
            self.save(record).await?;
        }

        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|source| Error::FileRead {
                path: path.clone(),
                source,
            })?;
        let file_name = path
            .file_name()
            .map_or_else(|| format!("{id}.{kind}"), |n| n.to_string_lossy().into_owned());

        Ok(Artifact {
            kind,
            file_name,
            bytes,
        })
    }
}

/// Record store backed by one JSON file.
#[derive(Debug)]
pub struct JsonFileStore {
    /// Path to the backing file.
    records_path: PathBuf,
    /// Directory holding per-record artifacts.
    artifacts_dir: PathBuf,
    generator: ArtifactGenerator,
    default_status: String,
    atomic_writes: bool,
}

impl JsonFileStore {
    /// Open a store at the given paths.
    ///
    /// Creates the parent directory of the backing file if it doesn't
    /// exist. The backing file itself is created on first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(
        records_path: impl AsRef<Path>,
        artifacts_dir: impl AsRef<Path>,
        generator: ArtifactGenerator,
    ) -> Result<Self> {
        let records_path = records_path.as_ref().to_path_buf();

        if let Some(parent) = records_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opened record store at {}", records_path.display());
        Ok(Self {
            records_path,
            artifacts_dir: artifacts_dir.as_ref().to_path_buf(),
            generator,
            default_status: Config::default().records.default_status,
            atomic_writes: true,
        })
    }

    /// Open the store described by the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the data directory cannot be created.
    pub fn from_config(config: &Config) -> Result<Self> {
        let store = Self::open(
            config.records_path(),
            config.artifacts_path(),
            ArtifactGenerator::from_config(config),
        )?
        .with_default_status(config.records.default_status.clone())
        .with_atomic_writes(config.storage.atomic_writes);
        Ok(store)
    }

    /// Status assigned to new records saved without one.
    #[must_use]
    pub fn with_default_status(mut self, status: impl Into<String>) -> Self {
        self.default_status = status.into();
        self
    }

    /// Whether to stage backing-file writes through a temporary file.
    #[must_use]
    pub fn with_atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }

    /// Get the path to the backing file.
    #[must_use]
    pub fn records_path(&self) -> &Path {
        &self.records_path
    }

    /// Get the artifact directory.
    #[must_use]
    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    /// Overwrite the backing file with the whole collection.
    async fn write_records(&self, records: &[Record]) -> Result<()> {
        let json = serde_json::to_string_pretty(records)?;

        if self.atomic_writes {
            let staging = self.staging_path();
            tokio::fs::write(&staging, json)
                .await
                .map_err(|source| Error::FileWrite {
                    path: staging.clone(),
                    source,
                })?;
            tokio::fs::rename(&staging, &self.records_path)
                .await
                .map_err(|source| Error::FileWrite {
                    path: self.records_path.clone(),
                    source,
                })?;
        } else {
            tokio::fs::write(&self.records_path, json)
                .await
                .map_err(|source| Error::FileWrite {
                    path: self.records_path.clone(),
                    source,
                })?;
        }

        debug!(
            "Wrote {} records to {}",
            records.len(),
            self.records_path.display()
        );
        Ok(())
    }

    /// Sibling file used to stage atomic writes.
    fn staging_path(&self) -> PathBuf {
        let name = self
            .records_path
            .file_name()
            .map_or_else(|| "records".into(), |n| n.to_string_lossy().into_owned());
        self.records_path.with_file_name(format!(".{name}.tmp"))
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    async fn list(&self) -> Result<Vec<Record>> {
        let text = match tokio::fs::read_to_string(&self.records_path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("{} does not exist yet", self.records_path.display());
                return Ok(Vec::new());
            }
            Err(source) => {
                return Err(Error::FileRead {
                    path: self.records_path.clone(),
                    source,
                })
            }
        };

        if text.trim().is_empty() {
            return Ok(Vec::new());
        }

        records_from_str(&text).map_err(|source| Error::Format {
            path: self.records_path.clone(),
            source,
        })
    }

    async fn save(&self, mut record: Record) -> Result<Record> {
        let mut records = self.list().await?;

        if record.is_new() {
            record.id = next_id(&records).ok_or_else(|| Error::IdExhausted {
                path: self.records_path.clone(),
                max: u64::MAX,
            })?;
            record.enrollment_date = Local::now().naive_local();
            if !record.has_status() {
                record.status = Some(self.default_status.clone());
            }
            records.push(record.clone());
            info!("Created record {}", record.id);
        } else {
            let Some(slot) = records.iter_mut().find(|r| r.id == record.id) else {
                return Err(Error::RecordNotFound { id: record.id });
            };
            slot.clone_from(&record);
            info!("Updated record {}", record.id);
        }

        self.write_records(&records).await?;
        self.generator
            .write_all(&record, &self.artifacts_dir)
            .await?;
        Ok(record)
    }

    async fn delete(&self, id: u64) -> Result<Record> {
        let mut records = self.list().await?;
        let index = records
            .iter()
            .position(|r| r.id == id)
            .ok_or(Error::RecordNotFound { id })?;
        let removed = records.remove(index);

        self.write_records(&records).await?;
        self.generator.remove_all(id, &self.artifacts_dir).await?;

        info!("Deleted record {}", id);
        Ok(removed)
    }

    fn artifact_path(&self, id: u64, kind: ArtifactKind) -> PathBuf {
        self.generator.path_in(&self.artifacts_dir, id, kind)
    }
}

/// One past the highest id in use, or 1 for an empty collection.
/// `None` once the highest id is `u64::MAX`.
fn next_id(records: &[Record]) -> Option<u64> {
    records
        .iter()
        .map(|r| r.id)
        .max()
        .map_or(Some(1), |max| max.checked_add(1))
}
