//! Append-only memory log with wholesale load/save
//!
//! The log is a one-column CSV (`memory_log` header) holding one stored
//! chunk per row. It is read once at startup and rewritten in full after
//! each update; saves write a temp file and rename it into place.

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Column name of the persisted log
const LOG_HEADER: &str = "memory_log";

/// One stored chunk of prior Q&A history
///
/// Identity is positional: append order is insertion order and the
/// tie-break order during ranking. `text` is authoritative and persisted;
/// the embedding and token count are a derived in-memory cache filled in
/// one batch pass and never written to disk.
#[derive(Debug, Clone)]
pub struct MemoryRecord {
    /// Chunk text
    pub text: String,

    /// Cached embedding vector, if annotated
    pub embedding: Option<Vec<f32>>,

    /// Cached token count, if annotated
    pub token_count: Option<usize>,
}

impl MemoryRecord {
    fn new(text: String) -> Self {
        Self {
            text,
            embedding: None,
            token_count: None,
        }
    }
}

/// Ordered, append-only collection of memory records
///
/// Exclusively owned by the session for the lifetime of one process run;
/// there are no concurrent writers.
pub struct MemoryStore {
    path: PathBuf,
    records: Vec<MemoryRecord>,
}

impl MemoryStore {
    /// Load the memory log, creating an empty (header-only) file if absent
    ///
    /// # Errors
    ///
    /// Returns error if the log exists but cannot be read or parsed, or if
    /// an absent log cannot be created.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if !path.exists() {
            let store = Self {
                path,
                records: Vec::new(),
            };
            store.save()?;
            tracing::info!(path = %store.path.display(), "created empty memory log");
            return Ok(store);
        }

        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(&path)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            if let Some(text) = row.get(0) {
                records.push(MemoryRecord::new(text.to_string()));
            }
        }

        tracing::info!(
            path = %path.display(),
            records = records.len(),
            "memory log loaded"
        );

        Ok(Self { path, records })
    }

    /// Append chunk texts as new records (annotations start empty)
    pub fn append_chunks(&mut self, chunks: impl IntoIterator<Item = String>) {
        for chunk in chunks {
            self.records.push(MemoryRecord::new(chunk));
        }
    }

    /// Rewrite the whole log to disk atomically
    ///
    /// # Errors
    ///
    /// Returns error if the log cannot be written or renamed into place.
    pub fn save(&self) -> Result<()> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let tmp = tempfile::NamedTempFile::new_in(dir)?;
        {
            let mut writer = csv::Writer::from_writer(tmp.as_file());
            writer.write_record([LOG_HEADER])?;
            for record in &self.records {
                writer.write_record([record.text.as_str()])?;
            }
            writer.flush()?;
        }

        tmp.persist(&self.path)
            .map_err(|e| Error::Persistence(e.to_string()))?;

        tracing::debug!(
            path = %self.path.display(),
            records = self.records.len(),
            "memory log saved"
        );
        Ok(())
    }

    /// All records in insertion order
    #[must_use]
    pub fn records(&self) -> &[MemoryRecord] {
        &self.records
    }

    /// Number of stored records
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// True if any record lacks a cached embedding
    #[must_use]
    pub fn needs_annotations(&self) -> bool {
        self.records.iter().any(|r| r.embedding.is_none())
    }

    /// Replace the annotation cache for every record in one pass
    pub(crate) fn set_annotations(
        &mut self,
        embeddings: Vec<Vec<f32>>,
        token_counts: Vec<usize>,
    ) {
        for ((record, embedding), count) in
            self.records.iter_mut().zip(embeddings).zip(token_counts)
        {
            record.embedding = Some(embedding);
            record.token_count = Some(count);
        }
    }

    /// Path of the persisted log
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
