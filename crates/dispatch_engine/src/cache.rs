use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

const TRANSCRIPT_FILENAME: &str = "transcript.ron";
const DRAFT_FILENAME: &str = "draft.txt";

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache directory missing or not writable: {0}")]
    CacheDir(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

/// Ensure the cache directory exists; create it if missing.
pub fn ensure_cache_dir(dir: &Path) -> Result<(), CacheError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| CacheError::CacheDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(CacheError::CacheDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| CacheError::CacheDir(e.to_string()))?;
    }
    // Basic writability probe: try creating a temp file.
    NamedTempFile::new_in(dir).map_err(|e| CacheError::CacheDir(e.to_string()))?;
    Ok(())
}

/// On-disk snapshots for one session: the serialized confirmed transcript
/// and the unsent draft. Every write goes through a temp file and rename,
/// so a crash mid-write never corrupts a snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn transcript_path(&self) -> PathBuf {
        self.dir.join(TRANSCRIPT_FILENAME)
    }

    pub fn draft_path(&self) -> PathBuf {
        self.dir.join(DRAFT_FILENAME)
    }

    /// Replaces the transcript snapshot.
    pub fn save_transcript(&self, serialized: &str) -> Result<PathBuf, CacheError> {
        self.write_atomic(TRANSCRIPT_FILENAME, serialized)
    }

    /// Returns the serialized transcript snapshot, or `None` when nothing
    /// has been written yet.
    pub fn load_transcript(&self) -> Result<Option<String>, CacheError> {
        self.read(TRANSCRIPT_FILENAME)
    }

    /// Replaces the draft snapshot.
    pub fn save_draft(&self, draft: &str) -> Result<PathBuf, CacheError> {
        self.write_atomic(DRAFT_FILENAME, draft)
    }

    pub fn load_draft(&self) -> Result<Option<String>, CacheError> {
        self.read(DRAFT_FILENAME)
    }

    /// Removes the draft snapshot. Clearing twice is a no-op.
    pub fn clear_draft(&self) -> Result<(), CacheError> {
        match fs::remove_file(self.draft_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(CacheError::Io(err)),
        }
    }

    fn write_atomic(&self, filename: &str, content: &str) -> Result<PathBuf, CacheError> {
        ensure_cache_dir(&self.dir)?;

        let target = self.dir.join(filename);
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(content.as_bytes())?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;

        if target.exists() {
            fs::remove_file(&target)?;
        }
        tmp.persist(&target).map_err(|e| CacheError::Io(e.error))?;
        Ok(target)
    }

    fn read(&self, filename: &str) -> Result<Option<String>, CacheError> {
        match fs::read_to_string(self.dir.join(filename)) {
            Ok(text) => Ok(Some(text)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(CacheError::Io(err)),
        }
    }
}
