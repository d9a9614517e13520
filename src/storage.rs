//! Filesystem storage for uploaded documents and produced artifacts.
//!
//! Everything is addressed by job id: `{data_dir}/uploads/{id}` holds the
//! source bytes until conversion consumes them, `{data_dir}/output/{id}.md`
//! holds the artifact until the job is deleted. The two trees are
//! independent so either side can be reclaimed on its own.

use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::convert::Markdown;
use crate::error::Result;

pub struct DocumentStorage {
    uploads_dir: PathBuf,
    output_dir: PathBuf,
}

impl DocumentStorage {
    /// Create the storage layout under `data_dir`.
    pub fn new(data_dir: &Path) -> Result<Self> {
        let uploads_dir = data_dir.join("uploads");
        let output_dir = data_dir.join("output");
        std::fs::create_dir_all(&uploads_dir)?;
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            uploads_dir,
            output_dir,
        })
    }

    pub fn source_path(&self, id: Uuid) -> PathBuf {
        self.uploads_dir.join(id.to_string())
    }

    pub fn artifact_path(&self, id: Uuid) -> PathBuf {
        self.output_dir.join(format!("{id}.md"))
    }

    /// Persist uploaded bytes for a job.
    pub fn write_source(&self, id: Uuid, content: &[u8]) -> Result<PathBuf> {
        let path = self.source_path(id);
        std::fs::write(&path, content)?;
        Ok(path)
    }

    pub fn read_source(&self, id: Uuid) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.source_path(id))?)
    }

    /// Remove the source bytes; idempotent.
    pub fn remove_source(&self, id: Uuid) -> Result<()> {
        remove_if_exists(&self.source_path(id))
    }

    /// Write the Markdown artifact for a completed job.
    pub fn write_artifact(&self, id: Uuid, markdown: &Markdown) -> Result<PathBuf> {
        let path = self.artifact_path(id);
        std::fs::write(&path, markdown.text.as_bytes())?;
        Ok(path)
    }

    pub fn read_artifact(&self, id: Uuid) -> Result<Vec<u8>> {
        Ok(std::fs::read(self.artifact_path(id))?)
    }

    /// Remove everything the job owns on disk; idempotent.
    pub fn remove(&self, id: Uuid) -> Result<()> {
        remove_if_exists(&self.source_path(id))?;
        remove_if_exists(&self.artifact_path(id))
    }
}

fn remove_if_exists(path: &Path) -> Result<()> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
