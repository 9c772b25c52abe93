//! Request-scoped scratch files for uploaded documents.
//!
//! A [`ScratchFile`] owns one uniquely named file on disk. The file is removed
//! by [`ScratchFile::release`] or, failing that, when the guard is dropped, so
//! early returns, inference errors and cancelled requests all clean up.

use std::io;
use std::path::{Path, PathBuf};

use tempfile::TempPath;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const SCRATCH_PREFIX: &str = "ocrflux-";

/// Directory in which scratch files are created.
#[derive(Debug, Clone)]
pub struct ScratchDir {
    root: PathBuf,
}

impl ScratchDir {
    /// Use `root` for scratch files. The directory must already exist.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Use the operating system's temporary directory.
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    /// The directory scratch files are created in.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create an empty, uniquely named scratch file ending in `suffix`.
    ///
    /// File creation runs on the blocking pool.
    pub async fn acquire(&self, suffix: &str) -> io::Result<ScratchFile> {
        let root = self.root.clone();
        let suffix = suffix.to_owned();
        let named = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new()
                .prefix(SCRATCH_PREFIX)
                .suffix(&suffix)
                .tempfile_in(&root)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;
        let (file, path) = named.into_parts();
        debug!(path = %path.display(), "Created scratch file");

        Ok(ScratchFile {
            file: Some(File::from_std(file)),
            path,
            bytes_written: 0,
        })
    }
}

impl Default for ScratchDir {
    fn default() -> Self {
        Self::system()
    }
}

/// One request's uploaded content on disk.
#[derive(Debug)]
pub struct ScratchFile {
    file: Option<File>,
    path: TempPath,
    bytes_written: u64,
}

impl ScratchFile {
    /// Path of the scratch file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Append a chunk of the upload.
    pub async fn write_chunk(&mut self, chunk: &[u8]) -> io::Result<()> {
        let file = self.file.as_mut().ok_or_else(|| {
            io::Error::new(io::ErrorKind::Other, "scratch file already finished")
        })?;
        file.write_all(chunk).await?;
        self.bytes_written += chunk.len() as u64;
        Ok(())
    }

    /// Flush and close the write handle so other processes can read the file.
    pub async fn finish(&mut self) -> io::Result<()> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
            file.sync_all().await?;
        }
        Ok(())
    }

    /// Delete the file. Deleting a file that is already gone is not an error.
    pub fn release(self) -> io::Result<()> {
        let Self { file, path, .. } = self;
        drop(file);

        let shown = path.display().to_string();
        match path.close() {
            Ok(()) => {
                debug!(path = %shown, "Removed scratch file");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(path = %shown, error = %e, "Failed to remove scratch file");
                Err(e)
            }
        }
    }
}
