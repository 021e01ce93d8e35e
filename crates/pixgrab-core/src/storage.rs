//! Disk I/O and file lifecycle.
//!
//! Each transfer writes sequentially into `<final>.part` and is renamed onto
//! the final name only after the body is complete and synced, so a failed or
//! interrupted transfer never leaves a truncated file under the final name.

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Temporary file suffix used before atomic rename.
pub const TEMP_SUFFIX: &str = ".part";

/// Path for the temp file: appends `.part` to the final path (e.g. `1_p0.png` → `1_p0.png.part`).
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Sequential writer for one in-flight download.
pub struct PartFile {
    file: File,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
}

impl PartFile {
    /// Create (or truncate) the temp file for `final_path`, creating parent directories.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        if let Some(parent) = final_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        Ok(Self {
            file,
            temp_path,
            final_path: final_path.to_path_buf(),
            written: 0,
        })
    }

    pub fn append(&mut self, data: &[u8]) -> io::Result<()> {
        self.file.write_all(data)?;
        self.written += data.len() as u64;
        Ok(())
    }

    /// Bytes appended so far.
    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    /// Sync and atomically rename onto the final path. Returns bytes written.
    pub fn finalize(self) -> io::Result<u64> {
        self.file.sync_all()?;
        drop(self.file);
        std::fs::rename(&self.temp_path, &self.final_path)?;
        Ok(self.written)
    }

    /// Remove the temp file; used when the transfer failed.
    pub fn discard(self) {
        drop(self.file);
        if let Err(e) = std::fs::remove_file(&self.temp_path) {
            tracing::debug!(path = %self.temp_path.display(), "failed to remove temp file: {}", e);
        }
    }
}
