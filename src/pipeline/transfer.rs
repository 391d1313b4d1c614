//! Disposable workspace and result transfer.
//!
//! The engine never writes straight to the user's destination. It writes
//! into a fresh numbered directory under the temp root (`<temp>/1`,
//! `<temp>/2`, …) and [`FileTransfer::invoke`] then moves the results to
//! their final names:
//!
//! ```text
//! workspace                    destination = out/report.png
//! tmp-00000001.png   ──▶       out/report-01.png
//! tmp-00000002.png   ──▶       out/report-02.png
//! tmp-00000003.png   ──▶       out/report-03.png
//! ```
//!
//! A single output file keeps the destination name unchanged. Dropping the
//! transfer removes the workspace whether or not anything was moved.

use crate::error::ConvertError;
use crate::format::{Format, FormatFamily};
use crate::io::FileSystem;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct FileTransfer {
    format: Format,
    destination: PathBuf,
    workspace: PathBuf,
    fs: Arc<dyn FileSystem>,
    auto_rename: bool,
}

impl FileTransfer {
    /// Allocate a workspace under `temp_root` for one conversion to
    /// `destination`.
    pub fn new(
        format: Format,
        destination: impl Into<PathBuf>,
        temp_root: &Path,
        fs: Arc<dyn FileSystem>,
    ) -> Result<Self, ConvertError> {
        let workspace = allocate_workspace(fs.as_ref(), temp_root)?;
        debug!("Allocated workspace {}", workspace.display());
        Ok(Self {
            format,
            destination: destination.into(),
            workspace,
            fs,
            auto_rename: false,
        })
    }

    /// Pick `name (k).ext` instead of overwriting existing destinations.
    pub fn auto_rename(mut self, enabled: bool) -> Self {
        self.auto_rename = enabled;
        self
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Where the engine should write. Raster formats get a `%08d` page
    /// counter that the engine expands per page.
    pub fn working_path(&self) -> PathBuf {
        let ext = self.format.extension();
        let name = match self.format.family() {
            FormatFamily::Document => format!("tmp{ext}"),
            FormatFamily::Raster => format!("tmp-%08d{ext}"),
        };
        self.workspace.join(name)
    }

    /// Move every workspace file to its destination and return those
    /// destinations in page order.
    pub fn invoke(&self) -> Result<Vec<PathBuf>, ConvertError> {
        let mut files = self.fs.list_files(&self.workspace)?;
        files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        let count = files.len();
        let mut moved = Vec::with_capacity(count);
        for (i, src) in files.iter().enumerate() {
            let mut dst = if count == 1 {
                self.destination.clone()
            } else {
                numbered(&self.destination, i + 1, count)
            };
            if self.auto_rename {
                dst = self.fs.unique_name(&dst);
            }

            if let Some(parent) = dst.parent() {
                if !parent.as_os_str().is_empty() && !self.fs.exists(parent) {
                    self.fs.create_dir_all(parent)?;
                }
            }

            debug!("Moving {} -> {}", src.display(), dst.display());
            self.fs.move_file(src, &dst, !self.auto_rename)?;
            moved.push(dst);
        }

        info!("Transferred {} file(s)", moved.len());
        Ok(moved)
    }
}

impl Drop for FileTransfer {
    fn drop(&mut self) {
        if self.fs.exists(&self.workspace) {
            if let Err(e) = self.fs.remove_dir_all(&self.workspace) {
                warn!("Failed to remove workspace {}: {}", self.workspace.display(), e);
            }
        }
    }
}

/// First `temp_root/<n>` (n = 1, 2, …) that does not exist, created.
fn allocate_workspace(fs: &dyn FileSystem, temp_root: &Path) -> Result<PathBuf, ConvertError> {
    let dir = (1u64..)
        .map(|n| temp_root.join(n.to_string()))
        .find(|candidate| !fs.exists(candidate))
        .ok_or_else(|| ConvertError::Internal("workspace numbers exhausted".into()))?;
    fs.create_dir_all(&dir)?;
    Ok(dir)
}

/// `{stem}-{index}{ext}` beside `destination`, the index zero-padded to the
/// digit count of `total` but never fewer than two digits.
fn numbered(destination: &Path, index: usize, total: usize) -> PathBuf {
    let width = total.to_string().len().max(2);
    let stem = destination
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = destination
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let name = format!("{stem}-{index:0width$}{ext}");
    match destination.parent() {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}
