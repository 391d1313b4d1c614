//! Filesystem boundary.
//!
//! Every filesystem touch in the pipeline (creating the destination
//! directory, listing the workspace, moving results, cleaning up) goes through
//! [`FileSystem`]. Tests and embedders can swap in their own implementation;
//! [`LocalFileSystem`] is the `std::fs` one used by default.

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

/// Filesystem operations used by the conversion pipeline.
pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Regular files directly inside `dir`, in no particular order.
    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Move `src` to `dst`. When `overwrite` is false and `dst` exists the
    /// move fails with [`io::ErrorKind::AlreadyExists`].
    fn move_file(&self, src: &Path, dst: &Path, overwrite: bool) -> io::Result<()>;

    fn remove_dir_all(&self, path: &Path) -> io::Result<()>;

    fn remove_file(&self, path: &Path) -> io::Result<()>;

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>>;

    /// First of `{stem} (2){ext}`, `{stem} (3){ext}`, … that does not exist.
    /// Returns `path` unchanged when it is free.
    fn unique_name(&self, path: &Path) -> PathBuf {
        if !self.exists(path) {
            return path.to_path_buf();
        }

        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let ext = path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        (2u32..)
            .map(|k| dir.join(format!("{stem} ({k}){ext}")))
            .find(|candidate| !self.exists(candidate))
            .unwrap_or_else(|| path.to_path_buf())
    }
}

/// [`FileSystem`] backed by `std::fs`.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl FileSystem for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn list_files(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }

    fn move_file(&self, src: &Path, dst: &Path, overwrite: bool) -> io::Result<()> {
        if !overwrite && dst.exists() {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("destination exists: {}", dst.display()),
            ));
        }

        // `rename` replaces `dst` in place; copy only across devices.
        match fs::rename(src, dst) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::CrossesDevices => copy_across(src, dst),
            Err(e) => Err(e),
        }
    }

    fn remove_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::remove_dir_all(path)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn open(&self, path: &Path) -> io::Result<Box<dyn Read + Send>> {
        Ok(Box::new(fs::File::open(path)?))
    }
}

/// Copy into a sibling of `dst`, then rename over it. An existing `dst` is
/// untouched until the copy is complete.
fn copy_across(src: &Path, dst: &Path) -> io::Result<()> {
    let name = dst
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let partial = dst.with_file_name(format!(".{name}.partial"));

    if let Err(e) = fs::copy(src, &partial) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    if let Err(e) = fs::rename(&partial, dst) {
        let _ = fs::remove_file(&partial);
        return Err(e);
    }
    fs::remove_file(src)
}
