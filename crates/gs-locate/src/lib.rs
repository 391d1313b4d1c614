//! # gs-locate
//!
//! Find the [Ghostscript](https://www.ghostscript.com/) executable and detect
//! its revision, so that callers driving `gs` through its command-line
//! protocol do not have to hard-code platform-specific binary names.
//!
//! ## How it works
//!
//! On first call to [`locate_ghostscript`]:
//!
//! 1. Checks `GHOSTSCRIPT_PATH` for an explicit executable.
//! 2. Otherwise searches the `PATH` for the platform candidates
//!    (`gs` on Unix; `gswin64c`, `gswin32c`, `gs` on Windows).
//! 3. Caches the result for the lifetime of the process.
//!
//! [`detect_revision`] runs `<gs> --version` and turns `9.56.1` into the
//! revision number `956` (`major * 100 + minor`).
//!
//! ## Usage
//!
//! ```rust,no_run
//! use gs_locate::{detect_revision, locate_ghostscript};
//!
//! let gs = locate_ghostscript().expect("Ghostscript unavailable");
//! let revision = detect_revision(&gs).expect("could not read version");
//! println!("{} (revision {revision})", gs.display());
//! ```
//!
//! ## Environment variable overrides
//!
//! - `GHOSTSCRIPT_PATH`: path to an existing Ghostscript executable; skips
//!   the `PATH` search.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::OnceLock;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

// ── Public constants ─────────────────────────────────────────────────────────

/// Environment variable that overrides the `PATH` search.
pub const GHOSTSCRIPT_PATH_ENV: &str = "GHOSTSCRIPT_PATH";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned by gs-locate operations.
#[derive(Error, Debug)]
pub enum GsLocateError {
    /// No candidate executable was found on this system.
    #[error("Ghostscript not found (tried {tried}). Install it or set GHOSTSCRIPT_PATH.")]
    NotFound { tried: String },

    /// `GHOSTSCRIPT_PATH` is set but points at nothing.
    #[error("GHOSTSCRIPT_PATH '{path}' does not exist")]
    InvalidOverride { path: PathBuf },

    /// The executable could not be started.
    #[error("Failed to run '{path}': {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// `--version` printed something that is not a version number.
    #[error("Unrecognised Ghostscript version output: {0:?}")]
    UnparsableVersion(String),
}

// ── Internal: platform candidates ────────────────────────────────────────────

fn candidates() -> &'static [&'static str] {
    if cfg!(target_os = "windows") {
        &["gswin64c", "gswin32c", "gs"]
    } else {
        &["gs"]
    }
}

// ── Thread-safe singleton path cache ─────────────────────────────────────────

static RESOLVED_PATH: OnceLock<PathBuf> = OnceLock::new();

static RE_VERSION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+)\.(\d+)(?:\.(\d+))?").unwrap());

// ── Public API ───────────────────────────────────────────────────────────────

/// Returns the Ghostscript executable, searching once per process.
///
/// Safe to call from multiple threads simultaneously; concurrent first calls
/// may both search, but they resolve to the same path.
pub fn locate_ghostscript() -> Result<PathBuf, GsLocateError> {
    if let Some(path) = RESOLVED_PATH.get() {
        return Ok(path.clone());
    }

    let path = resolve()?;
    let _ = RESOLVED_PATH.set(path.clone());
    Ok(path)
}

/// Runs `<executable> --version` and returns the revision number.
pub fn detect_revision(executable: &Path) -> Result<u32, GsLocateError> {
    let output = Command::new(executable)
        .arg("--version")
        .stdin(Stdio::null())
        .stderr(Stdio::null())
        .output()
        .map_err(|e| GsLocateError::Spawn {
            path: executable.to_path_buf(),
            source: e,
        })?;

    parse_revision(&String::from_utf8_lossy(&output.stdout))
}

/// Parses `gs --version` output (`9.56.1`, `10.02.1`, `9.27`) into
/// `major * 100 + minor`.
pub fn parse_revision(version: &str) -> Result<u32, GsLocateError> {
    let caps = RE_VERSION
        .captures(version.trim())
        .ok_or_else(|| GsLocateError::UnparsableVersion(version.trim().to_string()))?;

    let major: u32 = caps[1]
        .parse()
        .map_err(|_| GsLocateError::UnparsableVersion(version.trim().to_string()))?;
    let minor: u32 = caps[2]
        .parse()
        .map_err(|_| GsLocateError::UnparsableVersion(version.trim().to_string()))?;

    Ok(major * 100 + minor)
}

// ── Internal helpers ─────────────────────────────────────────────────────────

fn resolve() -> Result<PathBuf, GsLocateError> {
    // 1. Environment variable override.
    if let Ok(env_path) = std::env::var(GHOSTSCRIPT_PATH_ENV) {
        let p = PathBuf::from(env_path);
        if p.exists() {
            return Ok(p);
        }
        return Err(GsLocateError::InvalidOverride { path: p });
    }

    // 2. PATH search.
    for name in candidates() {
        if let Ok(p) = which::which(name) {
            return Ok(p);
        }
    }

    Err(GsLocateError::NotFound {
        tried: candidates().join(", "),
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_three_part_version() {
        assert_eq!(parse_revision("9.56.1\n").unwrap(), 956);
        assert_eq!(parse_revision("10.02.1").unwrap(), 1002);
    }

    #[test]
    fn parse_two_part_version() {
        assert_eq!(parse_revision("9.27").unwrap(), 927);
    }

    #[test]
    fn parse_rejects_garbage() {
        let err = parse_revision("GPL Ghostscript").unwrap_err();
        assert!(err.to_string().contains("GPL Ghostscript"));
    }

    #[test]
    fn candidates_nonempty() {
        assert!(candidates().contains(&"gs"));
    }

    #[test]
    fn not_found_message_mentions_override() {
        let e = GsLocateError::NotFound {
            tried: "gs".into(),
        };
        assert!(e.to_string().contains("GHOSTSCRIPT_PATH"));
    }
}
