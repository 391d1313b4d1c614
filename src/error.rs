//! Error types for the edgequake-psconv library.
//!
//! A single fatal error type, [`ConvertError`], covers every way a
//! conversion can stop. The variants fall into four families that callers
//! usually want to report differently:
//!
//! * **Configuration**: [`ConvertError::UnsupportedFormat`] and
//!   [`ConvertError::InvalidConfig`]. The caller must change its request.
//! * **Integrity**: [`ConvertError::DigestMismatch`]. The source changed
//!   since it was fingerprinted; nothing was rendered.
//! * **Engine**: [`ConvertError::EngineFailed`] and
//!   [`ConvertError::EngineNotFound`]. Ghostscript is missing or refused the
//!   job; the status code is kept verbatim.
//! * **Filesystem**: [`ConvertError::Io`]. Propagated unchanged from the
//!   move/create/delete call that failed.
//!
//! Nothing in the library retries.

use std::path::PathBuf;
use thiserror::Error;

use crate::converter::ConverterKind;
use crate::format::Format;

/// All fatal errors returned by the edgequake-psconv library.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ── Configuration errors ──────────────────────────────────────────────
    /// The converter kind cannot produce the requested format.
    #[error("Format {format} is not supported by the {kind} converter")]
    UnsupportedFormat { format: Format, kind: ConverterKind },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Input errors ──────────────────────────────────────────────────────
    /// Source file was not found at the given path.
    #[error("Source file not found: '{path}'\nCheck the path exists and is readable.")]
    SourceNotFound { path: PathBuf },

    // ── Integrity errors ──────────────────────────────────────────────────
    /// The source no longer matches the digest recorded for it.
    #[error("Digest mismatch for '{path}': expected {expected}, got {actual}\nThe source file was modified after it was submitted.")]
    DigestMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },

    // ── Engine errors ─────────────────────────────────────────────────────
    /// Ghostscript exited with a non-zero status.
    #[error("Ghostscript failed with status {status}: {stderr}")]
    EngineFailed { status: i32, stderr: String },

    /// No Ghostscript executable could be located.
    #[error(
        "Ghostscript is not available: {0}\n\n\
You can:\n\
  • Install Ghostscript from your package manager (ghostscript).\n\
  • Set GHOSTSCRIPT_PATH=/path/to/gs to use a specific executable.\n"
    )]
    EngineNotFound(String),

    // ── Hook errors ───────────────────────────────────────────────────────
    /// A decoration or post-process hook reported a failure.
    #[error("{stage} hook failed: {message}")]
    Hook { stage: &'static str, message: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Filesystem failure while preparing, moving or cleaning up files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Process exit code for the CLI; each error family gets its own value.
    pub fn exit_code(&self) -> i32 {
        match self {
            ConvertError::UnsupportedFormat { .. } | ConvertError::InvalidConfig(_) => 2,
            ConvertError::SourceNotFound { .. } => 3,
            ConvertError::DigestMismatch { .. } => 4,
            ConvertError::EngineFailed { .. } | ConvertError::EngineNotFound(_) => 5,
            ConvertError::Hook { .. } => 6,
            ConvertError::Io(_) => 7,
            ConvertError::Internal(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_format_display() {
        let e = ConvertError::UnsupportedFormat {
            format: Format::Png,
            kind: ConverterKind::Pdf,
        };
        let msg = e.to_string();
        assert!(msg.contains("Png"), "got: {msg}");
        assert!(msg.contains("pdf"), "got: {msg}");
    }

    #[test]
    fn engine_failed_keeps_status() {
        let e = ConvertError::EngineFailed {
            status: -100,
            stderr: "Unrecoverable error".into(),
        };
        assert!(e.to_string().contains("-100"));
        assert_eq!(e.exit_code(), 5);
    }

    #[test]
    fn digest_mismatch_display() {
        let e = ConvertError::DigestMismatch {
            path: PathBuf::from("in.ps"),
            expected: "aa".into(),
            actual: "bb".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("in.ps"));
        assert!(msg.contains("expected aa"));
        assert_eq!(e.exit_code(), 4);
    }

    #[test]
    fn io_error_propagates_message() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let e: ConvertError = io.into();
        assert!(e.to_string().contains("denied"));
    }

    #[test]
    fn exit_codes_are_distinct_per_family() {
        let codes = [
            ConvertError::InvalidConfig("x".into()).exit_code(),
            ConvertError::DigestMismatch {
                path: PathBuf::new(),
                expected: String::new(),
                actual: String::new(),
            }
            .exit_code(),
            ConvertError::EngineNotFound("x".into()).exit_code(),
            ConvertError::Internal("x".into()).exit_code(),
        ];
        let mut dedup = codes.to_vec();
        dedup.sort_unstable();
        dedup.dedup();
        assert_eq!(dedup.len(), codes.len());
    }
}
