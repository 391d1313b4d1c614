//! Rendering engine boundary.
//!
//! [`Engine`] is the seam between argument compilation and the actual
//! interpreter. [`Ghostscript`] runs the `gs` executable found by
//! [`gs_locate`]; tests substitute a scripted engine that writes fake output
//! files.
//!
//! Runs synchronously. Async callers should wrap the whole conversion in
//! `tokio::task::spawn_blocking`, as the CLI does.

use crate::error::ConvertError;
use gs_locate::{detect_revision, locate_ghostscript};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, info, warn};

/// Executes a compiled argument vector.
pub trait Engine: Send + Sync {
    /// Engine revision as `major * 100 + minor`, when known.
    fn revision(&self) -> Option<u32>;

    /// Run with `args`, whose first element is the invocation-name slot.
    ///
    /// `temp` is the working directory the engine should use for its own
    /// scratch files.
    fn run(&self, args: &[String], temp: Option<&Path>) -> Result<(), ConvertError>;
}

/// The Ghostscript executable.
#[derive(Debug, Clone)]
pub struct Ghostscript {
    program: PathBuf,
    revision: Option<u32>,
}

impl Ghostscript {
    pub fn new(program: impl Into<PathBuf>, revision: Option<u32>) -> Self {
        Self {
            program: program.into(),
            revision,
        }
    }

    /// Find Ghostscript on this system and read its revision.
    ///
    /// An unreadable version is not fatal; the engine then reports no
    /// revision and no revision-specific arguments are emitted.
    pub fn locate() -> Result<Self, ConvertError> {
        let program =
            locate_ghostscript().map_err(|e| ConvertError::EngineNotFound(e.to_string()))?;

        let revision = match detect_revision(&program) {
            Ok(rev) => Some(rev),
            Err(e) => {
                warn!("Could not detect Ghostscript revision: {}", e);
                None
            }
        };

        info!(
            "Using Ghostscript at {} (revision {:?})",
            program.display(),
            revision
        );
        Ok(Self::new(program, revision))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl Engine for Ghostscript {
    fn revision(&self) -> Option<u32> {
        self.revision
    }

    fn run(&self, args: &[String], temp: Option<&Path>) -> Result<(), ConvertError> {
        let mut cmd = Command::new(&self.program);
        // argv[0] is supplied by the OS.
        cmd.args(args.iter().skip(1))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        if let Some(temp) = temp {
            cmd.env("TEMP", temp).env("TMPDIR", temp);
        }

        debug!("Spawning {}", self.program.display());
        let output = cmd.output().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConvertError::EngineNotFound(self.program.display().to_string())
            } else {
                ConvertError::Io(e)
            }
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ConvertError::EngineFailed {
                status: output.status.code().unwrap_or(-1),
                stderr,
            });
        }
        Ok(())
    }
}
