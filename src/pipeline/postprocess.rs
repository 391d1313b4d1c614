//! Caller hooks around the transfer step.
//!
//! A [`Decorator`] sees the working file before it leaves the workspace (the
//! place to stamp or watermark documents). A [`PostProcess`] sees the final
//! destination paths. Plain closures implement both traits.

use crate::error::ConvertError;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;
use tracing::{info, warn};

/// Called with the working file path after rendering, before transfer.
///
/// For raster formats the path is the `%08d` page template, not a single
/// existing file.
pub trait Decorator: Send + Sync {
    fn decorate(&self, working_path: &Path) -> Result<(), ConvertError>;
}

impl<F> Decorator for F
where
    F: Fn(&Path) -> Result<(), ConvertError> + Send + Sync,
{
    fn decorate(&self, working_path: &Path) -> Result<(), ConvertError> {
        self(working_path)
    }
}

/// Called with the destination paths after a successful transfer.
pub trait PostProcess: Send + Sync {
    fn post_process(&self, destinations: &[PathBuf]) -> Result<(), ConvertError>;
}

impl<F> PostProcess for F
where
    F: Fn(&[PathBuf]) -> Result<(), ConvertError> + Send + Sync,
{
    fn post_process(&self, destinations: &[PathBuf]) -> Result<(), ConvertError> {
        self(destinations)
    }
}

/// Opens every produced file with a user program, one process per file.
/// The conversion does not wait for them; each child is reaped on its own
/// detached thread.
#[derive(Debug, Clone)]
pub struct ProgramLauncher {
    program: PathBuf,
}

impl ProgramLauncher {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

impl PostProcess for ProgramLauncher {
    fn post_process(&self, destinations: &[PathBuf]) -> Result<(), ConvertError> {
        for path in destinations {
            let child = Command::new(&self.program)
                .arg(path)
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .spawn()
                .map_err(|e| ConvertError::Hook {
                    stage: "post-process",
                    message: format!("failed to launch {}: {}", self.program.display(), e),
                })?;
            info!(
                "Launched {} for {} (pid {})",
                self.program.display(),
                path.display(),
                child.id()
            );
            reap(child);
        }
        if destinations.is_empty() {
            warn!("Nothing to open with {}", self.program.display());
        }
        Ok(())
    }
}

/// Wait for `child` on a detached thread so it never lingers as a zombie.
fn reap(mut child: Child) -> JoinHandle<Option<ExitStatus>> {
    std::thread::spawn(move || match child.wait() {
        Ok(status) => Some(status),
        Err(e) => {
            warn!("Failed to reap pid {}: {}", child.id(), e);
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn closures_are_hooks() {
        let seen = Mutex::new(Vec::new());
        let hook = |paths: &[PathBuf]| -> Result<(), ConvertError> {
            seen.lock().unwrap().extend_from_slice(paths);
            Ok(())
        };
        hook.post_process(&[PathBuf::from("a.pdf")]).unwrap();
        assert_eq!(*seen.lock().unwrap(), vec![PathBuf::from("a.pdf")]);

        let deco = |p: &Path| -> Result<(), ConvertError> {
            if p.ends_with("tmp.pdf") {
                Ok(())
            } else {
                Err(ConvertError::Internal("wrong path".into()))
            }
        };
        assert!(deco.decorate(Path::new("/w/1/tmp.pdf")).is_ok());
        assert!(deco.decorate(Path::new("/w/1/other")).is_err());
    }

    #[test]
    fn launcher_reports_missing_program() {
        let launcher = ProgramLauncher::new("/nonexistent/viewer");
        let err = launcher
            .post_process(&[PathBuf::from("a.pdf")])
            .unwrap_err();
        assert!(matches!(err, ConvertError::Hook { stage: "post-process", .. }));
    }

    #[cfg(unix)]
    #[test]
    fn reaped_child_reports_exit_status() {
        let child = Command::new("true").spawn().unwrap();
        let status = reap(child).join().unwrap();
        assert!(status.unwrap().success());
    }

    #[cfg(unix)]
    #[test]
    fn launcher_opens_every_file() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("opened");
        let pages: Vec<PathBuf> = (1..=2)
            .map(|i| {
                let page = dir.path().join(format!("page-{i}.sh"));
                std::fs::write(&page, format!("echo {i} >> '{}'\n", marker.display())).unwrap();
                page
            })
            .collect();

        ProgramLauncher::new("sh").post_process(&pages).unwrap();

        let deadline = std::time::Instant::now() + std::time::Duration::from_secs(5);
        while std::fs::read_to_string(&marker).unwrap_or_default().lines().count() < 2 {
            assert!(std::time::Instant::now() < deadline, "viewer did not run for every file");
            std::thread::sleep(std::time::Duration::from_millis(20));
        }
    }

    #[test]
    fn launcher_with_no_files_is_noop() {
        let launcher = ProgramLauncher::new("/nonexistent/viewer");
        assert!(launcher.post_process(&[]).is_ok());
    }
}
