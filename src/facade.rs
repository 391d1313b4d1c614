//! Conversion session: one source, one destination, one engine.
//!
//! [`Facade::convert`] runs the pipeline synchronously:
//!
//! ```text
//! verify ──▶ render ──▶ decorate ──▶ transfer ──▶ post-process
//! (digest)   (engine)   (hook)       (workspace)  (hook)
//! ```
//!
//! Each step after verification first checks whether the session has been
//! disposed and is skipped if so. A skipped transfer yields no destinations
//! rather than an error.
//!
//! [`Facade::dispose`] is the async teardown. It marks the session disposed,
//! gives a running conversion a bounded grace period to finish, then removes
//! the temp root (and the source, when asked to). It never cancels the
//! engine.

use crate::config::{SaveOption, Settings};
use crate::converter::Converter;
use crate::error::ConvertError;
use crate::io::{FileSystem, LocalFileSystem};
use crate::pipeline::postprocess::{Decorator, PostProcess, ProgramLauncher};
use crate::pipeline::render::{Engine, Ghostscript};
use crate::pipeline::transfer::FileTransfer;
use crate::pipeline::verify::verify_digest;
use crate::progress::{NoopProgressCallback, ProgressCallback, Stage};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Default wait between busy checks during teardown.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default number of busy checks before teardown proceeds anyway.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

// ── Session state ────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Session {
    busy: Arc<AtomicBool>,
    disposed: Arc<AtomicBool>,
}

impl Session {
    fn begin(&self) -> BusyGuard {
        self.busy.store(true, Ordering::SeqCst);
        BusyGuard(Arc::clone(&self.busy))
    }

    fn handle(&self) -> SessionHandle {
        SessionHandle {
            busy: Arc::clone(&self.busy),
            disposed: Arc::clone(&self.disposed),
        }
    }
}

/// Resets the busy flag when the conversion returns, by any path.
struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Read-only view of a session, usable from other threads.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    busy: Arc<AtomicBool>,
    disposed: Arc<AtomicBool>,
}

impl SessionHandle {
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

// ── Facade ───────────────────────────────────────────────────────────────────

pub struct Facade {
    settings: Settings,
    engine: Arc<dyn Engine>,
    fs: Arc<dyn FileSystem>,
    decorator: Option<Arc<dyn Decorator>>,
    post_process: Option<Arc<dyn PostProcess>>,
    progress: ProgressCallback,
    session: Session,
    poll_interval: Duration,
    max_attempts: u32,
}

impl Facade {
    /// Create a facade around `engine`. A configured
    /// [`Settings::user_program`] becomes the post-process hook.
    pub fn new(settings: Settings, engine: Arc<dyn Engine>) -> Self {
        let post_process = settings
            .user_program
            .as_ref()
            .map(|p| Arc::new(ProgramLauncher::new(p)) as Arc<dyn PostProcess>);

        Self {
            settings,
            engine,
            fs: Arc::new(LocalFileSystem),
            decorator: None,
            post_process,
            progress: Arc::new(NoopProgressCallback),
            session: Session::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Create a facade around the Ghostscript found on this system.
    pub fn with_ghostscript(settings: Settings) -> Result<Self, ConvertError> {
        let engine = Ghostscript::locate()?;
        Ok(Self::new(settings, Arc::new(engine)))
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn decorator(mut self, decorator: impl Decorator + 'static) -> Self {
        self.decorator = Some(Arc::new(decorator));
        self
    }

    /// Replaces any hook derived from [`Settings::user_program`].
    pub fn post_process(mut self, hook: impl PostProcess + 'static) -> Self {
        self.post_process = Some(Arc::new(hook));
        self
    }

    pub fn progress(mut self, callback: ProgressCallback) -> Self {
        self.progress = callback;
        self
    }

    /// Teardown timing: wait `interval` between busy checks, at most
    /// `attempts` times.
    pub fn with_teardown(mut self, interval: Duration, attempts: u32) -> Self {
        self.poll_interval = interval;
        self.max_attempts = attempts;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn session(&self) -> SessionHandle {
        self.session.handle()
    }

    pub fn is_busy(&self) -> bool {
        self.session.busy.load(Ordering::SeqCst)
    }

    /// The converter this facade renders with.
    pub fn converter(&self) -> Result<Converter, ConvertError> {
        Ok(self.settings.converter()?.with_file_system(Arc::clone(&self.fs)))
    }

    /// The argument vector a conversion would run, with the destination in
    /// place of the private workspace path.
    pub fn inspect_arguments(&self) -> Result<Vec<String>, ConvertError> {
        let converter = self.converter()?;
        Ok(converter.arguments(
            self.engine.revision(),
            std::slice::from_ref(&self.settings.source),
            &self.settings.destination,
        ))
    }

    /// Run the pipeline and return the produced files in page order.
    pub fn convert(&self) -> Result<Vec<PathBuf>, ConvertError> {
        let _busy = self.session.begin();
        let started = Instant::now();
        let s = &self.settings;

        info!(
            "Converting {} -> {} ({})",
            s.source.display(),
            s.destination.display(),
            s.format
        );
        self.progress.on_conversion_start();

        s.validate()?;
        if !self.fs.exists(&s.source) {
            return Err(ConvertError::SourceNotFound {
                path: s.source.clone(),
            });
        }

        let converter = self.converter()?;
        let transfer = FileTransfer::new(s.format, &s.destination, &s.temp, Arc::clone(&self.fs))?
            .auto_rename(s.save_option == SaveOption::Rename);
        let working = transfer.working_path();

        if let Some(ref digest) = s.digest {
            self.stage(Stage::Verify, || {
                verify_digest(self.fs.as_ref(), &s.source, digest)
            })?;
        }

        if self.skipped(Stage::Render) {
            return Ok(Vec::new());
        }
        self.stage(Stage::Render, || {
            converter.invoke(self.engine.as_ref(), std::slice::from_ref(&s.source), &working)
        })?;

        if let Some(ref decorator) = self.decorator {
            if self.skipped(Stage::Decorate) {
                return Ok(Vec::new());
            }
            self.stage(Stage::Decorate, || decorator.decorate(&working))?;
        }

        if self.skipped(Stage::Transfer) {
            return Ok(Vec::new());
        }
        let destinations = self.stage(Stage::Transfer, || transfer.invoke())?;

        if let Some(ref hook) = self.post_process {
            if !self.skipped(Stage::PostProcess) {
                self.stage(Stage::PostProcess, || hook.post_process(&destinations))?;
            }
        }

        info!(
            "Conversion complete: {} file(s) in {}ms",
            destinations.len(),
            started.elapsed().as_millis()
        );
        self.progress.on_conversion_complete(&destinations);
        Ok(destinations)
    }

    /// Mark the session disposed, wait for a running conversion within the
    /// configured grace period, then remove the temp root and, if configured,
    /// the source. Cleanup failures are logged, not returned.
    pub async fn dispose(&self) {
        self.session.disposed.store(true, Ordering::SeqCst);

        let mut attempts = 0;
        while self.is_busy() && attempts < self.max_attempts {
            attempts += 1;
            debug!(
                "Conversion still running, waiting ({}/{})",
                attempts, self.max_attempts
            );
            tokio::time::sleep(self.poll_interval).await;
        }
        if self.is_busy() {
            warn!(
                "Conversion still running after {} checks; tearing down anyway",
                attempts
            );
        }

        let temp = &self.settings.temp;
        if self.fs.exists(temp) {
            match self.fs.remove_dir_all(temp) {
                Ok(()) => debug!("Removed temp root {}", temp.display()),
                Err(e) => warn!("Failed to remove temp root {}: {}", temp.display(), e),
            }
        }

        if self.settings.delete_source && self.fs.exists(&self.settings.source) {
            match self.fs.remove_file(&self.settings.source) {
                Ok(()) => info!("Deleted source {}", self.settings.source.display()),
                Err(e) => warn!(
                    "Failed to delete source {}: {}",
                    self.settings.source.display(),
                    e
                ),
            }
        }
    }

    fn stage<T>(
        &self,
        stage: Stage,
        f: impl FnOnce() -> Result<T, ConvertError>,
    ) -> Result<T, ConvertError> {
        debug!("Stage {} started", stage);
        self.progress.on_stage_start(stage);
        let out = f()?;
        self.progress.on_stage_complete(stage);
        Ok(out)
    }

    fn skipped(&self, stage: Stage) -> bool {
        let disposed = self.session.disposed.load(Ordering::SeqCst);
        if disposed {
            warn!("Session disposed, skipping {}", stage);
        }
        disposed
    }
}

// ── Convenience entry points ─────────────────────────────────────────────────

/// Convert with the system Ghostscript and tear the session down afterwards.
///
/// The conversion runs on tokio's blocking pool.
pub async fn convert(settings: Settings) -> Result<Vec<PathBuf>, ConvertError> {
    settings.validate()?;
    let facade = Arc::new(Facade::with_ghostscript(settings)?);

    let worker = Arc::clone(&facade);
    let result = tokio::task::spawn_blocking(move || worker.convert())
        .await
        .map_err(|e| ConvertError::Internal(format!("Conversion task panicked: {}", e)))?;

    facade.dispose().await;
    result
}

/// Synchronous wrapper around [`convert`].
///
/// Creates a temporary tokio runtime internally.
pub fn convert_blocking(settings: Settings) -> Result<Vec<PathBuf>, ConvertError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| ConvertError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(convert(settings))
}
