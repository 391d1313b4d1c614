//! Progress-callback trait for per-stage conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::facade::Facade::progress`] to follow a conversion through its
//! stages. The CLI drives its spinner from these events.
//!
//! # Example
//!
//! ```rust
//! use edgequake_psconv::{ConversionProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, stage: Stage) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} done");
//!     }
//! }
//!
//! let counter: Arc<dyn ConversionProgressCallback> = Arc::new(CountingCallback {
//!     completed: Arc::new(AtomicUsize::new(0)),
//! });
//! counter.on_stage_complete(Stage::Render);
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// One step of a conversion, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Source digest check. Only runs when a digest is configured.
    Verify,
    Render,
    /// Decoration hook. Only runs when a decorator is installed.
    Decorate,
    Transfer,
    /// Post-process hook. Only runs when one is installed.
    PostProcess,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Verify => "verify",
            Stage::Render => "render",
            Stage::Decorate => "decorate",
            Stage::Transfer => "transfer",
            Stage::PostProcess => "post-process",
        };
        f.write_str(s)
    }
}

/// Called by the facade as a conversion moves through its stages.
///
/// Implementations must be `Send + Sync`; a conversion usually runs on a
/// blocking thread while the callback's owner lives elsewhere. All methods
/// have default no-op implementations.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once before the first stage.
    fn on_conversion_start(&self) {}

    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Not called for a stage that failed or was skipped.
    fn on_stage_complete(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called once after a successful conversion.
    ///
    /// # Arguments
    /// * `destinations`: the produced files, in page order
    fn on_conversion_complete(&self, destinations: &[PathBuf]) {
        let _ = destinations;
    }
}

/// A no-op implementation; the default when no callback is configured.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl ConversionProgressCallback for Recorder {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage}"));
        }

        fn on_stage_complete(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("done {stage}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_conversion_start();
        cb.on_stage_start(Stage::Render);
        cb.on_stage_complete(Stage::Render);
        cb.on_conversion_complete(&[PathBuf::from("a.pdf")]);
    }

    #[test]
    fn overridden_methods_receive_events() {
        let rec = Recorder::default();
        rec.on_stage_start(Stage::Transfer);
        rec.on_stage_complete(Stage::Transfer);
        rec.on_conversion_complete(&[]);
        assert_eq!(
            *rec.events.lock().unwrap(),
            vec!["start transfer".to_string(), "done transfer".to_string()]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::PostProcess);
        assert_eq!(Stage::PostProcess.to_string(), "post-process");
    }
}
