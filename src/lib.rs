//! # edgequake-psconv
//!
//! Convert PostScript, EPS and PDF files to document or raster formats by
//! driving Ghostscript through its command-line protocol.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source
//!  │
//!  ├─ 1. Verify     optional SHA-256 check of the source
//!  ├─ 2. Render     compile arguments, run gs into a private workspace
//!  ├─ 3. Decorate   optional hook on the working file
//!  ├─ 4. Transfer   move results to their final names
//!  └─ 5. Post       optional hook on the destinations (e.g. open a viewer)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use edgequake_psconv::{convert, Format, SaveOption, Settings};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let settings = Settings::builder()
//!         .source("report.ps")
//!         .destination("out/report.png")
//!         .format(Format::Png)
//!         .resolution(150)
//!         .save_option(SaveOption::Rename)
//!         .build()?;
//!
//!     for page in convert(settings).await? {
//!         println!("{}", page.display());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Use [`Facade`] directly to plug in another [`Engine`], [`FileSystem`],
//! hooks or a progress callback.
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `psconv` binary (clap + anyhow + indicatif + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! edgequake-psconv = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod argument;
pub mod config;
pub mod converter;
pub mod error;
pub mod facade;
pub mod format;
pub mod io;
pub mod pipeline;
pub mod progress;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use argument::{Argument, Code};
pub use config::{
    ColorMode, Downsampling, Encoding, Orientation, Paper, PdfVersion, SaveOption, Settings,
    SettingsBuilder,
};
pub use converter::{Converter, ConverterKind, ConverterOptions, LEGACY_REVISION};
pub use error::ConvertError;
pub use facade::{convert, convert_blocking, Facade, SessionHandle};
pub use format::{Format, FormatFamily};
pub use io::{FileSystem, LocalFileSystem};
pub use pipeline::postprocess::{Decorator, PostProcess, ProgramLauncher};
pub use pipeline::render::{Engine, Ghostscript};
pub use pipeline::transfer::FileTransfer;
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback, Stage};
