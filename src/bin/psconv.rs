//! CLI binary for edgequake-psconv.
//!
//! A thin shim over the library crate that maps CLI flags to `Settings`,
//! runs one conversion and prints the produced files.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_psconv::{
    ColorMode, ConversionProgressCallback, ConvertError, Downsampling, Encoding, Engine, Facade,
    Format, Ghostscript, Orientation, Paper, PdfVersion, ProgressCallback, SaveOption, Settings,
    Stage,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal spinner that names the running stage and logs each finished one.
struct CliProgressCallback {
    bar: ProgressBar,
    started: Instant,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new_spinner();
        let style = ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Preparing");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            started: Instant::now(),
        })
    }
}

impl ConversionProgressCallback for CliProgressCallback {
    fn on_stage_start(&self, stage: Stage) {
        self.bar.set_prefix("Converting");
        self.bar.set_message(stage.to_string());
    }

    fn on_stage_complete(&self, stage: Stage) {
        self.bar.println(format!(
            "  {} {:<12} {}",
            green("✓"),
            stage.to_string(),
            dim(&format!("{:.1}s", self.started.elapsed().as_secs_f64())),
        ));
    }

    fn on_conversion_complete(&self, destinations: &[PathBuf]) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} {} file(s) written",
            green("✔"),
            bold(&destinations.len().to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # PostScript to PDF next to the source
  psconv report.ps

  # One PNG per page at 150 DPI, never overwriting existing files
  psconv report.ps -f png -r 150 -o out/report.png --rename

  # Grayscale, linearized PDF 1.4
  psconv scan.pdf -o small.pdf --color-mode gray --pdf-version 1.4 --linearize

  # Refuse to convert a source that changed since it was recorded
  psconv report.ps --digest 5d41402abc4b2a76b9719d911017c592...

  # Show the Ghostscript arguments without running anything
  psconv report.ps -f tiffmono --tiff-compression g4fax --inspect-args

  # Open every result in a viewer
  psconv report.ps -f jpeg --exec xdg-open

FORMATS:
  Document  pdf, ps, eps, text
  Raster    png, pngalpha, pnggray, pngmono, png256, jpeg, jpeggray, jpegcmyk,
            tiff, tiffgray, tiffmono, bmp, bmpgray, bmpmono, psd, psdcmyk
  Raster formats write one file per page: out-01.png, out-02.png, …

EXIT CODES:
  0  success
  1  internal error
  2  invalid configuration or unsupported format
  3  source not found
  4  source digest mismatch
  5  Ghostscript missing or failed
  6  decoration or post-process hook failed
  7  filesystem error

ENVIRONMENT VARIABLES:
  GHOSTSCRIPT_PATH   Path to the gs executable; skips the PATH search
  RUST_LOG           Override the log filter (e.g. edgequake_psconv=debug)
  PSCONV_*           Fallback for most flags (see --help for each)
"#;

/// Convert PostScript and PDF documents with Ghostscript.
#[derive(Parser, Debug)]
#[command(
    name = "psconv",
    version,
    about = "Convert PostScript and PDF documents with Ghostscript",
    long_about = "Convert PostScript, EPS and PDF documents to PDF, PostScript or raster \
images (PNG, JPEG, TIFF, BMP, PSD) by driving the Ghostscript command line. \
Rendering happens in a private workspace; results are moved to the destination afterwards.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Source file (PostScript, EPS or PDF).
    input: PathBuf,

    /// Destination path. Default: the source path with the format's extension.
    #[arg(short, long, env = "PSCONV_OUTPUT")]
    output: Option<PathBuf>,

    /// Output format (pdf, ps, eps, text, png, jpeg, tiff, …).
    #[arg(short, long, env = "PSCONV_FORMAT")]
    format: Option<Format>,

    /// Rendering resolution in DPI.
    #[arg(short, long, env = "PSCONV_RESOLUTION",
          value_parser = clap::value_parser!(u32).range(1..))]
    resolution: Option<u32>,

    /// Page orientation: auto, portrait, landscape.
    #[arg(long, env = "PSCONV_ORIENTATION")]
    orientation: Option<Orientation>,

    /// Fixed paper size: auto, a3, a4, a5, b4, b5, letter, legal.
    #[arg(long, env = "PSCONV_PAPER")]
    paper: Option<Paper>,

    /// Document color conversion: same, rgb, cmyk, gray.
    #[arg(long, env = "PSCONV_COLOR_MODE")]
    color_mode: Option<ColorMode>,

    /// Image downsampling for documents: none, average, bicubic, subsample.
    #[arg(long, env = "PSCONV_DOWNSAMPLING")]
    downsampling: Option<Downsampling>,

    /// PDF compatibility level, e.g. 1.4.
    #[arg(long, env = "PSCONV_PDF_VERSION")]
    pdf_version: Option<PdfVersion>,

    /// PDF image compression: none, flate, jpeg, lzw, fax, g4fax, packbits.
    #[arg(long, env = "PSCONV_COMPRESSION")]
    compression: Option<Encoding>,

    /// PDF monochrome image compression (same values as --compression).
    #[arg(long, env = "PSCONV_MONO_COMPRESSION")]
    mono_compression: Option<Encoding>,

    /// TIFF compression: lzw, fax, g4fax, packbits, none.
    #[arg(long, env = "PSCONV_TIFF_COMPRESSION")]
    tiff_compression: Option<Encoding>,

    /// Let Ghostscript print its own progress (omits -dQUIET).
    #[arg(long, env = "PSCONV_ENGINE_OUTPUT")]
    engine_output: bool,

    /// Redirect Ghostscript's stdout to this file.
    #[arg(long, env = "PSCONV_ENGINE_LOG")]
    engine_log: Option<PathBuf>,

    /// Extra PostScript resource directory (repeatable).
    #[arg(long = "resource-dir", value_name = "DIR")]
    resource_dirs: Vec<PathBuf>,

    /// Extra font directory (repeatable).
    #[arg(long = "font-dir", value_name = "DIR")]
    font_dirs: Vec<PathBuf>,

    /// Raw Ghostscript argument, passed verbatim (repeatable).
    #[arg(long = "gs-option", value_name = "ARG", allow_hyphen_values = true)]
    gs_options: Vec<String>,

    /// PostScript statement for the -c block (repeatable).
    #[arg(long = "gs-code", value_name = "PS", allow_hyphen_values = true)]
    gs_codes: Vec<String>,

    /// JPEG quality (1–100; out-of-range values are clamped).
    #[arg(long, env = "PSCONV_QUALITY")]
    quality: Option<u32>,

    /// Produce a linearized (fast web view) PDF.
    #[arg(long, env = "PSCONV_LINEARIZE")]
    linearize: bool,

    /// Do not embed fonts in document output.
    #[arg(long, env = "PSCONV_NO_EMBED_FONTS")]
    no_embed_fonts: bool,

    /// Disable text and graphics anti-aliasing in raster output.
    #[arg(long, env = "PSCONV_NO_ANTI_ALIAS")]
    no_anti_alias: bool,

    /// Keep existing files and write `name (2).ext` instead of overwriting.
    #[arg(long, env = "PSCONV_RENAME")]
    rename: bool,

    /// Root directory for private workspaces; removed when done.
    #[arg(long, env = "PSCONV_TEMP")]
    temp: Option<PathBuf>,

    /// Expected SHA-256 of the source (hex).
    #[arg(long, env = "PSCONV_DIGEST")]
    digest: Option<String>,

    /// Delete the source once the conversion is over.
    #[arg(long, env = "PSCONV_DELETE_SOURCE")]
    delete_source: bool,

    /// Program to open each produced file with.
    #[arg(long, env = "PSCONV_EXEC")]
    exec: Option<PathBuf>,

    /// Load settings from a JSON file; flags override its values.
    #[arg(long, env = "PSCONV_SETTINGS")]
    settings: Option<PathBuf>,

    /// Print the Ghostscript argument vector and exit.
    #[arg(long)]
    inspect_args: bool,

    /// Print results as JSON.
    #[arg(long, env = "PSCONV_JSON")]
    json: bool,

    /// Disable the progress spinner.
    #[arg(long, env = "PSCONV_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PSCONV_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PSCONV_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner gives all the feedback that matters; keep INFO logs out of
    // its way unless asked for.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json && !cli.inspect_args;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    match run(&cli, show_progress).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", red("✘"), e);
            let code = e
                .downcast_ref::<ConvertError>()
                .map(ConvertError::exit_code)
                .unwrap_or(1);
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}

async fn run(cli: &Cli, show_progress: bool) -> Result<()> {
    let settings = build_settings(cli)?;

    // ── Inspect mode ─────────────────────────────────────────────────────
    if cli.inspect_args {
        let engine = Ghostscript::locate().unwrap_or_else(|e| {
            warn!("{}; showing arguments without revision-specific options", e);
            Ghostscript::new("gs", None)
        });
        let facade = Facade::new(settings, Arc::new(engine));
        let args = facade
            .inspect_arguments()
            .context("Failed to compile arguments")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&args).context("Failed to serialise arguments")?
            );
        } else {
            for arg in &args {
                println!("{arg}");
            }
        }
        return Ok(());
    }

    // ── Run conversion ───────────────────────────────────────────────────
    let engine = Ghostscript::locate().context("Ghostscript is required")?;
    if !cli.quiet && !cli.json {
        eprintln!(
            "{}",
            dim(&format!(
                "Ghostscript {} (revision {})",
                engine.program().display(),
                engine
                    .revision()
                    .map(|r| r.to_string())
                    .unwrap_or_else(|| "unknown".into())
            ))
        );
    }

    let mut facade = Facade::new(settings, Arc::new(engine));
    if show_progress {
        let cb = CliProgressCallback::new();
        facade = facade.progress(cb as ProgressCallback);
    }
    let facade = Arc::new(facade);

    let worker = Arc::clone(&facade);
    let result = tokio::task::spawn_blocking(move || worker.convert())
        .await
        .context("Conversion task panicked")?;
    facade.dispose().await;

    let destinations = result.context("Conversion failed")?;

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&destinations).context("Failed to serialise output")?
        );
    } else if !cli.quiet {
        for path in &destinations {
            println!("{}", path.display());
        }
    }
    Ok(())
}

/// Map CLI args (and an optional settings file) to `Settings`.
fn build_settings(cli: &Cli) -> Result<Settings> {
    let mut s = match cli.settings {
        Some(ref path) => Settings::load(path)
            .with_context(|| format!("Failed to load settings from {}", path.display()))?,
        None => Settings::default(),
    };

    s.source = cli.input.clone();
    if let Some(format) = cli.format {
        s.format = format;
    }
    s.destination = match cli.output {
        Some(ref out) => out.clone(),
        None if s.destination.as_os_str().is_empty() => default_destination(&s.source, s.format),
        None => s.destination.clone(),
    };

    if let Some(r) = cli.resolution {
        s.resolution = r;
    }
    if let Some(o) = cli.orientation {
        s.orientation = o;
    }
    if let Some(p) = cli.paper {
        s.paper = p;
    }
    if let Some(c) = cli.color_mode {
        s.color_mode = c;
    }
    if let Some(d) = cli.downsampling {
        s.downsampling = d;
    }
    if let Some(v) = cli.pdf_version {
        s.pdf_version = v;
    }
    if let Some(c) = cli.compression {
        s.compression = c;
    }
    if let Some(c) = cli.mono_compression {
        s.mono_compression = c;
    }
    if let Some(c) = cli.tiff_compression {
        s.tiff_compression = c;
    }
    if cli.engine_output {
        s.quiet = false;
    }
    if let Some(ref log) = cli.engine_log {
        s.log = Some(log.clone());
    }
    s.resources.extend(cli.resource_dirs.iter().cloned());
    s.fonts.extend(cli.font_dirs.iter().cloned());
    s.options.extend(cli.gs_options.iter().cloned());
    s.codes.extend(cli.gs_codes.iter().cloned());
    if let Some(q) = cli.quality {
        s.jpeg_quality = q;
    }
    if cli.linearize {
        s.linearization = true;
    }
    if cli.no_embed_fonts {
        s.embed_fonts = false;
    }
    if cli.no_anti_alias {
        s.anti_alias = false;
    }
    if cli.rename {
        s.save_option = SaveOption::Rename;
    }
    if let Some(ref t) = cli.temp {
        s.temp = t.clone();
    }
    if let Some(ref d) = cli.digest {
        s.digest = Some(d.clone());
    }
    if cli.delete_source {
        s.delete_source = true;
    }
    if let Some(ref p) = cli.exec {
        s.user_program = Some(p.clone());
    }

    s.validate().context("Invalid configuration")?;
    Ok(s)
}

/// `report.ps` + PNG → `report.png`; `scan.pdf` + PDF → `scan-converted.pdf`.
fn default_destination(source: &Path, format: Format) -> PathBuf {
    let ext = format.extension().trim_start_matches('.');
    let dest = source.with_extension(ext);
    if dest != source {
        return dest;
    }
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}-converted.{ext}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("psconv").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn default_destination_swaps_extension() {
        assert_eq!(
            default_destination(Path::new("in/report.ps"), Format::Png),
            Path::new("in/report.png")
        );
    }

    #[test]
    fn default_destination_never_reuses_source() {
        assert_eq!(
            default_destination(Path::new("in/scan.pdf"), Format::Pdf),
            Path::new("in/scan-converted.pdf")
        );
        let s = build_settings(&parse(&["scan.pdf", "--delete-source"])).unwrap();
        assert_eq!(s.destination, Path::new("scan-converted.pdf"));
    }

    #[test]
    fn explicit_destination_equal_to_source_is_rejected() {
        let err = build_settings(&parse(&["scan.pdf", "-o", "scan.pdf"])).unwrap_err();
        assert!(format!("{err:#}").contains("is the source file"));
    }

    #[test]
    fn engine_flags_reach_settings() {
        let s = build_settings(&parse(&[
            "in.ps",
            "-f",
            "tiff",
            "--tiff-compression",
            "g4fax",
            "--mono-compression",
            "flate",
            "--engine-output",
            "--engine-log",
            "gs.log",
            "--font-dir",
            "/fonts",
            "--resource-dir",
            "/res",
            "--gs-option",
            "-dMaxBitmap=1000",
            "--gs-code",
            "true setglobal",
        ]))
        .unwrap();

        assert_eq!(s.tiff_compression, Encoding::G4Fax);
        assert_eq!(s.mono_compression, Encoding::Flate);
        assert!(!s.quiet);
        assert_eq!(s.log, Some(PathBuf::from("gs.log")));
        assert_eq!(s.fonts, vec![PathBuf::from("/fonts")]);
        assert_eq!(s.resources, vec![PathBuf::from("/res")]);
        assert_eq!(s.options, vec!["-dMaxBitmap=1000".to_string()]);
        assert_eq!(s.codes, vec!["true setglobal".to_string()]);
    }
}
