//! Configuration types for a conversion job.
//!
//! [`Settings`] is the user-facing description of one job: what to read,
//! where to write, which format, and the knobs for the rendering engine. It
//! is built via [`SettingsBuilder`] or loaded from a JSON file, and it is
//! immutable once handed to a [`crate::facade::Facade`].
//!
//! The enums at the bottom of this file are shared by the settings and by
//! [`crate::converter::ConverterOptions`].

use crate::error::ConvertError;
use crate::format::Format;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Settings for one conversion job.
///
/// # Example
/// ```rust
/// use edgequake_psconv::{Format, SaveOption, Settings};
///
/// let settings = Settings::builder()
///     .source("report.ps")
///     .destination("out/report.pdf")
///     .format(Format::Pdf)
///     .resolution(300)
///     .save_option(SaveOption::Rename)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// File to convert (PostScript, EPS or PDF).
    pub source: PathBuf,

    /// Requested output path. Multi-page raster output gets `-01`, `-02`, …
    /// suffixes derived from this name.
    pub destination: PathBuf,

    /// Output format. Default: PDF.
    pub format: Format,

    /// What to do when the destination already exists. Default: overwrite.
    pub save_option: SaveOption,

    /// Rendering resolution in DPI. Default: 600.
    pub resolution: u32,

    pub orientation: Orientation,

    pub paper: Paper,

    pub color_mode: ColorMode,

    /// Image downsampling for document formats. Default: none.
    pub downsampling: Downsampling,

    /// PDF compatibility level. Default: 1.7.
    pub pdf_version: PdfVersion,

    /// Filter for color and gray images embedded in a PDF. Default: JPEG.
    pub compression: Encoding,

    /// Filter for monochrome images embedded in a PDF. Default: CCITT fax.
    pub mono_compression: Encoding,

    /// TIFF page compression. Default: LZW.
    pub tiff_compression: Encoding,

    /// Produce a linearized ("fast web view") PDF. Default: false.
    pub linearization: bool,

    /// Embed all fonts in document output. Default: true.
    pub embed_fonts: bool,

    /// JPEG quality 1–100. Default: 90.
    pub jpeg_quality: u32,

    /// Anti-alias text and graphics in raster output. Default: true.
    pub anti_alias: bool,

    /// Pass `-dQUIET` to the engine. Default: true.
    pub quiet: bool,

    /// Redirect engine stdout to this file.
    pub log: Option<PathBuf>,

    /// Extra PostScript resource directories (`-I`).
    pub resources: Vec<PathBuf>,

    /// Extra font directories (`-sFONTPATH`).
    pub fonts: Vec<PathBuf>,

    /// Raw engine arguments appended after the base arguments, verbatim.
    pub options: Vec<String>,

    /// PostScript statements for the `-c … -f` block, after the orientation
    /// statement.
    pub codes: Vec<String>,

    /// Root under which private workspaces are allocated. Removed on
    /// teardown. Default: `<system temp>/edgequake-psconv/<pid>`.
    pub temp: PathBuf,

    /// SHA-256 (lowercase hex) the source must still match, if recorded.
    pub digest: Option<String>,

    /// Delete the source file on teardown. Default: false.
    pub delete_source: bool,

    /// Program to launch once per produced file.
    pub user_program: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: PathBuf::new(),
            destination: PathBuf::new(),
            format: Format::default(),
            save_option: SaveOption::default(),
            resolution: 600,
            orientation: Orientation::default(),
            paper: Paper::default(),
            color_mode: ColorMode::default(),
            downsampling: Downsampling::default(),
            pdf_version: PdfVersion::default(),
            compression: Encoding::Jpeg,
            mono_compression: Encoding::Fax,
            tiff_compression: Encoding::Lzw,
            linearization: false,
            embed_fonts: true,
            jpeg_quality: 90,
            anti_alias: true,
            quiet: true,
            log: None,
            resources: Vec::new(),
            fonts: Vec::new(),
            options: Vec::new(),
            codes: Vec::new(),
            temp: default_temp_root(),
            digest: None,
            delete_source: false,
            user_program: None,
        }
    }
}

impl Settings {
    /// Create a new builder for `Settings`.
    pub fn builder() -> SettingsBuilder {
        SettingsBuilder {
            settings: Self::default(),
        }
    }

    /// Load persisted settings from a JSON file. Missing fields take their
    /// defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConvertError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        serde_json::from_str(&text).map_err(|e| {
            ConvertError::InvalidConfig(format!("{}: {e}", path.display()))
        })
    }

    /// Re-run the builder checks on an already assembled value.
    pub fn validate(&self) -> Result<(), ConvertError> {
        if self.resolution == 0 {
            return Err(ConvertError::InvalidConfig(
                "Resolution must be ≥ 1 DPI".into(),
            ));
        }
        if self.source.as_os_str().is_empty() {
            return Err(ConvertError::InvalidConfig("Source path is empty".into()));
        }
        if self.destination.as_os_str().is_empty() {
            return Err(ConvertError::InvalidConfig(
                "Destination path is empty".into(),
            ));
        }
        if self.temp.as_os_str().is_empty() {
            return Err(ConvertError::InvalidConfig("Temp root is empty".into()));
        }
        if same_path(&self.source, &self.destination) {
            return Err(ConvertError::InvalidConfig(format!(
                "Destination '{}' is the source file",
                self.destination.display()
            )));
        }
        Ok(())
    }
}

/// Per-process root so teardown never touches another process's workspaces.
fn default_temp_root() -> PathBuf {
    std::env::temp_dir()
        .join("edgequake-psconv")
        .join(std::process::id().to_string())
}

/// Equal as written, or both resolve to the same existing file.
fn same_path(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (std::fs::canonicalize(a), std::fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Builder for [`Settings`].
#[derive(Debug)]
pub struct SettingsBuilder {
    settings: Settings,
}

impl SettingsBuilder {
    pub fn source(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.source = path.into();
        self
    }

    pub fn destination(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.destination = path.into();
        self
    }

    pub fn format(mut self, format: Format) -> Self {
        self.settings.format = format;
        self
    }

    pub fn save_option(mut self, option: SaveOption) -> Self {
        self.settings.save_option = option;
        self
    }

    pub fn resolution(mut self, dpi: u32) -> Self {
        self.settings.resolution = dpi;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.settings.orientation = orientation;
        self
    }

    pub fn paper(mut self, paper: Paper) -> Self {
        self.settings.paper = paper;
        self
    }

    pub fn color_mode(mut self, mode: ColorMode) -> Self {
        self.settings.color_mode = mode;
        self
    }

    pub fn downsampling(mut self, method: Downsampling) -> Self {
        self.settings.downsampling = method;
        self
    }

    pub fn pdf_version(mut self, version: PdfVersion) -> Self {
        self.settings.pdf_version = version;
        self
    }

    pub fn compression(mut self, encoding: Encoding) -> Self {
        self.settings.compression = encoding;
        self
    }

    pub fn mono_compression(mut self, encoding: Encoding) -> Self {
        self.settings.mono_compression = encoding;
        self
    }

    pub fn tiff_compression(mut self, encoding: Encoding) -> Self {
        self.settings.tiff_compression = encoding;
        self
    }

    pub fn quiet(mut self, v: bool) -> Self {
        self.settings.quiet = v;
        self
    }

    pub fn log(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.log = Some(path.into());
        self
    }

    pub fn resource_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.resources.push(dir.into());
        self
    }

    pub fn font_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.settings.fonts.push(dir.into());
        self
    }

    /// Append one raw engine argument, e.g. `-dMaxBitmap=500000000`.
    pub fn option(mut self, token: impl Into<String>) -> Self {
        self.settings.options.push(token.into());
        self
    }

    /// Append one PostScript statement to the `-c` block.
    pub fn code(mut self, statement: impl Into<String>) -> Self {
        self.settings.codes.push(statement.into());
        self
    }

    pub fn linearization(mut self, v: bool) -> Self {
        self.settings.linearization = v;
        self
    }

    pub fn embed_fonts(mut self, v: bool) -> Self {
        self.settings.embed_fonts = v;
        self
    }

    pub fn jpeg_quality(mut self, q: u32) -> Self {
        self.settings.jpeg_quality = q;
        self
    }

    pub fn anti_alias(mut self, v: bool) -> Self {
        self.settings.anti_alias = v;
        self
    }

    pub fn temp(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings.temp = path.into();
        self
    }

    pub fn digest(mut self, digest: impl Into<String>) -> Self {
        self.settings.digest = Some(digest.into());
        self
    }

    pub fn delete_source(mut self, v: bool) -> Self {
        self.settings.delete_source = v;
        self
    }

    pub fn user_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.settings.user_program = Some(program.into());
        self
    }

    /// Build the settings, validating constraints.
    pub fn build(self) -> Result<Settings, ConvertError> {
        self.settings.validate()?;
        Ok(self.settings)
    }
}

// ── Enums ────────────────────────────────────────────────────────────────

/// Implements case-insensitive `FromStr` over the variant names.
macro_rules! parse_by_name {
    ($ty:ident { $($name:literal => $variant:ident),+ $(,)? }) => {
        impl FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    other => Err(format!(
                        concat!("Unknown ", stringify!($ty), " '{}'"),
                        other
                    )),
                }
            }
        }
    };
}

/// Behaviour when the destination file already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SaveOption {
    /// Replace the existing file. (default)
    #[default]
    Overwrite,
    /// Keep the existing file and pick `name (2).ext`, `name (3).ext`, ….
    Rename,
}

parse_by_name!(SaveOption { "overwrite" => Overwrite, "rename" => Rename });

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    /// Let the engine decide per page. (default)
    #[default]
    Auto,
    Portrait,
    Landscape,
}

parse_by_name!(Orientation { "auto" => Auto, "portrait" => Portrait, "landscape" => Landscape });

/// Fixed paper size, or `Auto` to keep the source's media.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Paper {
    #[default]
    Auto,
    A3,
    A4,
    A5,
    B4,
    B5,
    Letter,
    Legal,
}

parse_by_name!(Paper {
    "auto" => Auto, "a3" => A3, "a4" => A4, "a5" => A5,
    "b4" => B4, "b5" => B5, "letter" => Letter, "legal" => Legal,
});

/// Color conversion for document output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ColorMode {
    /// Leave colors as they are in the source. (default)
    #[default]
    SameAsSource,
    Rgb,
    Cmyk,
    Grayscale,
}

parse_by_name!(ColorMode {
    "sameassource" => SameAsSource, "same" => SameAsSource,
    "rgb" => Rgb, "cmyk" => Cmyk, "grayscale" => Grayscale, "gray" => Grayscale,
});

/// Image downsampling method for document output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Downsampling {
    #[default]
    None,
    Average,
    Bicubic,
    Subsample,
}

parse_by_name!(Downsampling {
    "none" => None, "average" => Average, "bicubic" => Bicubic, "subsample" => Subsample,
});

/// Compression encodings for image streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Encoding {
    /// No compression selected.
    #[default]
    None,
    Flate,
    Jpeg,
    Lzw,
    /// CCITT Group 3 fax.
    Fax,
    /// CCITT Group 4 fax.
    G4Fax,
    PackBits,
}

parse_by_name!(Encoding {
    "none" => None, "flate" => Flate, "jpeg" => Jpeg, "lzw" => Lzw,
    "fax" => Fax, "g4fax" => G4Fax, "packbits" => PackBits,
});

/// PDF compatibility level `major.minor`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PdfVersion {
    pub major: u32,
    pub minor: u32,
}

impl PdfVersion {
    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }
}

impl Default for PdfVersion {
    fn default() -> Self {
        Self::new(1, 7)
    }
}

impl fmt::Display for PdfVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

impl FromStr for PdfVersion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (major, minor) = s
            .trim()
            .split_once('.')
            .ok_or_else(|| format!("PDF version must look like 1.7, got '{s}'"))?;
        let major = major
            .parse()
            .map_err(|_| format!("Invalid PDF major version '{major}'"))?;
        let minor = minor
            .parse()
            .map_err(|_| format!("Invalid PDF minor version '{minor}'"))?;
        Ok(Self::new(major, minor))
    }
}
