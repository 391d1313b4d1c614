//! Compile conversion options into a Ghostscript argument vector.
//!
//! A [`Converter`] is a format plus a [`ConverterKind`] tag plus a bag of
//! [`ConverterOptions`]. The kind selects which option groups matter and
//! which argument layers are appended after the base arguments:
//!
//! ```text
//! kind      supported formats        layers (in order)
//! Generic   every format             -
//! Document  Ps, Eps, Pdf             document
//! Pdf       Pdf                      document, pdf
//! Image     every raster format      image
//! Jpeg      Jpeg, JpegGray, JpegCmyk image, jpeg
//! Tiff      Tiff, TiffGray, TiffMono image, tiff
//! ```
//!
//! Every layer is a pure function that appends to the list built by the
//! layers before it, so later layers refine earlier ones.
//!
//! The compiled vector is, in order: the dummy slot, base arguments, the
//! kind's layers, an optional `-c <codes> -f` block, `-f`, then the sources.

mod document;
mod image;
mod pdf;

pub use document::mono_resolution;
pub use image::clamp_quality;
pub use pdf::LEGACY_REVISION;

use crate::argument::{Argument, Code};
use crate::config::{ColorMode, Downsampling, Encoding, Orientation, Paper, PdfVersion, Settings};
use crate::error::ConvertError;
use crate::format::{Format, FormatFamily};
use crate::io::{FileSystem, LocalFileSystem};
use crate::pipeline::render::Engine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Separator Ghostscript expects between directories in `-I` and `FONTPATH`.
const SEARCH_PATH_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// One argument layer: appends kind-specific tokens.
type Layer = fn(&Converter, Option<u32>, &mut Vec<Argument>);

const DOCUMENT_LAYERS: &[Layer] = &[document::extend];
const PDF_LAYERS: &[Layer] = &[document::extend, pdf::extend];
const IMAGE_LAYERS: &[Layer] = &[image::extend];
const JPEG_LAYERS: &[Layer] = &[image::extend, image::extend_jpeg];
const TIFF_LAYERS: &[Layer] = &[image::extend, image::extend_tiff];

/// Which family of options a converter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConverterKind {
    Generic,
    Document,
    Pdf,
    Image,
    Jpeg,
    Tiff,
}

impl ConverterKind {
    /// Whether a converter of this kind can produce `format`.
    pub fn supports(self, format: Format) -> bool {
        match self {
            ConverterKind::Generic => true,
            ConverterKind::Document => matches!(format, Format::Ps | Format::Eps | Format::Pdf),
            ConverterKind::Pdf => format == Format::Pdf,
            ConverterKind::Image => format.family() == FormatFamily::Raster,
            ConverterKind::Jpeg => format.is_jpeg(),
            ConverterKind::Tiff => format.is_tiff(),
        }
    }

    pub fn supported_formats(self) -> Vec<Format> {
        Format::ALL.into_iter().filter(|f| self.supports(*f)).collect()
    }

    /// The narrowest kind that supports `format`.
    pub fn most_specific(format: Format) -> Self {
        match format {
            Format::Pdf => ConverterKind::Pdf,
            Format::Ps | Format::Eps => ConverterKind::Document,
            Format::Text => ConverterKind::Generic,
            f if f.is_jpeg() => ConverterKind::Jpeg,
            f if f.is_tiff() => ConverterKind::Tiff,
            _ => ConverterKind::Image,
        }
    }

    fn layers(self) -> &'static [Layer] {
        match self {
            ConverterKind::Generic => &[],
            ConverterKind::Document => DOCUMENT_LAYERS,
            ConverterKind::Pdf => PDF_LAYERS,
            ConverterKind::Image => IMAGE_LAYERS,
            ConverterKind::Jpeg => JPEG_LAYERS,
            ConverterKind::Tiff => TIFF_LAYERS,
        }
    }
}

impl fmt::Display for ConverterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ConverterKind::Generic => "generic",
            ConverterKind::Document => "document",
            ConverterKind::Pdf => "pdf",
            ConverterKind::Image => "image",
            ConverterKind::Jpeg => "jpeg",
            ConverterKind::Tiff => "tiff",
        };
        f.write_str(name)
    }
}

/// Mutable settings surface of a converter. Layers read only the fields that
/// concern them.
#[derive(Debug, Clone, PartialEq)]
pub struct ConverterOptions {
    /// Rendering DPI. Default: 600.
    pub resolution: u32,
    pub orientation: Orientation,
    pub paper: Paper,

    // Document
    pub color_mode: ColorMode,
    pub downsampling: Downsampling,
    /// Default: true.
    pub embed_fonts: bool,

    // PDF
    pub version: PdfVersion,
    /// Filter for color and gray image streams. Default: JPEG.
    pub compression: Encoding,
    /// Filter for monochrome image streams. Default: CCITT fax.
    pub mono_compression: Encoding,
    pub linearization: bool,

    // Raster
    /// Default: true.
    pub anti_alias: bool,
    /// 1–100, clamped when compiled. Default: 90.
    pub quality: u32,
    /// Default: LZW.
    pub tiff_compression: Encoding,

    // Engine environment
    /// Pass `-dQUIET`. Default: true.
    pub quiet: bool,
    /// Redirect engine stdout to this file.
    pub log: Option<PathBuf>,
    /// Working directory exported to the engine as `TEMP`/`TMPDIR`.
    pub temp: Option<PathBuf>,

    pub resources: Vec<PathBuf>,
    pub fonts: Vec<PathBuf>,
    /// Extra arguments appended after the base arguments.
    pub options: Vec<Argument>,
    /// Extra PostScript statements for the `-c` block.
    pub codes: Vec<Code>,
}

impl Default for ConverterOptions {
    fn default() -> Self {
        Self {
            resolution: 600,
            orientation: Orientation::default(),
            paper: Paper::default(),
            color_mode: ColorMode::default(),
            downsampling: Downsampling::default(),
            embed_fonts: true,
            version: PdfVersion::default(),
            compression: Encoding::Jpeg,
            mono_compression: Encoding::Fax,
            linearization: false,
            anti_alias: true,
            quality: 90,
            tiff_compression: Encoding::Lzw,
            quiet: true,
            log: None,
            temp: None,
            resources: Vec::new(),
            fonts: Vec::new(),
            options: Vec::new(),
            codes: Vec::new(),
        }
    }
}

/// A format-specific argument compiler bound to a filesystem.
#[derive(Clone)]
pub struct Converter {
    kind: ConverterKind,
    format: Format,
    fs: Arc<dyn FileSystem>,
    pub options: ConverterOptions,
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("kind", &self.kind)
            .field("format", &self.format)
            .field("fs", &"<dyn FileSystem>")
            .field("options", &self.options)
            .finish()
    }
}

impl Converter {
    /// Create a converter, failing if `kind` cannot produce `format`.
    pub fn new(kind: ConverterKind, format: Format) -> Result<Self, ConvertError> {
        if !kind.supports(format) {
            return Err(ConvertError::UnsupportedFormat { format, kind });
        }
        Ok(Self {
            kind,
            format,
            fs: Arc::new(LocalFileSystem),
            options: ConverterOptions::default(),
        })
    }

    pub fn generic(format: Format) -> Result<Self, ConvertError> {
        Self::new(ConverterKind::Generic, format)
    }

    pub fn document(format: Format) -> Result<Self, ConvertError> {
        Self::new(ConverterKind::Document, format)
    }

    pub fn pdf(format: Format) -> Result<Self, ConvertError> {
        Self::new(ConverterKind::Pdf, format)
    }

    pub fn image(format: Format) -> Result<Self, ConvertError> {
        Self::new(ConverterKind::Image, format)
    }

    pub fn jpeg(format: Format) -> Result<Self, ConvertError> {
        Self::new(ConverterKind::Jpeg, format)
    }

    pub fn tiff(format: Format) -> Result<Self, ConvertError> {
        Self::new(ConverterKind::Tiff, format)
    }

    /// Converter of the narrowest kind for `format`.
    pub fn for_format(format: Format) -> Result<Self, ConvertError> {
        Self::new(ConverterKind::most_specific(format), format)
    }

    /// Replace the filesystem used to prepare the destination directory.
    pub fn with_file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn kind(&self) -> ConverterKind {
        self.kind
    }

    pub fn format(&self) -> Format {
        self.format
    }

    /// Compile the full argument vector for rendering `sources` into `dest`.
    ///
    /// `revision` is the detected engine revision; it only affects the
    /// legacy PDF shim.
    pub fn arguments(&self, revision: Option<u32>, sources: &[PathBuf], dest: &Path) -> Vec<String> {
        let mut args = vec![Argument::dummy()];
        self.base_arguments(dest, &mut args);
        for layer in self.kind.layers() {
            layer(self, revision, &mut args);
        }

        let mut tokens: Vec<String> = args.iter().map(ToString::to_string).collect();

        let codes = self.codes();
        if !codes.is_empty() {
            tokens.push(Argument::flag('c').to_string());
            tokens.extend(codes.iter().map(ToString::to_string));
            tokens.push(Argument::flag('f').to_string());
        }

        tokens.push(Argument::flag('f').to_string());
        tokens.extend(
            sources
                .iter()
                .map(|s| Argument::value(s.to_string_lossy()).to_string()),
        );
        tokens
    }

    /// Render `sources` into `dest` with `engine`, creating the parent
    /// directory of `dest` first.
    pub fn invoke(
        &self,
        engine: &dyn Engine,
        sources: &[PathBuf],
        dest: &Path,
    ) -> Result<(), ConvertError> {
        if let Some(parent) = dest.parent() {
            if !parent.as_os_str().is_empty() && !self.fs.exists(parent) {
                self.fs.create_dir_all(parent)?;
            }
        }

        let args = self.arguments(engine.revision(), sources, dest);
        debug!("Engine arguments: {:?}", args);
        engine.run(&args, self.options.temp.as_deref())
    }

    /// Orientation statement first, then caller codes.
    fn codes(&self) -> Vec<Code> {
        let mut codes = Vec::with_capacity(self.options.codes.len() + 1);
        match self.options.orientation {
            Orientation::Portrait => codes.push(Code::new("<</Orientation 0>> setpagedevice")),
            Orientation::Landscape => codes.push(Code::new("<</Orientation 3>> setpagedevice")),
            Orientation::Auto => {}
        }
        codes.extend(self.options.codes.iter().cloned());
        codes
    }

    fn base_arguments(&self, dest: &Path, args: &mut Vec<Argument>) {
        let o = &self.options;

        args.push(Argument::pair('s', "DEVICE", self.format.device()));
        args.push(Argument::named('d', "NOPAUSE"));
        args.push(Argument::named('d', "BATCH"));
        args.push(Argument::named('d', "SAFER"));
        if o.quiet {
            args.push(Argument::named('d', "QUIET"));
        }
        if let Some(ref log) = o.log {
            args.push(Argument::pair('s', "stdout", log.to_string_lossy()));
        }
        if !o.resources.is_empty() {
            args.push(Argument::new(Some('I'), "", join_search_path(&o.resources), false));
        }
        if !o.fonts.is_empty() {
            args.push(Argument::pair('s', "FONTPATH", join_search_path(&o.fonts)));
        }
        args.push(Argument::named('r', o.resolution.to_string()));
        if let Some(name) = paper_name(o.paper) {
            args.push(Argument::pair('s', "PAPERSIZE", name));
            args.push(Argument::named('d', "FIXEDMEDIA"));
            args.push(Argument::named('d', "PDFFitPage"));
        }
        args.extend(o.options.iter().cloned());
        args.push(Argument::pair('s', "OutputFile", dest.to_string_lossy()));
    }
}

impl Settings {
    /// The narrowest converter for [`Settings::format`], with every option
    /// this value carries copied across.
    pub fn converter(&self) -> Result<Converter, ConvertError> {
        let mut converter = Converter::for_format(self.format)?;
        let o = &mut converter.options;
        o.resolution = self.resolution;
        o.orientation = self.orientation;
        o.paper = self.paper;
        o.color_mode = self.color_mode;
        o.downsampling = self.downsampling;
        o.embed_fonts = self.embed_fonts;
        o.version = self.pdf_version;
        o.compression = self.compression;
        o.mono_compression = self.mono_compression;
        o.tiff_compression = self.tiff_compression;
        o.linearization = self.linearization;
        o.anti_alias = self.anti_alias;
        o.quality = self.jpeg_quality;
        o.quiet = self.quiet;
        o.log = self.log.clone();
        o.resources = self.resources.clone();
        o.fonts = self.fonts.clone();
        o.options = self.options.iter().map(|t| Argument::value(t.as_str())).collect();
        o.codes = self.codes.iter().map(|c| Code::new(c.as_str())).collect();
        o.temp = Some(self.temp.clone());
        Ok(converter)
    }
}

fn paper_name(paper: Paper) -> Option<&'static str> {
    match paper {
        Paper::Auto => None,
        Paper::A3 => Some("a3"),
        Paper::A4 => Some("a4"),
        Paper::A5 => Some("a5"),
        Paper::B4 => Some("b4"),
        Paper::B5 => Some("b5"),
        Paper::Letter => Some("letter"),
        Paper::Legal => Some("legal"),
    }
}

fn join_search_path(dirs: &[PathBuf]) -> String {
    dirs.iter()
        .map(|d| d.to_string_lossy().to_string())
        .collect::<Vec<_>>()
        .join(SEARCH_PATH_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(c: &Converter) -> Vec<String> {
        c.arguments(None, &[PathBuf::from("in.ps")], Path::new("out/tmp.pdf"))
    }

    fn position(args: &[String], token: &str) -> usize {
        args.iter()
            .position(|a| a == token)
            .unwrap_or_else(|| panic!("{token} missing from {args:?}"))
    }

    #[test]
    fn every_constructor_rejects_unsupported_formats() {
        assert!(Converter::pdf(Format::Png).is_err());
        assert!(Converter::document(Format::Jpeg).is_err());
        assert!(Converter::image(Format::Pdf).is_err());
        assert!(Converter::jpeg(Format::Png).is_err());
        assert!(Converter::tiff(Format::Jpeg).is_err());
        assert!(Converter::new(ConverterKind::Document, Format::Text).is_err());
    }

    #[test]
    fn unsupported_error_names_format_and_kind() {
        let err = Converter::tiff(Format::Png).unwrap_err();
        match err {
            ConvertError::UnsupportedFormat { format, kind } => {
                assert_eq!(format, Format::Png);
                assert_eq!(kind, ConverterKind::Tiff);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn generic_accepts_everything() {
        for f in Format::ALL {
            assert!(Converter::generic(f).is_ok(), "{f}");
            assert!(Converter::for_format(f).is_ok(), "{f}");
        }
    }

    #[test]
    fn most_specific_kind() {
        assert_eq!(ConverterKind::most_specific(Format::Pdf), ConverterKind::Pdf);
        assert_eq!(ConverterKind::most_specific(Format::Eps), ConverterKind::Document);
        assert_eq!(ConverterKind::most_specific(Format::JpegGray), ConverterKind::Jpeg);
        assert_eq!(ConverterKind::most_specific(Format::TiffMono), ConverterKind::Tiff);
        assert_eq!(ConverterKind::most_specific(Format::PngAlpha), ConverterKind::Image);
        assert_eq!(ConverterKind::most_specific(Format::Text), ConverterKind::Generic);
    }

    #[test]
    fn vector_order_is_fixed() {
        let mut c = Converter::generic(Format::Png).unwrap();
        c.options.codes.push(Code::new("true setglobal"));
        let args = compile(&c);

        assert_eq!(args[0], "gs");
        assert_eq!(args[1], "-sDEVICE=png16m");
        let out = position(&args, "-sOutputFile=out/tmp.pdf");
        let code_start = position(&args, "-c");
        assert!(out < code_start);
        assert_eq!(args[code_start + 1], "true setglobal");
        assert_eq!(args[code_start + 2], "-f");
        assert_eq!(args[code_start + 3], "-f");
        assert_eq!(args.last().unwrap(), "in.ps");
    }

    #[test]
    fn no_code_block_without_codes() {
        let c = Converter::generic(Format::Png).unwrap();
        let args = compile(&c);
        assert!(!args.contains(&"-c".to_string()));
        assert_eq!(args[args.len() - 2], "-f");
    }

    #[test]
    fn orientation_code_precedes_caller_codes() {
        let mut c = Converter::generic(Format::Png).unwrap();
        c.options.orientation = Orientation::Landscape;
        c.options.codes.push(Code::new("caller"));
        let args = compile(&c);
        let start = position(&args, "-c");
        assert_eq!(args[start + 1], "<</Orientation 3>> setpagedevice");
        assert_eq!(args[start + 2], "caller");
    }

    #[test]
    fn base_arguments_follow_options() {
        let mut c = Converter::generic(Format::Pdf).unwrap();
        c.options.quiet = false;
        c.options.log = Some(PathBuf::from("gs.log"));
        c.options.resources = vec![PathBuf::from("r1"), PathBuf::from("r2")];
        c.options.fonts = vec![PathBuf::from("f1")];
        c.options.resolution = 150;
        c.options.paper = Paper::A4;
        c.options.options.push(Argument::named('d', "NOINTERPOLATE"));
        let args = compile(&c);

        assert!(!args.contains(&"-dQUIET".to_string()));
        assert!(args.contains(&"-sstdout=gs.log".to_string()));
        assert!(args.contains(&format!("-Ir1{SEARCH_PATH_SEPARATOR}r2")));
        assert!(args.contains(&"-sFONTPATH=f1".to_string()));
        assert!(args.contains(&"-r150".to_string()));
        assert!(args.contains(&"-sPAPERSIZE=a4".to_string()));
        assert!(args.contains(&"-dFIXEDMEDIA".to_string()));
        assert!(position(&args, "-dNOINTERPOLATE") < position(&args, "-sOutputFile=out/tmp.pdf"));
    }

    #[test]
    fn auto_paper_emits_nothing() {
        let c = Converter::generic(Format::Pdf).unwrap();
        let args = compile(&c);
        assert!(!args.iter().any(|a| a.contains("PAPERSIZE") || a == "-dFIXEDMEDIA"));
        assert!(args.contains(&"-dQUIET".to_string()));
        assert!(args.contains(&"-r600".to_string()));
    }

    #[test]
    fn settings_pick_narrowest_kind() {
        let settings = Settings::builder()
            .source("in.ps")
            .destination("out.jpg")
            .format(Format::JpegCmyk)
            .jpeg_quality(40)
            .resolution(150)
            .build()
            .unwrap();
        let c = settings.converter().unwrap();
        assert_eq!(c.kind(), ConverterKind::Jpeg);
        assert_eq!(c.options.quality, 40);
        assert_eq!(c.options.resolution, 150);
        assert_eq!(c.options.temp.as_deref(), Some(settings.temp.as_path()));
    }

    #[test]
    fn settings_carry_engine_surface() {
        let settings = Settings::builder()
            .source("in.ps")
            .destination("out.tif")
            .format(Format::TiffMono)
            .tiff_compression(Encoding::G4Fax)
            .quiet(false)
            .log("gs.log")
            .font_dir("/fonts")
            .option("-dMaxBitmap=1000")
            .code("true setglobal")
            .build()
            .unwrap();
        let args = compile(&settings.converter().unwrap());

        assert!(args.contains(&"-sCompression=g4".to_string()));
        assert!(!args.contains(&"-dQUIET".to_string()));
        assert!(args.contains(&"-sstdout=gs.log".to_string()));
        assert!(args.contains(&"-sFONTPATH=/fonts".to_string()));
        assert!(position(&args, "-dMaxBitmap=1000") < position(&args, "-sOutputFile=out/tmp.pdf"));
        assert_eq!(args[position(&args, "-c") + 1], "true setglobal");
    }

    #[test]
    fn pdf_layers_run_document_first() {
        let c = Converter::pdf(Format::Pdf).unwrap();
        let args = compile(&c);
        assert!(position(&args, "-dEmbedAllFonts=true") < position(&args, "-dCompatibilityLevel=1.7"));
    }
}
