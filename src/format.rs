//! Output formats and their Ghostscript device names.
//!
//! Every format belongs to one of two families. Document formats (PDF,
//! PostScript, EPS, text) make Ghostscript write a single file no matter how
//! many pages the source has. Raster formats make it write one file per page,
//! which is why the workspace uses a `%08d` counter template for them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Output family, deciding how many files the engine may produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormatFamily {
    /// One output file for the whole document.
    Document,
    /// One output file per page.
    Raster,
}

/// A target format the engine can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Format {
    Text,
    Ps,
    Eps,
    #[default]
    Pdf,
    Bmp,
    BmpGray,
    BmpMono,
    Jpeg,
    JpegGray,
    JpegCmyk,
    Png,
    PngAlpha,
    PngGray,
    PngMono,
    Png256,
    Tiff,
    TiffGray,
    TiffMono,
    Psd,
    PsdCmyk,
}

impl Format {
    /// Every format, in declaration order.
    pub const ALL: [Format; 20] = [
        Format::Text,
        Format::Ps,
        Format::Eps,
        Format::Pdf,
        Format::Bmp,
        Format::BmpGray,
        Format::BmpMono,
        Format::Jpeg,
        Format::JpegGray,
        Format::JpegCmyk,
        Format::Png,
        Format::PngAlpha,
        Format::PngGray,
        Format::PngMono,
        Format::Png256,
        Format::Tiff,
        Format::TiffGray,
        Format::TiffMono,
        Format::Psd,
        Format::PsdCmyk,
    ];

    /// Ghostscript `-sDEVICE=` value.
    pub fn device(self) -> &'static str {
        match self {
            Format::Text => "txtwrite",
            Format::Ps => "ps2write",
            Format::Eps => "eps2write",
            Format::Pdf => "pdfwrite",
            Format::Bmp => "bmp16m",
            Format::BmpGray => "bmpgray",
            Format::BmpMono => "bmpmono",
            Format::Jpeg => "jpeg",
            Format::JpegGray => "jpeggray",
            Format::JpegCmyk => "jpegcmyk",
            Format::Png => "png16m",
            Format::PngAlpha => "pngalpha",
            Format::PngGray => "pnggray",
            Format::PngMono => "pngmono",
            Format::Png256 => "png256",
            Format::Tiff => "tiff24nc",
            Format::TiffGray => "tiffgray",
            Format::TiffMono => "tiffscaled",
            Format::Psd => "psdrgb",
            Format::PsdCmyk => "psdcmyk",
        }
    }

    /// File extension including the leading dot.
    pub fn extension(self) -> &'static str {
        match self {
            Format::Text => ".txt",
            Format::Ps => ".ps",
            Format::Eps => ".eps",
            Format::Pdf => ".pdf",
            Format::Bmp | Format::BmpGray | Format::BmpMono => ".bmp",
            Format::Jpeg | Format::JpegGray | Format::JpegCmyk => ".jpg",
            Format::Png | Format::PngAlpha | Format::PngGray | Format::PngMono | Format::Png256 => {
                ".png"
            }
            Format::Tiff | Format::TiffGray | Format::TiffMono => ".tiff",
            Format::Psd | Format::PsdCmyk => ".psd",
        }
    }

    pub fn family(self) -> FormatFamily {
        match self {
            Format::Text | Format::Ps | Format::Eps | Format::Pdf => FormatFamily::Document,
            _ => FormatFamily::Raster,
        }
    }

    pub fn is_jpeg(self) -> bool {
        matches!(self, Format::Jpeg | Format::JpegGray | Format::JpegCmyk)
    }

    pub fn is_tiff(self) -> bool {
        matches!(self, Format::Tiff | Format::TiffGray | Format::TiffMono)
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl FromStr for Format {
    type Err = String;

    /// Case-insensitive; accepts the variant name, the device name, or the
    /// bare extension (`jpg`, `tif`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().trim_start_matches('.').to_lowercase();
        let alias = match needle.as_str() {
            "jpg" => Some(Format::Jpeg),
            "tif" => Some(Format::Tiff),
            "txt" => Some(Format::Text),
            _ => None,
        };
        if let Some(f) = alias {
            return Ok(f);
        }

        Format::ALL
            .iter()
            .copied()
            .find(|f| f.to_string().to_lowercase() == needle || f.device() == needle)
            .ok_or_else(|| format!("Unknown format '{s}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_family() {
        for f in [Format::Text, Format::Ps, Format::Eps, Format::Pdf] {
            assert_eq!(f.family(), FormatFamily::Document, "{f}");
        }
        assert_eq!(Format::Png.family(), FormatFamily::Raster);
        assert_eq!(Format::TiffMono.family(), FormatFamily::Raster);
    }

    #[test]
    fn parse_names_devices_and_aliases() {
        assert_eq!("pdf".parse::<Format>().unwrap(), Format::Pdf);
        assert_eq!("PngGray".parse::<Format>().unwrap(), Format::PngGray);
        assert_eq!("png16m".parse::<Format>().unwrap(), Format::Png);
        assert_eq!(".jpg".parse::<Format>().unwrap(), Format::Jpeg);
        assert_eq!("tif".parse::<Format>().unwrap(), Format::Tiff);
        assert!("docx".parse::<Format>().is_err());
    }

    #[test]
    fn devices_are_unique() {
        let mut devices: Vec<_> = Format::ALL.iter().map(|f| f.device()).collect();
        devices.sort_unstable();
        devices.dedup();
        assert_eq!(devices.len(), Format::ALL.len());
    }

    #[test]
    fn extensions_have_leading_dot() {
        assert!(Format::ALL.iter().all(|f| f.extension().starts_with('.')));
    }
}
