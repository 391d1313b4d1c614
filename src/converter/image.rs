//! Raster layers: anti-aliasing for every raster device, then JPEG quality
//! or TIFF compression on top.

use super::Converter;
use crate::argument::Argument;
use crate::config::Encoding;

/// Clamp a JPEG quality factor into 1–100.
pub fn clamp_quality(quality: u32) -> u32 {
    quality.clamp(1, 100)
}

pub(super) fn extend(c: &Converter, _revision: Option<u32>, args: &mut Vec<Argument>) {
    if c.options.anti_alias {
        args.push(Argument::pair('d', "TextAlphaBits", "4"));
        args.push(Argument::pair('d', "GraphicsAlphaBits", "4"));
    }
}

pub(super) fn extend_jpeg(c: &Converter, _revision: Option<u32>, args: &mut Vec<Argument>) {
    args.push(Argument::pair(
        'd',
        "JPEGQ",
        clamp_quality(c.options.quality).to_string(),
    ));
}

pub(super) fn extend_tiff(c: &Converter, _revision: Option<u32>, args: &mut Vec<Argument>) {
    if let Some(name) = tiff_compression(c.options.tiff_compression) {
        args.push(Argument::pair('s', "Compression", name));
    }
}

fn tiff_compression(encoding: Encoding) -> Option<&'static str> {
    match encoding {
        Encoding::Fax => Some("g3"),
        Encoding::G4Fax => Some("g4"),
        Encoding::Lzw => Some("lzw"),
        Encoding::PackBits => Some("pack"),
        Encoding::None | Encoding::Flate | Encoding::Jpeg => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use std::path::{Path, PathBuf};

    fn compile(c: &Converter) -> Vec<String> {
        c.arguments(None, &[PathBuf::from("a.ps")], Path::new("tmp-%08d.png"))
    }

    #[test]
    fn quality_is_clamped() {
        assert_eq!(clamp_quality(0), 1);
        assert_eq!(clamp_quality(1), 1);
        assert_eq!(clamp_quality(75), 75);
        assert_eq!(clamp_quality(100), 100);
        assert_eq!(clamp_quality(250), 100);
    }

    #[test]
    fn jpeg_quality_argument() {
        let mut c = Converter::jpeg(Format::JpegGray).unwrap();
        assert!(compile(&c).contains(&"-dJPEGQ=90".to_string()));
        c.options.quality = 0;
        assert!(compile(&c).contains(&"-dJPEGQ=1".to_string()));
        c.options.quality = 101;
        assert!(compile(&c).contains(&"-dJPEGQ=100".to_string()));
    }

    #[test]
    fn anti_aliasing_toggle() {
        let mut c = Converter::image(Format::Png).unwrap();
        assert!(compile(&c).contains(&"-dTextAlphaBits=4".to_string()));
        c.options.anti_alias = false;
        assert!(!compile(&c).iter().any(|a| a.contains("AlphaBits")));
    }

    #[test]
    fn tiff_compression_names() {
        let mut c = Converter::tiff(Format::TiffMono).unwrap();
        assert!(compile(&c).contains(&"-sCompression=lzw".to_string()));

        for (encoding, name) in [
            (Encoding::Fax, "g3"),
            (Encoding::G4Fax, "g4"),
            (Encoding::PackBits, "pack"),
        ] {
            c.options.tiff_compression = encoding;
            assert!(compile(&c).contains(&format!("-sCompression={name}")));
        }

        c.options.tiff_compression = Encoding::Jpeg;
        assert!(!compile(&c).iter().any(|a| a.starts_with("-sCompression")));
    }

    #[test]
    fn image_kind_skips_format_layers() {
        let c = Converter::image(Format::Jpeg).unwrap();
        assert!(!compile(&c).iter().any(|a| a.starts_with("-dJPEGQ")));
    }
}
