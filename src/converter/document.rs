//! Document layer: font embedding, page rotation, color conversion and image
//! downsampling for the vector output devices.

use super::Converter;
use crate::argument::Argument;
use crate::config::{ColorMode, Downsampling, Orientation};

/// Monochrome images are kept at print resolution or better.
pub fn mono_resolution(resolution: u32) -> u32 {
    if resolution < 300 {
        300
    } else if resolution < 1200 {
        1200
    } else {
        resolution
    }
}

pub(super) fn extend(c: &Converter, _revision: Option<u32>, args: &mut Vec<Argument>) {
    let o = &c.options;

    args.push(Argument::boolean("EmbedAllFonts", o.embed_fonts));
    if o.embed_fonts {
        args.push(Argument::boolean("SubsetFonts", true));
    }

    let rotate = match o.orientation {
        Orientation::Auto => "PageByPage",
        Orientation::Portrait | Orientation::Landscape => "None",
    };
    args.push(Argument::literal('d', "AutoRotatePages", rotate));

    if let Some(strategy) = color_strategy(o.color_mode) {
        args.push(Argument::literal('d', "ColorConversionStrategy", strategy));
        args.push(Argument::literal('d', "ProcessColorModel", process_model(o.color_mode)));
    }

    let downsample = o.downsampling != Downsampling::None;
    let channels = [
        ("Color", o.resolution),
        ("Gray", o.resolution),
        ("Mono", mono_resolution(o.resolution)),
    ];
    for (channel, resolution) in channels {
        args.push(Argument::boolean(format!("Downsample{channel}Images"), downsample));
        args.push(Argument::pair(
            'd',
            format!("{channel}ImageResolution"),
            resolution.to_string(),
        ));
        if let Some(method) = downsample_method(o.downsampling) {
            args.push(Argument::literal('d', format!("{channel}ImageDownsampleType"), method));
        }
    }
}

fn color_strategy(mode: ColorMode) -> Option<&'static str> {
    match mode {
        ColorMode::SameAsSource => None,
        ColorMode::Rgb => Some("RGB"),
        ColorMode::Cmyk => Some("CMYK"),
        ColorMode::Grayscale => Some("Gray"),
    }
}

fn process_model(mode: ColorMode) -> &'static str {
    match mode {
        ColorMode::Cmyk => "DeviceCMYK",
        ColorMode::Grayscale => "DeviceGray",
        ColorMode::Rgb | ColorMode::SameAsSource => "DeviceRGB",
    }
}

fn downsample_method(method: Downsampling) -> Option<&'static str> {
    match method {
        Downsampling::None => None,
        Downsampling::Average => Some("Average"),
        Downsampling::Bicubic => Some("Bicubic"),
        Downsampling::Subsample => Some("Subsample"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::Format;
    use std::path::{Path, PathBuf};

    fn compile(c: &Converter) -> Vec<String> {
        c.arguments(None, &[PathBuf::from("a.ps")], Path::new("tmp.pdf"))
    }

    #[test]
    fn mono_resolution_snaps_up() {
        assert_eq!(mono_resolution(72), 300);
        assert_eq!(mono_resolution(299), 300);
        assert_eq!(mono_resolution(300), 1200);
        assert_eq!(mono_resolution(600), 1200);
        assert_eq!(mono_resolution(1199), 1200);
        assert_eq!(mono_resolution(1200), 1200);
        assert_eq!(mono_resolution(2400), 2400);
    }

    #[test]
    fn mono_resolution_never_lowers() {
        for r in [1, 150, 300, 720, 1200, 4800] {
            assert!(mono_resolution(r) >= r);
        }
    }

    #[test]
    fn per_channel_resolutions() {
        let mut c = Converter::document(Format::Pdf).unwrap();
        c.options.resolution = 72;
        let args = compile(&c);
        assert!(args.contains(&"-dColorImageResolution=72".to_string()));
        assert!(args.contains(&"-dGrayImageResolution=72".to_string()));
        assert!(args.contains(&"-dMonoImageResolution=300".to_string()));
    }

    #[test]
    fn downsampling_off_by_default() {
        let c = Converter::document(Format::Ps).unwrap();
        let args = compile(&c);
        assert!(args.contains(&"-dDownsampleColorImages=false".to_string()));
        assert!(!args.iter().any(|a| a.contains("DownsampleType")));
    }

    #[test]
    fn downsampling_method_per_channel() {
        let mut c = Converter::document(Format::Pdf).unwrap();
        c.options.downsampling = Downsampling::Bicubic;
        let args = compile(&c);
        for ch in ["Color", "Gray", "Mono"] {
            assert!(args.contains(&format!("-dDownsample{ch}Images=true")));
            assert!(args.contains(&format!("-d{ch}ImageDownsampleType=/Bicubic")));
        }
    }

    #[test]
    fn subset_only_when_embedding() {
        let mut c = Converter::document(Format::Pdf).unwrap();
        assert!(compile(&c).contains(&"-dSubsetFonts=true".to_string()));

        c.options.embed_fonts = false;
        let args = compile(&c);
        assert!(args.contains(&"-dEmbedAllFonts=false".to_string()));
        assert!(!args.iter().any(|a| a.starts_with("-dSubsetFonts")));
    }

    #[test]
    fn rotation_and_color() {
        let mut c = Converter::document(Format::Pdf).unwrap();
        assert!(compile(&c).contains(&"-dAutoRotatePages=/PageByPage".to_string()));
        assert!(!compile(&c).iter().any(|a| a.contains("ColorConversionStrategy")));

        c.options.orientation = Orientation::Portrait;
        c.options.color_mode = ColorMode::Grayscale;
        let args = compile(&c);
        assert!(args.contains(&"-dAutoRotatePages=/None".to_string()));
        assert!(args.contains(&"-dColorConversionStrategy=/Gray".to_string()));
        assert!(args.contains(&"-dProcessColorModel=/DeviceGray".to_string()));
    }
}
