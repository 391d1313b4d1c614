//! PDF layer: image stream filters, compatibility level and linearization.

use super::Converter;
use crate::argument::Argument;
use crate::config::Encoding;

/// Engine revision whose new PDF interpreter mishandles our inputs; for it we
/// fall back to the legacy interpreter.
pub const LEGACY_REVISION: u32 = 956;

pub(super) fn extend(c: &Converter, revision: Option<u32>, args: &mut Vec<Argument>) {
    let o = &c.options;

    let channels = [
        ("Color", o.compression),
        ("Gray", o.compression),
        ("Mono", o.mono_compression),
    ];
    for (channel, encoding) in channels {
        match filter(encoding) {
            Some(name) => {
                args.push(Argument::boolean(format!("Encode{channel}Images"), true));
                args.push(Argument::boolean(format!("AutoFilter{channel}Images"), false));
                args.push(Argument::literal('d', format!("{channel}ImageFilter"), name));
            }
            None => args.push(Argument::boolean(format!("Encode{channel}Images"), false)),
        }
    }

    args.push(Argument::pair('d', "CompatibilityLevel", o.version.to_string()));
    if o.linearization {
        args.push(Argument::named('d', "FastWebView"));
    }
    if revision == Some(LEGACY_REVISION) {
        args.push(Argument::boolean("NEWPDF", false));
    }
}

fn filter(encoding: Encoding) -> Option<&'static str> {
    match encoding {
        Encoding::None => None,
        Encoding::Flate => Some("FlateEncode"),
        Encoding::Jpeg => Some("DCTEncode"),
        Encoding::Lzw => Some("LZWEncode"),
        Encoding::Fax | Encoding::G4Fax => Some("CCITTFaxEncode"),
        Encoding::PackBits => Some("RunLengthEncode"),
    }
}
