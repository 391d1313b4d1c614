//! Tokens of the Ghostscript command-line protocol.
//!
//! An [`Argument`] renders as `-{type}{name}[={/}{value}]`:
//!
//! ```text
//! type  name        value      literal   rendered
//! 's'   DEVICE      pdfwrite   no        -sDEVICE=pdfwrite
//! 'd'   AutoRotate… None       yes       -dAutoRotatePages=/None
//! 'r'   600         -          -         -r600
//! 'f'   -           -          -         -f
//! -     -           in.ps      no        in.ps
//! ```
//!
//! A [`Code`] is a raw PostScript statement placed between `-c` and `-f`.

use std::fmt;

/// Invocation-name placeholder. Ghostscript ignores `argv[0]`, so every
/// vector starts with this slot.
const DUMMY_NAME: &str = "gs";

/// One token of the engine's argument vector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    kind: Option<char>,
    name: String,
    value: String,
    literal: bool,
}

impl Argument {
    /// Full constructor.
    pub fn new(
        kind: Option<char>,
        name: impl Into<String>,
        value: impl Into<String>,
        literal: bool,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            value: value.into(),
            literal,
        }
    }

    /// The leading invocation-name slot.
    pub fn dummy() -> Self {
        Self::new(None, DUMMY_NAME, "", false)
    }

    /// `-{kind}` with nothing else, e.g. `-f`.
    pub fn flag(kind: char) -> Self {
        Self::new(Some(kind), "", "", false)
    }

    /// `-{kind}{name}`, e.g. `-dSAFER` or `-r600`.
    pub fn named(kind: char, name: impl Into<String>) -> Self {
        Self::new(Some(kind), name, "", false)
    }

    /// `-{kind}{name}={value}`.
    pub fn pair(kind: char, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(Some(kind), name, value, false)
    }

    /// `-{kind}{name}=/{value}`, a PostScript name literal.
    pub fn literal(kind: char, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(Some(kind), name, value, true)
    }

    /// `-d{name}=true|false`.
    pub fn boolean(name: impl Into<String>, value: bool) -> Self {
        Self::pair('d', name, value.to_string())
    }

    /// A bare value such as a source path.
    pub fn value(value: impl Into<String>) -> Self {
        Self::new(None, "", value, false)
    }

    pub fn kind(&self) -> Option<char> {
        self.kind
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_str(&self) -> &str {
        &self.value
    }

    pub fn is_literal(&self) -> bool {
        self.literal
    }
}

impl fmt::Display for Argument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(kind) = self.kind {
            write!(f, "-{kind}")?;
        }
        f.write_str(&self.name)?;
        if !self.value.is_empty() {
            if !self.name.is_empty() {
                f.write_str("=")?;
            }
            if self.literal {
                f.write_str("/")?;
            }
            f.write_str(&self.value)?;
        }
        Ok(())
    }
}

/// A raw PostScript statement for the `-c … -f` block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Code(String);

impl Code {
    pub fn new(statement: impl Into<String>) -> Self {
        Self(statement.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_each_shape() {
        assert_eq!(Argument::pair('s', "DEVICE", "pdfwrite").to_string(), "-sDEVICE=pdfwrite");
        assert_eq!(
            Argument::literal('d', "AutoRotatePages", "None").to_string(),
            "-dAutoRotatePages=/None"
        );
        assert_eq!(Argument::named('r', "600").to_string(), "-r600");
        assert_eq!(Argument::named('d', "SAFER").to_string(), "-dSAFER");
        assert_eq!(Argument::flag('f').to_string(), "-f");
        assert_eq!(Argument::value("in.ps").to_string(), "in.ps");
        assert_eq!(Argument::boolean("EmbedAllFonts", true).to_string(), "-dEmbedAllFonts=true");
    }

    #[test]
    fn dummy_is_plain_name() {
        assert_eq!(Argument::dummy().to_string(), "gs");
    }

    #[test]
    fn empty_value_never_leaves_equals() {
        for literal in [false, true] {
            let a = Argument::new(Some('d'), "FastWebView", "", literal);
            assert_eq!(a.to_string(), "-dFastWebView");
            assert!(!a.to_string().ends_with('='));
        }
    }

    #[test]
    fn value_without_name_has_no_equals() {
        assert_eq!(Argument::new(Some('I'), "", "/usr/share/fonts", false).to_string(), "-I/usr/share/fonts");
        assert_eq!(Argument::new(None, "", "Bicubic", true).to_string(), "/Bicubic");
    }

    #[test]
    fn literal_marker_only_when_literal() {
        let values = ["a", "RGB", "x y"];
        for v in values {
            let lit = Argument::literal('s', "K", v).to_string();
            let plain = Argument::pair('s', "K", v).to_string();
            assert!(lit.contains("=/"), "{lit}");
            assert!(!plain.contains('/'), "{plain}");
        }
    }

    #[test]
    fn no_kind_no_dash() {
        assert!(!Argument::new(None, "name", "v", false).to_string().starts_with('-'));
    }

    #[test]
    fn code_renders_raw() {
        let c = Code::new("<</Orientation 3>> setpagedevice");
        assert_eq!(c.to_string(), "<</Orientation 3>> setpagedevice");
        assert_eq!(c.as_str(), c.to_string());
    }
}
