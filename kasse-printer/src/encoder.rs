//! Print directives and the family-independent encoder

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::dialect::{Dialect, DirectiveKind, PrinterFamily};
use crate::encoding::Charset;
use crate::error::{PrintError, PrintResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSize {
    Normal,
    DoubleHeight,
    DoubleWidth,
    Double,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutMode {
    Full,
    /// Leaves a small connection
    Partial,
}

/// Abstract print instruction, independent of the printer family
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Directive {
    InitializePrinter,
    /// Switch the code page used for following `Text` directives
    SelectCharset(Charset),
    SetAlignment(Alignment),
    SetBold(bool),
    SetSize(TextSize),
    /// Raw text; `\n` ends a line
    Text(String),
    FeedLines(u8),
    Cut(CutMode),
}

impl Directive {
    /// Table key for this directive, `None` for text
    pub fn kind(&self) -> Option<DirectiveKind> {
        let kind = match self {
            Directive::InitializePrinter => DirectiveKind::Initialize,
            Directive::SelectCharset(charset) => DirectiveKind::for_charset(*charset),
            Directive::SetAlignment(Alignment::Left) => DirectiveKind::AlignLeft,
            Directive::SetAlignment(Alignment::Center) => DirectiveKind::AlignCenter,
            Directive::SetAlignment(Alignment::Right) => DirectiveKind::AlignRight,
            Directive::SetBold(true) => DirectiveKind::BoldOn,
            Directive::SetBold(false) => DirectiveKind::BoldOff,
            Directive::SetSize(TextSize::Normal) => DirectiveKind::SizeNormal,
            Directive::SetSize(TextSize::DoubleHeight) => DirectiveKind::SizeDoubleHeight,
            Directive::SetSize(TextSize::DoubleWidth) => DirectiveKind::SizeDoubleWidth,
            Directive::SetSize(TextSize::Double) => DirectiveKind::SizeDouble,
            Directive::FeedLines(_) => DirectiveKind::Feed,
            Directive::Cut(CutMode::Full) => DirectiveKind::CutFull,
            Directive::Cut(CutMode::Partial) => DirectiveKind::CutPartial,
            Directive::Text(_) => return None,
        };
        Some(kind)
    }
}

/// Encode directives into the byte stream a printer family understands
///
/// Text is encoded with the charset selected by the last `SelectCharset`
/// directive (Windows-1252 until one is seen). Fails on the first directive
/// the family does not define; nothing is skipped.
#[instrument(skip(directives), fields(count = directives.len()))]
pub fn encode(directives: &[Directive], family: PrinterFamily) -> PrintResult<Vec<u8>> {
    let dialect = Dialect::for_family(family);
    let mut out = Vec::with_capacity(1024);
    let mut charset = Charset::default();

    for directive in directives {
        match directive {
            Directive::Text(s) => out.extend_from_slice(&charset.encode(s)),
            other => {
                if let Directive::SelectCharset(selected) = other {
                    charset = *selected;
                }
                let count = match other {
                    Directive::FeedLines(n) => *n,
                    _ => 0,
                };
                // Every non-text directive has a kind
                if let Some(kind) = other.kind() {
                    let command = dialect
                        .command(kind)
                        .ok_or(PrintError::UnsupportedDirective {
                            family,
                            directive: kind,
                        })?;
                    command.write(count, &mut out);
                }
            }
        }
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_escpos_basic() {
        let data = encode(
            &[
                Directive::InitializePrinter,
                Directive::SetBold(true),
                Directive::Text("X\n".into()),
                Directive::SetBold(false),
                Directive::Cut(CutMode::Full),
            ],
            PrinterFamily::EscPos,
        )
        .unwrap();
        assert_eq!(
            data,
            vec![
                0x1B, 0x40, 0x1B, 0x45, 0x01, b'X', b'\n', 0x1B, 0x45, 0x00, 0x1D, 0x56, 0x00
            ]
        );
    }

    #[test]
    fn test_bold_differs_between_families() {
        let directives = [
            Directive::SetBold(true),
            Directive::Text("X".into()),
            Directive::SetBold(false),
        ];
        let esc = encode(&directives, PrinterFamily::EscPos).unwrap();
        let star = encode(&directives, PrinterFamily::StarLine).unwrap();
        assert_ne!(esc, star);
        assert_eq!(star, vec![0x1B, 0x45, b'X', 0x1B, 0x46]);
    }

    #[test]
    fn test_unsupported_directive_is_an_error() {
        let err = encode(
            &[Directive::Text("hi".into()), Directive::Cut(CutMode::Partial)],
            PrinterFamily::PlainText,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PrintError::UnsupportedDirective {
                family: PrinterFamily::PlainText,
                directive: DirectiveKind::CutPartial,
            }
        ));
    }

    #[test]
    fn test_feed_lines() {
        let esc = encode(&[Directive::FeedLines(3)], PrinterFamily::EscPos).unwrap();
        assert_eq!(esc, vec![0x1B, 0x64, 3]);
        let plain = encode(&[Directive::FeedLines(3)], PrinterFamily::PlainText).unwrap();
        assert_eq!(plain, b"\n\n\n".to_vec());
    }

    #[test]
    fn test_charset_switch_applies_to_following_text() {
        let data = encode(
            &[
                Directive::Text("ø".into()),
                Directive::SelectCharset(Charset::Gbk),
                Directive::Text("中".into()),
            ],
            PrinterFamily::EscPos,
        )
        .unwrap();
        assert_eq!(data[0], 0xF8);
        assert_eq!(&data[1..6], &[0x1C, 0x26, 0x1C, 0x43, 0x01]);
        assert_eq!(&data[6..], &[0xD6, 0xD0]);
    }

    #[test]
    fn test_directive_serde() {
        let d: Directive = serde_json::from_str(r#"{"set_alignment":"center"}"#).unwrap();
        assert_eq!(d, Directive::SetAlignment(Alignment::Center));
        let d: Directive = serde_json::from_str(r#""initialize_printer""#).unwrap();
        assert_eq!(d, Directive::InitializePrinter);
    }
}
