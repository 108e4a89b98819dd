//! Printer family dialects
//!
//! Each family is a lookup table from directive kind to byte constants.
//! Adding a family means adding a table; the encoder does not change.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::encoding::Charset;

/// Command dialect spoken by a printer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrinterFamily {
    /// Epson ESC/POS and compatibles (most network thermal printers)
    EscPos,
    /// Star Micronics line mode
    StarLine,
    /// Dumb line printer: text and line feeds only
    PlainText,
}

impl PrinterFamily {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrinterFamily::EscPos => "esc_pos",
            PrinterFamily::StarLine => "star_line",
            PrinterFamily::PlainText => "plain_text",
        }
    }
}

impl fmt::Display for PrinterFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Directive kinds a dialect may define
///
/// Text is not listed: it is encoded through the selected charset for every
/// family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectiveKind {
    Initialize,
    AlignLeft,
    AlignCenter,
    AlignRight,
    BoldOn,
    BoldOff,
    SizeNormal,
    SizeDoubleHeight,
    SizeDoubleWidth,
    SizeDouble,
    Feed,
    CutFull,
    CutPartial,
    CharsetWindows1252,
    CharsetGbk,
}

impl DirectiveKind {
    /// Code page selection for a charset
    pub fn for_charset(charset: Charset) -> Self {
        match charset {
            Charset::Windows1252 => DirectiveKind::CharsetWindows1252,
            Charset::Gbk => DirectiveKind::CharsetGbk,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DirectiveKind::Initialize => "initialize",
            DirectiveKind::AlignLeft => "align_left",
            DirectiveKind::AlignCenter => "align_center",
            DirectiveKind::AlignRight => "align_right",
            DirectiveKind::BoldOn => "bold_on",
            DirectiveKind::BoldOff => "bold_off",
            DirectiveKind::SizeNormal => "size_normal",
            DirectiveKind::SizeDoubleHeight => "size_double_height",
            DirectiveKind::SizeDoubleWidth => "size_double_width",
            DirectiveKind::SizeDouble => "size_double",
            DirectiveKind::Feed => "feed",
            DirectiveKind::CutFull => "cut_full",
            DirectiveKind::CutPartial => "cut_partial",
            DirectiveKind::CharsetWindows1252 => "charset_windows1252",
            DirectiveKind::CharsetGbk => "charset_gbk",
        }
    }
}

impl fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Byte template for one directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Constant byte sequence
    Fixed(&'static [u8]),
    /// Prefix followed by a single count byte
    Counted(&'static [u8]),
    /// `n` line feed bytes
    RepeatLineFeed,
}

impl Command {
    /// Append this command to `out`; `count` is ignored for fixed commands
    pub fn write(self, count: u8, out: &mut Vec<u8>) {
        match self {
            Command::Fixed(bytes) => out.extend_from_slice(bytes),
            Command::Counted(prefix) => {
                out.extend_from_slice(prefix);
                out.push(count);
            }
            Command::RepeatLineFeed => out.extend(std::iter::repeat_n(b'\n', count as usize)),
        }
    }
}

/// Directive table for one printer family
#[derive(Debug)]
pub struct Dialect {
    family: PrinterFamily,
    commands: &'static [(DirectiveKind, Command)],
}

impl Dialect {
    /// Get the table for a family
    pub fn for_family(family: PrinterFamily) -> &'static Dialect {
        match family {
            PrinterFamily::EscPos => &ESC_POS,
            PrinterFamily::StarLine => &STAR_LINE,
            PrinterFamily::PlainText => &PLAIN_TEXT,
        }
    }

    pub fn family(&self) -> PrinterFamily {
        self.family
    }

    /// Look up the command for a directive kind
    pub fn command(&self, kind: DirectiveKind) -> Option<Command> {
        self.commands
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, cmd)| *cmd)
    }

    pub fn supports(&self, kind: DirectiveKind) -> bool {
        self.command(kind).is_some()
    }
}

static ESC_POS: Dialect = Dialect {
    family: PrinterFamily::EscPos,
    commands: &[
        // ESC @
        (DirectiveKind::Initialize, Command::Fixed(&[0x1B, 0x40])),
        // ESC a n
        (DirectiveKind::AlignLeft, Command::Fixed(&[0x1B, 0x61, 0x00])),
        (DirectiveKind::AlignCenter, Command::Fixed(&[0x1B, 0x61, 0x01])),
        (DirectiveKind::AlignRight, Command::Fixed(&[0x1B, 0x61, 0x02])),
        // ESC E n
        (DirectiveKind::BoldOn, Command::Fixed(&[0x1B, 0x45, 0x01])),
        (DirectiveKind::BoldOff, Command::Fixed(&[0x1B, 0x45, 0x00])),
        // GS ! n
        (DirectiveKind::SizeNormal, Command::Fixed(&[0x1D, 0x21, 0x00])),
        (DirectiveKind::SizeDoubleHeight, Command::Fixed(&[0x1D, 0x21, 0x01])),
        (DirectiveKind::SizeDoubleWidth, Command::Fixed(&[0x1D, 0x21, 0x10])),
        (DirectiveKind::SizeDouble, Command::Fixed(&[0x1D, 0x21, 0x11])),
        // ESC d n - Print and feed n lines
        (DirectiveKind::Feed, Command::Counted(&[0x1B, 0x64])),
        // GS V m
        (DirectiveKind::CutFull, Command::Fixed(&[0x1D, 0x56, 0x00])),
        (DirectiveKind::CutPartial, Command::Fixed(&[0x1D, 0x56, 0x01])),
        // ESC t 16 - WPC1252
        (DirectiveKind::CharsetWindows1252, Command::Fixed(&[0x1B, 0x74, 0x10])),
        // FS & + FS C 1 - Chinese mode, GBK
        (
            DirectiveKind::CharsetGbk,
            Command::Fixed(&[0x1C, 0x26, 0x1C, 0x43, 0x01]),
        ),
    ],
};

static STAR_LINE: Dialect = Dialect {
    family: PrinterFamily::StarLine,
    commands: &[
        (DirectiveKind::Initialize, Command::Fixed(&[0x1B, 0x40])),
        // ESC GS a n
        (DirectiveKind::AlignLeft, Command::Fixed(&[0x1B, 0x1D, 0x61, 0x00])),
        (DirectiveKind::AlignCenter, Command::Fixed(&[0x1B, 0x1D, 0x61, 0x01])),
        (DirectiveKind::AlignRight, Command::Fixed(&[0x1B, 0x1D, 0x61, 0x02])),
        // ESC E / ESC F
        (DirectiveKind::BoldOn, Command::Fixed(&[0x1B, 0x45])),
        (DirectiveKind::BoldOff, Command::Fixed(&[0x1B, 0x46])),
        // ESC i n1 n2 (height, width)
        (DirectiveKind::SizeNormal, Command::Fixed(&[0x1B, 0x69, 0x00, 0x00])),
        (DirectiveKind::SizeDoubleHeight, Command::Fixed(&[0x1B, 0x69, 0x01, 0x00])),
        (DirectiveKind::SizeDoubleWidth, Command::Fixed(&[0x1B, 0x69, 0x00, 0x01])),
        (DirectiveKind::SizeDouble, Command::Fixed(&[0x1B, 0x69, 0x01, 0x01])),
        // ESC a n - Feed n lines
        (DirectiveKind::Feed, Command::Counted(&[0x1B, 0x61])),
        // ESC d n - 2: full cut after feed, 3: partial cut after feed
        (DirectiveKind::CutFull, Command::Fixed(&[0x1B, 0x64, 0x02])),
        (DirectiveKind::CutPartial, Command::Fixed(&[0x1B, 0x64, 0x03])),
        // ESC GS t 32 - Windows-1252
        (
            DirectiveKind::CharsetWindows1252,
            Command::Fixed(&[0x1B, 0x1D, 0x74, 0x20]),
        ),
    ],
};

static PLAIN_TEXT: Dialect = Dialect {
    family: PrinterFamily::PlainText,
    commands: &[
        (DirectiveKind::Initialize, Command::Fixed(&[])),
        (DirectiveKind::Feed, Command::RepeatLineFeed),
        (DirectiveKind::CharsetWindows1252, Command::Fixed(&[])),
        (DirectiveKind::CharsetGbk, Command::Fixed(&[])),
    ],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bold_constants_differ_between_families() {
        let esc = Dialect::for_family(PrinterFamily::EscPos);
        let star = Dialect::for_family(PrinterFamily::StarLine);
        assert_ne!(
            esc.command(DirectiveKind::BoldOn),
            star.command(DirectiveKind::BoldOn)
        );
    }

    #[test]
    fn test_plain_text_has_no_cut() {
        let plain = Dialect::for_family(PrinterFamily::PlainText);
        assert!(!plain.supports(DirectiveKind::CutFull));
        assert!(!plain.supports(DirectiveKind::BoldOn));
        assert!(plain.supports(DirectiveKind::Feed));
    }

    #[test]
    fn test_command_write() {
        let mut out = Vec::new();
        Command::Counted(&[0x1B, 0x64]).write(3, &mut out);
        Command::RepeatLineFeed.write(2, &mut out);
        Command::Fixed(&[0x1D, 0x56, 0x00]).write(9, &mut out);
        assert_eq!(out, vec![0x1B, 0x64, 3, b'\n', b'\n', 0x1D, 0x56, 0x00]);
    }

    #[test]
    fn test_family_serde_names() {
        let family: PrinterFamily = serde_json::from_str("\"star_line\"").unwrap();
        assert_eq!(family, PrinterFamily::StarLine);
        assert_eq!(family.to_string(), "star_line");
    }
}
