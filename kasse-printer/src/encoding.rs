//! Character set handling for thermal printers
//!
//! Thermal printers take single or double byte code pages, not UTF-8.
//! This module provides utilities for:
//! - Encoding text for the printer's code page
//! - Calculating printed widths (one column per encoded byte)
//! - Truncating/padding strings to printed widths

use serde::{Deserialize, Serialize};

/// Code page the printer is configured for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Charset {
    /// Western European (WPC1252), covers æ ø å and €
    #[default]
    Windows1252,
    /// Simplified Chinese, two columns per ideograph
    Gbk,
}

impl Charset {
    fn encoding(self) -> &'static encoding_rs::Encoding {
        match self {
            Charset::Windows1252 => encoding_rs::WINDOWS_1252,
            Charset::Gbk => encoding_rs::GBK,
        }
    }

    /// Encode text for the printer
    ///
    /// Characters the code page cannot represent are printed as `?`.
    pub fn encode(self, s: &str) -> Vec<u8> {
        let mut out = Vec::with_capacity(s.len());
        let mut tmp = [0u8; 4];
        for c in s.chars() {
            if c.is_ascii() {
                out.push(c as u8);
                continue;
            }
            let (cow, _, had_errors) = self.encoding().encode(c.encode_utf8(&mut tmp));
            if had_errors {
                out.push(b'?');
            } else {
                out.extend_from_slice(&cow);
            }
        }
        out
    }

    /// Printed width of a single character
    fn char_width(self, c: char) -> usize {
        if c.is_ascii() {
            return 1;
        }
        let mut tmp = [0u8; 4];
        let (cow, _, had_errors) = self.encoding().encode(c.encode_utf8(&mut tmp));
        if had_errors { 1 } else { cow.len() }
    }

    /// Get the printed width of a string
    pub fn width(self, s: &str) -> usize {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    /// Truncate a string to fit within a printed width
    pub fn truncate(self, s: &str, max_width: usize) -> String {
        let mut width = 0;
        let mut result = String::new();
        for c in s.chars() {
            let w = self.char_width(c);
            if width + w > max_width {
                break;
            }
            result.push(c);
            width += w;
        }
        result
    }

    /// Pad a string to a specific printed width
    ///
    /// If the string is longer than the width, it will be truncated.
    pub fn pad(self, s: &str, width: usize, align_right: bool) -> String {
        let current = self.width(s);
        if current >= width {
            return self.truncate(s, width);
        }
        let spaces = " ".repeat(width - current);
        if align_right {
            format!("{}{}", spaces, s)
        } else {
            format!("{}{}", s, spaces)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_width() {
        assert_eq!(Charset::Windows1252.width("hello"), 5);
        assert_eq!(Charset::Windows1252.width("smørrebrød"), 10);
        assert_eq!(Charset::Gbk.width("你好"), 4);
        assert_eq!(Charset::Gbk.width("AB中文CD"), 8);
    }

    #[test]
    fn test_encode_latin() {
        assert_eq!(Charset::Windows1252.encode("æøå"), vec![0xE6, 0xF8, 0xE5]);
        assert_eq!(Charset::Windows1252.encode("€"), vec![0x80]);
    }

    #[test]
    fn test_unmappable_becomes_question_mark() {
        assert_eq!(Charset::Windows1252.encode("a你b"), b"a?b".to_vec());
        assert_eq!(Charset::Windows1252.width("a你b"), 3);
    }

    #[test]
    fn test_truncate() {
        assert_eq!(Charset::Windows1252.truncate("hello world", 5), "hello");
        assert_eq!(Charset::Gbk.truncate("你好世界", 4), "你好");
        assert_eq!(Charset::Gbk.truncate("AB中文", 5), "AB中");
    }

    #[test]
    fn test_pad() {
        assert_eq!(Charset::Windows1252.pad("hi", 5, false), "hi   ");
        assert_eq!(Charset::Windows1252.pad("hi", 5, true), "   hi");
        assert_eq!(Charset::Windows1252.pad("hello world", 5, false), "hello");
    }
}
