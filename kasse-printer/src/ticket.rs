//! Ticket builder
//!
//! Provides a fluent API for building a directive list.

use serde::{Deserialize, Serialize};

use crate::dialect::{Dialect, DirectiveKind, PrinterFamily};
use crate::encoder::{Alignment, CutMode, Directive, TextSize};
use crate::encoding::Charset;

/// Formatting features a physical printer is set up to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub cut: bool,
    pub bold: bool,
    pub alignment: bool,
    pub double_size: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            cut: true,
            bold: true,
            alignment: true,
            double_size: true,
        }
    }
}

impl Capabilities {
    /// Nothing but text and feeds
    pub fn plain() -> Self {
        Self {
            cut: false,
            bold: false,
            alignment: false,
            double_size: false,
        }
    }

    /// Capabilities that are enabled but missing from the family's dialect
    pub fn missing_in(&self, family: PrinterFamily) -> Vec<DirectiveKind> {
        let dialect = Dialect::for_family(family);
        let mut wanted = Vec::new();
        if self.cut {
            wanted.extend([DirectiveKind::CutFull, DirectiveKind::CutPartial]);
        }
        if self.bold {
            wanted.extend([DirectiveKind::BoldOn, DirectiveKind::BoldOff]);
        }
        if self.alignment {
            wanted.extend([
                DirectiveKind::AlignLeft,
                DirectiveKind::AlignCenter,
                DirectiveKind::AlignRight,
            ]);
        }
        if self.double_size {
            wanted.extend([
                DirectiveKind::SizeNormal,
                DirectiveKind::SizeDouble,
                DirectiveKind::SizeDoubleHeight,
            ]);
        }
        wanted.retain(|k| !dialect.supports(*k));
        wanted
    }
}

/// Directive list builder
///
/// Styling calls for features the printer is not set up for are dropped
/// here, so the encoded stream only contains what the profile allows.
pub struct TicketBuilder {
    directives: Vec<Directive>,
    width: usize,
    charset: Charset,
    caps: Capabilities,
}

impl TicketBuilder {
    /// Create a new builder with the specified paper width in characters
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 48 characters
    pub fn new(width: usize, charset: Charset, caps: Capabilities) -> Self {
        let directives = vec![
            Directive::InitializePrinter,
            Directive::SelectCharset(charset),
        ];
        Self {
            directives,
            width,
            charset,
            caps,
        }
    }

    /// Get the configured paper width
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn charset(&self) -> Charset {
        self.charset
    }

    fn push(&mut self, directive: Directive) -> &mut Self {
        self.directives.push(directive);
        self
    }

    // === Text Output ===

    pub fn text(&mut self, s: &str) -> &mut Self {
        self.push(Directive::Text(s.to_string()))
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.push(Directive::Text(format!("{}\n", s)))
    }

    pub fn newline(&mut self) -> &mut Self {
        self.push(Directive::Text("\n".to_string()))
    }

    /// Print and feed n lines
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        self.push(Directive::FeedLines(lines))
    }

    // === Alignment ===

    pub fn center(&mut self) -> &mut Self {
        self.align(Alignment::Center)
    }

    pub fn left(&mut self) -> &mut Self {
        self.align(Alignment::Left)
    }

    pub fn right(&mut self) -> &mut Self {
        self.align(Alignment::Right)
    }

    fn align(&mut self, alignment: Alignment) -> &mut Self {
        if self.caps.alignment {
            self.push(Directive::SetAlignment(alignment));
        }
        self
    }

    // === Text Style ===

    pub fn bold(&mut self) -> &mut Self {
        if self.caps.bold {
            self.push(Directive::SetBold(true));
        }
        self
    }

    pub fn bold_off(&mut self) -> &mut Self {
        if self.caps.bold {
            self.push(Directive::SetBold(false));
        }
        self
    }

    /// Double width and height
    pub fn double_size(&mut self) -> &mut Self {
        self.size(TextSize::Double)
    }

    pub fn double_height(&mut self) -> &mut Self {
        self.size(TextSize::DoubleHeight)
    }

    /// Reset to normal size
    pub fn reset_size(&mut self) -> &mut Self {
        self.size(TextSize::Normal)
    }

    fn size(&mut self, size: TextSize) -> &mut Self {
        if self.caps.double_size {
            self.push(Directive::SetSize(size));
        }
        self
    }

    // === Separators ===

    /// Print a line of '=' characters
    pub fn sep_double(&mut self) -> &mut Self {
        self.line(&"=".repeat(self.width))
    }

    /// Print a line of '-' characters
    pub fn sep_single(&mut self) -> &mut Self {
        self.line(&"-".repeat(self.width))
    }

    // === Layout Helpers ===

    /// Print left and right text on the same line
    ///
    /// Left text is left-aligned, right text is right-aligned,
    /// with spaces filling the gap.
    pub fn line_lr(&mut self, left: &str, right: &str) -> &mut Self {
        let lw = self.charset.width(left);
        let rw = self.charset.width(right);

        if lw + rw >= self.width {
            // Too long, just print with space
            self.line(&format!("{} {}", left, right))
        } else {
            let spaces = self.width - lw - rw;
            self.line(&format!("{}{}{}", left, " ".repeat(spaces), right))
        }
    }

    /// Print text truncated to the paper width
    pub fn line_clipped(&mut self, s: &str) -> &mut Self {
        let clipped = self.charset.truncate(s, self.width);
        self.line(&clipped)
    }

    // === Paper Control ===

    /// Cut paper (full cut); dropped when the printer has no cutter
    pub fn cut(&mut self) -> &mut Self {
        if self.caps.cut {
            self.push(Directive::Cut(CutMode::Full));
        }
        self
    }

    /// Partial cut (leave a small connection)
    pub fn cut_partial(&mut self) -> &mut Self {
        if self.caps.cut {
            self.push(Directive::Cut(CutMode::Partial));
        }
        self
    }

    // === Build ===

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn build(self) -> Vec<Directive> {
        self.directives
    }
}

impl Default for TicketBuilder {
    fn default() -> Self {
        Self::new(48, Charset::default(), Capabilities::default())
    }
}
