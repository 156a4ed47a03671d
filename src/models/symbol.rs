use compact_str::CompactString;
use std::fmt;
use unicode_segmentation::UnicodeSegmentation;

/// Wire tokens the recorder uses for a line break. Both mean the same thing.
pub const NEWLINE_TOKEN: &str = "NEWLINE";
pub const CRLF_TOKEN: &str = "CR-LF";

/// One cell of a document grid.
///
/// A line break is never stored in a row; it is realized as the boundary
/// between two rows.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum Symbol {
    Char(CompactString),
    LineBreak,
}

impl Symbol {
    /// Decodes a recorded `character` value.
    ///
    /// Returns `None` unless the value is a line-break token or exactly one
    /// grapheme cluster.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            NEWLINE_TOKEN | CRLF_TOKEN | "\n" | "\r\n" => Some(Self::LineBreak),
            _ => {
                let mut graphemes = raw.graphemes(true);
                let first = graphemes.next()?;
                if graphemes.next().is_some() {
                    return None;
                }
                Some(Self::Char(CompactString::new(first)))
            }
        }
    }

    pub fn ch(c: char) -> Self {
        if c == '\n' {
            return Self::LineBreak;
        }
        let mut buf = [0u8; 4];
        Self::Char(CompactString::new(c.encode_utf8(&mut buf)))
    }

    pub fn is_line_break(&self) -> bool {
        matches!(self, Self::LineBreak)
    }

    /// Text this symbol contributes to a rendered file.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Char(s) => s.as_str(),
            Self::LineBreak => "\n",
        }
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(s) => write!(f, "{:?}", s.as_str()),
            Self::LineBreak => f.write_str("LineBreak"),
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Char(s) => f.write_str(s),
            Self::LineBreak => f.write_str(NEWLINE_TOKEN),
        }
    }
}
