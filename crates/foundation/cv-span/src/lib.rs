//! Source file spans and locations of declarations

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;

/// A unique identifier for a declaration file
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FileId(pub u32);

impl FileId {
    /// File id used for declarations built in memory rather than loaded
    pub const SYNTHETIC: Self = Self(u32::MAX);

    /// File id from its index
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A byte offset span in a declaration file
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Span {
    /// Offset of the first byte
    pub start: u32,
    /// Offset one past the last byte
    pub end: u32,
}

impl Span {
    /// Span between two offsets
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Build a span from a byte range, saturating offsets that do not fit
    pub fn from_range(range: Range<usize>) -> Self {
        let start = u32::try_from(range.start).unwrap_or(u32::MAX);
        let end = u32::try_from(range.end).unwrap_or(u32::MAX);
        Self { start, end }
    }

    /// Byte range for slicing the source
    pub fn range(&self) -> Range<usize> {
        self.start as usize..self.end as usize
    }

    /// Length in bytes
    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    /// Whether the span covers no bytes
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A span with associated file
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FileSpan {
    /// File the span points into
    pub file: FileId,
    /// Byte range in that file
    pub span: Span,
}

impl FileSpan {
    /// Span in `file`
    pub fn new(file: FileId, span: Span) -> Self {
        Self { file, span }
    }

    /// Span for a declaration that has no source text
    pub fn synthetic() -> Self {
        Self {
            file: FileId::SYNTHETIC,
            span: Span::default(),
        }
    }

    /// Whether the span belongs to a builtin declaration
    pub fn is_synthetic(&self) -> bool {
        self.file == FileId::SYNTHETIC
    }

    /// Byte range in the file
    pub fn range(&self) -> Range<usize> {
        self.span.range()
    }
}

impl fmt::Display for FileSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_synthetic() {
            write!(f, "<synthetic>")
        } else {
            write!(f, "{}:{}..{}", self.file.0, self.span.start, self.span.end)
        }
    }
}

/// Convert a byte offset into a 1-based (line, column) pair
pub fn line_col(source: &str, offset: u32) -> (usize, usize) {
    let offset = (offset as usize).min(source.len());
    let before = &source[..offset];
    let line = before.matches('\n').count() + 1;
    let column = before.rfind('\n').map_or(offset, |newline| offset - newline - 1) + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let source = "first\nsecond\nthird";
        assert_eq!(line_col(source, 0), (1, 1));
        assert_eq!(line_col(source, 6), (2, 1));
        assert_eq!(line_col(source, 9), (2, 4));
        assert_eq!(line_col(source, 1000), (3, 6));
    }

    #[test]
    fn test_synthetic_span_display() {
        assert_eq!(FileSpan::synthetic().to_string(), "<synthetic>");
        let span = FileSpan::new(FileId::new(0), Span::new(3, 7));
        assert_eq!(span.to_string(), "0:3..7");
        assert_eq!(span.span.len(), 4);
    }
}
