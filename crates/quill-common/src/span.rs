use std::fmt;

use serde::Serialize;

/// Byte-offset span into source text. Start is inclusive, end is exclusive.
///
/// The lexer tracks everything as byte offsets. Line/column pairs are
/// computed on demand via [`LineIndex`] and stored on AST nodes as [`Pos`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn new(start: u32, end: u32) -> Self {
        debug_assert!(start <= end, "span start ({start}) must be <= end ({end})");
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A single-point source position: 1-based line and column.
///
/// Every diagnostic and every runtime fault message refers to source code
/// through one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct Pos {
    pub line: u32,
    pub column: u32,
}

impl Pos {
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Pre-computed index of line start positions.
///
/// Built once per source file and used to convert between byte offsets and
/// (line, column) pairs in both directions.
#[derive(Debug)]
pub struct LineIndex {
    /// Byte offset of the start of each line. The first entry is always 0.
    line_starts: Vec<u32>,
    len: u32,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0u32];
        for (i, byte) in source.bytes().enumerate() {
            if byte == b'\n' {
                line_starts.push((i + 1) as u32);
            }
        }
        Self {
            line_starts,
            len: source.len() as u32,
        }
    }

    /// Convert a byte offset to a 1-based (line, column) pair.
    pub fn line_col(&self, offset: u32) -> (u32, u32) {
        // partition_point yields the first line starting after `offset`.
        let line_idx = self.line_starts.partition_point(|&start| start <= offset);
        let line_idx = line_idx.saturating_sub(1);
        let line = (line_idx as u32) + 1;
        let col = offset - self.line_starts[line_idx] + 1;
        (line, col)
    }

    /// Position of the byte at `offset`.
    pub fn pos(&self, offset: u32) -> Pos {
        let (line, column) = self.line_col(offset);
        Pos { line, column }
    }

    /// Byte offset of a position, clamped to the end of the source.
    ///
    /// Used when rendering diagnostics that only carry a [`Pos`].
    pub fn offset(&self, pos: Pos) -> u32 {
        let Some(&start) = self.line_starts.get(pos.line.saturating_sub(1) as usize) else {
            return self.len;
        };
        (start + pos.column.saturating_sub(1)).min(self.len)
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
