//! Source positions.

use std::fmt;

/// A location in the markdown source.
///
/// Both `line` and `column` are 1-based; `column` counts bytes. Nodes created
/// through the editing API have no source location and report `0:0`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    /// Line number (1-based).
    pub line: u32,
    /// Byte column within the line (1-based).
    pub column: u32,
}

impl Position {
    /// Create a position from a line and column.
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }

    /// Whether this position was assigned by the parser.
    #[must_use]
    pub const fn is_known(self) -> bool {
        self.line > 0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Maps byte offsets in a source string to [`Position`]s.
pub(crate) struct LineIndex<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> LineIndex<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        let bytes = source.as_bytes();
        // A line ends at `\n`, at `\r\n`, or at a lone `\r`.
        let line_starts = std::iter::once(0)
            .chain(bytes.iter().enumerate().filter_map(|(i, &b)| match b {
                b'\n' => Some(i + 1),
                b'\r' if bytes.get(i + 1) != Some(&b'\n') => Some(i + 1),
                _ => None,
            }))
            .collect();
        Self {
            source,
            line_starts,
        }
    }

    /// Position of the byte at `offset`.
    pub(crate) fn position(&self, offset: usize) -> Position {
        let line = self.line_starts.partition_point(|&start| start <= offset);
        let column = offset - self.line_starts[line - 1] + 1;
        Position::new(to_u32(line), to_u32(column))
    }

    /// Position of the last byte of `start..end`, ignoring trailing line endings.
    ///
    /// An empty span reports its start position.
    pub(crate) fn end_position(&self, start: usize, end: usize) -> Position {
        let bytes = self.source.as_bytes();
        let mut end = end.min(bytes.len());
        while end > start && matches!(bytes[end - 1], b'\n' | b'\r') {
            end -= 1;
        }
        if end <= start {
            self.position(start)
        } else {
            self.position(end - 1)
        }
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
