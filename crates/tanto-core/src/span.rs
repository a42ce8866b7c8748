//! Source positions.
//!
//! Lines and columns are 1-based, matching what diagnostics print. A `Span`
//! is ordered so that outer constructs sort before the constructs they
//! contain when both start at the same location.

use std::cmp::Ordering;
use std::fmt;

use crate::graph::StmtClass;

/// A contiguous source region in line/column form.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub begin_line: u32,
    pub begin_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(begin_line: u32, begin_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            begin_line,
            begin_col,
            end_line,
            end_col,
        }
    }

    /// Source order: earlier begin first; at equal begins the wider span
    /// (later end) goes first, so parents precede their children.
    pub fn source_cmp(&self, other: &Span) -> Ordering {
        (self.begin_line, self.begin_col)
            .cmp(&(other.begin_line, other.begin_col))
            .then_with(|| {
                (other.end_line, other.end_col).cmp(&(self.end_line, self.end_col))
            })
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}:{} .. {}:{}]",
            self.begin_line, self.begin_col, self.end_line, self.end_col
        )
    }
}

/// Identity of a statement as seen from source locations alone.
///
/// Rewrite callbacks do not see graph nodes, only the re-parsed tree; the
/// pair of statement class and span is how analysis results are looked up
/// from there.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StmtKey {
    pub class: StmtClass,
    pub span: Span,
}

impl StmtKey {
    pub fn new(class: StmtClass, span: Span) -> Self {
        Self { class, span }
    }
}
