//! Error types for CST parsing.
//!
//! The scanners themselves never fail. Problems they notice are recorded as a
//! [`CstError`] on the node concerned and scanning carries on; the top-level
//! [`crate::parse`] functions turn the first of these into a [`ParseError`]
//! with a source location.

use thiserror::Error;

/// Result type for the top-level parse functions.
pub type Result<T> = std::result::Result<T, ParseError>;

/// Filename carried along for error reporting.
#[derive(Clone, Debug, Default)]
pub struct ErrorContext {
    pub filename: Option<String>,
}

impl ErrorContext {
    pub fn new(filename: Option<&str>) -> Self {
        Self {
            filename: filename.map(String::from),
        }
    }

    /// Format a location suffix for error messages.
    pub fn loc_suffix(&self, line: usize, col: usize) -> String {
        match &self.filename {
            Some(name) => format!(" at {}:{} of <{}>", line + 1, col + 1, name),
            None => format!(" at {}:{}", line + 1, col + 1),
        }
    }
}

/// A problem recorded on a single node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CstError {
    #[error("Node consumed no characters")]
    EmptyNode,

    #[error("Sequence items must not have preceding content on the same line")]
    SequenceItemNotAtLineStart,

    /// The argument names what set the block indent.
    #[error("Block scalars must not be less indented than their {0}")]
    BlockScalarUnderIndented(&'static str),

    #[error(
        "Block scalars with more-indented leading empty lines must use an explicit indentation indicator"
    )]
    BlockScalarLeadingEmptyLines,

    #[error("Insufficient indentation in flow collection")]
    FlowCollectionIndent,

    /// The argument is the missing closing character.
    #[error("Missing closing {0}")]
    Unterminated(char),
}

/// Error type returned by [`crate::parse`].
#[derive(Error, Debug)]
pub enum ParseError {
    /// A node recorded a problem while scanning.
    #[error("{0}{1}")]
    Node(CstError, String),

    /// A `---` or `...` line; only one document is parsed.
    #[error("Unexpected document marker{0}")]
    DocumentMarker(String),
}

impl ParseError {
    /// Create an error with location information.
    pub fn with_location(self, ctx: &ErrorContext, line: usize, col: usize) -> Self {
        let suffix = ctx.loc_suffix(line, col);
        match self {
            ParseError::Node(err, _) => ParseError::Node(err, suffix),
            ParseError::DocumentMarker(_) => ParseError::DocumentMarker(suffix),
        }
    }
}
