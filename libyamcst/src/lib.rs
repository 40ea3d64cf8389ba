//! Lossless concrete syntax trees for YAML-style text.
//!
//! The parser keeps every byte of its input: comments, blank lines,
//! indentation and indicators all end up either in a node or in the gaps
//! between sibling nodes, so rendering an unmodified tree gives back the
//! text it was parsed from.
//!
//! # Parsing Pipeline
//!
//! 1. **Document**: Normalizes line breaks, then walks the top level,
//!    picking up comments and blank lines itself and handing everything
//!    else to the dispatcher.
//!
//! 2. **Dispatcher**: Reads the properties (tags, anchors, comments) in front
//!    of a node, decides its type from the next character, and scans it.
//!    A node followed by a block indicator becomes the first entry of a new
//!    block collection.
//!
//! 3. **Collection scanner**: Consumes further entries of a block sequence or
//!    mapping, with the comments and blank lines between them, and stops at
//!    the first line that belongs to an enclosing block.
//!
//! Scanners never fail: problems are recorded on the node concerned (see
//! [`CstError`]) and [`parse`] reports the first of them.

pub mod collection;
pub mod dispatch;
mod document;
mod error;
pub mod flow;
pub mod item;
mod node;
mod render;
pub mod scalar;
pub mod source;
mod span;
pub mod trivia;

pub use collection::TrimReport;
pub use dispatch::{Dispatcher, ParseNode};
pub use document::{normalize_newlines, Document};
pub use error::{CstError, ErrorContext, ParseError, Result};
pub use node::{
    BlockHeader, Chomp, CollectionType, Context, FlowItem, ItemType, Node, NodeId, NodeKind,
    NodeType, Tag, Tree,
};
pub use span::Span;

/// Parse a single document.
///
/// # Example
///
/// ```
/// use libyamcst::parse;
///
/// let doc = parse("- a\n- b\n").unwrap();
/// assert_eq!(doc.render(), "- a\n- b\n");
/// ```
pub fn parse(input: &str) -> Result<Document> {
    parse_with_filename(input, None)
}

/// Parse a single document with a filename for error messages.
///
/// Fails with the first node error in source order, or with
/// [`ParseError::DocumentMarker`] if a `---` or `...` line ends the document
/// before the input does. Use [`Document::parse`] to get the tree regardless.
pub fn parse_with_filename(input: &str, filename: Option<&str>) -> Result<Document> {
    let ctx = ErrorContext::new(filename);
    let doc = Document::parse(input);

    if let Some((id, err)) = doc.errors().first() {
        let (line, col) = doc.line_col(doc.tree().node(*id).range.start);
        return Err(ParseError::Node((*err).clone(), String::new()).with_location(&ctx, line, col));
    }

    if let Some(offset) = doc.boundary() {
        let (line, col) = doc.line_col(offset);
        return Err(ParseError::DocumentMarker(String::new()).with_location(&ctx, line, col));
    }

    Ok(doc)
}
