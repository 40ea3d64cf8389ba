//! Single-document driver.
//!
//! Normalizes line breaks, parses top-level nodes and the trivia around them
//! until the end of input or a document marker, and takes over whatever
//! trailing comments and blank lines the top-level collections hand back.

use std::fmt;

use crate::dispatch::{Dispatcher, ParseNode};
use crate::error::CstError;
use crate::node::{Context, NodeId, Tree};
use crate::source::{at_document_boundary, char_at, char_before, end_of_white_space, line_col};
use crate::span::Span;
use crate::trivia::{parse_blank_line, parse_comment, start_comment_or_end_blank_line};

/// Replace `\r\n` and lone `\r` with `\n`. Returns the normalized text and
/// the normalized offsets of the line breaks that lost a `\r`.
pub fn normalize_newlines(src: &str) -> (String, Vec<usize>) {
    if !src.contains('\r') {
        return (src.to_string(), Vec::new());
    }
    let mut out = String::with_capacity(src.len());
    let mut cr = Vec::new();
    let mut rest = src;
    while let Some(i) = rest.find('\r') {
        out.push_str(&rest[..i]);
        if rest[i + 1..].starts_with('\n') {
            cr.push(out.len());
            rest = &rest[i + 2..];
        } else {
            rest = &rest[i + 1..];
        }
        out.push('\n');
    }
    out.push_str(rest);
    (out, cr)
}

/// A parsed document: the node tree plus the top-level nodes in order.
#[derive(Debug, Clone)]
pub struct Document {
    tree: Tree,
    contents: Vec<NodeId>,
    range: Span,
    boundary: Option<usize>,
    cr: Vec<usize>,
}

impl Document {
    /// Parse `src` with the standard [`Dispatcher`].
    pub fn parse(src: &str) -> Self {
        Self::parse_with(src, &mut Dispatcher)
    }

    /// Parse `src`, delegating every top-level node to `parser`.
    pub fn parse_with(src: &str, parser: &mut dyn ParseNode) -> Self {
        let (normalized, cr) = normalize_newlines(src);
        let mut tree = Tree::new(normalized);
        let (contents, end) = parse_contents(&mut tree, parser);
        let len = tree.src().len();
        let mut doc = Document {
            tree,
            contents,
            range: Span::new(0, len),
            boundary: (end < len).then_some(end),
            cr,
        };
        if !doc.cr.is_empty() {
            doc.set_orig_ranges();
        }
        doc
    }

    fn set_orig_ranges(&mut self) {
        let mut offset = self.range.set_orig_range(&self.cr, 0);
        for &id in &self.contents {
            offset = self.tree.set_orig_ranges(id, &self.cr, offset);
        }
    }

    /// The newline-normalized source.
    pub fn src(&self) -> &str {
        self.tree.src()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// Top-level nodes and trivia, in source order.
    pub fn contents(&self) -> &[NodeId] {
        &self.contents
    }

    /// Offsets (in the normalized source) of line breaks that were `\r\n`.
    pub fn cr_offsets(&self) -> &[usize] {
        &self.cr
    }

    /// Offset of the document marker that stopped parsing, if any.
    pub fn boundary(&self) -> Option<usize> {
        self.boundary
    }

    /// Every node error, ordered by position.
    pub fn errors(&self) -> Vec<(NodeId, &CstError)> {
        let mut errors: Vec<_> = self
            .tree
            .iter()
            .filter_map(|(id, node)| node.error.as_ref().map(|error| (id, error)))
            .collect();
        errors.sort_by_key(|(id, _)| self.tree.node(*id).range.start);
        errors
    }

    /// Zero-based line and column of a normalized offset.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        line_col(self.src().as_bytes(), offset)
    }

    /// The whole (normalized) source, with `set_value` overrides applied.
    /// Text after a document marker is kept as is.
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.src().len());
        self.tree.render_span(self.range, &self.contents, &mut out);
        out
    }
}

impl fmt::Display for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Parse top-level content until the end of input or a document marker.
/// Returns the top-level nodes and the offset where parsing stopped.
fn parse_contents(tree: &mut Tree, parser: &mut dyn ParseNode) -> (Vec<NodeId>, usize) {
    let src = tree.source();
    let bytes = src.as_bytes();
    let mut contents = Vec::new();
    let mut line_start = 0;
    let mut at_line_start = true;
    let mut offset = end_of_white_space(bytes, 0);
    while !at_document_boundary(bytes, offset, None) {
        match char_at(bytes, offset) {
            Some(b'\n') => {
                if at_line_start {
                    let (blank, end) =
                        parse_blank_line(tree, Context::document(line_start, true), offset);
                    contents.push(blank);
                    offset = end;
                } else {
                    offset += 1;
                    at_line_start = true;
                }
                line_start = offset;
            }
            Some(b'#') => {
                let (comment, end) =
                    parse_comment(tree, Context::document(line_start, at_line_start), offset);
                contents.push(comment);
                offset = end;
                at_line_start = false;
            }
            _ => {
                let context = Context::document(line_start, at_line_start);
                let Some(node) = parser.parse_node(tree, context, offset) else {
                    break;
                };
                contents.push(node);
                offset = tree.node(node).range.end;
                if let Some(report) = tree.grab_end_trivia(node) {
                    contents.extend(report.detached);
                }
                // a collection may stop at the start of a line it does not own
                at_line_start = char_before(bytes, offset) == Some(b'\n');
                if at_line_start {
                    line_start = offset;
                }
            }
        }
        offset = start_comment_or_end_blank_line(bytes, offset);
        log::trace!("document content at {}", offset);
    }
    (contents, offset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeType;

    fn types(doc: &Document) -> Vec<NodeType> {
        doc.contents()
            .iter()
            .map(|&id| doc.tree().node(id).node_type())
            .collect()
    }

    #[test]
    fn test_normalize_newlines() {
        assert_eq!(normalize_newlines("a\nb"), ("a\nb".to_string(), vec![]));
        assert_eq!(
            normalize_newlines("a\r\nb\r\n"),
            ("a\nb\n".to_string(), vec![1, 3])
        );
        assert_eq!(normalize_newlines("a\rb"), ("a\nb".to_string(), vec![]));
    }

    #[test]
    fn test_top_level_trivia() {
        let doc = Document::parse("# head\n\na: 1\n\n# tail\n");
        assert_eq!(
            types(&doc),
            vec![
                NodeType::Comment,
                NodeType::BlankLine,
                NodeType::Map,
                NodeType::BlankLine,
                NodeType::Comment
            ]
        );
        assert_eq!(doc.render(), "# head\n\na: 1\n\n# tail\n");
        assert!(doc.errors().is_empty());
        assert_eq!(doc.boundary(), None);
    }

    #[test]
    fn test_trailing_blank_lines_move_to_document() {
        let doc = Document::parse("- a\n\n\n");
        assert_eq!(
            types(&doc),
            vec![NodeType::Seq, NodeType::BlankLine, NodeType::BlankLine]
        );
        let seq = doc.contents()[0];
        assert_eq!(doc.tree().node(seq).range, Span::new(0, 4));
        assert_eq!(doc.render(), "- a\n\n\n");
    }

    #[test]
    fn test_stops_at_marker() {
        let doc = Document::parse("a: 1\n---\nb: 2\n");
        assert_eq!(types(&doc), vec![NodeType::Map]);
        assert_eq!(doc.boundary(), Some(5));
        assert_eq!(doc.render(), "a: 1\n---\nb: 2\n");
    }

    #[test]
    fn test_errors_in_order() {
        let src = "a: - b\nc: \"d\n";
        let doc = Document::parse(src);
        let errors: Vec<_> = doc.errors().into_iter().map(|(_, e)| e.clone()).collect();
        assert_eq!(
            errors,
            vec![
                CstError::SequenceItemNotAtLineStart,
                CstError::Unterminated('"')
            ]
        );
        assert_eq!(doc.render(), src);
    }

    #[test]
    fn test_text_after_block_header() {
        for src in ["a: |é\n", "- >é\n", "|é", "a: |2é\n  x\n"] {
            let doc = Document::parse(src);
            assert_eq!(doc.render(), src);
        }
    }

    #[test]
    fn test_crlf() {
        let doc = Document::parse("a: 1\r\n");
        assert_eq!(doc.src(), "a: 1\n");
        assert_eq!(doc.cr_offsets(), &[4]);
        let map = doc.contents()[0];
        assert_eq!(doc.tree().node(map).range.orig, Some((0, 6)));
    }
}
