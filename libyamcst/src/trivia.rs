//! Comment and blank-line nodes.
//!
//! Trivia carry no value. They are kept as nodes so that rendering can put
//! every byte back and so that a block collection can hand trailing trivia
//! over to whoever owns the lines that follow it.

use crate::node::{Context, NodeId, NodeKind, Tree};
use crate::source::end_of_white_space;
use crate::span::Span;

/// Scan a comment whose `#` is at `start`.
///
/// The comment text is also recorded as the node's only prop. Returns the
/// node and the offset of the line break that ends it (or the buffer length).
pub fn parse_comment(tree: &mut Tree, context: Context, start: usize) -> (NodeId, usize) {
    let id = tree.alloc(NodeKind::Comment, context);
    let end = tree.parse_comment_prop(id, start);
    tree.node_mut(id).range = Span::new(start, end);
    (id, end)
}

/// Record the line break at `start` as a blank line. Returns the node and
/// the offset just after the break.
pub fn parse_blank_line(tree: &mut Tree, context: Context, start: usize) -> (NodeId, usize) {
    let id = tree.alloc(NodeKind::BlankLine, context);
    let end = if start < tree.src().len() { start + 1 } else { start };
    tree.node_mut(id).range = Span::new(start, end);
    (id, end)
}

/// Skip whitespace only if it leads to a comment or a line break.
pub fn start_comment_or_end_blank_line(src: &[u8], offset: usize) -> usize {
    let ws_end = end_of_white_space(src, offset);
    match src.get(ws_end) {
        Some(b'#' | b'\n') => ws_end,
        _ => offset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comment() {
        let mut tree = Tree::new("a # note\nb");
        let (id, end) = parse_comment(&mut tree, Context::document(0, false), 2);
        assert_eq!(end, 8);
        let node = tree.node(id);
        assert_eq!(node.range, Span::new(2, 8));
        assert_eq!(node.props, vec![Span::new(2, 8)]);
        assert_eq!(tree.comment(id).as_deref(), Some(" note"));
    }

    #[test]
    fn test_comment_at_end_of_buffer() {
        let mut tree = Tree::new("#");
        let (id, end) = parse_comment(&mut tree, Context::document(0, true), 0);
        assert_eq!(end, 1);
        assert_eq!(tree.comment(id).as_deref(), Some(""));
    }

    #[test]
    fn test_blank_line() {
        let mut tree = Tree::new("a\n\nb");
        let (id, end) = parse_blank_line(&mut tree, Context::document(2, true), 2);
        assert_eq!(end, 3);
        assert_eq!(tree.node(id).range, Span::new(2, 3));
        assert!(tree.node(id).is_trivia());
    }

    #[test]
    fn test_start_comment_or_end_blank_line() {
        assert_eq!(start_comment_or_end_blank_line(b"a  # c", 1), 3);
        assert_eq!(start_comment_or_end_blank_line(b"a  \n", 1), 3);
        assert_eq!(start_comment_or_end_blank_line(b"a  b", 1), 1);
    }
}
