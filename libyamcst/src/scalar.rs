//! Scalar and alias nodes.
//!
//! Each `parse_*` function fills in the value range (and trailing comment
//! prop) of an already allocated node and returns the offset where the
//! scan should resume. The caller sets the node's full range.

use crate::error::CstError;
use crate::node::{BlockHeader, Chomp, NodeId, NodeKind, Tree};
use crate::source::{
    at_document_boundary, char_at, end_of_block_indent, end_of_identifier, end_of_line,
    end_of_white_space, indent_diff,
};
use crate::span::Span;

/// End of the part of a plain scalar on the line starting at `start`.
///
/// Stops before a line break, before `: ` and before ` #`; in flow context
/// also before flow indicators and `:,`.
pub fn plain_end_of_line(src: &[u8], start: usize, in_flow: bool) -> usize {
    let mut offset = start;
    while let Some(ch) = char_at(src, offset) {
        if ch == b'\n' {
            break;
        }
        if in_flow && matches!(ch, b'[' | b']' | b'{' | b'}' | b',') {
            break;
        }
        let next = char_at(src, offset + 1);
        if ch == b':'
            && (matches!(next, None | Some(b'\n' | b'\t' | b' ')) || (in_flow && next == Some(b',')))
        {
            break;
        }
        if matches!(ch, b' ' | b'\t') && next == Some(b'#') {
            break;
        }
        offset += 1;
    }
    offset
}

fn has_comment(tree: &Tree, id: NodeId) -> bool {
    let bytes = tree.src().as_bytes();
    tree.node(id)
        .props
        .iter()
        .any(|prop| char_at(bytes, prop.start) == Some(b'#'))
}

/// Continuation lines of a plain scalar, starting at the line break `start`.
fn parse_plain_continuation(tree: &mut Tree, id: NodeId, start: usize) -> usize {
    let src = tree.source();
    let bytes = src.as_bytes();
    let context = tree.node(id).context;
    let mut offset = start;
    let mut value_end = start;
    while char_at(bytes, offset) == Some(b'\n') {
        if at_document_boundary(bytes, offset + 1, None) {
            break;
        }
        let Some(end) = end_of_block_indent(bytes, context.indent, offset + 1) else {
            break;
        };
        match char_at(bytes, end) {
            Some(b'#') => break,
            Some(b'\n') => offset = end,
            // blank lines before the end of input are not part of the scalar
            None => break,
            Some(_) => {
                value_end = plain_end_of_line(bytes, end, context.in_flow);
                offset = value_end;
            }
        }
    }
    let node = tree.node_mut(id);
    let value_range = node.value_range.get_or_insert(Span::at(start));
    if value_range.is_empty() {
        value_range.start = start;
    }
    value_range.end = value_end;
    value_end
}

/// Plain (unquoted) scalar, possibly spanning several more indented lines.
pub fn parse_plain(tree: &mut Tree, id: NodeId, start: usize) -> usize {
    let src = tree.source();
    let bytes = src.as_bytes();
    let in_flow = tree.node(id).context.in_flow;
    let mut offset = start;
    if !matches!(char_at(bytes, offset), None | Some(b'#' | b'\n')) {
        offset = plain_end_of_line(bytes, start, in_flow);
    }
    tree.node_mut(id).value_range = Some(Span::new(start, offset));
    offset = end_of_white_space(bytes, offset);
    offset = tree.parse_comment_prop(id, offset);
    let value_empty = tree.node(id).value_range.map_or(true, |span| span.is_empty());
    if !has_comment(tree, id) || value_empty {
        offset = parse_plain_continuation(tree, id, offset);
    }
    offset
}

/// Offset just past the closing quote, or `None` if the input ends first.
fn end_of_double_quote(src: &[u8], mut offset: usize) -> Option<usize> {
    while let Some(ch) = char_at(src, offset) {
        match ch {
            b'"' => return Some(offset + 1),
            b'\\' => offset += 2,
            _ => offset += 1,
        }
    }
    None
}

fn end_of_single_quote(src: &[u8], mut offset: usize) -> Option<usize> {
    while let Some(ch) = char_at(src, offset) {
        if ch == b'\'' {
            if char_at(src, offset + 1) != Some(b'\'') {
                return Some(offset + 1);
            }
            offset += 2;
        } else {
            offset += 1;
        }
    }
    None
}

fn parse_quoted(tree: &mut Tree, id: NodeId, start: usize, quote: u8) -> usize {
    let src = tree.source();
    let bytes = src.as_bytes();
    let end = if quote == b'"' {
        end_of_double_quote(bytes, start + 1)
    } else {
        end_of_single_quote(bytes, start + 1)
    };
    let node = tree.node_mut(id);
    let offset = match end {
        Some(end) => end,
        None => {
            node.error = Some(CstError::Unterminated(quote as char));
            bytes.len()
        }
    };
    node.value_range = Some(Span::new(start, offset));
    let offset = end_of_white_space(bytes, offset);
    tree.parse_comment_prop(id, offset)
}

/// `"..."` scalar; may span lines, `\` escapes the next byte.
pub fn parse_double_quoted(tree: &mut Tree, id: NodeId, start: usize) -> usize {
    parse_quoted(tree, id, start, b'"')
}

/// `'...'` scalar; `''` stands for one quote.
pub fn parse_single_quoted(tree: &mut Tree, id: NodeId, start: usize) -> usize {
    parse_quoted(tree, id, start, b'\'')
}

/// `*name` alias.
pub fn parse_alias(tree: &mut Tree, id: NodeId, start: usize) -> usize {
    let src = tree.source();
    let bytes = src.as_bytes();
    let end = end_of_identifier(bytes, start + 1);
    tree.node_mut(id).value_range = Some(Span::new(start + 1, end));
    let offset = end_of_white_space(bytes, end);
    tree.parse_comment_prop(id, offset)
}

/// `|` or `>` block scalar whose indicator is at `start`.
///
/// The value range starts on the line after the header. Unless the
/// chomping indicator is `+`, it ends just after the last content line's
/// line break; with `+` it also covers the trailing empty lines.
pub fn parse_block_value(tree: &mut Tree, id: NodeId, start: usize) -> usize {
    let src = tree.source();
    let bytes = src.as_bytes();
    let context = tree.node(id).context;

    let mut offset = start + 1;
    let mut chomping = Chomp::Clip;
    let mut explicit_indent = 0isize;
    loop {
        match char_at(bytes, offset) {
            Some(b'-') => chomping = Chomp::Strip,
            Some(b'+') => chomping = Chomp::Keep,
            Some(digit @ b'0'..=b'9') => {
                explicit_indent = explicit_indent
                    .saturating_mul(10)
                    .saturating_add(isize::from(digit - b'0'))
            }
            _ => break,
        }
        offset += 1;
    }
    let header = Span::new(start, offset);
    let explicit = explicit_indent > 0;
    let mut block_indent = explicit.then_some(explicit_indent);

    offset = end_of_white_space(bytes, offset);
    offset = tree.parse_comment_prop(id, offset);
    let body_start = offset;

    let mut value_end = offset;
    let mut min_block_indent = 1isize;
    let mut error = None;
    while char_at(bytes, offset) == Some(b'\n') {
        offset += 1;
        if at_document_boundary(bytes, offset, None) {
            break;
        }
        let Some(end) = end_of_block_indent(bytes, context.indent, offset) else {
            break;
        };
        let ch = char_at(bytes, end);
        let line_indent = indent_diff(end, offset, context.indent);
        match block_indent {
            None if ch != Some(b'\n') => {
                if line_indent < min_block_indent {
                    error = Some(CstError::BlockScalarLeadingEmptyLines);
                }
                block_indent = Some(line_indent);
            }
            None => min_block_indent = min_block_indent.max(line_indent),
            Some(indent) => {
                if matches!(ch, Some(c) if c != b'\n') && line_indent < indent {
                    if ch == Some(b'#') {
                        break;
                    }
                    if error.is_none() {
                        error = Some(CstError::BlockScalarUnderIndented(if explicit {
                            "explicit indentation indicator"
                        } else {
                            "first line"
                        }));
                    }
                }
            }
        }
        if ch == Some(b'\n') {
            offset = end;
        } else {
            offset = end_of_line(bytes, end);
            value_end = offset;
        }
    }
    if chomping != Chomp::Keep {
        offset = if char_at(bytes, value_end) == Some(b'\n') {
            value_end + 1
        } else {
            value_end
        };
    }

    let node = tree.node_mut(id);
    node.value_range = Some(Span::new((body_start + 1).min(offset), offset));
    if node.error.is_none() {
        node.error = error;
    }
    if let NodeKind::BlockValue(block) = &mut node.kind {
        *block = BlockHeader {
            literal: block.literal,
            chomping,
            block_indent,
            header,
        };
    }
    offset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Context, NodeType};

    fn scan(
        src: &str,
        node_type: NodeType,
        context: Context,
        parse: fn(&mut Tree, NodeId, usize) -> usize,
        start: usize,
    ) -> (Tree, NodeId, usize) {
        let mut tree = Tree::new(src);
        let id = tree.alloc(NodeKind::for_type(node_type), context);
        let end = parse(&mut tree, id, start);
        (tree, id, end)
    }

    fn block_ctx(indent: isize) -> Context {
        Context {
            indent,
            ..Context::document(0, true)
        }
    }

    #[test]
    fn test_plain_end_of_line() {
        assert_eq!(plain_end_of_line(b"a b: c", 0, false), 3);
        assert_eq!(plain_end_of_line(b"a:b", 0, false), 3);
        assert_eq!(plain_end_of_line(b"a #c", 0, false), 1);
        assert_eq!(plain_end_of_line(b"a#c", 0, false), 3);
        assert_eq!(plain_end_of_line(b"a, b]", 0, true), 1);
        assert_eq!(plain_end_of_line(b"a:,b", 0, true), 1);
        assert_eq!(plain_end_of_line(b"a, b]", 0, false), 5);
    }

    #[test]
    fn test_plain_multi_line() {
        let src = "a\n b\n\n c\nd";
        let (tree, id, end) = scan(src, NodeType::Plain, block_ctx(-1), parse_plain, 0);
        // `d` is at column 0, more indented than the document level
        assert_eq!(end, 10);
        assert_eq!(tree.raw_value(id), Some(src));
        let (tree, id, end) = scan(src, NodeType::Plain, block_ctx(0), parse_plain, 0);
        assert_eq!(end, 8);
        assert_eq!(tree.raw_value(id), Some("a\n b\n\n c"));
    }

    #[test]
    fn test_plain_trailing_blank_lines_excluded() {
        let (tree, id, end) = scan("a\n\n\n", NodeType::Plain, block_ctx(0), parse_plain, 0);
        assert_eq!(end, 1);
        assert_eq!(tree.raw_value(id), Some("a"));
    }

    #[test]
    fn test_plain_with_comment_is_single_line() {
        let (tree, id, end) = scan("a # c\n b", NodeType::Plain, block_ctx(-1), parse_plain, 0);
        assert_eq!(end, 5);
        assert_eq!(tree.raw_value(id), Some("a"));
        assert_eq!(tree.comment(id).as_deref(), Some(" c"));
    }

    #[test]
    fn test_double_quoted() {
        let src = r#""a\"b" # c"#;
        let (tree, id, end) = scan(src, NodeType::QuoteDouble, block_ctx(-1), parse_double_quoted, 0);
        assert_eq!(end, src.len());
        assert_eq!(tree.raw_value(id), Some(r#""a\"b""#));
        assert!(tree.node(id).error.is_none());
    }

    #[test]
    fn test_single_quoted() {
        let (tree, id, end) = scan("'it''s'\n", NodeType::QuoteSingle, block_ctx(-1), parse_single_quoted, 0);
        assert_eq!(end, 7);
        assert_eq!(tree.raw_value(id), Some("'it''s'"));
    }

    #[test]
    fn test_unterminated_quote() {
        let (tree, id, end) = scan("\"abc", NodeType::QuoteDouble, block_ctx(-1), parse_double_quoted, 0);
        assert_eq!(end, 4);
        assert_eq!(tree.node(id).error, Some(CstError::Unterminated('"')));
        let (tree, id, _) = scan("'a\\'", NodeType::QuoteSingle, block_ctx(-1), parse_single_quoted, 0);
        assert!(tree.node(id).error.is_none());
        assert_eq!(tree.raw_value(id), Some("'a\\'"));
    }

    #[test]
    fn test_alias() {
        let (tree, id, end) = scan("*ref # c", NodeType::Alias, block_ctx(-1), parse_alias, 0);
        assert_eq!(end, 8);
        assert_eq!(tree.raw_value(id), Some("ref"));
    }

    fn header(tree: &Tree, id: NodeId) -> BlockHeader {
        match &tree.node(id).kind {
            NodeKind::BlockValue(header) => header.clone(),
            _ => panic!("not a block value"),
        }
    }

    #[test]
    fn test_block_literal() {
        let src = "|\n  a\n  b\nc";
        let (tree, id, end) = scan(src, NodeType::BlockLiteral, block_ctx(0), parse_block_value, 0);
        assert_eq!(end, 10);
        assert_eq!(tree.raw_value(id), Some("  a\n  b\n"));
        let header = header(&tree, id);
        assert!(header.literal);
        assert_eq!(header.chomping, Chomp::Clip);
        assert_eq!(header.block_indent, Some(2));
        assert_eq!(header.header, Span::new(0, 1));
    }

    #[test]
    fn test_block_keep_covers_trailing_lines() {
        let src = "|+\n  a\n\n- b";
        let (tree, id, end) = scan(src, NodeType::BlockLiteral, block_ctx(0), parse_block_value, 0);
        assert_eq!(end, 8);
        assert_eq!(tree.raw_value(id), Some("  a\n\n"));
        assert_eq!(header(&tree, id).chomping, Chomp::Keep);
        assert!(tree.includes_trailing_lines(id));
    }

    #[test]
    fn test_block_strip_with_indicator() {
        let src = ">2-\n   a\n";
        let (tree, id, end) = scan(src, NodeType::BlockFolded, block_ctx(0), parse_block_value, 0);
        assert_eq!(end, 9);
        let header = header(&tree, id);
        assert!(!header.literal);
        assert_eq!(header.chomping, Chomp::Strip);
        assert_eq!(header.block_indent, Some(2));
        assert!(tree.node(id).error.is_none());
    }

    #[test]
    fn test_block_under_indented() {
        let src = "|\n    a\n  b\n";
        let (tree, id, _) = scan(src, NodeType::BlockLiteral, block_ctx(0), parse_block_value, 0);
        assert_eq!(
            tree.node(id).error,
            Some(CstError::BlockScalarUnderIndented("first line"))
        );
    }

    #[test]
    fn test_block_leading_empty_lines() {
        let src = "|\n    \n  a\n";
        let (tree, id, _) = scan(src, NodeType::BlockLiteral, block_ctx(0), parse_block_value, 0);
        assert_eq!(
            tree.node(id).error,
            Some(CstError::BlockScalarLeadingEmptyLines)
        );
    }

    #[test]
    fn test_block_header_comment() {
        let src = "| # c\n  a\n";
        let (tree, id, end) = scan(src, NodeType::BlockLiteral, block_ctx(0), parse_block_value, 0);
        assert_eq!(end, 10);
        assert_eq!(tree.comment(id).as_deref(), Some(" c"));
        assert_eq!(tree.raw_value(id), Some("  a\n"));
    }

    #[test]
    fn test_block_header_followed_by_text() {
        let (tree, id, end) = scan("|é\n", NodeType::BlockLiteral, block_ctx(0), parse_block_value, 0);
        assert_eq!(end, 1);
        assert_eq!(tree.raw_value(id), Some(""));
    }
}
