//! Flow collections: `[...]` and `{...}`.

use crate::dispatch::ParseNode;
use crate::error::CstError;
use crate::node::{CollectionType, Context, FlowItem, NodeId, NodeKind, Tree};
use crate::source::{char_at, end_of_indent, end_of_white_space, indent_diff, normalize_offset};
use crate::span::Span;
use crate::trivia::{parse_blank_line, parse_comment};

/// Whether the last node before the indicators at the end of `items`,
/// skipping comments, is a quoted scalar or a flow collection.
fn prev_node_is_json_like(tree: &Tree, items: &[FlowItem]) -> bool {
    for item in items.iter().rev() {
        match item {
            FlowItem::Node(id) => {
                let node = tree.node(*id);
                if node.json_like() {
                    return true;
                }
                if !matches!(node.kind, NodeKind::Comment) {
                    return false;
                }
            }
            FlowItem::Char { .. } => return false,
        }
    }
    false
}

fn flow_char(ch: u8, offset: usize) -> FlowItem {
    FlowItem::Char {
        ch,
        offset,
        orig_offset: None,
    }
}

/// Scan a flow collection whose opening bracket is at `start`.
///
/// Entries are delegated to `parser` in flow context. Lines inside the
/// collection must stay indented past the enclosing block's indent. Returns
/// the offset after the closing bracket and any trailing comment.
pub fn parse(tree: &mut Tree, parser: &mut dyn ParseNode, id: NodeId, start: usize) -> usize {
    let src = tree.source();
    let bytes = src.as_bytes();
    let context = tree.node(id).context;
    let flow_type = match tree.node(id).kind {
        NodeKind::FlowCollection { flow_type, .. } => flow_type,
        _ => CollectionType::Seq,
    };
    let close = match flow_type {
        CollectionType::Seq => ']',
        CollectionType::Map => '}',
    };

    let mut items = vec![flow_char(bytes[start], start)];
    let mut line_start = context.line_start;
    let mut error = None;
    let mut offset = end_of_white_space(bytes, start + 1);
    let mut ch = char_at(bytes, offset);
    while let Some(c) = ch {
        if c == b']' || c == b'}' {
            break;
        }
        match c {
            b'\n' => {
                line_start = offset + 1;
                let ws_end = end_of_white_space(bytes, line_start);
                if char_at(bytes, ws_end) == Some(b'\n') {
                    let blank_ctx = Context {
                        parent: Some(id),
                        ..context
                    };
                    let (blank, end) = parse_blank_line(tree, blank_ctx, ws_end);
                    items.push(FlowItem::Node(blank));
                    line_start = end;
                }
                offset = end_of_indent(bytes, line_start);
                let diff = indent_diff(offset, line_start, context.indent);
                if diff <= 0 {
                    let next = char_at(bytes, offset);
                    if error.is_none() && (diff < 0 || !matches!(next, Some(b']' | b'}'))) {
                        error = Some(CstError::FlowCollectionIndent);
                    }
                }
            }
            b',' => {
                items.push(flow_char(c, offset));
                offset += 1;
            }
            b'#' => {
                let comment_ctx = Context {
                    parent: Some(id),
                    line_start,
                    ..context
                };
                let (comment, end) = parse_comment(tree, comment_ctx, offset);
                items.push(FlowItem::Node(comment));
                offset = end;
            }
            b'?' | b':'
                if matches!(char_at(bytes, offset + 1), Some(b'\n' | b'\t' | b' ' | b','))
                    || (c == b':' && prev_node_is_json_like(tree, &items)) =>
            {
                items.push(flow_char(c, offset));
                offset += 1;
            }
            _ => {
                let overlay = Context {
                    parent: Some(id),
                    indent: -1,
                    line_start,
                    at_line_start: false,
                    in_collection: false,
                    in_flow: true,
                };
                match parser.parse_node(tree, overlay, offset) {
                    Some(node) => {
                        items.push(FlowItem::Node(node));
                        offset = normalize_offset(bytes, tree.node(node).range.end);
                    }
                    None => {
                        // a document marker inside the brackets
                        let node = tree.node_mut(id);
                        node.value_range = Some(Span::new(start, offset));
                        node.error = Some(CstError::Unterminated(close));
                        set_items(tree, id, items);
                        return offset;
                    }
                }
            }
        }
        offset = end_of_white_space(bytes, offset);
        ch = char_at(bytes, offset);
    }

    let node = tree.node_mut(id);
    match ch {
        Some(c) => {
            node.value_range = Some(Span::new(start, offset + 1));
            items.push(flow_char(c, offset));
            offset = end_of_white_space(bytes, offset + 1);
        }
        None => {
            node.value_range = Some(Span::new(start, offset));
            error = Some(CstError::Unterminated(close));
        }
    }
    if node.error.is_none() {
        node.error = error;
    }
    set_items(tree, id, items);
    if ch.is_some() {
        offset = tree.parse_comment_prop(id, offset);
    }
    offset
}

fn set_items(tree: &mut Tree, id: NodeId, items: Vec<FlowItem>) {
    if let NodeKind::FlowCollection { items: slot, .. } = &mut tree.node_mut(id).kind {
        *slot = items;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::node::NodeType;

    fn scan(src: &str) -> (Tree, NodeId, usize) {
        let mut tree = Tree::new(src);
        let node_type = if src.starts_with('{') {
            NodeType::FlowMap
        } else {
            NodeType::FlowSeq
        };
        let id = tree.alloc(NodeKind::for_type(node_type), Context::document(0, true));
        let end = parse(&mut tree, &mut Dispatcher, id, 0);
        (tree, id, end)
    }

    fn items(tree: &Tree, id: NodeId) -> Vec<FlowItem> {
        match &tree.node(id).kind {
            NodeKind::FlowCollection { items, .. } => items.clone(),
            _ => Vec::new(),
        }
    }

    fn chars(tree: &Tree, id: NodeId) -> String {
        items(tree, id)
            .iter()
            .filter_map(|item| match item {
                FlowItem::Char { ch, .. } => Some(*ch as char),
                FlowItem::Node(_) => None,
            })
            .collect()
    }

    #[test]
    fn test_flow_seq() {
        let (tree, id, end) = scan("[a, b] # c");
        assert_eq!(end, 10);
        assert_eq!(chars(&tree, id), "[,]");
        assert_eq!(tree.children(id).len(), 2);
        assert_eq!(tree.raw_value(id), Some("[a, b]"));
        assert_eq!(tree.comment(id).as_deref(), Some(" c"));
        assert!(tree.node(id).error.is_none());
    }

    #[test]
    fn test_flow_map() {
        let (tree, id, _) = scan("{a: 1, \"b\":2}");
        assert_eq!(chars(&tree, id), "{:,:}");
        let values: Vec<_> = tree
            .children(id)
            .into_iter()
            .map(|n| tree.raw_value(n).unwrap_or_default().to_string())
            .collect();
        assert_eq!(values, vec!["a", "1", "\"b\"", "2"]);
    }

    #[test]
    fn test_nested_and_multi_line() {
        let (tree, id, end) = scan("[a,\n  [b],\n\n  c]\n");
        assert_eq!(end, 16);
        let children = tree.children(id);
        let types: Vec<_> = children.iter().map(|&n| tree.node(n).node_type()).collect();
        assert_eq!(
            types,
            vec![
                NodeType::Plain,
                NodeType::FlowSeq,
                NodeType::BlankLine,
                NodeType::Plain
            ]
        );
        assert!(tree.node(id).error.is_none());
    }

    #[test]
    fn test_unterminated() {
        let (tree, id, end) = scan("[a, b");
        assert_eq!(end, 5);
        assert_eq!(tree.node(id).error, Some(CstError::Unterminated(']')));
    }

    #[test]
    fn test_insufficient_indent() {
        let mut tree = Tree::new("- [a,\nb]");
        let ctx = Context {
            indent: 0,
            ..Context::document(0, false)
        };
        let id = tree.alloc(NodeKind::for_type(NodeType::FlowSeq), ctx);
        parse(&mut tree, &mut Dispatcher, id, 2);
        assert_eq!(tree.node(id).error, Some(CstError::FlowCollectionIndent));
    }
}
