//! Block collection entries: `- `, `? ` and `: ` items.

use crate::dispatch::ParseNode;
use crate::error::CstError;
use crate::node::{Context, ItemType, NodeId, NodeKind, Tree};
use crate::source::{
    char_at, end_of_indent, end_of_line, end_of_white_space, indent_diff, next_node_is_indented,
};
use crate::span::Span;

fn item_type(tree: &Tree, id: NodeId) -> ItemType {
    match tree.node(id).kind {
        NodeKind::CollectionItem { item_type, .. } => item_type,
        _ => ItemType::SeqItem,
    }
}

/// Scan a collection item whose indicator is at `start`.
///
/// Whatever follows the indicator (on the same line, or on later lines that
/// are indented enough) is delegated to `parser` and becomes the item's
/// node. Comments between the indicator and that node become props of the
/// item. Returns the offset where scanning should resume.
pub fn parse(tree: &mut Tree, parser: &mut dyn ParseNode, id: NodeId, start: usize) -> usize {
    let src = tree.source();
    let bytes = src.as_bytes();
    let context = tree.node(id).context;
    let item_type = item_type(tree, id);

    let mut at_line_start = context.at_line_start;
    let mut line_start = context.line_start;
    if !at_line_start && item_type == ItemType::SeqItem {
        tree.node_mut(id).error = Some(CstError::SequenceItemNotAtLineStart);
    }
    let indent = if at_line_start {
        (start - line_start) as isize
    } else {
        context.indent
    };

    let mut offset = end_of_white_space(bytes, start + 1);
    let mut ch = char_at(bytes, offset);
    let inline_comment = ch == Some(b'#');
    let mut comments = Vec::new();
    while matches!(ch, Some(b'\n' | b'#')) {
        if ch == Some(b'#') {
            let end = end_of_line(bytes, offset + 1);
            comments.push(Span::new(offset, end));
            offset = end;
        } else {
            at_line_start = true;
            line_start = offset + 1;
            offset = end_of_indent(bytes, line_start);
        }
        ch = char_at(bytes, offset);
    }

    let mut node = None;
    if next_node_is_indented(
        ch,
        indent_diff(offset, line_start, indent),
        item_type != ItemType::SeqItem,
    ) {
        let overlay = Context {
            parent: Some(id),
            indent,
            line_start,
            at_line_start,
            in_collection: false,
            in_flow: false,
        };
        node = parser.parse_node(tree, overlay, offset);
    }

    let value_end = match node {
        Some(inner) => {
            tree.node_mut(id).props.extend(comments);
            let inner = tree.node(inner);
            offset = inner.range.end;
            inner.value_range.map_or(offset, |span| span.end)
        }
        None if inline_comment => {
            let comment = comments[0];
            tree.node_mut(id).props.push(comment);
            offset = comment.end;
            offset
        }
        None => {
            offset = end_of_line(bytes, start + 1);
            offset
        }
    };

    let item = tree.node_mut(id);
    item.value_range = Some(Span::new(start, value_end));
    if let NodeKind::CollectionItem { node: slot, .. } = &mut item.kind {
        *slot = node;
    }
    offset
}

/// Move the props of `first` that sit on lines before its own line off the
/// node, returning them in order. The node's range then starts at its first
/// remaining prop, or at its value.
pub fn partition_props(tree: &mut Tree, first: NodeId) -> Vec<Span> {
    let node = tree.node_mut(first);
    let line_start = node.context.line_start;
    let Some(last) = node.props.iter().rposition(|prop| prop.start < line_start) else {
        return Vec::new();
    };
    let own = node.props.split_off(last + 1);
    let moved = std::mem::replace(&mut node.props, own);
    if let Some(start) = node
        .props
        .first()
        .or(node.value_range.as_ref())
        .map(|span| span.start)
    {
        node.range.start = start;
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Dispatcher;
    use crate::node::NodeType;

    fn parse_item(src: &str, item: NodeType, start: usize) -> (Tree, NodeId, usize) {
        let mut tree = Tree::new(src);
        let id = tree.alloc(NodeKind::for_type(item), Context::document(0, true));
        let end = parse(&mut tree, &mut Dispatcher, id, start);
        tree.node_mut(id).range = Span::new(start, end);
        (tree, id, end)
    }

    fn inner(tree: &Tree, id: NodeId) -> Option<NodeId> {
        match tree.node(id).kind {
            NodeKind::CollectionItem { node, .. } => node,
            _ => None,
        }
    }

    #[test]
    fn test_inline_value() {
        let (tree, id, end) = parse_item("- a\n", NodeType::SeqItem, 0);
        assert_eq!(end, 3);
        let node = inner(&tree, id).unwrap();
        assert_eq!(tree.node(node).node_type(), NodeType::Plain);
        assert_eq!(tree.raw_value(node), Some("a"));
        assert_eq!(tree.node(id).value_range, Some(Span::new(0, 3)));
        assert!(tree.node(id).error.is_none());
    }

    #[test]
    fn test_empty_item() {
        let (tree, id, end) = parse_item("-\n- b", NodeType::SeqItem, 0);
        assert_eq!(end, 1);
        assert_eq!(inner(&tree, id), None);
        assert_eq!(tree.node(id).value_range, Some(Span::new(0, 1)));
    }

    #[test]
    fn test_inline_comment_only() {
        let (tree, id, end) = parse_item("- # c\n- b", NodeType::SeqItem, 0);
        assert_eq!(end, 5);
        assert_eq!(inner(&tree, id), None);
        assert_eq!(tree.node(id).props, vec![Span::new(2, 5)]);
    }

    #[test]
    fn test_value_on_next_line() {
        let (tree, id, _) = parse_item("- # c\n  a\n", NodeType::SeqItem, 0);
        let node = inner(&tree, id).unwrap();
        assert_eq!(tree.raw_value(node), Some("a"));
        assert_eq!(tree.comment(id).as_deref(), Some(" c"));
    }

    #[test]
    fn test_comment_on_later_line_is_left_behind() {
        let (tree, id, end) = parse_item("-\n  # c\n- b", NodeType::SeqItem, 0);
        assert_eq!(end, 1);
        assert!(tree.node(id).props.is_empty());
    }

    #[test]
    fn test_sequence_item_not_at_line_start() {
        let mut tree = Tree::new("a: - b");
        let ctx = Context {
            at_line_start: false,
            ..Context::document(0, false)
        };
        let id = tree.alloc(NodeKind::for_type(NodeType::SeqItem), ctx);
        parse(&mut tree, &mut Dispatcher, id, 3);
        assert_eq!(
            tree.node(id).error,
            Some(CstError::SequenceItemNotAtLineStart)
        );
    }

    #[test]
    fn test_partition_props() {
        let mut tree = Tree::new("&a\n!t b: c");
        let ctx = Context::document(3, true);
        let id = tree.alloc(NodeKind::Plain, ctx);
        let node = tree.node_mut(id);
        node.props = vec![Span::new(0, 2), Span::new(3, 5)];
        node.range = Span::new(0, 7);
        node.value_range = Some(Span::new(6, 7));
        let moved = partition_props(&mut tree, id);
        assert_eq!(moved, vec![Span::new(0, 2)]);
        assert_eq!(tree.node(id).props, vec![Span::new(3, 5)]);
        assert_eq!(tree.node(id).range.start, 3);
    }

    #[test]
    fn test_partition_props_all_moved() {
        let mut tree = Tree::new("&a\nb: c");
        let id = tree.alloc(NodeKind::Plain, Context::document(3, true));
        let node = tree.node_mut(id);
        node.props = vec![Span::new(0, 2)];
        node.range = Span::new(0, 4);
        node.value_range = Some(Span::new(3, 4));
        assert_eq!(partition_props(&mut tree, id), vec![Span::new(0, 2)]);
        assert!(tree.node(id).props.is_empty());
        assert_eq!(tree.node(id).range.start, 3);
    }

    #[test]
    fn test_partition_props_none_before() {
        let mut tree = Tree::new("&a b: c");
        let id = tree.alloc(NodeKind::Plain, Context::document(0, true));
        tree.node_mut(id).props = vec![Span::new(0, 2)];
        tree.node_mut(id).range = Span::new(0, 4);
        assert!(partition_props(&mut tree, id).is_empty());
        assert_eq!(tree.node(id).range.start, 0);
    }
}
