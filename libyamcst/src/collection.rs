//! Block collections.
//!
//! A collection is started by the dispatcher once its first entry has been
//! parsed: either a collection item (`- `, `? `, `: `) or an implicit key
//! followed by `:`. It then keeps consuming entries and the comments and
//! blank lines between them for as long as they sit at the column of the
//! first entry.
//!
//! A collection never claims trivia that belong to an outer, less indented
//! owner. Comments and blank lines that end up at the tail of a collection
//! are handed back to the caller by [`Tree::grab_end_trivia`], and the ranges of
//! everything between the caller's node and that collection are pulled back
//! to exclude them.

use crate::dispatch::ParseNode;
use crate::item::partition_props;
use crate::node::{CollectionType, Context, ItemType, NodeId, NodeKind, Tree};
use crate::source::{
    at_blank, char_at, char_before, end_of_indent, end_of_white_space, indent_diff,
    next_content_has_indent, normalize_offset, start_of_line,
};
use crate::trivia::{parse_blank_line, parse_comment};

/// Trivia detached from the tail of a collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrimReport {
    /// Start of the first detached node; the new end of the trimmed ranges.
    pub boundary: usize,
    /// Detached nodes, in source order. The caller takes ownership of them.
    pub detached: Vec<NodeId>,
}

impl Tree {
    /// Detach the trailing trivia of the collection inside `node`.
    ///
    /// `node` is unwrapped through collection items down to a block
    /// collection. Trailing blank lines are always detached; a trailing
    /// comment only if it sits left of the collection's own indent.
    /// Detaching stops at the first entry that is not eligible. Returns
    /// `None` if nothing was detached.
    pub fn grab_end_trivia(&mut self, node: NodeId) -> Option<TrimReport> {
        let collection = self.innermost_collection(node)?;
        let items = self.items(collection);
        let mut cut = None;
        for (i, &item) in items.iter().enumerate().rev() {
            let entry = self.node(item);
            match entry.kind {
                NodeKind::Comment => {
                    let Context {
                        indent, line_start, ..
                    } = entry.context;
                    if indent > 0 && indent_diff(entry.range.start, line_start, indent) >= 0 {
                        break;
                    }
                    cut = Some(i);
                }
                NodeKind::BlankLine => cut = Some(i),
                _ => break,
            }
        }
        let detached = self.split_items(collection, cut?);
        let boundary = self.node(detached[0]).range.start;

        // pull back every range from the collection up to the caller's node
        let mut current = collection;
        loop {
            let n = self.node_mut(current);
            n.range.end = boundary;
            if let Some(value_range) = n.value_range.as_mut() {
                value_range.end = value_range.end.min(boundary);
            }
            if current == node {
                break;
            }
            match n.context.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        log::trace!(
            "reattach {} trivia from collection {} at {}",
            detached.len(),
            collection.index(),
            boundary
        );
        Some(TrimReport { boundary, detached })
    }
}

/// Wrap `first` in a new collection.
///
/// Props of `first` on earlier lines move to the collection, and trailing
/// trivia the first entry picked up are detached into the collection's own
/// items. The collection's range is left for [`parse`] to fill in.
pub fn create(tree: &mut Tree, first: NodeId, context: Context) -> NodeId {
    let collection_type = match tree.node(first).kind {
        NodeKind::CollectionItem {
            item_type: ItemType::SeqItem,
            ..
        } => CollectionType::Seq,
        _ => CollectionType::Map,
    };
    let props = partition_props(tree, first);
    let id = tree.alloc(
        NodeKind::Collection {
            collection_type,
            items: vec![first],
        },
        context,
    );
    tree.node_mut(id).props = props;
    if let Some(report) = tree.grab_end_trivia(first) {
        for item in report.detached {
            tree.push_item(id, item);
        }
    }
    id
}

fn is_seq(tree: &Tree, id: NodeId) -> bool {
    matches!(
        tree.node(id).kind,
        NodeKind::Collection {
            collection_type: CollectionType::Seq,
            ..
        }
    )
}

/// Continue the collection `id` from `start`, just after its first entry.
///
/// Returns the offset where the caller should resume; when the collection
/// stops at a line it does not own, that is the start of the line.
pub fn parse(
    tree: &mut Tree,
    parser: &mut dyn ParseNode,
    id: NodeId,
    context: Context,
    start: usize,
) -> usize {
    let src = tree.source();
    let bytes = src.as_bytes();
    tree.node_mut(id).context = context;
    log::trace!("collection {} from {}", id.index(), start);

    let mut line_start = start_of_line(bytes, start);
    let first = tree.items(id)[0];
    let first_node = tree.node_mut(first);
    first_node.context.parent = Some(id);
    let indent = (first_node.range.start - first_node.context.line_start) as isize;
    let first_value = first_node.value_range;
    tree.node_mut(id).value_range = first_value;
    let is_seq = is_seq(tree, id);

    let mut offset = normalize_offset(bytes, start);
    let mut ch = char_at(bytes, offset);
    let mut at_line_start = end_of_white_space(bytes, line_start) == offset;
    let mut prev_includes_trailing_lines = false;
    // a boundary at a line start must not cut into the last entry
    let mut last_end = start;
    log::trace!("collection {} items at indent {}", id.index(), indent);

    while ch.is_some() {
        while matches!(ch, Some(b'\n' | b'#')) {
            if at_line_start && ch == Some(b'\n') && !prev_includes_trailing_lines {
                let trivia_ctx = Context {
                    parent: Some(id),
                    indent,
                    line_start,
                    at_line_start: true,
                    in_collection: true,
                    in_flow: false,
                };
                let (blank, end) = parse_blank_line(tree, trivia_ctx, offset);
                offset = end;
                tree.set_value_end(id, offset);
                tree.push_item(id, blank);
                if offset >= bytes.len() {
                    ch = None;
                    break;
                }
                offset -= 1;
            } else if ch == Some(b'#') {
                if indent_diff(offset, line_start, indent) < 0
                    && !next_content_has_indent(bytes, offset, indent)
                {
                    log::trace!("collection {} ends at less indented comment", id.index());
                    return if line_start >= last_end { line_start } else { offset };
                }
                let trivia_ctx = Context {
                    parent: Some(id),
                    indent,
                    line_start,
                    at_line_start,
                    in_collection: true,
                    in_flow: false,
                };
                let (comment, end) = parse_comment(tree, trivia_ctx, offset);
                tree.push_item(id, comment);
                offset = end;
                tree.set_value_end(id, offset);
                if offset >= bytes.len() {
                    ch = None;
                    break;
                }
            }
            line_start = offset + 1;
            offset = end_of_indent(bytes, line_start);
            if at_blank(bytes, offset, false) {
                let ws_end = end_of_white_space(bytes, offset);
                if matches!(char_at(bytes, ws_end), None | Some(b'\n' | b'#')) {
                    offset = ws_end;
                }
            }
            ch = char_at(bytes, offset);
            at_line_start = true;
        }

        let Some(c) = ch else {
            log::trace!("collection {} ends at end of input", id.index());
            break;
        };
        if indent_diff(offset, line_start, indent) != 0 && (at_line_start || c != b':') {
            log::trace!("collection {} ends at unindent", id.index());
            if line_start >= last_end {
                offset = line_start;
            }
            break;
        }
        if is_seq != (c == b'-') {
            let type_switch = c != b'-' || at_blank(bytes, offset + 1, true);
            if type_switch {
                log::trace!("collection {} ends at entry of other type", id.index());
                if line_start >= last_end {
                    offset = line_start;
                }
                break;
            }
        }

        let overlay = Context {
            parent: Some(id),
            indent,
            line_start,
            at_line_start,
            in_collection: true,
            in_flow: false,
        };
        let Some(node) = parser.parse_node(tree, overlay, offset) else {
            // a document boundary
            return offset;
        };
        tree.push_item(id, node);
        let entry = tree.node(node);
        let entry_end = entry.range.end;
        last_end = last_end.max(entry_end);
        if let Some(value_range) = entry.value_range {
            tree.set_value_end(id, value_range.end);
        }
        offset = normalize_offset(bytes, entry_end);
        ch = char_at(bytes, offset);
        at_line_start = false;
        prev_includes_trailing_lines = tree.includes_trailing_lines(node);
        if ch.is_some() {
            let mut ls = offset;
            while matches!(char_before(bytes, ls), Some(b' ' | b'\t')) {
                ls -= 1;
            }
            if char_before(bytes, ls) == Some(b'\n') {
                line_start = ls;
                at_line_start = true;
            }
        }
        if let Some(report) = tree.grab_end_trivia(node) {
            for item in report.detached {
                tree.push_item(id, item);
            }
        }
        log::trace!("collection {} entry {} ends at {}", id.index(), node.index(), offset);
    }
    offset
}
