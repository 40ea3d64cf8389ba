//! Node dispatch.
//!
//! Given a start offset, [`Dispatcher`] collects the node's props (anchors,
//! tags and comments, possibly over several lines), picks the node type from
//! the next character, runs the matching scanner and, if the node turns out
//! to be the first entry of a block collection, continues with that
//! collection instead.

use crate::collection;
use crate::error::CstError;
use crate::flow;
use crate::item;
use crate::node::{Context, ItemType, NodeId, NodeKind, NodeType, Tree};
use crate::scalar;
use crate::source::{
    at_blank, at_document_boundary, char_at, char_before, end_of_identifier, end_of_indent,
    end_of_line, end_of_white_space, indent_diff, next_node_is_indented,
};
use crate::span::Span;

/// Parses one node at a given offset.
///
/// Collection items, block collections and flow collections delegate their
/// entries through this trait, so a caller can substitute its own node
/// parser for some or all offsets.
pub trait ParseNode {
    /// Parse the node starting at `start` in `context`. Returns `None` at a
    /// document boundary (including the end of input).
    fn parse_node(&mut self, tree: &mut Tree, context: Context, start: usize) -> Option<NodeId>;
}

/// The standard node parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct Dispatcher;

/// Node type indicated by the character at `offset`.
pub fn parse_type(src: &[u8], offset: usize, in_flow: bool) -> NodeType {
    match char_at(src, offset) {
        Some(b'*') => NodeType::Alias,
        Some(b'>') => NodeType::BlockFolded,
        Some(b'|') => NodeType::BlockLiteral,
        Some(b'{') => NodeType::FlowMap,
        Some(b'[') => NodeType::FlowSeq,
        Some(b'?') if !in_flow && at_blank(src, offset + 1, true) => NodeType::MapKey,
        Some(b':') if !in_flow && at_blank(src, offset + 1, true) => NodeType::MapValue,
        Some(b'-') if !in_flow && at_blank(src, offset + 1, true) => NodeType::SeqItem,
        Some(b'"') => NodeType::QuoteDouble,
        Some(b'\'') => NodeType::QuoteSingle,
        _ => NodeType::Plain,
    }
}

/// `seg.seg,YYYY[-MM[-DD]]/x`: a tag URI with a date, whose comma does not
/// end the tag.
fn is_dated_tag_authority(src: &[u8]) -> bool {
    fn word(src: &[u8], mut i: usize) -> usize {
        while matches!(src.get(i), Some(c) if c.is_ascii_alphanumeric() || *c == b'-') {
            i += 1;
        }
        i
    }
    fn digits(src: &[u8], i: usize, n: usize) -> bool {
        src.len() >= i + n && src[i..i + n].iter().all(u8::is_ascii_digit)
    }

    let mut i = word(src, 0);
    if i == 0 || src.get(i) != Some(&b'.') {
        return false;
    }
    let host = i + 1;
    i = word(src, host);
    if i == host || src.get(i) != Some(&b',') || !digits(src, i + 1, 4) {
        return false;
    }
    i += 5;
    for _ in 0..2 {
        if src.get(i) == Some(&b'-') && digits(src, i + 1, 2) {
            i += 3;
        } else {
            break;
        }
    }
    src.get(i) == Some(&b'/') && matches!(src.get(i + 1), Some(c) if !c.is_ascii_whitespace())
}

/// Props found before a node, the node type after them, and where the
/// node's value starts.
struct Props {
    props: Vec<Span>,
    node_type: NodeType,
    value_start: usize,
}

/// Collect props from `start`. A line break is crossed only if the next
/// non-empty line is indented enough to still belong to this node; `context`
/// is then moved to that line.
fn parse_props(tree: &Tree, context: &mut Context, start: usize) -> Props {
    let bytes = tree.src().as_bytes();
    let mut props = Vec::new();
    let mut line_has_props = false;
    let mut offset = if context.at_line_start {
        end_of_indent(bytes, start)
    } else {
        end_of_white_space(bytes, start)
    };
    let mut ch = char_at(bytes, offset);
    while matches!(ch, Some(b'&' | b'#' | b'!' | b'\n')) {
        match ch {
            Some(b'\n') => {
                let mut line_start;
                let mut in_end = offset;
                loop {
                    line_start = in_end + 1;
                    in_end = end_of_indent(bytes, line_start);
                    if char_at(bytes, in_end) != Some(b'\n') {
                        break;
                    }
                }
                let next = char_at(bytes, in_end);
                let seq_item_parent = context.parent.is_some_and(|parent| {
                    let parent = tree.node(parent);
                    matches!(
                        parent.kind,
                        NodeKind::CollectionItem {
                            item_type: ItemType::SeqItem,
                            ..
                        }
                    ) && parent.context.at_line_start
                });
                if next != Some(b'#')
                    && !next_node_is_indented(
                        next,
                        indent_diff(in_end, line_start, context.indent),
                        !seq_item_parent,
                    )
                {
                    break;
                }
                context.at_line_start = true;
                context.line_start = line_start;
                line_has_props = false;
                offset = in_end;
            }
            Some(b'#') => {
                let end = end_of_line(bytes, offset + 1);
                props.push(Span::new(offset, end));
                offset = end;
            }
            _ => {
                let mut end = end_of_identifier(bytes, offset + 1);
                if ch == Some(b'!')
                    && char_at(bytes, end) == Some(b',')
                    && is_dated_tag_authority(&bytes[offset + 1..])
                {
                    end = end_of_identifier(bytes, end + 5);
                }
                props.push(Span::new(offset, end));
                line_has_props = true;
                offset = end_of_white_space(bytes, end);
            }
        }
        ch = char_at(bytes, offset);
    }
    // an empty node with props, as in `&a : b`
    if line_has_props && ch == Some(b':') && at_blank(bytes, offset + 1, true) {
        offset -= 1;
    }
    Props {
        props,
        node_type: parse_type(bytes, offset, context.in_flow),
        value_start: offset,
    }
}

/// Whether `id`, just parsed in `context`, is the first entry of a block
/// collection: a collection item, or an implicit key followed by `:` on the
/// same line.
fn node_starts_collection(tree: &Tree, context: &Context, id: NodeId) -> bool {
    if context.in_collection || context.in_flow {
        return false;
    }
    let node = tree.node(id);
    if matches!(node.kind, NodeKind::CollectionItem { .. }) {
        return true;
    }
    let bytes = tree.src().as_bytes();
    let offset = node.range.end;
    if char_at(bytes, offset) == Some(b'\n') || char_before(bytes, offset) == Some(b'\n') {
        return false;
    }
    char_at(bytes, end_of_white_space(bytes, offset)) == Some(b':')
}

impl Dispatcher {
    fn parse_value(&mut self, tree: &mut Tree, id: NodeId, start: usize) -> usize {
        match tree.node(id).node_type() {
            NodeType::Alias => scalar::parse_alias(tree, id, start),
            NodeType::Plain => scalar::parse_plain(tree, id, start),
            NodeType::QuoteDouble => scalar::parse_double_quoted(tree, id, start),
            NodeType::QuoteSingle => scalar::parse_single_quoted(tree, id, start),
            NodeType::BlockFolded | NodeType::BlockLiteral => {
                scalar::parse_block_value(tree, id, start)
            }
            NodeType::FlowMap | NodeType::FlowSeq => flow::parse(tree, self, id, start),
            NodeType::MapKey | NodeType::MapValue | NodeType::SeqItem => {
                item::parse(tree, self, id, start)
            }
            NodeType::Comment | NodeType::BlankLine | NodeType::Map | NodeType::Seq => start,
        }
    }
}

impl ParseNode for Dispatcher {
    fn parse_node(&mut self, tree: &mut Tree, overlay: Context, start: usize) -> Option<NodeId> {
        if at_document_boundary(tree.src().as_bytes(), start, None) {
            return None;
        }
        let mut context = overlay;
        let Props {
            props,
            node_type,
            value_start,
        } = parse_props(tree, &mut context, start);
        let id = tree.alloc(NodeKind::for_type(node_type), context);
        tree.node_mut(id).props = props;

        let offset = self.parse_value(tree, id, value_start);
        let width = tree
            .src()
            .get(start..)
            .and_then(|rest| rest.chars().next())
            .map_or(1, char::len_utf8);
        let node = tree.node_mut(id);
        node.range = Span::new(start, offset);
        if offset <= start {
            node.error = Some(CstError::EmptyNode);
            node.range.end = start + width;
        }
        log::trace!(
            "{} {} at {}..{}",
            node.node_type().as_str(),
            id.index(),
            node.range.start,
            node.range.end
        );

        if node_starts_collection(tree, &context, id) {
            let collection = collection::create(tree, id, context);
            let end = collection::parse(tree, self, collection, context, offset);
            tree.node_mut(collection).range = Span::new(start, end);
            return Some(collection);
        }
        Some(id)
    }
}
