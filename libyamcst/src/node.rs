//! CST node arena.
//!
//! All nodes of one parse live in a [`Tree`] and refer to each other by
//! [`NodeId`]. Parent links are plain ids stored in each node's [`Context`];
//! they are only followed when trailing trivia is reattached.

use std::fmt;
use std::rc::Rc;

use crate::error::CstError;
use crate::source::{char_at, end_of_line};
use crate::span::Span;

/// Index of a node in its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Node type tags, named after the indicators and styles they come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Alias,
    BlankLine,
    BlockFolded,
    BlockLiteral,
    Comment,
    FlowMap,
    FlowSeq,
    Map,
    MapKey,
    MapValue,
    Plain,
    QuoteDouble,
    QuoteSingle,
    Seq,
    SeqItem,
}

impl NodeType {
    pub fn as_str(self) -> &'static str {
        match self {
            NodeType::Alias => "ALIAS",
            NodeType::BlankLine => "BLANK_LINE",
            NodeType::BlockFolded => "BLOCK_FOLDED",
            NodeType::BlockLiteral => "BLOCK_LITERAL",
            NodeType::Comment => "COMMENT",
            NodeType::FlowMap => "FLOW_MAP",
            NodeType::FlowSeq => "FLOW_SEQ",
            NodeType::Map => "MAP",
            NodeType::MapKey => "MAP_KEY",
            NodeType::MapValue => "MAP_VALUE",
            NodeType::Plain => "PLAIN",
            NodeType::QuoteDouble => "QUOTE_DOUBLE",
            NodeType::QuoteSingle => "QUOTE_SINGLE",
            NodeType::Seq => "SEQ",
            NodeType::SeqItem => "SEQ_ITEM",
        }
    }
}

/// Block collection flavour, fixed by the first entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionType {
    Seq,
    Map,
}

/// The indicator that introduced a collection item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    /// `- `
    SeqItem,
    /// `? `
    MapKey,
    /// `: `
    MapValue,
}

/// Block scalar chomping indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Chomp {
    #[default]
    Clip,
    Keep,
    Strip,
}

/// Header of a `|` or `>` block scalar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockHeader {
    pub literal: bool,
    pub chomping: Chomp,
    /// Explicit or detected content indent, relative to the parent indent.
    pub block_indent: Option<isize>,
    pub header: Span,
}

/// An entry of a flow collection: either an indicator character (`[`, `,`,
/// `:`, ...) or a nested node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowItem {
    Char {
        ch: u8,
        offset: usize,
        orig_offset: Option<usize>,
    },
    Node(NodeId),
}

/// Variant payload of a node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Alias,
    BlankLine,
    Comment,
    Plain,
    QuoteDouble,
    QuoteSingle,
    BlockValue(BlockHeader),
    FlowCollection {
        flow_type: CollectionType,
        items: Vec<FlowItem>,
    },
    CollectionItem {
        item_type: ItemType,
        node: Option<NodeId>,
    },
    Collection {
        collection_type: CollectionType,
        items: Vec<NodeId>,
    },
}

impl NodeKind {
    /// Fresh, not yet parsed payload for a dispatched node type.
    pub fn for_type(node_type: NodeType) -> Self {
        match node_type {
            NodeType::Alias => NodeKind::Alias,
            NodeType::BlankLine => NodeKind::BlankLine,
            NodeType::Comment => NodeKind::Comment,
            NodeType::Plain => NodeKind::Plain,
            NodeType::QuoteDouble => NodeKind::QuoteDouble,
            NodeType::QuoteSingle => NodeKind::QuoteSingle,
            NodeType::BlockFolded | NodeType::BlockLiteral => NodeKind::BlockValue(BlockHeader {
                literal: node_type == NodeType::BlockLiteral,
                chomping: Chomp::Clip,
                block_indent: None,
                header: Span::default(),
            }),
            NodeType::FlowMap => NodeKind::FlowCollection {
                flow_type: CollectionType::Map,
                items: Vec::new(),
            },
            NodeType::FlowSeq => NodeKind::FlowCollection {
                flow_type: CollectionType::Seq,
                items: Vec::new(),
            },
            NodeType::MapKey => NodeKind::CollectionItem {
                item_type: ItemType::MapKey,
                node: None,
            },
            NodeType::MapValue => NodeKind::CollectionItem {
                item_type: ItemType::MapValue,
                node: None,
            },
            NodeType::SeqItem => NodeKind::CollectionItem {
                item_type: ItemType::SeqItem,
                node: None,
            },
            NodeType::Map => NodeKind::Collection {
                collection_type: CollectionType::Map,
                items: Vec::new(),
            },
            NodeType::Seq => NodeKind::Collection {
                collection_type: CollectionType::Seq,
                items: Vec::new(),
            },
        }
    }

    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Alias => NodeType::Alias,
            NodeKind::BlankLine => NodeType::BlankLine,
            NodeKind::Comment => NodeType::Comment,
            NodeKind::Plain => NodeType::Plain,
            NodeKind::QuoteDouble => NodeType::QuoteDouble,
            NodeKind::QuoteSingle => NodeType::QuoteSingle,
            NodeKind::BlockValue(header) if header.literal => NodeType::BlockLiteral,
            NodeKind::BlockValue(_) => NodeType::BlockFolded,
            NodeKind::FlowCollection {
                flow_type: CollectionType::Map,
                ..
            } => NodeType::FlowMap,
            NodeKind::FlowCollection { .. } => NodeType::FlowSeq,
            NodeKind::CollectionItem { item_type, .. } => match item_type {
                ItemType::SeqItem => NodeType::SeqItem,
                ItemType::MapKey => NodeType::MapKey,
                ItemType::MapValue => NodeType::MapValue,
            },
            NodeKind::Collection {
                collection_type: CollectionType::Map,
                ..
            } => NodeType::Map,
            NodeKind::Collection { .. } => NodeType::Seq,
        }
    }
}

/// Scan state handed to a node when it is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Context {
    pub parent: Option<NodeId>,
    /// Column the node's block must stay beyond; `-1` at document level and
    /// inside flow collections.
    pub indent: isize,
    pub line_start: usize,
    pub at_line_start: bool,
    pub in_collection: bool,
    pub in_flow: bool,
}

impl Context {
    /// Context of top-level content.
    pub fn document(line_start: usize, at_line_start: bool) -> Self {
        Self {
            parent: None,
            indent: -1,
            line_start,
            at_line_start,
            in_collection: false,
            in_flow: false,
        }
    }
}

/// A node in the arena.
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub context: Context,
    /// Full extent, including leading props.
    pub range: Span,
    /// Semantic payload only.
    pub value_range: Option<Span>,
    /// Anchors, tags and comments attached to the node, in source order.
    pub props: Vec<Span>,
    pub error: Option<CstError>,
    /// Replacement text used by rendering instead of the source slice.
    pub value: Option<String>,
}

impl Node {
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    pub fn is_trivia(&self) -> bool {
        matches!(self.kind, NodeKind::Comment | NodeKind::BlankLine)
    }

    /// Quoted scalars and flow collections, after which `:` needs no space.
    pub fn json_like(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::QuoteDouble | NodeKind::QuoteSingle | NodeKind::FlowCollection { .. }
        )
    }
}

/// A parsed tag property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag<'a> {
    /// `!<uri>`
    Verbatim(&'a str),
    /// `!handle!suffix`, `!!suffix` or `!suffix`
    Shorthand { handle: &'a str, suffix: &'a str },
}

impl fmt::Display for Tag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tag::Verbatim(uri) => write!(f, "!<{}>", uri),
            Tag::Shorthand { handle, suffix } => write!(f, "{}{}", handle, suffix),
        }
    }
}

/// Arena of nodes over one source buffer.
#[derive(Debug, Clone)]
pub struct Tree {
    src: Rc<str>,
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new(src: impl Into<Rc<str>>) -> Self {
        Self {
            src: src.into(),
            nodes: Vec::new(),
        }
    }

    /// Shared handle on the source, usable while the tree is being mutated.
    pub fn source(&self) -> Rc<str> {
        Rc::clone(&self.src)
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate an unparsed node; its range starts out empty.
    pub fn alloc(&mut self, kind: NodeKind, context: Context) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            kind,
            context,
            range: Span::default(),
            value_range: None,
            props: Vec::new(),
            error: None,
            value: None,
        });
        id
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().enumerate().map(|(i, n)| (NodeId(i), n))
    }

    /// Entries and trivia of a block collection; empty for other nodes.
    pub fn items(&self, id: NodeId) -> &[NodeId] {
        match &self.node(id).kind {
            NodeKind::Collection { items, .. } => items,
            _ => &[],
        }
    }

    pub(crate) fn push_item(&mut self, id: NodeId, item: NodeId) {
        if let NodeKind::Collection { items, .. } = &mut self.node_mut(id).kind {
            items.push(item);
        }
    }

    pub(crate) fn split_items(&mut self, id: NodeId, at: usize) -> Vec<NodeId> {
        match &mut self.node_mut(id).kind {
            NodeKind::Collection { items, .. } => items.split_off(at),
            _ => Vec::new(),
        }
    }

    /// Child nodes in source order: collection items, the node wrapped by a
    /// collection item, or the nodes of a flow collection.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        match &self.node(id).kind {
            NodeKind::Collection { items, .. } => items.clone(),
            NodeKind::CollectionItem { node, .. } => node.iter().copied().collect(),
            NodeKind::FlowCollection { items, .. } => items
                .iter()
                .filter_map(|item| match item {
                    FlowItem::Node(id) => Some(*id),
                    FlowItem::Char { .. } => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Unwrap collection items down to the block collection they hold, if
    /// any. Item ids always precede the ids of what they wrap, so this walks
    /// strictly forward through the arena.
    pub fn innermost_collection(&self, mut id: NodeId) -> Option<NodeId> {
        loop {
            match &self.node(id).kind {
                NodeKind::Collection { .. } => return Some(id),
                NodeKind::CollectionItem {
                    node: Some(inner), ..
                } => id = *inner,
                _ => return None,
            }
        }
    }

    /// Whether the node's own text already runs over the blank lines that
    /// follow it.
    pub fn includes_trailing_lines(&self, id: NodeId) -> bool {
        match &self.node(id).kind {
            NodeKind::Collection { items, .. } => !items.is_empty(),
            NodeKind::CollectionItem { node, .. } => {
                node.is_some_and(|inner| self.includes_trailing_lines(inner))
            }
            NodeKind::BlankLine => true,
            NodeKind::BlockValue(header) => header.chomping == Chomp::Keep,
            _ => false,
        }
    }

    /// Source text of the node's value range.
    pub fn raw_value(&self, id: NodeId) -> Option<&str> {
        self.node(id).value_range.map(|span| span.slice(&self.src))
    }

    fn prop_value(&self, prop: &Span, key: u8, skip_key: bool) -> Option<&str> {
        if char_at(self.src.as_bytes(), prop.start) != Some(key) {
            return None;
        }
        let start = if skip_key { prop.start + 1 } else { prop.start };
        Some(Span::new(start, prop.end).slice(&self.src))
    }

    pub fn anchor(&self, id: NodeId) -> Option<&str> {
        self.node(id)
            .props
            .iter()
            .find_map(|prop| self.prop_value(prop, b'&', true))
    }

    /// All comment props joined by newlines, without their `#`.
    pub fn comment(&self, id: NodeId) -> Option<String> {
        let comments: Vec<&str> = self
            .node(id)
            .props
            .iter()
            .filter_map(|prop| self.prop_value(prop, b'#', true))
            .collect();
        if comments.is_empty() {
            None
        } else {
            Some(comments.join("\n"))
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<Tag<'_>> {
        let raw = self
            .node(id)
            .props
            .iter()
            .find_map(|prop| self.prop_value(prop, b'!', false))?;
        if let Some(uri) = raw.strip_prefix("!<") {
            return Some(Tag::Verbatim(uri.strip_suffix('>').unwrap_or(uri)));
        }
        let split = raw.rfind('!').map_or(0, |i| i + 1);
        Some(Tag::Shorthand {
            handle: &raw[..split],
            suffix: &raw[split..],
        })
    }

    /// Replace the text the node renders as.
    pub fn set_value(&mut self, id: NodeId, value: impl Into<String>) {
        self.node_mut(id).value = Some(value.into());
    }

    /// If a comment starts at `start`, record it as a prop of `id` and return
    /// the end of its line; otherwise return `start`.
    pub(crate) fn parse_comment_prop(&mut self, id: NodeId, start: usize) -> usize {
        let src = self.source();
        let bytes = src.as_bytes();
        if char_at(bytes, start) != Some(b'#') {
            return start;
        }
        let end = end_of_line(bytes, start + 1);
        self.node_mut(id).props.push(Span::new(start, end));
        end
    }

    pub(crate) fn set_value_end(&mut self, id: NodeId, end: usize) {
        let node = self.node_mut(id);
        match node.value_range.as_mut() {
            Some(span) => span.end = end,
            None => node.value_range = Some(Span::new(node.range.start, end)),
        }
    }
}
