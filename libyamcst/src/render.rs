//! Turning a tree back into text, and mapping it onto the unnormalized
//! input.

use std::fmt::Write;

use crate::node::{FlowItem, NodeId, NodeKind, Tree};
use crate::span::Span;

impl Tree {
    /// Source text of `id`, with `set_value` overrides applied.
    ///
    /// Text between children that no child covers (indicators, line breaks,
    /// indentation, props) is copied from the source as is, so a tree
    /// without overrides renders to exactly the text it was parsed from.
    pub fn render(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out);
        out
    }

    pub fn render_into(&self, id: NodeId, out: &mut String) {
        let node = self.node(id);
        match &node.value {
            Some(value) => out.push_str(value),
            None => self.render_span(node.range, &self.children(id), out),
        }
    }

    /// Render `range`, substituting `children` (in source order) for the
    /// parts of it they cover.
    pub(crate) fn render_span(&self, range: Span, children: &[NodeId], out: &mut String) {
        let src = self.src();
        let mut cursor = range.start;
        for &child in children {
            let span = self.node(child).range;
            if span.start > cursor {
                out.push_str(Span::new(cursor, span.start).slice(src));
            }
            self.render_into(child, out);
            cursor = cursor.max(span.end);
        }
        if range.end > cursor {
            out.push_str(Span::new(cursor, range.end).slice(src));
        }
    }

    /// Fill in the `orig` ranges of `id` and everything below it.
    ///
    /// `cr` lists the normalized offsets where a `\r` was dropped and
    /// `offset` is where to resume searching it; nodes must be visited in
    /// source order. Returns the index to resume from for the next node.
    pub fn set_orig_ranges(&mut self, id: NodeId, cr: &[usize], offset: usize) -> usize {
        let node = self.node_mut(id);
        let mut offset = node.range.set_orig_range(cr, offset);
        if let Some(value_range) = node.value_range.as_mut() {
            value_range.set_orig_range(cr, offset);
        }
        for prop in node.props.iter_mut() {
            prop.set_orig_range(cr, offset);
        }
        match &mut node.kind {
            NodeKind::BlockValue(block) => block.header.set_orig_range(cr, offset),
            NodeKind::CollectionItem {
                node: Some(inner), ..
            } => {
                let inner = *inner;
                self.set_orig_ranges(inner, cr, offset)
            }
            NodeKind::Collection { items, .. } => {
                let items = items.clone();
                for item in items {
                    offset = self.set_orig_ranges(item, cr, offset);
                }
                offset
            }
            NodeKind::FlowCollection { items, .. } => {
                let mut items = std::mem::take(items);
                for item in items.iter_mut() {
                    match item {
                        FlowItem::Node(inner) => offset = self.set_orig_ranges(*inner, cr, offset),
                        FlowItem::Char {
                            offset: at,
                            orig_offset,
                            ..
                        } => {
                            let mut i = offset;
                            while i < cr.len() && cr[i] <= *at {
                                i += 1;
                            }
                            *orig_offset = Some(*at + i);
                            offset = i;
                        }
                    }
                }
                if let NodeKind::FlowCollection { items: slot, .. } = &mut self.node_mut(id).kind {
                    *slot = items;
                }
                offset
            }
            _ => offset,
        }
    }

    /// Indented outline of `id` and its descendants: one line per node with
    /// its type, range and, for leaves, its value text.
    pub fn outline(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.outline_into(id, 0, &mut out);
        out
    }

    fn outline_into(&self, id: NodeId, depth: usize, out: &mut String) {
        let node = self.node(id);
        let _ = write!(
            out,
            "{:width$}{} {}..{}",
            "",
            node.node_type().as_str(),
            node.range.start,
            node.range.end,
            width = depth * 2
        );
        let children = self.children(id);
        if children.is_empty() {
            if let Some(value) = self.raw_value(id) {
                let _ = write!(out, " {:?}", value);
            }
        }
        if let Some(error) = &node.error {
            let _ = write!(out, " !{}", error);
        }
        out.push('\n');
        for child in children {
            self.outline_into(child, depth + 1, out);
        }
    }
}
