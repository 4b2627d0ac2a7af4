//! In-place edits of a single block. Every byte outside the touched span
//! is left as it was.

use regex::Regex;
use routekit::v1::{EntityNode, Schema, query};

use crate::error::Result;
use crate::indent::{indent, indent_level};
use crate::literal::end_marker;
use crate::locate::{BlockLocator, BlockSpan, children_region};
use crate::serialize::{Serializer, Strategy, child_id_list};

/// An emptied children list left open across lines.
const OPEN_ITEMS: &str = r"->\s*setItems\s*\(\s*\[\z";

pub struct Patcher<'a> {
    serializer: Serializer<'a>,
    locator: BlockLocator<'a>,
}

impl<'a> Patcher<'a> {
    /// Patcher for documents in the nested layout.
    pub fn new(schema: &'a Schema) -> Self {
        Self::with_strategy(schema, Strategy::Tree)
    }

    /// Patcher for documents written in `strategy`'s layout.
    pub fn with_strategy(schema: &'a Schema, strategy: Strategy) -> Self {
        Self {
            serializer: Serializer::with_strategy(schema, strategy).only_string_support(true),
            locator: BlockLocator::new(schema),
        }
    }

    pub fn strategy(&self) -> Strategy {
        self.serializer.strategy()
    }

    /// Re-render `node` over its block. In the nested layout the subtree
    /// is rendered with it at the indent of `depth`; in the plain layout
    /// only the node's own block is, listing its children by id. `None`
    /// when the block is not in `text`.
    pub fn replace(&self, text: &str, node: &EntityNode, depth: usize) -> Result<Option<String>> {
        self.replace_with(text, node, node, depth)
    }

    /// Like [`replace`](Self::replace), locating the block through
    /// `current`, the node as the text still describes it. Needed when the
    /// edit changes a value the maker call is matched on.
    pub fn replace_with(
        &self,
        text: &str,
        current: &EntityNode,
        node: &EntityNode,
        depth: usize,
    ) -> Result<Option<String>> {
        let Some(span) = self.locator.locate(current, text)? else {
            log::debug!("{}: no block to replace", current.id);
            return Ok(None);
        };
        let rendered = match self.strategy() {
            Strategy::Tree => self.serializer.render_node(node, depth, None)?,
            Strategy::Plain => self.serializer.render_plain_block(node, None)?,
        };
        Ok(Some(span.splice(text, rendered.trim_start())))
    }

    /// Rewrite only the children list of `node`'s block, leaving the
    /// parent's own calls untouched.
    pub fn replace_children(
        &self,
        text: &str,
        node: &EntityNode,
        depth: usize,
    ) -> Result<Option<String>> {
        let Some(span) = self.locator.locate(node, text)? else {
            return Ok(None);
        };
        let Some(region) = children_region(&node.id, span.slice(text))? else {
            log::debug!("{}: block has no children list", node.id);
            return Ok(None);
        };

        let close = format!("]){}", end_marker(&node.id));
        let replacement = match self.strategy() {
            Strategy::Plain => format!("->setItems([{}{close}", child_id_list(node)),
            Strategy::Tree if node.children.is_empty() => format!("->setItems([{close}"),
            Strategy::Tree => {
                let children = node
                    .children
                    .iter()
                    .map(|child| self.serializer.render_node(child, depth + 1, None))
                    .collect::<Result<Vec<_>>>()?;
                format!(
                    "->setItems([\n{}\n{}",
                    children.join(",\n"),
                    indent(&close, indent_level(depth))
                )
            }
        };

        let target = BlockSpan {
            id: node.id.clone(),
            start: span.start + region.start,
            end: span.start + region.end,
        };
        Ok(Some(target.splice(text, &replacement)))
    }

    /// Cut `node`'s block out together with one separating comma. A line
    /// left holding only whitespace goes too, and a children list left
    /// empty closes back to `[]`. In the plain layout the blocks of the
    /// node's descendants are cut as well.
    pub fn remove(&self, text: &str, node: &EntityNode) -> Result<Option<String>> {
        let Some(mut out) = self.remove_block(text, node)? else {
            return Ok(None);
        };
        if self.strategy() == Strategy::Plain {
            for (_, descendant) in query::walk(&node.children) {
                match self.remove_block(&out, descendant)? {
                    Some(rest) => out = rest,
                    None => log::debug!("{}: no block for descendant {}", node.id, descendant.id),
                }
            }
        }
        Ok(Some(out))
    }

    fn remove_block(&self, text: &str, node: &EntityNode) -> Result<Option<String>> {
        let Some(span) = self.locator.locate(node, text)? else {
            log::debug!("{}: no block to remove", node.id);
            return Ok(None);
        };
        let (mut start, mut end) = (span.start, span.end);

        let after = &text[end..];
        let before = &text[..start];
        if after.trim_start().starts_with(',') {
            end += after.len() - after.trim_start().len() + 1;
        } else if before.trim_end().ends_with(',') {
            start = before.trim_end().len() - 1;
        }

        let line_start = text[..start].rfind('\n').map_or(0, |i| i + 1);
        if text[line_start..start].trim().is_empty() {
            start = line_start;
            let rest = &text[end..];
            if let Some(newline) = rest.find('\n')
                && rest[..newline].trim().is_empty()
            {
                end += newline + 1;
            }
        }

        let removed = BlockSpan {
            id: node.id.clone(),
            start,
            end,
        };
        let mut out = removed.splice(text, "");

        let open = out[..start].trim_end().len();
        let close = out.len() - out[start..].trim_start().len();
        if out[close..].starts_with(']') && Regex::new(OPEN_ITEMS)?.is_match(&out[..open]) {
            out.replace_range(open..close, "");
        }
        Ok(Some(out))
    }
}
