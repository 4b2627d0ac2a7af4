//! Rendering one node into a block with an open children slot, and placing
//! that block at an indent level with its children spliced in.

use std::ops::Range;

use routekit::v1::{EntityNode, ITEMS, Schema, should_omit};

use crate::error::Result;
use crate::indent::indent;
use crate::literal::{end_marker, format_literal, setter_name};
use crate::locate::{BlockLocator, children_region};
use crate::signature::SignatureMatcher;

const ITEMS_OPEN: &str = "->setItems([";

/// A block's text with the byte range its children belong in.
///
/// The text is unindented; [`place`](Self::place) applies the indent and
/// fills the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedBlock {
    pub id: String,
    pub text: String,
    pub slot: Range<usize>,
}

impl RenderedBlock {
    /// `prefix` followed by an empty `->setItems([])` and the end marker.
    fn with_children_slot(id: &str, mut prefix: String) -> Self {
        prefix.push_str(ITEMS_OPEN);
        let at = prefix.len();
        prefix.push_str("])");
        prefix.push_str(&end_marker(id));
        Self {
            id: id.to_string(),
            text: prefix,
            slot: at..at,
        }
    }

    /// Everything up to and including `->setItems([`.
    pub fn head(&self) -> &str {
        &self.text[..self.slot.start]
    }

    /// `])->setEndBlock('<id>')`
    pub fn tail(&self) -> &str {
        &self.text[self.slot.end..]
    }

    /// Indent the block at `level` and splice in already placed child
    /// blocks. Without children the tail stays on the `->setItems([` line.
    pub fn place(&self, level: usize, children: &[String]) -> String {
        if children.is_empty() {
            return indent(&format!("{}{}", self.head(), self.tail()), level);
        }
        format!(
            "{}\n{}\n{}",
            indent(self.head(), level),
            children.join(",\n"),
            indent(self.tail(), level)
        )
    }

    /// Indent the block at `level` with `content` written inside the
    /// children brackets on one line.
    pub fn place_inline(&self, level: usize, content: &str) -> String {
        indent(
            &format!("{}{}{}", self.head(), content, self.tail()),
            level,
        )
    }
}

pub struct BlockRenderer<'a> {
    schema: &'a Schema,
    signature: SignatureMatcher<'a>,
    locator: BlockLocator<'a>,
}

impl<'a> BlockRenderer<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            signature: SignatureMatcher::new(schema),
            locator: BlockLocator::new(schema),
        }
    }

    /// Whether `name` is written as its own `->setX(...)` call.
    fn is_setter_attribute(&self, name: &str) -> bool {
        if name == "id" || name == ITEMS {
            return false;
        }
        self.schema.maker.is_none() || !self.schema.is_constructor_param(name)
    }

    /// Describe the node from its attributes: the maker call, one setter
    /// per kept attribute in attribute order, then the children slot.
    pub fn from_attributes(&self, node: &EntityNode) -> RenderedBlock {
        let mut text = self.signature.literal_call(node);
        for (name, value) in node.attributes.iter() {
            if !self.is_setter_attribute(name)
                || should_omit(node, name, self.schema.rules_for(name))
            {
                continue;
            }
            match format_literal(value) {
                Some(literal) => {
                    text.push_str("\n->");
                    text.push_str(&setter_name(name));
                    text.push('(');
                    text.push_str(&literal);
                    text.push(')');
                }
                None => log::debug!("{}: {} has no literal form, skipped", node.id, name),
            }
        }
        text.push('\n');
        RenderedBlock::with_children_slot(&node.id, text)
    }

    /// Reuse the node's block from `text`, keeping everything before its
    /// children list as written. `None` when the block is absent or has no
    /// children list to splice into.
    pub fn from_existing(&self, node: &EntityNode, text: &str) -> Result<Option<RenderedBlock>> {
        let Some(span) = self.locator.locate(node, text)? else {
            return Ok(None);
        };
        let block = span.slice(text);
        let Some(region) = children_region(&node.id, block)? else {
            log::debug!("{}: block found without a children list", node.id);
            return Ok(None);
        };
        Ok(Some(RenderedBlock::with_children_slot(
            &node.id,
            block[..region.start].to_string(),
        )))
    }

    /// The existing block when there is one, else a fresh rendering.
    pub fn render(&self, node: &EntityNode, existing: Option<&str>) -> Result<RenderedBlock> {
        if let Some(text) = existing
            && let Some(block) = self.from_existing(node, text)?
        {
            log::debug!("{}: reusing existing block", node.id);
            return Ok(block);
        }
        log::debug!("{}: rendering from attributes", node.id);
        Ok(self.from_attributes(node))
    }
}
