//! Finding an entity's block inside existing source text.
//!
//! A block runs from its maker call through its own
//! `->setEndBlock('<id>')`, with any nested blocks balanced in between. Locations are returned as byte spans so callers
//! splice with one slice-and-concatenate; nothing here rewrites text.

use std::ops::Range;

use regex::Regex;
use routekit::v1::{EntityNode, Schema};

use crate::error::Result;
use crate::literal::end_marker_pattern;
use crate::signature::SignatureMatcher;

/// Byte span of one block inside a text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockSpan {
    pub id: String,
    pub start: usize,
    pub end: usize,
}

impl BlockSpan {
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    pub fn slice<'t>(&self, text: &'t str) -> &'t str {
        &text[self.range()]
    }

    /// `text` with this span replaced by `replacement`.
    pub fn splice(&self, text: &str, replacement: &str) -> String {
        let mut out = String::with_capacity(text.len() + replacement.len());
        out.push_str(&text[..self.start]);
        out.push_str(replacement);
        out.push_str(&text[self.end..]);
        out
    }
}

/// The `->setItems([ ... ])->setEndBlock('<id>')` tail of a block, relative
/// to the block text it was found in.
///
/// `start..end` covers the whole tail; `inner_start..inner_end` is the list
/// content between the brackets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildrenRegion {
    pub start: usize,
    pub end: usize,
    pub inner_start: usize,
    pub inner_end: usize,
}

impl ChildrenRegion {
    pub fn inner(&self) -> Range<usize> {
        self.inner_start..self.inner_end
    }
}

pub struct BlockLocator<'a> {
    signature: SignatureMatcher<'a>,
}

impl<'a> BlockLocator<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self {
            signature: SignatureMatcher::new(schema),
        }
    }

    /// The node's block in `text`: the first end marker for its id that a
    /// matching maker call encloses, opened by the nearest such call whose
    /// span holds only whole blocks. `None` when the text holds no such
    /// block.
    pub fn locate(&self, node: &EntityNode, text: &str) -> Result<Option<BlockSpan>> {
        let call = self.signature.search_pattern(node)?;
        let opener = Regex::new(&self.signature.opener_source())?;
        let any_end = Regex::new(ANY_END_MARKER)?;
        let close = Regex::new(&end_marker_pattern(&node.id))?;

        for marker in close.find_iter(text) {
            let start = call
                .find_iter(&text[..marker.start()])
                .map(|m| m.start())
                .filter(|&start| encloses_whole_blocks(&opener, &any_end, &text[start..marker.start()]))
                .last();
            if let Some(start) = start {
                return Ok(Some(BlockSpan {
                    id: node.id.clone(),
                    start,
                    end: marker.end(),
                }));
            }
        }
        Ok(None)
    }
}

const ANY_END_MARKER: &str = r"->\s*setEndBlock\s*\(";

/// Whether `inner`, a block's text from its maker call up to its end
/// marker, closes every block it opens and nothing opened before it.
fn encloses_whole_blocks(opener: &Regex, any_end: &Regex, inner: &str) -> bool {
    let mut events: Vec<(usize, i32)> = opener
        .find_iter(inner)
        .map(|m| (m.start(), 1))
        .chain(any_end.find_iter(inner).map(|m| (m.start(), -1)))
        .collect();
    events.sort_unstable();

    let mut depth = 0;
    for (_, step) in events {
        depth += step;
        if depth <= 0 {
            return false;
        }
    }
    depth == 1
}

/// Find the children list of block `id` inside `block_text` (as returned by
/// [`BlockSpan::slice`]).
pub fn children_region(id: &str, block_text: &str) -> Result<Option<ChildrenRegion>> {
    let re = Regex::new(&format!(
        r"(?s)->\s*setItems\s*\(\s*\[(.*)\]\s*\)\s*{}\s*$",
        end_marker_pattern(id)
    ))?;
    Ok(re.captures(block_text).and_then(|caps| {
        let whole = caps.get(0)?;
        let inner = caps.get(1)?;
        Some(ChildrenRegion {
            start: whole.start(),
            end: whole.end(),
            inner_start: inner.start(),
            inner_end: inner.end(),
        })
    }))
}
