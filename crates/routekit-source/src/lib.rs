//! Write routekit forests as fluent-builder source files, read them back
//! and patch single blocks in place.
//!
//! Each entity becomes one block: a maker call, one `->setX(...)` per
//! attribute the schema keeps, a `->setItems([...])` children list and a
//! closing `->setEndBlock('<id>')` that anchors the block for later
//! lookups. Two layouts are supported: [`Strategy::Tree`] nests children
//! inside their parent, [`Strategy::Plain`] writes every node at the top
//! level and lists child ids.
//!
//! # Example
//!
//! ```
//! use routekit::v1::{EntityNode, Schema};
//! use routekit_source::{Patcher, Serializer, parse_document};
//!
//! let schema = Schema::new("Route")
//!     .with_maker("make")
//!     .with_param("id", None)
//!     .with_param("title", None);
//! let roots = vec![
//!     EntityNode::new("home").with_title("Home").with_url("/"),
//!     EntityNode::new("admin")
//!         .with_title("Admin")
//!         .with_child(EntityNode::new("admin.users").with_title("Users")),
//! ];
//!
//! let text = Serializer::new(&schema, "tree").unwrap().serialize(&roots, None).unwrap();
//! assert!(text.contains("->setItems([])->setEndBlock('home'),"));
//! assert_eq!(parse_document(&text, &schema).unwrap().roots, roots);
//!
//! let moved = EntityNode::new("home").with_title("Home").with_url("/start");
//! let patched = Patcher::new(&schema).replace(&text, &moved, 0).unwrap().unwrap();
//! assert!(patched.contains("->setUrl('/start')"));
//! ```
//!
//! Existing files keep their header verbatim, and blocks already in the
//! file are reused up to their children list so hand edits survive a
//! regeneration (see [`Serializer::only_string_support`]).

mod error;
mod format;
mod indent;
mod literal;
mod locate;
mod parse;
mod patch;
mod render;
mod sanitize;
mod serialize;
mod signature;

pub use error::{Error, Result};
pub use format::{Formatter, NoopFormatter};
pub use indent::{INDENT_UNIT, indent, indent_level, is_continuation};
pub use literal::{
    attribute_name, end_marker, end_marker_pattern, flexible_pattern, format_literal, quote,
    setter_name,
};
pub use locate::{BlockLocator, BlockSpan, ChildrenRegion, children_region};
pub use parse::parse_document;
pub use patch::Patcher;
pub use render::{BlockRenderer, RenderedBlock};
pub use sanitize::sanitize;
pub use serialize::{FOOTER, Serializer, Strategy, split_header};
pub use signature::{FALLBACK_MAKER, SignatureMatcher};
