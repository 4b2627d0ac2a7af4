//! Entity trees for route and navigation files.
//!
//! `routekit` models the entities a route file declares: each
//! [`EntityNode`](v1::EntityNode) has an id, an ordered bag of attribute
//! [`Value`](v1::Value)s and ordered children. A [`Schema`](v1::Schema) says
//! how a kind of entity is written as source text (class, maker method,
//! constructor parameters) and which attributes are left out of the text,
//! through omission [`Rule`](v1::Rule)s. Reading and writing the text itself
//! lives in `routekit-source`.

mod config;
mod error;
mod query;
mod rules;
mod schema;
mod types;

pub mod v1 {
    //! Versioned public API for routekit types, rules and queries.
    //!
    //! # Entities
    //!
    //! - [`Forest`]: the ordered roots of one route file
    //! - [`EntityNode`]: a route or navigation entry with its subtree
    //! - [`Attributes`]: ordered attribute bag
    //! - [`Value`]: scalar, list, map or opaque runtime object
    //!
    //! # Rendering rules
    //!
    //! - [`Schema`] / [`ConstructorParam`]: class, maker call, parameters
    //! - [`Rule`], [`should_omit`], [`resolve_path`]: attribute omission
    //! - [`Config`] / [`OutputConfig`]: TOML configuration
    //!
    //! # Example: build a forest and look nodes up
    //!
    //! ```
    //! use routekit::v1::*;
    //!
    //! let mut forest = Forest::from_roots(vec![
    //!     EntityNode::new("home").with_title("Home").with_url("/"),
    //!     EntityNode::new("admin").with_title("Admin"),
    //! ]);
    //! forest
    //!     .insert(Some("admin"), EntityNode::new("admin.users").with_permissions(["users.view"]))
    //!     .unwrap();
    //!
    //! assert_eq!(forest.depth_of("admin.users"), Some(1));
    //! assert_eq!(forest.all_permissions(), vec!["users.view"]);
    //! assert!(forest.validate().is_ok());
    //! ```

    /// Traversal and lookup functions over `&[EntityNode]` slices.
    pub mod query {
        pub use crate::query::{
            all_permissions, all_roles, depth_of, duplicate_ids, find, lineage, parent_of, walk,
        };
    }
    pub use crate::config::{Config, OutputConfig};
    pub use crate::error::Error;
    pub use crate::rules::{Rule, parse_literal, resolve_path, should_omit};
    pub use crate::schema::{ConstructorParam, DEFAULT_HEADER, Schema};
    pub use crate::types::{Attributes, EntityNode, Forest, ITEMS, Value};
}
