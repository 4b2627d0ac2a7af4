//! Whole-document serialization of a forest in one of two layouts.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use routekit::v1::{EntityNode, Schema, query};

use crate::error::{Error, Result};
use crate::indent::indent_level;
use crate::literal::quote;
use crate::render::BlockRenderer;
use crate::sanitize::sanitize;

/// Closing of the returned array.
pub const FOOTER: &str = "\n];\n";

/// Document layout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    /// Children nested inside their parent's `->setItems([...])`.
    #[default]
    Tree,
    /// Every node a top-level sibling; `->setItems([...])` lists child ids.
    Plain,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Tree => "tree",
            Strategy::Plain => "plain",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tree" => Ok(Strategy::Tree),
            "plain" => Ok(Strategy::Plain),
            other => Err(Error::UnknownStrategy(other.to_string())),
        }
    }
}

/// Split a document into its header (through the last `return [`) and the
/// rest.
pub fn split_header(text: &str) -> Result<(&str, &str)> {
    let re = Regex::new(r"(?s)^.*return\s*\[")?;
    let m = re.find(text).ok_or(Error::MalformedHeader)?;
    Ok(text.split_at(m.end()))
}

/// Writes a forest as a complete document.
///
/// With existing text, its header is kept verbatim and (unless
/// `only_string_support` is set) each node's existing block is reused up
/// to its children list, so hand edits survive regeneration.
///
/// ```
/// use routekit::v1::{EntityNode, Schema};
/// use routekit_source::Serializer;
///
/// let schema = Schema::new("Route")
///     .with_maker("make")
///     .with_param("id", None)
///     .with_param("title", None);
/// let roots = vec![EntityNode::new("home").with_title("Home")];
///
/// let text = Serializer::new(&schema, "tree").unwrap().serialize(&roots, None).unwrap();
/// assert_eq!(
///     text,
///     "<?php\n\nreturn [\n    Route::make('home', 'Home')\n        ->setItems([])->setEndBlock('home')\n];\n"
/// );
/// ```
pub struct Serializer<'a> {
    schema: &'a Schema,
    strategy: Strategy,
    only_string_support: bool,
    renderer: BlockRenderer<'a>,
}

impl<'a> Serializer<'a> {
    /// Build a serializer for the strategy named `strategy` (`tree` or
    /// `plain`).
    pub fn new(schema: &'a Schema, strategy: &str) -> Result<Self> {
        Ok(Self::with_strategy(schema, strategy.parse()?))
    }

    pub fn with_strategy(schema: &'a Schema, strategy: Strategy) -> Self {
        Self {
            schema,
            strategy,
            only_string_support: false,
            renderer: BlockRenderer::new(schema),
        }
    }

    /// Always render from attributes, ignoring existing blocks.
    pub fn only_string_support(mut self, enabled: bool) -> Self {
        self.only_string_support = enabled;
        self
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn serialize(&self, roots: &[EntityNode], existing: Option<&str>) -> Result<String> {
        let (header, body_text) = match existing.filter(|t| !t.trim().is_empty()) {
            Some(text) => {
                let (header, rest) = split_header(text)?;
                (header, Some(rest))
            }
            None => (self.schema.header_or_default(), None),
        };

        let body = match self.strategy {
            Strategy::Tree => roots
                .iter()
                .map(|node| self.render_node(node, 0, body_text))
                .collect::<Result<Vec<_>>>()?
                .join(",\n"),
            Strategy::Plain => self.plain_body(roots, body_text)?,
        };

        let document = if body.is_empty() {
            format!("{header}{FOOTER}")
        } else {
            format!("{header}\n{body}{FOOTER}")
        };
        Ok(sanitize(&document))
    }

    /// Render `node` and its subtree in the nested layout, placed at the
    /// indent level of `depth`.
    pub fn render_node(
        &self,
        node: &EntityNode,
        depth: usize,
        existing: Option<&str>,
    ) -> Result<String> {
        let existing = existing.filter(|_| !self.only_string_support);
        let block = self.renderer.render(node, existing)?;
        let children = node
            .children
            .iter()
            .map(|child| self.render_node(child, depth + 1, existing))
            .collect::<Result<Vec<_>>>()?;
        Ok(block.place(indent_level(depth), &children))
    }

    /// Render `node`'s own block in the plain layout: top level, with its
    /// children listed by id.
    pub fn render_plain_block(&self, node: &EntityNode, existing: Option<&str>) -> Result<String> {
        let existing = existing.filter(|_| !self.only_string_support);
        let block = self.renderer.render(node, existing)?;
        Ok(block.place_inline(indent_level(0), &child_id_list(node)))
    }

    fn plain_body(&self, roots: &[EntityNode], existing: Option<&str>) -> Result<String> {
        let blocks = query::walk(roots)
            .into_iter()
            .map(|(_, node)| Ok(format!("{},", self.render_plain_block(node, existing)?)))
            .collect::<Result<Vec<_>>>()?;
        Ok(blocks.join("\n"))
    }
}

/// `'a', 'b'`: the quoted ids of `node`'s children.
pub(crate) fn child_id_list(node: &EntityNode) -> String {
    node.children
        .iter()
        .map(|c| quote(&c.id))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use routekit::v1::{Rule, Value};

    fn schema() -> Schema {
        Schema::new("Route")
            .with_maker("make")
            .with_param("id", None)
            .with_param("title", None)
    }

    fn example_forest() -> Vec<EntityNode> {
        vec![
            EntityNode::new("home").with_title("Home").with_url("/"),
            EntityNode::new("admin")
                .with_title("Admin")
                .with_url("/admin")
                .with_child(
                    EntityNode::new("admin.users")
                        .with_title("Users")
                        .with_url("/admin/users"),
                ),
        ]
    }

    const EXAMPLE_TREE: &str = "<?php

return [
    Route::make('home', 'Home')
        ->setUrl('/')
        ->setItems([])->setEndBlock('home'),
    Route::make('admin', 'Admin')
        ->setUrl('/admin')
        ->setItems([
            Route::make('admin.users', 'Users')
                ->setUrl('/admin/users')
                ->setItems([])->setEndBlock('admin.users')
        ])->setEndBlock('admin')
];
";

    const EXAMPLE_PLAIN: &str = "<?php

return [
    Route::make('home', 'Home')
        ->setUrl('/')
        ->setItems([])->setEndBlock('home'),
    Route::make('admin', 'Admin')
        ->setUrl('/admin')
        ->setItems(['admin.users'])->setEndBlock('admin'),
    Route::make('admin.users', 'Users')
        ->setUrl('/admin/users')
        ->setItems([])->setEndBlock('admin.users'),
];
";

    // ── Strategy ───────────────────────────────────────────────────────

    #[test]
    fn test_strategy_parse() {
        assert_eq!("tree".parse::<Strategy>().unwrap(), Strategy::Tree);
        assert_eq!("plain".parse::<Strategy>().unwrap(), Strategy::Plain);
        assert_eq!(Strategy::Plain.to_string(), "plain");
    }

    #[test]
    fn test_unknown_strategy_fails_at_construction() {
        let schema = schema();
        let err = Serializer::new(&schema, "nested").err().unwrap();
        assert!(matches!(err, Error::UnknownStrategy(ref s) if s == "nested"));
    }

    // ── split_header ───────────────────────────────────────────────────

    #[test]
    fn test_split_header_uses_last_return() {
        let text = "<?php\n// return [ in a comment\nreturn [\n    X\n];\n";
        let (header, rest) = split_header(text).unwrap();
        assert_eq!(header, "<?php\n// return [ in a comment\nreturn [");
        assert_eq!(rest, "\n    X\n];\n");
    }

    #[test]
    fn test_split_header_malformed() {
        assert!(matches!(
            split_header("<?php\n$routes = [];\n"),
            Err(Error::MalformedHeader)
        ));
    }

    // ── Tree ───────────────────────────────────────────────────────────

    #[test]
    fn test_example_forest_tree() {
        let schema = schema();
        let text = Serializer::new(&schema, "tree")
            .unwrap()
            .serialize(&example_forest(), None)
            .unwrap();
        assert_eq!(text, EXAMPLE_TREE);
    }

    #[test]
    fn test_leaf_uses_empty_children_marker() {
        let schema = schema();
        let text = Serializer::new(&schema, "tree")
            .unwrap()
            .serialize(&[EntityNode::new("solo")], None)
            .unwrap();
        assert!(text.contains("->setItems([])->setEndBlock('solo')"));
        assert!(!text.contains("setItems([\n"));
    }

    #[test]
    fn test_empty_forest() {
        let schema = schema();
        let serializer = Serializer::new(&schema, "tree").unwrap();
        assert_eq!(serializer.serialize(&[], None).unwrap(), "<?php\n\nreturn [\n];\n");
    }

    #[test]
    fn test_deep_nesting_levels() {
        let schema = schema();
        let forest = vec![EntityNode::new("a").with_child(
            EntityNode::new("b").with_child(EntityNode::new("c")),
        )];
        let text = Serializer::new(&schema, "tree")
            .unwrap()
            .serialize(&forest, None)
            .unwrap();
        assert!(text.contains("\n    Route::make('a', null)\n"));
        assert!(text.contains("\n            Route::make('b', null)\n"));
        assert!(text.contains("\n                    Route::make('c', null)\n"));
        assert!(text.contains("\n                ])->setEndBlock('b')\n"));
    }

    #[test]
    fn test_reserialize_is_stable() {
        let schema = schema();
        let serializer = Serializer::new(&schema, "tree").unwrap();
        let first = serializer.serialize(&example_forest(), None).unwrap();
        let second = serializer.serialize(&example_forest(), Some(&first)).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_header_kept_verbatim() {
        let schema = schema();
        let existing = "<?php\n\nuse App\\Navigation\\Route;\n\nreturn [\n];\n";
        let text = Serializer::new(&schema, "tree")
            .unwrap()
            .serialize(&[EntityNode::new("home")], Some(existing))
            .unwrap();
        assert!(text.starts_with("<?php\n\nuse App\\Navigation\\Route;\n\nreturn [\n    Route::make('home', null)"));
        assert!(text.ends_with("\n];\n"));
    }

    #[test]
    fn test_malformed_existing_text_is_fatal() {
        let schema = schema();
        let err = Serializer::new(&schema, "tree")
            .unwrap()
            .serialize(&example_forest(), Some("<?php echo 'hi';"))
            .unwrap_err();
        assert!(matches!(err, Error::MalformedHeader));
    }

    #[test]
    fn test_hand_edits_survive_unless_only_string_support() {
        let schema = schema();
        let edited = EXAMPLE_TREE.replace(
            "        ->setUrl('/admin')\n",
            "        ->setUrl('/admin')\n        ->setIcon('shield')\n",
        );
        let reused = Serializer::new(&schema, "tree")
            .unwrap()
            .serialize(&example_forest(), Some(&edited))
            .unwrap();
        assert_eq!(reused, edited);

        let regenerated = Serializer::new(&schema, "tree")
            .unwrap()
            .only_string_support(true)
            .serialize(&example_forest(), Some(&edited))
            .unwrap();
        assert_eq!(regenerated, EXAMPLE_TREE);
    }

    #[test]
    fn test_new_child_spliced_into_existing_parent() {
        let schema = schema();
        let mut forest = example_forest();
        forest[1]
            .children
            .push(EntityNode::new("admin.roles").with_title("Roles"));
        let text = Serializer::new(&schema, "tree")
            .unwrap()
            .serialize(&forest, Some(EXAMPLE_TREE))
            .unwrap();
        assert!(text.contains(
            "->setItems([])->setEndBlock('admin.users'),\n            Route::make('admin.roles', 'Roles')\n                ->setItems([])->setEndBlock('admin.roles')\n        ])->setEndBlock('admin')"
        ));
    }

    #[test]
    fn test_omission_rules_applied() {
        let schema = schema()
            .with_rule("urlMethod", Rule::OmitWhen(Value::from("GET")))
            .with_rule("urlMethod", Rule::IsBlank);
        let forest = vec![
            EntityNode::new("a").with_url_method("GET"),
            EntityNode::new("b").with_url_method("POST"),
        ];
        let text = Serializer::new(&schema, "tree")
            .unwrap()
            .serialize(&forest, None)
            .unwrap();
        assert!(!text.contains("setUrlMethod('GET')"));
        assert!(text.contains("->setUrlMethod('POST')"));
    }

    // ── Plain ──────────────────────────────────────────────────────────

    #[test]
    fn test_example_forest_plain() {
        let schema = schema();
        let text = Serializer::new(&schema, "plain")
            .unwrap()
            .serialize(&example_forest(), None)
            .unwrap();
        assert_eq!(text, EXAMPLE_PLAIN);
    }

    #[test]
    fn test_plain_reserialize_is_stable() {
        let schema = schema();
        let serializer = Serializer::new(&schema, "plain").unwrap();
        let again = serializer
            .serialize(&example_forest(), Some(EXAMPLE_PLAIN))
            .unwrap();
        assert_eq!(again, EXAMPLE_PLAIN);
    }
}
