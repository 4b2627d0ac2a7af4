//! Maker-call signatures: the literal call that opens a node's block and
//! the pattern that finds that call again inside a file.

use regex::Regex;
use routekit::v1::{EntityNode, Schema, resolve_path};

use crate::error::Result;
use crate::literal::{NULL, flexible_pattern, format_literal, quote};

/// Maker used when a schema declares none.
pub const FALLBACK_MAKER: &str = "make";

pub struct SignatureMatcher<'a> {
    schema: &'a Schema,
}

impl<'a> SignatureMatcher<'a> {
    pub fn new(schema: &'a Schema) -> Self {
        Self { schema }
    }

    fn maker(&self) -> &str {
        self.schema.maker.as_deref().unwrap_or(FALLBACK_MAKER)
    }

    /// Formatted maker arguments in parameter order.
    ///
    /// Each parameter takes the node's value, then the declared default,
    /// then `null`. Without a maker method the id is the only argument.
    pub fn arguments(&self, node: &EntityNode) -> Vec<String> {
        if self.schema.maker.is_none() {
            return vec![quote(&node.id)];
        }
        self.schema
            .constructor_params()
            .iter()
            .map(|param| {
                resolve_path(node, &param.name)
                    .filter(|v| !v.is_null())
                    .and_then(|v| format_literal(&v))
                    .or_else(|| {
                        param
                            .default
                            .as_ref()
                            .filter(|v| !v.is_null())
                            .and_then(format_literal)
                    })
                    .unwrap_or_else(|| NULL.to_string())
            })
            .collect()
    }

    /// `Class::maker(arg1, arg2)`
    pub fn literal_call(&self, node: &EntityNode) -> String {
        format!(
            "{}::{}({})",
            self.schema.class,
            self.maker(),
            self.arguments(node).join(", ")
        )
    }

    /// Regex source of [`search_pattern`](Self::search_pattern).
    pub fn pattern_source(&self, node: &EntityNode) -> String {
        let arguments = self.arguments(node);
        let bound = bound_arguments(&arguments)
            .iter()
            .map(|arg| flexible_pattern(arg))
            .collect::<Vec<_>>()
            .join(r"\s*,\s*");
        format!(
            r"{}\s*::\s*{}\s*\(\s*{}\s*[,)]",
            regex::escape(&self.schema.class),
            regex::escape(self.maker()),
            bound
        )
    }

    /// Regex source matching any maker call of the schema's class, whatever
    /// its arguments.
    pub fn opener_source(&self) -> String {
        format!(
            r"{}\s*::\s*{}\s*\(",
            regex::escape(&self.schema.class),
            regex::escape(self.maker())
        )
    }

    /// Pattern matching this node's maker call in text, tolerant of
    /// reformatting. Only the leading argument is bound when the second one
    /// repeats it or is `null`; trailing arguments are never constrained.
    pub fn search_pattern(&self, node: &EntityNode) -> Result<Regex> {
        Ok(Regex::new(&self.pattern_source(node))?)
    }
}

/// The leading arguments a search pattern binds.
fn bound_arguments(arguments: &[String]) -> &[String] {
    match arguments {
        [first, second, ..] if second == first || second == NULL => &arguments[..1],
        _ => arguments,
    }
}
