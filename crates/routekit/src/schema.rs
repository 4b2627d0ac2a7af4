use serde::Deserialize;
use std::collections::BTreeMap;

use crate::rules::Rule;
use crate::types::Value;

/// Preamble used when a route file does not exist yet.
pub const DEFAULT_HEADER: &str = "<?php\n\nreturn [";

/// A positional parameter of an entity's maker call.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConstructorParam {
    /// Attribute the argument is read from (`id` is the node id).
    pub name: String,
    /// Declared default, used when the node has no value for `name`.
    #[serde(default)]
    pub default: Option<Value>,
}

/// Describes how one kind of entity is written as source text: the class
/// and maker method that open a block, the positional constructor
/// parameters, and the omission rules of each attribute.
///
/// # TOML shape
///
/// ```toml
/// [schemas.route]
/// class = "Route"
/// maker = "make"
/// params = [{ name = "id" }, { name = "title" }]
///
/// [schemas.route.rules]
/// urlMethod = ["omit:GET"]
/// permissions = [{ hasChildren = ["minElements:1"] }]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Schema {
    pub class: String,
    /// Named constructor. `None` means the class has no maker method and
    /// blocks are keyed on the id alone.
    #[serde(default)]
    pub maker: Option<String>,
    #[serde(default)]
    pub params: Vec<ConstructorParam>,
    /// Preamble for new files, ending with `return [`.
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub rules: BTreeMap<String, Vec<Rule>>,
}

impl Schema {
    /// A schema with no maker method, no parameters and no rules
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            maker: None,
            params: Vec::new(),
            header: None,
            rules: BTreeMap::new(),
        }
    }

    pub fn with_maker(mut self, maker: impl Into<String>) -> Self {
        self.maker = Some(maker.into());
        self
    }

    /// Append a constructor parameter
    pub fn with_param(mut self, name: impl Into<String>, default: Option<Value>) -> Self {
        self.params.push(ConstructorParam {
            name: name.into(),
            default,
        });
        self
    }

    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Add an omission rule for `attribute`
    pub fn with_rule(mut self, attribute: impl Into<String>, rule: Rule) -> Self {
        self.rules.entry(attribute.into()).or_default().push(rule);
        self
    }

    /// The parameters bound positionally in the maker call (at most two).
    pub fn constructor_params(&self) -> &[ConstructorParam] {
        &self.params[..self.params.len().min(2)]
    }

    pub fn is_constructor_param(&self, name: &str) -> bool {
        self.constructor_params().iter().any(|p| p.name == name)
    }

    pub fn rules_for(&self, attribute: &str) -> &[Rule] {
        self.rules.get(attribute).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn header_or_default(&self) -> &str {
        self.header.as_deref().unwrap_or(DEFAULT_HEADER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constructor_params_capped_at_two() {
        let schema = Schema::new("Route")
            .with_param("id", None)
            .with_param("title", None)
            .with_param("url", None);
        let names: Vec<&str> = schema
            .constructor_params()
            .iter()
            .map(|p| p.name.as_str())
            .collect();
        assert_eq!(names, vec!["id", "title"]);
        assert!(!schema.is_constructor_param("url"));
    }

    #[test]
    fn test_rules_for_accumulates() {
        let schema = Schema::new("Route")
            .with_rule("sort", Rule::OmitWhen(Value::Int(0)))
            .with_rule("sort", Rule::IsBlank);
        assert_eq!(schema.rules_for("sort").len(), 2);
        assert!(schema.rules_for("title").is_empty());
    }

    #[test]
    fn test_header_default() {
        assert_eq!(Schema::new("Route").header_or_default(), DEFAULT_HEADER);
        let schema = Schema::new("Route").with_header("<?php\nreturn [");
        assert_eq!(schema.header_or_default(), "<?php\nreturn [");
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            class = "Route"
            maker = "make"
            params = [{ name = "id" }, { name = "title", default = "Untitled" }]

            [rules]
            urlMethod = ["omit:GET"]
            permissions = [{ hasChildren = ["minElements:1"] }]
        "#;
        let schema: Schema = toml::from_str(toml).unwrap();
        assert_eq!(schema.maker.as_deref(), Some("make"));
        assert_eq!(schema.params[1].default, Some(Value::from("Untitled")));
        assert_eq!(
            schema.rules_for("urlMethod"),
            &[Rule::OmitWhen(Value::from("GET"))]
        );
        assert!(matches!(
            schema.rules_for("permissions")[0],
            Rule::Gated { .. }
        ));
    }
}
