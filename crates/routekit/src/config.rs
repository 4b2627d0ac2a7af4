//! Configuration loading.
//!
//! `defaults/routekit.default.toml` is embedded into every binary. A user
//! file is layered on top of it: schemas are replaced or added by name and
//! an `[output]` table replaces the output defaults.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::schema::Schema;

const DEFAULT_TOML: &str = include_str!("../defaults/routekit.default.toml");

/// How documents are written unless the caller overrides it.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputConfig {
    /// `tree` or `plain`
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Always render blocks from attributes, never reuse text from the file.
    #[serde(default)]
    pub only_string_support: bool,
    /// External formatter command line, e.g. `["php-cs-fixer", "fix", "--quiet"]`.
    /// The file to format is appended as the last argument.
    #[serde(default)]
    pub formatter: Vec<String>,
}

fn default_strategy() -> String {
    "tree".to_string()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            only_string_support: false,
            formatter: Vec::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    output: Option<OutputConfig>,
    #[serde(default)]
    schemas: BTreeMap<String, Schema>,
}

/// Resolved configuration: output defaults plus named entity schemas.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub output: OutputConfig,
    pub schemas: BTreeMap<String, Schema>,
}

impl Config {
    /// The embedded defaults only.
    pub fn builtin() -> Result<Self> {
        let file: ConfigFile = toml::from_str(DEFAULT_TOML)?;
        Ok(Self {
            output: file.output.unwrap_or_default(),
            schemas: file.schemas,
        })
    }

    /// Defaults, plus the file at `path` when given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = Self::builtin()?;
        match path {
            Some(path) => config.layer_file(path),
            None => Ok(config),
        }
    }

    /// Layer a TOML document over this configuration.
    pub fn layer_str(mut self, toml: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(toml)?;
        if let Some(output) = file.output {
            self.output = output;
        }
        self.schemas.extend(file.schemas);
        Ok(self)
    }

    /// Layer a TOML file. Missing files are an error.
    pub fn layer_file(self, path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        self.layer_str(&content)
    }

    pub fn schema(&self, name: &str) -> Result<&Schema> {
        self.schemas
            .get(name)
            .ok_or_else(|| Error::UnknownSchema(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::Rule;
    use crate::types::Value;
    use std::io::Write;

    #[test]
    fn test_builtin_parses() {
        let config = Config::builtin().unwrap();
        assert_eq!(config.output.strategy, "tree");
        assert!(!config.output.only_string_support);

        let route = config.schema("route").unwrap();
        assert_eq!(route.class, "Route");
        assert_eq!(route.maker.as_deref(), Some("make"));
        assert_eq!(route.params.len(), 2);
        assert!(route.header_or_default().ends_with("return ["));
        assert!(route.header_or_default().contains("use App\\Navigation\\Route;"));
        assert!(route.rules_for("urlMethod").contains(&Rule::OmitWhen(Value::from("GET"))));

        let menu = config.schema("menu").unwrap();
        assert!(matches!(menu.rules_for("url")[1], Rule::Gated { .. }));
    }

    #[test]
    fn test_unknown_schema() {
        let config = Config::builtin().unwrap();
        assert!(matches!(config.schema("nope"), Err(Error::UnknownSchema(_))));
    }

    #[test]
    fn test_layer_replaces_and_adds() {
        let config = Config::builtin()
            .unwrap()
            .layer_str(
                r#"
                [output]
                strategy = "plain"
                formatter = ["php-cs-fixer", "fix"]

                [schemas.route]
                class = "AdminRoute"

                [schemas.link]
                class = "Link"
                "#,
            )
            .unwrap();
        assert_eq!(config.output.strategy, "plain");
        assert_eq!(config.output.formatter, vec!["php-cs-fixer", "fix"]);
        assert_eq!(config.schema("route").unwrap().class, "AdminRoute");
        assert!(config.schema("route").unwrap().maker.is_none());
        assert_eq!(config.schema("link").unwrap().class, "Link");
        assert!(config.schema("menu").is_ok());
    }

    #[test]
    fn test_layer_without_output_keeps_defaults() {
        let config = Config::builtin()
            .unwrap()
            .layer_str("[schemas.link]\nclass = \"Link\"\n")
            .unwrap();
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_layer_invalid_rule_fails() {
        let result = Config::builtin().unwrap().layer_str(
            r#"
            [schemas.route]
            class = "Route"
            [schemas.route.rules]
            sort = ["sometimes"]
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "[output]\nonly_string_support = true\n").unwrap();
        f.flush().unwrap();

        let config = Config::load(Some(f.path())).unwrap();
        assert!(config.output.only_string_support);
        assert_eq!(config.output.strategy, "tree");
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Some(Path::new("/nonexistent/routekit.toml")));
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
