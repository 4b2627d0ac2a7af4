//! Attribute omission rules.
//!
//! Every attribute of a schema can carry a list of rules. When rendering a
//! node, an attribute is dropped from the generated text as soon as **any**
//! of its rules holds. A rule keyed by another rule (a gate) only
//! contributes when the gate itself holds.
//!
//! Rules are written in a compact string form, the same one used in the
//! configuration file:
//!
//! | rule | omitted when |
//! |---|---|
//! | `omit` | always (value is non-null) |
//! | `omit:<literal>` | value equals the literal |
//! | `same:<path>` | value equals the value at `path` |
//! | `hasChildren` | the node has children |
//! | `equals:[<path>,]<literal>` | value at `path` (or the value) equals the literal |
//! | `notEquals:[<path>,]<literal>` | ... differs from the literal |
//! | `greaterThan:[<path>,]<n>` | ... is a number above `n` |
//! | `lessThan:[<path>,]<n>` | ... is a number below `n` |
//! | `hasAttribute:<path>` | `path` resolves |
//! | `isTrue:<path>` / `isFalse:<path>` | value at `path` is `true` / `false` |
//! | `minElements:<n>` | value is a list with fewer than `n` elements |
//! | `isBlank` | value is null or a whitespace-only string |

use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::Error;
use crate::types::{EntityNode, ITEMS, Value};

/// One omission predicate.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawRule")]
pub enum Rule {
    Omit,
    OmitWhen(Value),
    Same(String),
    HasChildren,
    Equals(Option<String>, Value),
    NotEquals(Option<String>, Value),
    GreaterThan(Option<String>, f64),
    LessThan(Option<String>, f64),
    HasAttribute(String),
    IsTrue(String),
    IsFalse(String),
    MinElements(usize),
    IsBlank,
    /// `rules` only count when `gate` holds.
    Gated { gate: Box<Rule>, rules: Vec<Rule> },
}

impl Rule {
    /// Whether this rule asks for `value` (an attribute of `node`) to be omitted.
    pub fn holds(&self, node: &EntityNode, value: &Value) -> bool {
        match self {
            Rule::Omit => !value.is_null(),
            Rule::OmitWhen(literal) => value.loosely_equals(literal),
            Rule::Same(path) => {
                resolve_path(node, path).is_some_and(|other| value.loosely_equals(&other))
            }
            Rule::HasChildren => node.has_children(),
            Rule::Equals(path, literal) => {
                operand(node, path.as_deref(), value).is_some_and(|v| v.loosely_equals(literal))
            }
            Rule::NotEquals(path, literal) => {
                operand(node, path.as_deref(), value).is_some_and(|v| !v.loosely_equals(literal))
            }
            Rule::GreaterThan(path, threshold) => operand(node, path.as_deref(), value)
                .and_then(|v| v.as_f64())
                .is_some_and(|n| n > *threshold),
            Rule::LessThan(path, threshold) => operand(node, path.as_deref(), value)
                .and_then(|v| v.as_f64())
                .is_some_and(|n| n < *threshold),
            Rule::HasAttribute(path) => resolve_path(node, path).is_some(),
            Rule::IsTrue(path) => resolve_path(node, path).and_then(|v| v.as_bool()) == Some(true),
            Rule::IsFalse(path) => {
                resolve_path(node, path).and_then(|v| v.as_bool()) == Some(false)
            }
            Rule::MinElements(min) => value.count().is_some_and(|n| n < *min),
            Rule::IsBlank => match value {
                Value::Null => true,
                Value::String(s) => s.trim().is_empty(),
                _ => false,
            },
            Rule::Gated { gate, rules } => {
                gate.holds(node, value) && rules.iter().any(|r| r.holds(node, value))
            }
        }
    }
}

/// Decide whether `attribute` of `node` is left out of the generated text.
///
/// Null or missing values and runtime objects are always omitted; otherwise
/// the attribute is omitted when any rule holds.
///
/// # Examples
///
/// ```
/// use routekit::v1::{EntityNode, Rule, should_omit};
///
/// let node = EntityNode::new("users").with_url_method("GET").with_icon("  ");
/// let method_rules: Vec<Rule> = vec!["omit:GET".parse().unwrap()];
/// let icon_rules: Vec<Rule> = vec!["isBlank".parse().unwrap()];
///
/// assert!(should_omit(&node, "urlMethod", &method_rules));
/// assert!(should_omit(&node, "icon", &icon_rules));
/// assert!(should_omit(&node, "missing", &[]));
/// ```
pub fn should_omit(node: &EntityNode, attribute: &str, rules: &[Rule]) -> bool {
    let Some(value) = resolve_path(node, attribute) else {
        return true;
    };
    if value.is_null() || !value.is_renderable() {
        return true;
    }
    rules.iter().any(|rule| rule.holds(node, &value))
}

/// Resolve a dotted path against a node.
///
/// The first segment names an attribute or one of the computed accessors
/// `id` and `items` (the list of child ids). Further segments index into
/// maps by key and lists by position.
pub fn resolve_path(node: &EntityNode, path: &str) -> Option<Value> {
    let mut segments = path.split('.');
    let head = segments.next()?;
    let root = match head {
        "id" => Value::String(node.id.clone()),
        ITEMS => Value::List(
            node.children
                .iter()
                .map(|c| Value::String(c.id.clone()))
                .collect(),
        ),
        name => node.get(name)?.clone(),
    };
    segments.try_fold(root, |current, segment| current.child(segment).cloned())
}

fn operand(node: &EntityNode, path: Option<&str>, value: &Value) -> Option<Value> {
    match path {
        Some(path) => resolve_path(node, path),
        None => Some(value.clone()),
    }
}

/// Parse a rule argument literal: `true`, `false`, `null`, numbers, else a
/// string (surrounding quotes are stripped).
pub fn parse_literal(raw: &str) -> Value {
    let raw = raw.trim();
    match raw.to_ascii_lowercase().as_str() {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" => return Value::Null,
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return Value::Int(i);
    }
    let numeric_start = raw
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '.');
    if numeric_start && let Ok(f) = raw.parse::<f64>() {
        return Value::Float(f);
    }
    for quote in ['\'', '"'] {
        if raw.len() >= 2 && raw.starts_with(quote) && raw.ends_with(quote) {
            return Value::String(raw[1..raw.len() - 1].to_string());
        }
    }
    Value::String(raw.to_string())
}

fn invalid(rule: &str, reason: impl Into<String>) -> Error {
    Error::InvalidRule {
        rule: rule.to_string(),
        reason: reason.into(),
    }
}

/// Split `path,literal` comparison arguments; a lone argument is the literal.
fn comparison_args(args: &str) -> (Option<String>, &str) {
    match args.split_once(',') {
        Some((path, literal)) => (Some(path.trim().to_string()), literal),
        None => (None, args),
    }
}

impl FromStr for Rule {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (name, args) = match s.split_once(':') {
            Some((name, args)) => (name.trim(), Some(args)),
            None => (s.trim(), None),
        };
        let required = |what: &str| args.ok_or_else(|| invalid(s, format!("missing {what}")));
        let number = |raw: &str| {
            parse_literal(raw)
                .as_f64()
                .ok_or_else(|| invalid(s, format!("`{}` is not a number", raw.trim())))
        };

        let rule = match name {
            "omit" => match args {
                Some(literal) => Rule::OmitWhen(parse_literal(literal)),
                None => Rule::Omit,
            },
            "same" => Rule::Same(required("path")?.trim().to_string()),
            "hasChildren" => Rule::HasChildren,
            "equals" => {
                let (path, literal) = comparison_args(required("literal")?);
                Rule::Equals(path, parse_literal(literal))
            }
            "notEquals" => {
                let (path, literal) = comparison_args(required("literal")?);
                Rule::NotEquals(path, parse_literal(literal))
            }
            "greaterThan" => {
                let (path, literal) = comparison_args(required("threshold")?);
                Rule::GreaterThan(path, number(literal)?)
            }
            "lessThan" => {
                let (path, literal) = comparison_args(required("threshold")?);
                Rule::LessThan(path, number(literal)?)
            }
            "hasAttribute" => Rule::HasAttribute(required("path")?.trim().to_string()),
            "isTrue" => Rule::IsTrue(required("path")?.trim().to_string()),
            "isFalse" => Rule::IsFalse(required("path")?.trim().to_string()),
            "minElements" => {
                let raw = required("count")?.trim();
                Rule::MinElements(
                    raw.parse()
                        .map_err(|_| invalid(s, format!("`{raw}` is not a count")))?,
                )
            }
            "isBlank" => Rule::IsBlank,
            other => return Err(invalid(s, format!("unknown rule `{other}`"))),
        };
        Ok(rule)
    }
}

/// Configuration form of a rule: either `"name:args"` or a single-key table
/// mapping a gate rule to its nested rules.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawRule {
    Plain(String),
    Gated(BTreeMap<String, Vec<RawRule>>),
}

impl TryFrom<RawRule> for Rule {
    type Error = Error;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        match raw {
            RawRule::Plain(s) => s.parse(),
            RawRule::Gated(table) => {
                let mut entries = table.into_iter();
                let (Some((gate, nested)), None) = (entries.next(), entries.next()) else {
                    return Err(invalid("{...}", "a gated rule needs exactly one gate"));
                };
                let rules = nested
                    .into_iter()
                    .map(Rule::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Rule::Gated {
                    gate: Box::new(gate.parse()?),
                    rules,
                })
            }
        }
    }
}
