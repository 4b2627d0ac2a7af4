//! Literal formatting for attribute values and builder calls.

use routekit::v1::Value;

pub const NULL: &str = "null";

/// Render a value as a source literal. Runtime objects and non-finite
/// floats have no literal form and yield `None`.
pub fn format_literal(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(NULL.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Int(i) => Some(i.to_string()),
        Value::Float(f) if !f.is_finite() => None,
        Value::Float(f) if f.fract() == 0.0 => Some(format!("{f:.1}")),
        Value::Float(f) => Some(f.to_string()),
        Value::String(s) => Some(quote(s)),
        Value::List(items) => {
            let items = items
                .iter()
                .map(format_literal)
                .collect::<Option<Vec<_>>>()?;
            Some(format!("[{}]", items.join(", ")))
        }
        Value::Map(entries) => {
            let entries = entries
                .iter()
                .map(|(k, v)| format_literal(v).map(|v| format!("{} => {}", quote(k), v)))
                .collect::<Option<Vec<_>>>()?;
            Some(format!("[{}]", entries.join(", ")))
        }
        Value::Object(_) => None,
    }
}

/// Quote a string.
///
/// Single quotes are used unless the string spans lines. Only `'` and
/// backslashes that would otherwise start an escape are escaped, so
/// ordinary strings (including namespaced class names) pass through
/// verbatim.
pub fn quote(s: &str) -> String {
    if s.contains(['\n', '\r']) {
        return double_quote(s);
    }
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\'' => out.push_str("\\'"),
            '\\' if matches!(chars.peek(), None | Some('\\') | Some('\'')) => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

/// Double-quoted form for multi-line strings. Line breaks become escapes so
/// the literal stays on one line through indenting and sanitizing.
fn double_quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '$' => out.push_str("\\$"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// `urlMethod` -> `setUrlMethod`
pub fn setter_name(attribute: &str) -> String {
    let mut chars = attribute.chars();
    match chars.next() {
        Some(first) => format!("set{}{}", first.to_uppercase(), chars.as_str()),
        None => "set".to_string(),
    }
}

/// `setUrlMethod` -> `urlMethod`; `None` for anything that is not a setter.
pub fn attribute_name(method: &str) -> Option<String> {
    let rest = method.strip_prefix("set")?;
    let mut chars = rest.chars();
    let first = chars.next()?;
    Some(format!("{}{}", first.to_lowercase(), chars.as_str()))
}

/// The call that closes a block and anchors it to its id.
pub fn end_marker(id: &str) -> String {
    format!("->setEndBlock({})", quote(id))
}

/// Regex source matching `->setEndBlock('<id>')` with any spacing.
pub fn end_marker_pattern(id: &str) -> String {
    format!(
        r"->\s*setEndBlock\s*\(\s*{}\s*\)",
        regex::escape(&quote(id))
    )
}

/// Turn a formatted literal into a regex source that still matches after a
/// formatter has reflowed it: whitespace may appear or vanish around
/// punctuation and lists may gain a trailing comma. Quoted text is matched
/// exactly.
pub fn flexible_pattern(literal: &str) -> String {
    let mut out = String::new();
    let mut chars = literal.chars().peekable();
    let mut quote_char: Option<char> = None;

    while let Some(c) = chars.next() {
        if let Some(q) = quote_char {
            out.push_str(&regex::escape(&c.to_string()));
            if c == '\\' {
                if let Some(next) = chars.next() {
                    out.push_str(&regex::escape(&next.to_string()));
                }
            } else if c == q {
                quote_char = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => {
                quote_char = Some(c);
                out.push(c);
            }
            c if c.is_whitespace() => {
                while chars.peek().is_some_and(|n| n.is_whitespace()) {
                    chars.next();
                }
                out.push_str(r"\s*");
            }
            ',' => out.push_str(r"\s*,\s*"),
            '[' => out.push_str(r"\[\s*"),
            ']' => out.push_str(r"(?:\s*,)?\s*\]"),
            '=' if chars.peek() == Some(&'>') => {
                chars.next();
                out.push_str(r"\s*=>\s*");
            }
            c => out.push_str(&regex::escape(&c.to_string())),
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use regex::Regex;

    // ── format_literal ─────────────────────────────────────────────────

    #[test]
    fn test_format_scalars() {
        assert_eq!(format_literal(&Value::Null).unwrap(), "null");
        assert_eq!(format_literal(&Value::Bool(true)).unwrap(), "true");
        assert_eq!(format_literal(&Value::Int(-4)).unwrap(), "-4");
        assert_eq!(format_literal(&Value::Float(2.0)).unwrap(), "2.0");
        assert_eq!(format_literal(&Value::Float(0.25)).unwrap(), "0.25");
        assert_eq!(format_literal(&Value::from("Users")).unwrap(), "'Users'");
    }

    #[test]
    fn test_format_lists_and_maps() {
        let list = Value::from(vec!["web", "auth"]);
        assert_eq!(format_literal(&list).unwrap(), "['web', 'auth']");
        let map = Value::Map(vec![
            ("icon".into(), Value::from("users")),
            ("order".into(), Value::Int(2)),
        ]);
        assert_eq!(
            format_literal(&map).unwrap(),
            "['icon' => 'users', 'order' => 2]"
        );
        assert_eq!(format_literal(&Value::List(vec![])).unwrap(), "[]");
    }

    #[test]
    fn test_format_unrenderable() {
        assert!(format_literal(&Value::Object("Closure".into())).is_none());
        assert!(format_literal(&Value::Float(f64::NAN)).is_none());
        let nested = Value::List(vec![Value::Int(1), Value::Object("X".into())]);
        assert!(format_literal(&nested).is_none());
    }

    // ── quote ──────────────────────────────────────────────────────────

    #[test]
    fn test_quote_passthrough() {
        assert_eq!(
            quote(r"App\Http\Controllers\UserController"),
            r"'App\Http\Controllers\UserController'"
        );
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("it's"), r"'it\'s'");
        assert_eq!(quote(r"trailing\"), r"'trailing\\'");
        assert_eq!(quote(r"a\\b"), r"'a\\\b'");
    }

    #[test]
    fn test_quote_multiline_uses_double_quotes() {
        assert_eq!(quote("one\ntwo"), r#""one\ntwo""#);
        assert_eq!(quote("a\r\n\t$b \"c\" d\\"), r#""a\r\n\t\$b \"c\" d\\""#);
    }

    // ── names ──────────────────────────────────────────────────────────

    #[test]
    fn test_setter_and_attribute_names() {
        assert_eq!(setter_name("urlMethod"), "setUrlMethod");
        assert_eq!(setter_name("title"), "setTitle");
        assert_eq!(attribute_name("setUrlMethod").as_deref(), Some("urlMethod"));
        assert_eq!(attribute_name("set"), None);
        assert_eq!(attribute_name("getUrl"), None);
    }

    #[test]
    fn test_end_marker() {
        assert_eq!(end_marker("admin.users"), "->setEndBlock('admin.users')");
        let re = Regex::new(&end_marker_pattern("admin.users")).unwrap();
        assert!(re.is_match("->setEndBlock( 'admin.users' )"));
        assert!(!re.is_match("->setEndBlock('adminXusers')"));
    }

    // ── flexible_pattern ───────────────────────────────────────────────

    #[test]
    fn test_flexible_pattern_tolerates_reflow() {
        let re = Regex::new(&flexible_pattern("['web', 'auth']")).unwrap();
        assert!(re.is_match("['web', 'auth']"));
        assert!(re.is_match("[\n    'web',\n    'auth',\n]"));
        assert!(!re.is_match("['web', 'admin']"));
    }

    #[test]
    fn test_flexible_pattern_keeps_quoted_text_exact() {
        let re = Regex::new(&format!("^{}$", flexible_pattern("'a, b [c]'"))).unwrap();
        assert!(re.is_match("'a, b [c]'"));
        assert!(!re.is_match("'a,b [c]'"));
    }

    #[test]
    fn test_flexible_pattern_maps() {
        let re = Regex::new(&flexible_pattern("['icon' => 'users']")).unwrap();
        assert!(re.is_match("['icon'=>'users']"));
        assert!(re.is_match("[\n  'icon' => 'users',\n]"));
    }
}
