//! Re-indentation of rendered blocks.

/// One indentation step.
pub const INDENT_UNIT: &str = "    ";

/// Indent level of a block at tree `depth` (roots are depth 0).
///
/// Every tree level adds two textual wrappers, the parent's `setItems([`
/// and the child block itself, so depth `d > 0` sits at `2d + 1`.
///
/// ```
/// use routekit_source::indent_level;
///
/// assert_eq!(indent_level(0), 1);
/// assert_eq!(indent_level(1), 3);
/// assert_eq!(indent_level(2), 5);
/// ```
pub fn indent_level(depth: usize) -> usize {
    2 * depth + 1
}

/// Lines that continue the builder chain of the line above: method calls
/// and the `])` closing a children list.
pub fn is_continuation(line: &str) -> bool {
    line.starts_with("->") || line.starts_with("])")
}

/// Strip each line's leading whitespace and prefix it with `level` units,
/// one more for continuation lines. Blank lines become empty.
pub fn indent(text: &str, level: usize) -> String {
    text.split('\n')
        .map(|line| {
            let line = line.trim_start();
            if line.trim_end().is_empty() {
                return String::new();
            }
            let units = if is_continuation(line) { level + 1 } else { level };
            format!("{}{}", INDENT_UNIT.repeat(units), line)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
