/// Tidy generated text: whitespace-only lines become empty, runs of blank
/// lines collapse to one and trailing blank lines are dropped. A final
/// newline survives if the input ended with one.
///
/// ```
/// use routekit_source::sanitize;
///
/// assert_eq!(sanitize("a\n  \n\n\nb\n\n\n"), "a\n\nb\n");
/// ```
pub fn sanitize(text: &str) -> String {
    let trailing_newline = text.ends_with('\n');
    let body = text.strip_suffix('\n').unwrap_or(text);

    let mut lines: Vec<&str> = Vec::new();
    for line in body.split('\n') {
        let blank = line.trim().is_empty();
        if blank && lines.last().is_some_and(|prev| prev.is_empty()) {
            continue;
        }
        lines.push(if blank { "" } else { line });
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    let mut out = lines.join("\n");
    if trailing_newline && !out.is_empty() {
        out.push('\n');
    }
    out
}
