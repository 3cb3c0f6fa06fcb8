/// Quote a string for use inside a space-separated build setting value.
///
/// Values containing whitespace, quotes or backslashes are wrapped in double
/// quotes with `"` and `\` escaped. Everything else is returned unchanged,
/// except the empty string, which becomes `""`.
pub fn quoted(value: &str) -> String {
    if value.is_empty() {
        return "\"\"".to_string();
    }
    if !value.chars().any(needs_quoting) {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

fn needs_quoting(c: char) -> bool {
    c.is_whitespace() || matches!(c, '"' | '\'' | '\\')
}
