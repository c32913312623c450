/// Serialize entries as dotenv text.
///
/// Keys are written in ascending order, one `KEY=value` per line, joined by
/// `\n` with no trailing newline. Values that are empty or contain
/// whitespace, quotes, backslashes, `#` or `$` are double-quoted and escaped.
///
/// ```
/// use std::collections::HashMap;
///
/// let mut env = HashMap::new();
/// env.insert("B", "va lue");
/// env.insert("A", "plain");
/// assert_eq!(dotenv_codec::serialize(&env), "A=plain\nB=\"va lue\"");
/// ```
pub fn serialize<I, K, V>(entries: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut entries: Vec<(K, V)> = entries.into_iter().collect();
    entries.sort_by(|(left, _), (right, _)| left.as_ref().cmp(right.as_ref()));

    let mut out = String::new();
    for (idx, (key, value)) in entries.iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        push_line(&mut out, key.as_ref(), value.as_ref());
    }
    out
}

fn push_line(out: &mut String, key: &str, value: &str) {
    out.push_str(key);
    out.push('=');
    if !needs_quoting(value) {
        out.push_str(value);
        return;
    }

    out.push('"');
    push_escaped(out, value);
    out.push('"');
}

fn needs_quoting(value: &str) -> bool {
    value.is_empty()
        || value
            .chars()
            .any(|ch| matches!(ch, ' ' | '\t' | '\n' | '\r' | '"' | '\'' | '\\' | '#' | '$'))
}

fn push_escaped(out: &mut String, value: &str) {
    for ch in value.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            _ => out.push(ch),
        }
    }
}
