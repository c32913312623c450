//! `$NAME` / `${NAME}` substitution.
//!
//! Expansion is a single left-to-right pass: text produced by `resolve` is
//! copied to the output and never scanned again, so self references cannot
//! loop.

/// Replace every placeholder in `input` with `resolve(name)`.
///
/// A `$` that does not start a well-formed placeholder is kept verbatim.
pub(crate) fn expand<F>(input: &str, mut resolve: F) -> String
where
    F: FnMut(&str) -> String,
{
    let mut out = String::with_capacity(input.len());
    let mut copied = 0;

    for span in placeholders(input) {
        out.push_str(&input[copied..span.start]);
        out.push_str(&resolve(span.name));
        copied = span.end;
    }

    out.push_str(&input[copied..]);
    out
}

/// A `$NAME` or `${NAME}` token within the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Span<'a> {
    start: usize,
    end: usize,
    name: &'a str,
}

/// Well-formed placeholders in `input`, left to right and non-overlapping.
fn placeholders(input: &str) -> impl Iterator<Item = Span<'_>> {
    let mut from = 0;
    std::iter::from_fn(move || {
        while let Some(offset) = input[from..].find('$') {
            let start = from + offset;
            match span_at(input, start) {
                Some(span) => {
                    from = span.end;
                    return Some(span);
                }
                None => from = start + 1,
            }
        }
        None
    })
}

/// Placeholder beginning with the `$` at `start`, if it is well formed.
fn span_at(input: &str, start: usize) -> Option<Span<'_>> {
    let rest = &input[start + 1..];

    if let Some(braced) = rest.strip_prefix('{') {
        let len = identifier_len(braced)?;
        if !braced[len..].starts_with('}') {
            return None;
        }
        return Some(Span {
            start,
            // `$`, `{`, the name, `}`
            end: start + len + 3,
            name: &braced[..len],
        });
    }

    let len = identifier_len(rest)?;
    Some(Span {
        start,
        end: start + len + 1,
        name: &rest[..len],
    })
}

/// Byte length of the identifier at the start of `text`.
fn identifier_len(text: &str) -> Option<usize> {
    let bytes = text.as_bytes();
    if !bytes.first().copied().is_some_and(is_identifier_start) {
        return None;
    }
    Some(bytes.iter().take_while(|byte| is_identifier_char(**byte)).count())
}

pub(crate) fn is_identifier_start(byte: u8) -> bool {
    byte.is_ascii_alphabetic() || byte == b'_'
}

pub(crate) fn is_identifier_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> String {
        match name {
            "BASE" => "hello".to_owned(),
            "SELF" => "$SELF".to_owned(),
            _ => String::new(),
        }
    }

    #[test]
    fn expands_bare_and_braced_references() {
        assert_eq!(expand("$BASE", lookup), "hello");
        assert_eq!(expand("${BASE}_world", lookup), "hello_world");
        assert_eq!(expand("${BASE}_${BASE}", lookup), "hello_hello");
    }

    #[test]
    fn bare_reference_takes_longest_identifier() {
        assert_eq!(expand("$BASE_world", lookup), "");
        assert_eq!(expand("$BASE-world", lookup), "hello-world");
    }

    #[test]
    fn unknown_names_resolve_through_callback() {
        assert_eq!(expand("a${MISSING}b$OTHER", lookup), "ab");
    }

    #[test]
    fn keeps_dollar_without_placeholder() {
        assert_eq!(expand("cost: $5", lookup), "cost: $5");
        assert_eq!(expand("trailing$", lookup), "trailing$");
        assert_eq!(expand("$$BASE", lookup), "$hello");
        assert_eq!(expand("${}", lookup), "${}");
        assert_eq!(expand("${1X}", lookup), "${1X}");
    }

    #[test]
    fn keeps_unterminated_brace() {
        assert_eq!(expand("${BASE", lookup), "${BASE");
        assert_eq!(expand("${BASE x}", lookup), "${BASE x}");
    }

    #[test]
    fn substituted_text_is_not_rescanned() {
        assert_eq!(expand("$SELF and ${SELF}", lookup), "$SELF and $SELF");
    }

    #[test]
    fn spans_cover_whole_tokens() {
        let spans: Vec<_> = placeholders("a$X-${YZ}$").collect();
        assert_eq!(
            spans,
            vec![
                Span {
                    start: 1,
                    end: 3,
                    name: "X",
                },
                Span {
                    start: 4,
                    end: 9,
                    name: "YZ",
                },
            ]
        );
    }

    #[test]
    fn passes_through_non_ascii_text() {
        assert_eq!(expand("こんにちは $BASE", lookup), "こんにちは hello");
    }
}
