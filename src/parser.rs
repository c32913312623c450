use std::io::Read;

use tracing::{debug, trace};

use crate::env::{EnvSource, ProcessEnv};
use crate::error::{Error, ParseError};
use crate::expand::{expand, is_identifier_char, is_identifier_start};
use crate::model::{EnvMap, SingleQuoteMode, SubstitutionMode};

/// Parse dotenv text with the default [`Parser`].
pub fn parse_str(input: &str) -> Result<EnvMap, Error> {
    Parser::new().parse_str(input)
}

/// Parse dotenv entries from UTF-8 bytes with the default [`Parser`].
pub fn parse_bytes(input: &[u8]) -> Result<EnvMap, Error> {
    Parser::new().parse_bytes(input)
}

/// Parse dotenv entries from a reader with the default [`Parser`].
pub fn parse_reader<R: Read>(reader: R) -> Result<EnvMap, Error> {
    Parser::new().parse_reader(reader)
}

/// Dotenv parser configuration.
///
/// The configuration is fixed once built. Each parse call accumulates into
/// its own map, so a `Parser` can be shared freely between threads.
///
/// ```
/// use dotenv_codec::{Parser, SubstitutionMode};
///
/// let env = Parser::new()
///     .substitution_mode(SubstitutionMode::Disabled)
///     .parse_str("GREETING=\"hi\\tthere\"\nCOPY=$GREETING\n")
///     .unwrap();
/// assert_eq!(env["GREETING"], "hi\tthere");
/// assert_eq!(env["COPY"], "$GREETING");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Parser {
    substitution_mode: SubstitutionMode,
    single_quote_mode: SingleQuoteMode,
}

impl Parser {
    /// Parser with expansion enabled and expanding single quotes.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn substitution_mode(mut self, substitution_mode: SubstitutionMode) -> Self {
        self.substitution_mode = substitution_mode;
        self
    }

    pub fn single_quote_mode(mut self, single_quote_mode: SingleQuoteMode) -> Self {
        self.single_quote_mode = single_quote_mode;
        self
    }

    /// Parse `input`, resolving unknown placeholders from the process
    /// environment.
    pub fn parse_str(&self, input: &str) -> Result<EnvMap, Error> {
        self.parse_str_with_env(input, &ProcessEnv)
    }

    /// Parse `input`, resolving unknown placeholders from `env`.
    pub fn parse_str_with_env<E: EnvSource>(
        &self,
        input: &str,
        env: &E,
    ) -> Result<EnvMap, Error> {
        self.parse_lines(input, env).map_err(Error::from)
    }

    pub fn parse_bytes(&self, input: &[u8]) -> Result<EnvMap, Error> {
        self.parse_bytes_with_env(input, &ProcessEnv)
    }

    pub fn parse_bytes_with_env<E: EnvSource>(
        &self,
        input: &[u8],
        env: &E,
    ) -> Result<EnvMap, Error> {
        let text = std::str::from_utf8(input)?;
        self.parse_str_with_env(text, env)
    }

    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<EnvMap, Error> {
        self.parse_reader_with_env(reader, &ProcessEnv)
    }

    /// Read `reader` to the end, then parse it. Read failures surface as
    /// [`Error::Io`] and no entries are returned.
    pub fn parse_reader_with_env<R: Read, E: EnvSource>(
        &self,
        mut reader: R,
        env: &E,
    ) -> Result<EnvMap, Error> {
        let mut buf = Vec::new();
        reader.read_to_end(&mut buf)?;
        self.parse_bytes_with_env(&buf, env)
    }

    fn parse_lines<E: EnvSource>(&self, input: &str, env: &E) -> Result<EnvMap, ParseError> {
        // Nothing escapes this map until every line has parsed.
        let mut result = EnvMap::new();

        for (idx, raw_line) in input.lines().enumerate() {
            let line_num = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let line = strip_inline_comment(line);
            let Some(assignment) = classify(line) else {
                debug!(line = line_num, "malformed dotenv line");
                return Err(ParseError::new(line_num, line));
            };

            let (decoded, quoting) = decode_value(assignment.raw_value);
            let value = if self.expands(quoting) {
                expand(&decoded, |name| resolve(name, &result, env))
            } else {
                decoded
            };

            trace!(line = line_num, key = assignment.key, "parsed assignment");
            result.insert(assignment.key.to_owned(), value);
        }

        Ok(result)
    }

    fn expands(&self, quoting: Quoting) -> bool {
        match self.substitution_mode {
            SubstitutionMode::Disabled => false,
            SubstitutionMode::Expand => !(quoting == Quoting::Single
                && self.single_quote_mode == SingleQuoteMode::Literal),
        }
    }
}

/// Earlier lines of the same input win over the fallback environment; a name
/// found in neither expands to nothing.
fn resolve<E: EnvSource>(name: &str, parsed: &EnvMap, env: &E) -> String {
    if let Some(value) = parsed.get(name) {
        return value.clone();
    }
    env.get_var(name).unwrap_or_default()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QuoteState {
    Unquoted,
    Quoted(u8),
}

/// Cut a trailing `#` comment that sits outside any quotes.
///
/// A quote preceded by a backslash does not close the open quote. Only the
/// single preceding byte is checked, so `"a\\"` keeps the quote open.
fn strip_inline_comment(line: &str) -> &str {
    let bytes = line.as_bytes();
    let mut state = QuoteState::Unquoted;

    for (idx, &byte) in bytes.iter().enumerate() {
        state = match state {
            QuoteState::Unquoted => match byte {
                b'"' | b'\'' => QuoteState::Quoted(byte),
                b'#' => return line[..idx].trim_end(),
                _ => QuoteState::Unquoted,
            },
            QuoteState::Quoted(quote) if byte == quote && bytes[idx - 1] != b'\\' => {
                QuoteState::Unquoted
            }
            quoted @ QuoteState::Quoted(_) => quoted,
        };
    }

    line
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Assignment<'a> {
    key: &'a str,
    raw_value: &'a str,
}

/// Match `export KEY=value`, then `KEY=value` / `KEY: value`.
///
/// Only ASCII whitespace may separate `export`, the key and the separator.
/// The value itself is trimmed of any Unicode whitespace.
fn classify(line: &str) -> Option<Assignment<'_>> {
    let line = line.trim();

    if let Some(rest) = line.strip_prefix("export")
        && rest.starts_with(|ch: char| ch.is_ascii_whitespace())
        && let Some(assignment) = split_assignment(rest.trim_ascii_start())
    {
        return Some(assignment);
    }

    split_assignment(line)
}

fn split_assignment(line: &str) -> Option<Assignment<'_>> {
    let bytes = line.as_bytes();
    if !bytes.first().copied().is_some_and(is_identifier_start) {
        return None;
    }

    let key_end = bytes
        .iter()
        .position(|byte| !is_identifier_char(*byte))
        .unwrap_or(bytes.len());
    let raw_value = line[key_end..]
        .trim_ascii_start()
        .strip_prefix(['=', ':'])?
        .trim();

    Some(Assignment {
        key: &line[..key_end],
        raw_value,
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quoting {
    Unquoted,
    Single,
    Double,
}

fn decode_value(raw: &str) -> (String, Quoting) {
    let bytes = raw.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            let inner = &raw[1..raw.len() - 1];
            return match first {
                b'"' => (unescape_double_quoted(inner), Quoting::Double),
                _ => (inner.to_owned(), Quoting::Single),
            };
        }
    }

    (raw.to_owned(), Quoting::Unquoted)
}

fn unescape_double_quoted(inner: &str) -> String {
    if !inner.contains('\\') {
        return inner.to_owned();
    }

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }

        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(escaped @ ('\\' | '"' | '\'')) => out.push(escaped),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }

    out
}
