//! Property tests for the parse/serialize pair.

use std::collections::BTreeMap;

use dotenv_codec::{EnvMap, Parser, SubstitutionMode, serialize};
use proptest::prelude::*;

fn key_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z_][A-Za-z0-9_]{0,8}"
}

/// Values that never need quoting.
fn plain_value_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_.,:/@%+=-]{0,16}"
}

/// Printable ASCII plus the control characters the encoder escapes.
fn any_value_strategy() -> impl Strategy<Value = String> {
    "[ -~\t\n\r]{0,24}"
}

fn parse_isolated(parser: Parser, input: &str) -> EnvMap {
    parser
        .parse_str_with_env(input, &EnvMap::new())
        .expect("generated input should parse")
}

proptest! {
    #[test]
    fn plain_assignments_parse_to_last_value(
        lines in prop::collection::vec((key_strategy(), plain_value_strategy()), 0..12)
    ) {
        let input: String = lines
            .iter()
            .map(|(key, value)| format!("{key}={value}\n"))
            .collect();

        let mut expected = BTreeMap::new();
        for (key, value) in &lines {
            expected.insert(key.clone(), value.clone());
        }

        prop_assert_eq!(parse_isolated(Parser::new(), &input), expected);
    }

    #[test]
    fn plain_values_round_trip(
        env in prop::collection::btree_map(key_strategy(), plain_value_strategy(), 0..12)
    ) {
        let text = serialize(&env);
        prop_assert_eq!(parse_isolated(Parser::new(), &text), env);
    }

    #[test]
    fn escaped_values_round_trip_without_expansion(
        env in prop::collection::btree_map(key_strategy(), any_value_strategy(), 0..8)
    ) {
        let text = serialize(&env);
        let parser = Parser::new().substitution_mode(SubstitutionMode::Disabled);
        prop_assert_eq!(parse_isolated(parser, &text), env);
    }

    #[test]
    fn serialized_output_is_sorted_without_trailing_newline(
        env in prop::collection::hash_map(key_strategy(), plain_value_strategy(), 1..12)
    ) {
        let text = serialize(&env);
        prop_assert!(!text.ends_with('\n'));

        let keys: Vec<&str> = text
            .lines()
            .map(|line| line.split_once('=').map_or(line, |(key, _)| key))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort_unstable();
        prop_assert_eq!(keys, sorted);
    }

    /// `$` forces quoting, but quoting does not stop expansion on the way back
    /// in, so a reference to an earlier key comes back resolved.
    #[test]
    fn placeholder_values_do_not_survive_round_trip(
        value in "[a-z0-9]{1,8}"
    ) {
        let mut env = BTreeMap::new();
        env.insert("A_SOURCE".to_owned(), value.clone());
        env.insert("B_REF".to_owned(), "$A_SOURCE".to_owned());

        let text = serialize(&env);
        prop_assert!(text.contains("B_REF=\"$A_SOURCE\""));

        let reparsed = parse_isolated(Parser::new(), &text);
        prop_assert_eq!(reparsed.get("B_REF"), Some(&value));
        prop_assert_ne!(reparsed, env);
    }

    /// Whitespace outside the quoting set leaves a value unquoted, and the
    /// parser then trims it off the ends.
    #[test]
    fn edge_whitespace_outside_quoting_set_is_trimmed(
        pad in prop::sample::select(vec!['\u{b}', '\u{c}', '\u{a0}', '\u{2003}']),
        core in "[a-z0-9]{1,8}",
        leading in any::<bool>(),
    ) {
        let value = if leading { format!("{pad}{core}") } else { format!("{core}{pad}") };
        let mut env = BTreeMap::new();
        env.insert("K".to_owned(), value.clone());

        let text = serialize(&env);
        prop_assert_eq!(&text, &format!("K={value}"));

        let reparsed = parse_isolated(Parser::new(), &text);
        prop_assert_eq!(reparsed.get("K"), Some(&core));
    }
}
