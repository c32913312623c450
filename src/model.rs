use std::collections::BTreeMap;

/// Parsed variables keyed by name.
pub type EnvMap = BTreeMap<String, String>;

/// Summary of the load operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped_existing: usize,
    pub files_read: usize,
}

/// Variable expansion behavior for parsed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubstitutionMode {
    /// Keep values as decoded with no expansion.
    Disabled,
    /// Expand `$VAR` and `${VAR}` placeholders.
    #[default]
    Expand,
}

/// How single-quoted values are treated once their quotes are stripped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SingleQuoteMode {
    /// No escape decoding, but placeholders are still expanded when
    /// [`SubstitutionMode::Expand`] is active.
    #[default]
    Expand,
    /// Fully literal: neither escapes nor placeholders are processed.
    Literal,
}
