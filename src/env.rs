use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;
use std::str::FromStr;

use crate::error::Error;

/// Read-only variable lookup used as the fallback during expansion and by the
/// typed accessors.
///
/// Implemented for the process environment ([`ProcessEnv`]), for
/// [`TargetEnv`], and for plain string maps, so parsing can be exercised
/// without touching global process state.
pub trait EnvSource {
    fn get_var(&self, key: &str) -> Option<String>;

    /// Value for `key` when set and non-empty, otherwise `default`.
    fn get_or(&self, key: &str, default: &str) -> String {
        non_empty(self.get_var(key)).unwrap_or_else(|| default.to_owned())
    }

    /// Value for `key`, or [`Error::MissingVar`] when unset or empty.
    fn require(&self, key: &str) -> Result<String, Error> {
        non_empty(self.get_var(key)).ok_or_else(|| Error::MissingVar(key.to_owned()))
    }

    /// Parse `key` with [`FromStr`], falling back to `default` when the value
    /// is unset, empty, or does not parse.
    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> T {
        non_empty(self.get_var(key))
            .and_then(|value| value.parse().ok())
            .unwrap_or(default)
    }

    /// Interpret `key` as a boolean.
    ///
    /// Accepts `true`/`1`/`yes`/`on` and `false`/`0`/`no`/`off` in any case;
    /// anything else yields `default`.
    fn bool_or(&self, key: &str, default: bool) -> bool {
        let Some(value) = self.get_var(key) else {
            return default;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => true,
            "false" | "0" | "no" | "off" => false,
            _ => default,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.is_empty())
}

/// Read-only view of the current process environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn get_var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

impl<S: BuildHasher> EnvSource for HashMap<String, String, S> {
    fn get_var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Destination for loaded environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetEnv {
    kind: TargetEnvKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum TargetEnvKind {
    /// Writes go through [`std::env::set_var`].
    Process,
    Memory(BTreeMap<String, String>),
}

impl Default for TargetEnv {
    fn default() -> Self {
        Self::memory()
    }
}

impl TargetEnv {
    /// Create a process-environment target.
    ///
    /// # Safety
    ///
    /// The caller must ensure no other threads concurrently read or write the
    /// process environment for the duration of operations that may mutate this
    /// target.
    pub unsafe fn process() -> Self {
        Self {
            kind: TargetEnvKind::Process,
        }
    }

    /// Create an empty in-memory target.
    pub fn memory() -> Self {
        Self::from_memory(BTreeMap::new())
    }

    /// Create an in-memory target seeded with `map`.
    pub fn from_memory(map: BTreeMap<String, String>) -> Self {
        Self {
            kind: TargetEnvKind::Memory(map),
        }
    }

    pub fn is_process(&self) -> bool {
        matches!(self.kind, TargetEnvKind::Process)
    }

    pub fn as_memory(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            TargetEnvKind::Memory(map) => Some(map),
            TargetEnvKind::Process => None,
        }
    }

    pub fn into_memory(self) -> Option<BTreeMap<String, String>> {
        match self.kind {
            TargetEnvKind::Memory(map) => Some(map),
            TargetEnvKind::Process => None,
        }
    }

    /// Store `key=value`. The process environment cannot hold an empty key,
    /// a key containing `=` or NUL, or a value containing NUL; those are
    /// rejected before anything is written.
    pub(crate) fn set_var(&mut self, key: &str, value: &str) -> Result<(), Error> {
        match &mut self.kind {
            TargetEnvKind::Process => {
                check_process_var(key, value)?;
                // SAFETY: only reachable through `TargetEnv::process`, whose
                // caller guarantees exclusive access to the process environment.
                unsafe { std::env::set_var(key, value) };
            }
            TargetEnvKind::Memory(map) => {
                map.insert(key.to_owned(), value.to_owned());
            }
        }
        Ok(())
    }
}

fn check_process_var(key: &str, value: &str) -> Result<(), Error> {
    let reason = if key.is_empty() {
        "key is empty"
    } else if key.contains('=') {
        "key contains '='"
    } else if key.contains('\0') {
        "key contains a NUL byte"
    } else if value.contains('\0') {
        "value contains a NUL byte"
    } else {
        return Ok(());
    };

    Err(Error::SetVar {
        key: key.to_owned(),
        reason,
    })
}

impl EnvSource for TargetEnv {
    fn get_var(&self, key: &str) -> Option<String> {
        match &self.kind {
            TargetEnvKind::Process => ProcessEnv.get_var(key),
            TargetEnvKind::Memory(map) => map.get(key).cloned(),
        }
    }
}
