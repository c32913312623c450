use std::fs::File;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::encode::serialize;
use crate::env::{EnvSource, TargetEnv};
use crate::error::Error;
use crate::model::{EnvMap, LoadReport, SingleQuoteMode, SubstitutionMode};
use crate::parser::Parser;

const DEFAULT_FILE: &str = ".env";

/// Load `.env` from the current working directory into the process
/// environment, keeping variables that are already set.
///
/// # Safety
///
/// Mutates the process environment; see [`TargetEnv::process`].
pub unsafe fn dotenv() -> Result<LoadReport, Error> {
    // SAFETY: forwarded to the caller.
    unsafe { from_filename(DEFAULT_FILE) }
}

/// Load a `.env` file from a specific path into the process environment.
///
/// # Safety
///
/// Mutates the process environment; see [`TargetEnv::process`].
pub unsafe fn from_path(path: impl AsRef<Path>) -> Result<LoadReport, Error> {
    // SAFETY: forwarded to the caller.
    unsafe { from_paths([path]) }
}

/// Load multiple `.env` files into the process environment. Later files take
/// precedence over earlier ones; existing variables are kept.
///
/// # Safety
///
/// Mutates the process environment; see [`TargetEnv::process`].
pub unsafe fn from_paths<I, P>(paths: I) -> Result<LoadReport, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    // SAFETY: forwarded to the caller.
    let target = unsafe { TargetEnv::process() };
    EnvLoader::new().paths(paths).target(target).load()
}

/// Load a dotenv file by filename from the current working directory.
///
/// # Safety
///
/// Mutates the process environment; see [`TargetEnv::process`].
pub unsafe fn from_filename(name: &str) -> Result<LoadReport, Error> {
    // SAFETY: forwarded to the caller.
    unsafe { from_path(PathBuf::from(name)) }
}

/// Like [`from_paths`], but file values replace variables that are already
/// set. With no paths, `.env` is loaded.
///
/// # Safety
///
/// Mutates the process environment; see [`TargetEnv::process`].
pub unsafe fn overload<I, P>(paths: I) -> Result<LoadReport, Error>
where
    I: IntoIterator<Item = P>,
    P: AsRef<Path>,
{
    // SAFETY: forwarded to the caller.
    let target = unsafe { TargetEnv::process() };
    EnvLoader::new()
        .paths(paths)
        .override_existing(true)
        .target(target)
        .load()
}

/// Serialize `entries` with [`serialize`] and write them to `path` followed
/// by a newline, creating missing parent directories.
pub fn write<I, K, V>(entries: I, path: impl AsRef<Path>) -> Result<(), Error>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let path = path.as_ref();
    let mut content = serialize(entries);
    content.push('\n');

    if let Some(dir) = path.parent()
        && !dir.as_os_str().is_empty()
    {
        std::fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    std::fs::write(path, content).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "wrote dotenv file");
    Ok(())
}

/// Builder-style dotenv loader.
///
/// Each file is parsed on its own: placeholders see earlier lines of the
/// same file, then the loader's target environment. The per-file results are
/// merged in order, so later files win on duplicate keys.
#[derive(Debug, Clone, Default)]
pub struct EnvLoader {
    paths: Vec<PathBuf>,
    override_existing: bool,
    parser: Parser,
    target: TargetEnv,
}

impl EnvLoader {
    /// Loader for `.env` into an empty in-memory target.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn path(mut self, path: impl AsRef<Path>) -> Self {
        self.paths.push(path.as_ref().to_path_buf());
        self
    }

    pub fn paths<I, P>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        self.paths
            .extend(paths.into_iter().map(|path| path.as_ref().to_path_buf()));
        self
    }

    pub fn override_existing(mut self, override_existing: bool) -> Self {
        self.override_existing = override_existing;
        self
    }

    pub fn substitution_mode(mut self, substitution_mode: SubstitutionMode) -> Self {
        self.parser = self.parser.substitution_mode(substitution_mode);
        self
    }

    pub fn single_quote_mode(mut self, single_quote_mode: SingleQuoteMode) -> Self {
        self.parser = self.parser.single_quote_mode(single_quote_mode);
        self
    }

    pub fn target(mut self, target: TargetEnv) -> Self {
        self.target = target;
        self
    }

    pub fn target_env(&self) -> &TargetEnv {
        &self.target
    }

    pub fn into_target(self) -> TargetEnv {
        self.target
    }

    /// Parse and merge every file without touching the target.
    ///
    /// The first unreadable or malformed file aborts the whole read.
    pub fn read(&self) -> Result<EnvMap, Error> {
        let mut merged = EnvMap::new();

        for path in self.effective_paths() {
            let file = File::open(&path).map_err(|source| Error::Open {
                path: path.clone(),
                source,
            })?;
            let parsed = self
                .parser
                .parse_reader_with_env(file, &self.target)
                .inspect_err(|err| {
                    debug!(path = %path.display(), %err, "failed to parse dotenv file");
                })?;

            debug!(path = %path.display(), entries = parsed.len(), "read dotenv file");
            merged.extend(parsed);
        }

        Ok(merged)
    }

    /// Read every file and apply the merged entries to the target.
    ///
    /// Unless overriding, a key whose current value is set and non-empty is
    /// left alone and counted in [`LoadReport::skipped_existing`]. A pair the
    /// process environment cannot hold fails with [`Error::SetVar`]; entries
    /// applied before it stay applied.
    pub fn load(&mut self) -> Result<LoadReport, Error> {
        let entries = self.read()?;
        let mut report = LoadReport {
            files_read: self.effective_paths().len(),
            ..LoadReport::default()
        };

        for (key, value) in entries {
            if !self.override_existing && is_set(&self.target, &key) {
                report.skipped_existing += 1;
                debug!(key = %key, "skipping existing key");
                continue;
            }

            self.target.set_var(&key, &value)?;
            report.loaded += 1;
        }

        Ok(report)
    }

    fn effective_paths(&self) -> Vec<PathBuf> {
        if self.paths.is_empty() {
            vec![PathBuf::from(DEFAULT_FILE)]
        } else {
            self.paths.clone()
        }
    }
}

fn is_set(env: &TargetEnv, key: &str) -> bool {
    env.get_var(key).is_some_and(|value| !value.is_empty())
}
