//! Parse, expand and serialize `.env` files.
//!
//! [`parse_str`] turns dotenv text into an [`EnvMap`]; [`serialize`] is the
//! inverse. Parsing is all-or-nothing: a malformed line fails the whole call
//! with a [`ParseError`] naming the 1-based line.
//!
//! Placeholders (`$NAME`, `${NAME}`) resolve against earlier lines of the same
//! input, then against an [`EnvSource`]. The plain entry points use the
//! process environment; the `*_with_env` variants take any lookup, so parsing
//! can be tested without touching global state.
//!
//! [`EnvLoader::load`] into the default in-memory target is process-isolated.
//! The convenience loaders (`dotenv`, `from_path`, `from_paths`,
//! `from_filename`, `overload`) mutate the process environment and are
//! `unsafe`, because callers must guarantee no concurrent process-environment
//! access.

mod encode;
mod env;
mod error;
mod expand;
mod loader;
mod model;
mod parser;

pub use encode::serialize;
pub use env::{EnvSource, ProcessEnv, TargetEnv};
pub use error::{Error, ParseError};
pub use loader::{EnvLoader, dotenv, from_filename, from_path, from_paths, overload, write};
pub use model::{EnvMap, LoadReport, SingleQuoteMode, SubstitutionMode};
pub use parser::{Parser, parse_bytes, parse_reader, parse_str};
