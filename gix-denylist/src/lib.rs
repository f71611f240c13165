/*!
Push-time denylist enforcement for gitoxide.

A denylist is a human-maintained text file naming references, commits, or commits on
particular references that must never be pushed again. This crate turns that file into a
lookup structure, keeps a persisted copy of it fresh, and decides per pushed reference
whether the update is accepted or rejected.

Layers, leaves first
- [`policy`]: the structured policy, its line parser and the three-tier matcher.
- [`cache`]: the persisted lookup cache, rebuilt when the policy file is newer.
- [`engine`]: [`PolicyEngine`], the loaded policy handed to everything that queries it.
- [`push`] and [`history`]: what a single ref update looks like and which commits it introduces.
- [`decision`]: the driver turning a ref update into [`decision::Outcome::Accept`] or a rejection.
- [`format`]: rendering of rejection messages and annotations.
- [`config`]: hook options read from git configuration.

Design principles
- Malformed policy lines are skipped with a warning, never fatal.
- An unreadable policy file is fatal; it is never treated as an empty denylist.
- The cache is replaced atomically so concurrent readers see either the old or the new version.
*/

#![deny(rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod cache;
pub mod config;
pub mod decision;
pub mod engine;
pub mod format;
pub mod history;
pub mod policy;
pub mod push;

pub use decision::{Driver, Outcome, Reason, Rejection};
pub use engine::PolicyEngine;
pub use policy::{Entry, EntryKind, MatchResult, Policy};
pub use push::{RefKind, RefName, RefUpdate};

use std::path::PathBuf;

/// Error type for operations provided by this crate.
///
/// Policy matches are not errors, they are reported as [`decision::Outcome::Reject`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The denylist itself could not be opened or read.
    #[error("could not read denylist at '{}': {source}", path.display())]
    PolicySource { path: PathBuf, source: std::io::Error },
    /// The lookup cache or its backup could not be read, written or installed.
    #[error("could not access lookup cache at '{}': {source}", path.display())]
    CacheIo { path: PathBuf, source: std::io::Error },
    /// The lookup cache could not be encoded or decoded.
    #[error("lookup cache encoding failed: {0}")]
    CacheEncode(#[from] bincode::Error),
    /// The lookup cache was written by an incompatible version of this crate.
    #[error("lookup cache at '{}' has format version {found}, expected {expected}", path.display())]
    CacheVersion { path: PathBuf, found: u32, expected: u32 },
    /// The pushed reference is neither below `refs/heads/` nor below `refs/tags/`.
    #[error("reference '{name}' is neither a branch nor a tag")]
    UnrecognizedRefType { name: String },
    /// A `pre-receive` input line did not have the `<old> <new> <ref>` shape.
    #[error("malformed ref update line: '{line}'")]
    MalformedUpdate { line: String },
    /// The commits introduced by a push could not be enumerated.
    #[error("could not enumerate pushed commits: {message}")]
    History { message: String },
    /// The annotation formatter could not be run or failed.
    #[error("annotation formatter '{program}' failed: {message}")]
    Formatter { program: String, message: String },
    /// A configuration value could not be used.
    #[error("invalid value for '{key}': {message}")]
    Config { key: String, message: String },
}
