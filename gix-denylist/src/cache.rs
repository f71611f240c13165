//! The persisted lookup cache.
//!
//! The cache is a bincode-encoded [`Policy`] derived from the policy file. It is rebuilt
//! whenever it is missing, older than the policy file, or cannot be decoded.
//!
//! Rebuilds write to a temporary file next to the cache, copy the previous cache to a
//! `~`-suffixed backup, and then atomically rename the temporary file into place. Concurrent
//! rebuilds each use their own temporary file, the last rename wins. A cache that can't be
//! written is only a warning, the freshly parsed policy is used instead.

use crate::policy::{self, Policy, Skipped};
use crate::Error;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Bumped whenever the encoded layout changes.
pub const FORMAT_VERSION: u32 = 1;

/// What [`ensure_fresh()`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    /// The existing cache was up to date and was used as is.
    Fresh,
    /// The cache was (re)built from the policy file.
    Rebuilt,
    /// The policy file was parsed, but the cache could not be written and is still stale.
    Uncached,
}

#[derive(Serialize, Deserialize)]
struct Snapshot {
    version: u32,
    policy: Policy,
}

/// The path at which the previous cache is kept when a new one is installed.
pub fn backup_path(cache: &Path) -> PathBuf {
    let mut name = OsString::from(cache.as_os_str());
    name.push("~");
    PathBuf::from(name)
}

/// Make sure the cache at `cache` reflects the policy file at `source`.
///
/// Fails if `source` cannot be opened, an unreadable policy is never treated as an empty one.
pub fn ensure_fresh(source: &Path, cache: &Path) -> Result<Freshness, Error> {
    refresh(source, cache).map(|(freshness, _policy)| freshness)
}

/// Like [`ensure_fresh()`], but also return the policy the cache now holds.
///
/// Failing to write the cache is not fatal, the freshly parsed policy is returned anyway.
pub fn refresh(source: &Path, cache: &Path) -> Result<(Freshness, Policy), Error> {
    let mut source_file = std::fs::File::open(source).map_err(policy_source(source))?;
    let source_modified = modified(&source_file, source)?;

    if !is_stale(source_modified, cache) {
        match load(cache) {
            Ok(policy) => {
                tracing::trace!(cache = %cache.display(), "lookup cache is up to date");
                return Ok((Freshness::Fresh, policy));
            }
            Err(err) => {
                tracing::warn!(cache = %cache.display(), "rebuilding unusable lookup cache: {err}");
            }
        }
    }

    let mut bytes = Vec::new();
    source_file.read_to_end(&mut bytes).map_err(policy_source(source))?;
    tracing::debug!(source = %source.display(), cache = %cache.display(), "rebuilding lookup cache");
    let policy = policy::parse_bytes(&bytes);
    let freshness = install(&policy, cache);
    Ok((freshness, policy))
}

/// Parse the policy file at `source` unconditionally and bring `cache` up to date with it.
///
/// Unlike [`refresh()`], dropped lines are returned instead of logged, and are reported even
/// if the cache was already fresh.
pub fn audit(source: &Path, cache: &Path) -> Result<(Freshness, Policy, Vec<Skipped>), Error> {
    let mut source_file = std::fs::File::open(source).map_err(policy_source(source))?;
    let source_modified = modified(&source_file, source)?;
    let mut bytes = Vec::new();
    source_file.read_to_end(&mut bytes).map_err(policy_source(source))?;
    let (policy, skipped) = policy::parse_bytes_with_diagnostics(&bytes);

    let freshness = if !is_stale(source_modified, cache) && load(cache).is_ok() {
        Freshness::Fresh
    } else {
        install(&policy, cache)
    };
    Ok((freshness, policy, skipped))
}

fn modified(file: &std::fs::File, path: &Path) -> Result<SystemTime, Error> {
    file.metadata()
        .and_then(|meta| meta.modified())
        .map_err(policy_source(path))
}

/// Store `policy` at `cache`, degrading to [`Freshness::Uncached`] if that fails.
fn install(policy: &Policy, cache: &Path) -> Freshness {
    match store(policy, cache) {
        Ok(()) => Freshness::Rebuilt,
        Err(err) => {
            tracing::warn!("continuing without lookup cache: {err}");
            Freshness::Uncached
        }
    }
}

/// Return `true` if `cache` is missing or was last written before `source_modified`.
fn is_stale(source_modified: SystemTime, cache: &Path) -> bool {
    match std::fs::metadata(cache).and_then(|meta| meta.modified()) {
        Ok(cache_modified) => cache_modified < source_modified,
        Err(_) => true,
    }
}

/// Decode the cache at `path`.
pub fn load(path: &Path) -> Result<Policy, Error> {
    let bytes = std::fs::read(path).map_err(cache_io(path))?;
    let snapshot: Snapshot = bincode::deserialize(&bytes)?;
    if snapshot.version != FORMAT_VERSION {
        return Err(Error::CacheVersion {
            path: path.to_owned(),
            found: snapshot.version,
            expected: FORMAT_VERSION,
        });
    }
    Ok(snapshot.policy)
}

/// Encode `policy` and atomically install it at `path`, keeping the previous cache as backup.
pub fn store(policy: &Policy, path: &Path) -> Result<(), Error> {
    let bytes = bincode::serialize(&Snapshot {
        version: FORMAT_VERSION,
        policy: policy.clone(),
    })?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_owned(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&dir).map_err(cache_io(&dir))?;

    let mut tempfile = gix_tempfile::new(
        &dir,
        gix_tempfile::ContainingDirectory::Exists,
        gix_tempfile::AutoRemove::Tempfile,
    )
    .map_err(cache_io(&dir))?;
    tempfile
        .with_mut(|file| file.write_all(&bytes))
        .and_then(|written| written)
        .map_err(cache_io(path))?;

    if path.is_file() {
        let backup = backup_path(path);
        std::fs::copy(path, &backup).map_err(cache_io(&backup))?;
    }
    tempfile.persist(path).map_err(|err| Error::CacheIo {
        path: path.to_owned(),
        source: err.error,
    })?;
    Ok(())
}

fn policy_source(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::PolicySource {
        path: path.to_owned(),
        source,
    }
}

fn cache_io(path: &Path) -> impl FnOnce(std::io::Error) -> Error + '_ {
    move |source| Error::CacheIo {
        path: path.to_owned(),
        source,
    }
}
