//! The structured denylist policy.
//!
//! A policy holds three kinds of rules, all keyed for constant-time lookup:
//! - `RefAll`: every update to a reference is blocked
//! - `RefSha`: a specific commit is blocked on a specific reference
//! - `ShaAll`: a commit is blocked on every reference
//!
//! Commits are always stored and compared by their first [`PREFIX_LEN`] lower-case hex
//! characters, so `abcdef1234567` and `abcdef1234567890` are the same commit to a policy.

pub mod matcher;
pub mod parse;

pub use matcher::MatchResult;
pub use parse::{
    parse, parse_bytes, parse_bytes_with_diagnostics, parse_with_diagnostics, report, SkipReason, Skipped,
};

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// The number of hex characters commit identifiers are normalized to.
pub const PREFIX_LEN: usize = 7;

/// Normalize a commit identifier to the prefix used for storage and comparison.
pub fn commit_prefix(commit: &str) -> String {
    commit.chars().take(PREFIX_LEN).collect::<String>().to_ascii_lowercase()
}

/// The kind of a denylist rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntryKind {
    /// Block every update to a reference.
    RefAll,
    /// Block one commit on one reference.
    RefSha,
    /// Block one commit on every reference.
    ShaAll,
}

/// A single denylist rule as authored in the policy file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Entry {
    RefAll {
        ref_name: String,
        annotation: Option<String>,
    },
    RefSha {
        ref_name: String,
        commit_prefix: String,
        annotation: Option<String>,
    },
    ShaAll {
        commit_prefix: String,
        annotation: Option<String>,
    },
}

impl Entry {
    /// Block all updates to `ref_name`.
    pub fn ref_all(ref_name: impl Into<String>, annotation: Option<String>) -> Self {
        Entry::RefAll {
            ref_name: ref_name.into(),
            annotation,
        }
    }

    /// Block `commit` on `ref_name`. The commit is normalized to its prefix.
    pub fn ref_sha(ref_name: impl Into<String>, commit: &str, annotation: Option<String>) -> Self {
        Entry::RefSha {
            ref_name: ref_name.into(),
            commit_prefix: commit_prefix(commit),
            annotation,
        }
    }

    /// Block `commit` everywhere. The commit is normalized to its prefix.
    pub fn sha_all(commit: &str, annotation: Option<String>) -> Self {
        Entry::ShaAll {
            commit_prefix: commit_prefix(commit),
            annotation,
        }
    }

    /// The kind of this rule.
    pub fn kind(&self) -> EntryKind {
        match self {
            Entry::RefAll { .. } => EntryKind::RefAll,
            Entry::RefSha { .. } => EntryKind::RefSha,
            Entry::ShaAll { .. } => EntryKind::ShaAll,
        }
    }

    /// The free-text reason attached to this rule, if any.
    pub fn annotation(&self) -> Option<&str> {
        match self {
            Entry::RefAll { annotation, .. } | Entry::RefSha { annotation, .. } | Entry::ShaAll { annotation, .. } => {
                annotation.as_deref()
            }
        }
    }
}

/// The marker stored for a blocked reference or commit, carrying its annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mark {
    pub annotation: Option<String>,
}

/// All rules scoped to a single reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefRules {
    /// Set if every update to the reference is blocked.
    pub block_all: Option<Mark>,
    /// Commit prefix to marker for commits blocked on this reference only.
    pub commits: HashMap<String, Mark>,
}

/// The structured policy: reference-scoped rules and reference-independent commit rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    refs: HashMap<String, RefRules>,
    commits: HashMap<String, Mark>,
}

impl Policy {
    /// Create an empty policy which blocks nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `text` in the policy file grammar, skipping invalid lines with a warning.
    pub fn from_text(text: &str) -> Self {
        parse(text)
    }

    /// Add `entry`. A later entry for the same key replaces the annotation of an earlier one.
    pub fn insert(&mut self, entry: Entry) {
        match entry {
            Entry::RefAll { ref_name, annotation } => {
                self.refs.entry(ref_name).or_default().block_all = Some(Mark { annotation });
            }
            Entry::RefSha {
                ref_name,
                commit_prefix: commit,
                annotation,
            } => {
                self.refs
                    .entry(ref_name)
                    .or_default()
                    .commits
                    .insert(commit_prefix(&commit), Mark { annotation });
            }
            Entry::ShaAll {
                commit_prefix: commit,
                annotation,
            } => {
                self.commits.insert(commit_prefix(&commit), Mark { annotation });
            }
        }
    }

    /// Return `true` if no rule was admitted.
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
            && self
                .refs
                .values()
                .all(|rules| rules.block_all.is_none() && rules.commits.is_empty())
    }

    /// The rules scoped to `ref_name`, if there are any.
    pub fn ref_rules(&self, ref_name: &str) -> Option<&RefRules> {
        self.refs.get(ref_name)
    }

    /// The reference-independent marker for `prefix`, if it is blocked everywhere.
    pub fn commit_rule(&self, prefix: &str) -> Option<&Mark> {
        self.commits.get(prefix)
    }

    /// All admitted rules, sorted for stable output.
    pub fn entries(&self) -> Vec<Entry> {
        let mut out = Vec::new();
        for (ref_name, rules) in &self.refs {
            if let Some(mark) = &rules.block_all {
                out.push(Entry::ref_all(ref_name.clone(), mark.annotation.clone()));
            }
            for (commit, mark) in &rules.commits {
                out.push(Entry::ref_sha(ref_name.clone(), commit, mark.annotation.clone()));
            }
        }
        for (commit, mark) in &self.commits {
            out.push(Entry::sha_all(commit, mark.annotation.clone()));
        }
        out.sort();
        out
    }
}

impl Extend<Entry> for Policy {
    fn extend<T: IntoIterator<Item = Entry>>(&mut self, iter: T) {
        for entry in iter {
            self.insert(entry);
        }
    }
}

impl FromIterator<Entry> for Policy {
    fn from_iter<T: IntoIterator<Item = Entry>>(iter: T) -> Self {
        let mut policy = Policy::new();
        policy.extend(iter);
        policy
    }
}
