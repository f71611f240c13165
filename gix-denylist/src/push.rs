//! The shape of a single pushed reference update.

use crate::Error;
use std::fmt;

const BRANCH_PREFIX: &str = "refs/heads/";
const TAG_PREFIX: &str = "refs/tags/";

/// Return `true` for the all-zero identifier git uses for "no object".
pub fn is_null(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b == b'0')
}

/// The kind of reference being pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Branch,
    Tag,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RefKind::Branch => "branch",
            RefKind::Tag => "tag",
        })
    }
}

/// A classified reference name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefName {
    pub kind: RefKind,
    /// The name without its `refs/heads/` or `refs/tags/` prefix, as used in the policy file.
    pub short: String,
}

impl RefName {
    /// Classify a fully qualified reference name as branch or tag.
    pub fn classify(full: &str) -> Result<Self, Error> {
        let (kind, short) = if let Some(short) = full.strip_prefix(BRANCH_PREFIX) {
            (RefKind::Branch, short)
        } else if let Some(short) = full.strip_prefix(TAG_PREFIX) {
            (RefKind::Tag, short)
        } else {
            return Err(Error::UnrecognizedRefType { name: full.to_owned() });
        };
        if short.is_empty() {
            return Err(Error::UnrecognizedRefType { name: full.to_owned() });
        }
        Ok(Self {
            kind,
            short: short.to_owned(),
        })
    }
}

impl fmt::Display for RefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.short)
    }
}

/// The commits a push introduces, as handed to a [`History`](crate::history::History).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitRange<'a> {
    /// Everything reachable from `tip`, for newly created references.
    All { tip: &'a str },
    /// Everything reachable from `new` but not from `old`.
    Between { old: &'a str, new: &'a str },
}

/// One `<ref> <old> <new>` update as passed to an `update` hook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefUpdate {
    /// The fully qualified reference name.
    pub name: String,
    pub old: String,
    pub new: String,
}

impl RefUpdate {
    /// Create an update of `name` from `old` to `new`.
    pub fn new(name: impl Into<String>, old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            old: old.into(),
            new: new.into(),
        }
    }

    /// Parse an `<old> <new> <ref>` line as a `pre-receive` hook receives it on stdin.
    pub fn from_pre_receive_line(line: &str) -> Result<Self, Error> {
        let mut tokens = line.split_whitespace();
        match (tokens.next(), tokens.next(), tokens.next(), tokens.next()) {
            (Some(old), Some(new), Some(name), None) => Ok(Self::new(name, old, new)),
            _ => Err(Error::MalformedUpdate { line: line.to_owned() }),
        }
    }

    /// Return `true` if the reference is being deleted.
    pub fn is_deletion(&self) -> bool {
        is_null(&self.new)
    }

    /// Return `true` if the reference did not exist before.
    pub fn is_creation(&self) -> bool {
        is_null(&self.old)
    }

    /// The commits introduced by this update, or `None` for deletions.
    pub fn commit_range(&self) -> Option<CommitRange<'_>> {
        if self.is_deletion() {
            None
        } else if self.is_creation() {
            Some(CommitRange::All { tip: &self.new })
        } else {
            Some(CommitRange::Between {
                old: &self.old,
                new: &self.new,
            })
        }
    }
}
