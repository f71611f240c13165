//! Matching of (reference, commit) candidates against a policy.
//!
//! Precedence, first match wins:
//! 1. the reference is blocked entirely (`RefAll`)
//! 2. the commit is blocked on this reference (`RefSha`)
//! 3. the commit is blocked everywhere (`ShaAll`)

use super::{commit_prefix, EntryKind, Mark, Policy};

/// The result of checking a candidate against a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchResult {
    /// No rule applies.
    NoMatch,
    /// A rule of `kind` applies, with its annotation if one was authored.
    Blocked {
        kind: EntryKind,
        annotation: Option<String>,
    },
}

impl MatchResult {
    fn blocked(kind: EntryKind, mark: &Mark) -> Self {
        MatchResult::Blocked {
            kind,
            annotation: mark.annotation.clone(),
        }
    }

    /// Return `true` if a rule applies.
    pub fn is_blocked(&self) -> bool {
        matches!(self, MatchResult::Blocked { .. })
    }
}

impl Policy {
    /// Check a candidate through all tiers in precedence order.
    pub fn check(&self, ref_name: &str, commit: Option<&str>) -> MatchResult {
        let by_ref = self.check_ref(ref_name);
        if by_ref.is_blocked() {
            return by_ref;
        }
        let Some(commit) = commit else {
            return MatchResult::NoMatch;
        };
        let on_ref = self.check_ref_commit(ref_name, commit);
        if on_ref.is_blocked() {
            return on_ref;
        }
        self.check_commit(commit)
    }

    /// Check whether every update to `ref_name` is blocked.
    pub fn check_ref(&self, ref_name: &str) -> MatchResult {
        match self.ref_rules(ref_name).and_then(|rules| rules.block_all.as_ref()) {
            Some(mark) => MatchResult::blocked(EntryKind::RefAll, mark),
            None => MatchResult::NoMatch,
        }
    }

    /// Check whether `commit` is blocked on `ref_name` specifically.
    pub fn check_ref_commit(&self, ref_name: &str, commit: &str) -> MatchResult {
        let prefix = commit_prefix(commit);
        match self.ref_rules(ref_name).and_then(|rules| rules.commits.get(&prefix)) {
            Some(mark) => MatchResult::blocked(EntryKind::RefSha, mark),
            None => MatchResult::NoMatch,
        }
    }

    /// Check whether `commit` is blocked regardless of the reference.
    pub fn check_commit(&self, commit: &str) -> MatchResult {
        match self.commit_rule(&commit_prefix(commit)) {
            Some(mark) => MatchResult::blocked(EntryKind::ShaAll, mark),
            None => MatchResult::NoMatch,
        }
    }
}
