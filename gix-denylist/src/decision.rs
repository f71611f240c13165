//! Turning a single ref update into an accept or reject decision.

use crate::engine::PolicyEngine;
use crate::format::{self, Formatter, Template};
use crate::history::History;
use crate::policy::{commit_prefix, MatchResult};
use crate::push::{RefKind, RefName, RefUpdate};
use crate::Error;
use std::fmt;

/// Why an update was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reason {
    /// Every update to the reference is blocked.
    BlockedRef { kind: RefKind, name: String },
    /// The commit is blocked on every reference.
    BlockedCommit { commit: String },
    /// The commit is blocked on this reference only.
    BlockedCommitOnRef {
        kind: RefKind,
        name: String,
        commit: String,
    },
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::BlockedRef { kind, name } => write!(f, "{kind} {name} is blacklisted"),
            Reason::BlockedCommit { commit } => write!(f, "commit {commit} is blacklisted"),
            Reason::BlockedCommitOnRef { kind, name, commit } => {
                write!(f, "commit {commit} is blacklisted on {kind} {name}")
            }
        }
    }
}

/// A rejected update, with the annotation of the rule that caused it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    pub reason: Reason,
    pub annotation: Option<String>,
}

impl Rejection {
    fn new(reason: Reason, result: MatchResult) -> Self {
        let annotation = match result {
            MatchResult::Blocked { annotation, .. } => annotation,
            MatchResult::NoMatch => None,
        };
        Rejection { reason, annotation }
    }

    /// Render the message shown to the pusher.
    ///
    /// The annotation, if any, is sanitized and passed through `formatter` before being appended
    /// to the reason in parentheses, and the result is substituted into `template`.
    pub fn message(&self, template: &Template, formatter: &mut dyn Formatter) -> String {
        let error = match self.annotation.as_deref() {
            Some(annotation) => {
                format!("{} ({})", self.reason, format::render_annotation(formatter, annotation))
            }
            None => self.reason.to_string(),
        };
        template.render(&error)
    }
}

/// The decision for a single update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Accept,
    Reject(Rejection),
}

impl Outcome {
    /// Return `true` if the update may proceed.
    pub fn is_accept(&self) -> bool {
        matches!(self, Outcome::Accept)
    }
}

/// Evaluates ref updates against a loaded policy.
pub struct Driver<'a> {
    engine: &'a PolicyEngine,
    history: &'a mut dyn History,
}

impl<'a> Driver<'a> {
    /// Decide updates with the policy in `engine`, enumerating pushed commits with `history`.
    pub fn new(engine: &'a PolicyEngine, history: &'a mut dyn History) -> Self {
        Driver { engine, history }
    }

    /// Decide whether `update` may proceed.
    ///
    /// Deletions are always accepted. Otherwise the reference is checked as a whole before any
    /// history is walked, then each introduced commit is checked globally and on the reference.
    /// The first match rejects.
    pub fn evaluate(&mut self, update: &RefUpdate) -> Result<Outcome, Error> {
        let name = RefName::classify(&update.name)?;
        let Some(range) = update.commit_range() else {
            tracing::debug!(reference = %update.name, "accepting deletion");
            return Ok(Outcome::Accept);
        };

        let policy = self.engine.policy();
        let result = policy.check_ref(&name.short);
        if result.is_blocked() {
            let reason = Reason::BlockedRef {
                kind: name.kind,
                name: name.short,
            };
            return Ok(Outcome::Reject(Rejection::new(reason, result)));
        }

        for commit in self.history.commits(range)? {
            tracing::trace!(%commit, reference = %name, "checking commit");
            let result = policy.check_commit(&commit);
            if result.is_blocked() {
                let reason = Reason::BlockedCommit {
                    commit: commit_prefix(&commit),
                };
                return Ok(Outcome::Reject(Rejection::new(reason, result)));
            }
            let result = policy.check_ref_commit(&name.short, &commit);
            if result.is_blocked() {
                let reason = Reason::BlockedCommitOnRef {
                    kind: name.kind,
                    name: name.short,
                    commit: commit_prefix(&commit),
                };
                return Ok(Outcome::Reject(Rejection::new(reason, result)));
            }
        }
        Ok(Outcome::Accept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::NoopFormatter;
    use crate::policy::Policy;
    use crate::push::CommitRange;
    use pretty_assertions::assert_eq;

    const NULL: &str = "0000000000000000000000000000000000000000";

    /// Hands out a fixed list of commits and remembers what it was asked for.
    #[derive(Default)]
    struct FakeHistory {
        commits: Vec<String>,
        requests: Vec<String>,
    }

    impl FakeHistory {
        fn with(commits: &[&str]) -> Self {
            FakeHistory {
                commits: commits.iter().map(|c| c.to_string()).collect(),
                requests: Vec::new(),
            }
        }
    }

    impl History for FakeHistory {
        fn commits(&mut self, range: CommitRange<'_>) -> Result<Vec<String>, Error> {
            self.requests.push(match range {
                CommitRange::All { tip } => tip.to_owned(),
                CommitRange::Between { old, new } => format!("{old}..{new}"),
            });
            Ok(self.commits.clone())
        }
    }

    fn evaluate(policy: &str, history: &mut FakeHistory, update: RefUpdate) -> Outcome {
        let engine = PolicyEngine::new(Policy::from_text(policy));
        Driver::new(&engine, history).evaluate(&update).unwrap()
    }

    fn reason(outcome: Outcome) -> String {
        match outcome {
            Outcome::Reject(rejection) => rejection.reason.to_string(),
            Outcome::Accept => panic!("expected a rejection"),
        }
    }

    #[test]
    fn blocked_refs_reject_without_walking_history() {
        let mut history = FakeHistory::with(&["abcdef1234"]);
        let outcome = evaluate(
            "frozen # archived",
            &mut history,
            RefUpdate::new("refs/heads/frozen", "1111111", "2222222"),
        );
        assert_eq!(
            outcome,
            Outcome::Reject(Rejection {
                reason: Reason::BlockedRef {
                    kind: RefKind::Branch,
                    name: "frozen".into()
                },
                annotation: Some("archived".into()),
            })
        );
        assert!(history.requests.is_empty());
    }

    #[test]
    fn deletions_are_accepted_even_for_blocked_refs() {
        let mut history = FakeHistory::default();
        let outcome = evaluate("frozen", &mut history, RefUpdate::new("refs/tags/frozen", "1111111", NULL));
        assert_eq!(outcome, Outcome::Accept);
        assert!(history.requests.is_empty());
    }

    #[test]
    fn unknown_ref_types_are_errors_even_for_deletions() {
        let engine = PolicyEngine::new(Policy::new());
        let mut history = FakeHistory::default();
        let err = Driver::new(&engine, &mut history)
            .evaluate(&RefUpdate::new("refs/notes/commits", "1111111", NULL))
            .unwrap_err();
        assert!(matches!(err, Error::UnrecognizedRefType { name } if name == "refs/notes/commits"));
    }

    #[test]
    fn new_refs_walk_everything_reachable_from_the_tip() {
        let mut history = FakeHistory::with(&["aaaaaaa1", "bad0001ffff"]);
        let outcome = evaluate(":bad0001", &mut history, RefUpdate::new("refs/heads/topic", NULL, "aaaaaaa1"));
        assert_eq!(reason(outcome), "commit bad0001 is blacklisted");
        assert_eq!(history.requests, vec!["aaaaaaa1".to_string()]);
    }

    #[test]
    fn existing_refs_walk_only_the_new_commits() {
        let mut history = FakeHistory::with(&["ccccccc"]);
        let outcome = evaluate(":bad0001", &mut history, RefUpdate::new("refs/heads/main", "aaaaaaa", "ccccccc"));
        assert_eq!(outcome, Outcome::Accept);
        assert_eq!(history.requests, vec!["aaaaaaa..ccccccc".to_string()]);
    }

    #[test]
    fn scoped_commits_only_reject_on_their_ref() {
        let policy = "main:bad0002 # rolled back";
        let update = |name: &str| RefUpdate::new(name, "aaaaaaa", "bad0002beef");

        let outcome = evaluate(policy, &mut FakeHistory::with(&["bad0002beef"]), update("refs/heads/main"));
        assert_eq!(reason(outcome), "commit bad0002 is blacklisted on branch main");

        let outcome = evaluate(policy, &mut FakeHistory::with(&["bad0002beef"]), update("refs/heads/dev"));
        assert_eq!(outcome, Outcome::Accept);
    }

    #[test]
    fn global_commit_rules_are_checked_before_scoped_ones() {
        let policy = "main:bad0003 # scoped\n:bad0003 # global";
        let outcome = evaluate(
            policy,
            &mut FakeHistory::with(&["bad0003"]),
            RefUpdate::new("refs/heads/main", "aaaaaaa", "bad0003"),
        );
        let Outcome::Reject(rejection) = outcome else {
            panic!("expected a rejection")
        };
        assert_eq!(rejection.reason.to_string(), "commit bad0003 is blacklisted");
        assert_eq!(rejection.annotation.as_deref(), Some("global"));
    }

    #[test]
    fn the_first_blocked_commit_decides() {
        let policy = ":bad0001 # first\n:bad0002 # second";
        let outcome = evaluate(
            policy,
            &mut FakeHistory::with(&["1234567", "BAD0002", "bad0001"]),
            RefUpdate::new("refs/heads/main", NULL, "1234567"),
        );
        assert_eq!(reason(outcome), "commit bad0002 is blacklisted");
    }

    #[test]
    fn messages_use_the_template_and_sanitized_annotation() {
        let rejection = Rejection {
            reason: Reason::BlockedRef {
                kind: RefKind::Tag,
                name: "v1".into(),
            },
            annotation: Some("use v1.1; really!".into()),
        };
        let template = Template::from_text(">> _ERROR_ <<");
        assert_eq!(
            rejection.message(&template, &mut NoopFormatter::new()),
            ">> tag v1 is blacklisted (use v1.1 really) <<"
        );

        let bare = Rejection {
            annotation: None,
            ..rejection
        };
        assert_eq!(
            bare.message(&Template::default(), &mut NoopFormatter::new()),
            "*** push rejected: tag v1 is blacklisted"
        );
    }
}
