//! Pushes evaluated end to end, from policy text to rendered message.

use gix_denylist::format::{NoopFormatter, Template};
use gix_denylist::history::History;
use gix_denylist::push::CommitRange;
use gix_denylist::{Driver, Error, Outcome, Policy, PolicyEngine, RefUpdate};

const NULL: &str = "0000000000000000000000000000000000000000";

struct Commits(Vec<&'static str>);

impl History for Commits {
    fn commits(&mut self, _range: CommitRange<'_>) -> Result<Vec<String>, Error> {
        Ok(self.0.iter().map(|c| c.to_string()).collect())
    }
}

const POLICY: &str = "\
# retired branches
legacy                  # retired in favour of main
main:bad0002            # rolled back
:bad0001
:abc                    # too short, ignored
deadbee1                # looks like a commit, ignored
";

fn decide(update: RefUpdate, commits: Vec<&'static str>) -> Outcome {
    let engine = PolicyEngine::new(Policy::from_text(POLICY));
    let mut history = Commits(commits);
    Driver::new(&engine, &mut history).evaluate(&update).unwrap()
}

fn message(outcome: Outcome) -> Option<String> {
    match outcome {
        Outcome::Accept => None,
        Outcome::Reject(rejection) => Some(rejection.message(&Template::default(), &mut NoopFormatter::new())),
    }
}

#[test]
fn creating_a_retired_branch() {
    let outcome = decide(RefUpdate::new("refs/heads/legacy", NULL, "1234567"), vec!["1234567"]);
    assert_eq!(
        message(outcome).as_deref(),
        Some("*** push rejected: branch legacy is blacklisted (retired in favour of main)")
    );
}

#[test]
fn deleting_a_retired_branch() {
    assert!(decide(RefUpdate::new("refs/heads/legacy", "1234567", NULL), vec![]).is_accept());
}

#[test]
fn globally_blocked_commits_are_blocked_on_tags_too() {
    let outcome = decide(
        RefUpdate::new("refs/tags/v2.0", NULL, "bad0001aaaa"),
        vec!["bad0001aaaa", "1234567"],
    );
    assert_eq!(
        message(outcome).as_deref(),
        Some("*** push rejected: commit bad0001 is blacklisted")
    );
}

#[test]
fn scoped_commits() {
    let commits = vec!["1111111", "BAD0002c0ffee"];
    let outcome = decide(RefUpdate::new("refs/heads/main", "0123456", "1111111"), commits.clone());
    assert_eq!(
        message(outcome).as_deref(),
        Some("*** push rejected: commit bad0002 is blacklisted on branch main (rolled back)")
    );
    assert!(decide(RefUpdate::new("refs/heads/dev", "0123456", "1111111"), commits).is_accept());
}

#[test]
fn ignored_lines_never_match() {
    assert!(decide(RefUpdate::new("refs/heads/deadbee1", NULL, "abc0000"), vec!["abc0000"]).is_accept());
}
