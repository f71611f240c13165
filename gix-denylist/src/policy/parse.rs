//! Parsing of the policy file.
//!
//! One rule per line, in one of three shapes, each optionally followed by `# annotation`:
//!
//! ```text
//! release-1             # block every update to release-1
//! :bad0001              # block commit bad0001 everywhere
//! main:bad0002          # block commit bad0002 on main only
//! ```
//!
//! Invalid lines are dropped and reported, they never fail the parse.

use super::{Entry, Policy, PREFIX_LEN};
use bstr::ByteSlice;
use std::fmt;

/// Why a line was dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The commit token is shorter than [`PREFIX_LEN`] characters and would be ambiguous.
    ShortCommit { token: String },
    /// The commit token contains characters other than hexadecimal digits.
    NonHexCommit { token: String },
    /// The reference token looks like a commit identifier, most likely a missing leading `:`.
    AmbiguousRef { token: String },
    /// The line is not valid UTF-8.
    InvalidUtf8,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::ShortCommit { token } => write!(
                f,
                "commit '{token}' is shorter than {PREFIX_LEN} characters and may match unrelated commits"
            ),
            SkipReason::NonHexCommit { token } => {
                write!(f, "commit '{token}' is not a hexadecimal commit identifier")
            }
            SkipReason::AmbiguousRef { token } => write!(
                f,
                "reference '{token}' looks like a commit, prefix it with ':' to block the commit instead"
            ),
            SkipReason::InvalidUtf8 => f.write_str("line is not valid UTF-8"),
        }
    }
}

/// A dropped line along with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub line_number: usize,
    pub line: String,
    pub reason: SkipReason,
}

/// Parse `text` into a policy, logging a warning for every dropped line.
pub fn parse(text: &str) -> Policy {
    parse_bytes(text.as_bytes())
}

/// Like [`parse()`], but for policy files which may not be entirely valid UTF-8.
pub fn parse_bytes(input: &[u8]) -> Policy {
    let (policy, skipped) = parse_bytes_with_diagnostics(input);
    report(&skipped);
    policy
}

/// Log a warning for each of the `skipped` lines.
pub fn report(skipped: &[Skipped]) {
    for skipped in skipped {
        tracing::warn!(line = skipped.line_number, "ignoring denylist entry: {}", skipped.reason);
    }
}

/// Parse `text` into a policy and return the dropped lines instead of logging them.
pub fn parse_with_diagnostics(text: &str) -> (Policy, Vec<Skipped>) {
    parse_bytes_with_diagnostics(text.as_bytes())
}

/// Parse `input` line by line, dropping lines that aren't valid UTF-8 along with all other invalid ones.
pub fn parse_bytes_with_diagnostics(input: &[u8]) -> (Policy, Vec<Skipped>) {
    let mut policy = Policy::new();
    let mut skipped = Vec::new();
    for (idx, line) in input.lines().enumerate() {
        let parsed = match line.to_str() {
            Ok(line) => parse_line(line),
            Err(_) => Err(SkipReason::InvalidUtf8),
        };
        match parsed {
            Ok(Some(entry)) => policy.insert(entry),
            Ok(None) => {}
            Err(reason) => skipped.push(Skipped {
                line_number: idx + 1,
                line: line.to_str_lossy().into_owned(),
                reason,
            }),
        }
    }
    (policy, skipped)
}

/// Parse a single line, returning `None` for blank and comment-only lines.
pub fn parse_line(line: &str) -> Result<Option<Entry>, SkipReason> {
    let (rule, annotation) = match line.split_once('#') {
        Some((rule, comment)) => {
            let comment = comment.trim();
            (rule, (!comment.is_empty()).then(|| comment.to_owned()))
        }
        None => (line, None),
    };
    let rule = rule.trim();
    if rule.is_empty() {
        return Ok(None);
    }

    let (ref_part, sha_part) = match rule.split_once(':') {
        Some((ref_part, sha_part)) => (ref_part.trim(), sha_part.trim()),
        None => (rule, ""),
    };

    if !ref_part.is_empty() {
        if looks_like_commit(ref_part) {
            return Err(SkipReason::AmbiguousRef {
                token: ref_part.to_owned(),
            });
        }
        if sha_part.is_empty() {
            return Ok(Some(Entry::ref_all(ref_part, annotation)));
        }
        validate_commit(sha_part)?;
        return Ok(Some(Entry::ref_sha(ref_part, sha_part, annotation)));
    }

    if sha_part.is_empty() {
        return Ok(None);
    }
    validate_commit(sha_part)?;
    Ok(Some(Entry::sha_all(sha_part, annotation)))
}

/// Return `true` if `token` contains a digit and consists only of `0-9a-f`.
///
/// This is a heuristic: `deadfeed` passes as a reference name while `deadfeed1` does not.
pub fn looks_like_commit(token: &str) -> bool {
    token.bytes().any(|b| b.is_ascii_digit()) && token.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

fn validate_commit(token: &str) -> Result<(), SkipReason> {
    if token.chars().count() < PREFIX_LEN {
        return Err(SkipReason::ShortCommit {
            token: token.to_owned(),
        });
    }
    if !token.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(SkipReason::NonHexCommit {
            token: token.to_owned(),
        });
    }
    Ok(())
}
