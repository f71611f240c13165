use crate::cache::{self, Freshness};
use crate::policy::{MatchResult, Policy};
use crate::Error;
use std::path::Path;

/// A loaded denylist, ready to answer queries for the rest of an invocation.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    policy: Policy,
    freshness: Freshness,
}

impl PolicyEngine {
    /// Create an engine from an already structured `policy`, bypassing any cache.
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            freshness: Freshness::Rebuilt,
        }
    }

    /// Bring the lookup cache at `cache` up to date with the policy file at `source` and load it.
    pub fn open(source: impl AsRef<Path>, cache: impl AsRef<Path>) -> Result<Self, Error> {
        let (freshness, policy) = cache::refresh(source.as_ref(), cache.as_ref())?;
        Ok(Self { policy, freshness })
    }

    /// The loaded policy.
    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Whether opening this engine had to rebuild the cache.
    pub fn freshness(&self) -> Freshness {
        self.freshness
    }

    /// Check a candidate, see [`Policy::check()`].
    pub fn check(&self, ref_name: &str, commit: Option<&str>) -> MatchResult {
        self.policy.check(ref_name, commit)
    }
}
