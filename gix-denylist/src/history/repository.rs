use super::History;
use crate::push::CommitRange;
use crate::Error;
use std::path::PathBuf;

/// A [`History`] backed by the repository the hook runs in.
///
/// The repository is opened on first use, updates that never need their commits
/// (deletions, blocked references) don't pay for it.
pub struct RepositoryHistory {
    git_dir: PathBuf,
    repo: Option<gix::Repository>,
}

impl RepositoryHistory {
    /// Walk history in the repository at `git_dir`.
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self {
            git_dir: git_dir.into(),
            repo: None,
        }
    }

    fn open(&self) -> Result<gix::Repository, Error> {
        gix::open(&self.git_dir).map_err(|err| Error::History {
            message: format!("cannot open repository at '{}': {err}", self.git_dir.display()),
        })
    }
}

fn resolve(repo: &gix::Repository, rev: &str) -> Result<gix::ObjectId, Error> {
    repo.rev_parse_single(rev)
        .map(|id| id.detach())
        .map_err(|err| Error::History {
            message: format!("cannot resolve '{rev}': {err}"),
        })
}

impl History for RepositoryHistory {
    fn commits(&mut self, range: CommitRange<'_>) -> Result<Vec<String>, Error> {
        let repo = match self.repo.take() {
            Some(repo) => repo,
            None => self.open()?,
        };
        let commits = walk(&repo, range);
        self.repo = Some(repo);
        let commits = commits?;
        tracing::debug!(count = commits.len(), "enumerated pushed commits");
        Ok(commits)
    }
}

fn walk(repo: &gix::Repository, range: CommitRange<'_>) -> Result<Vec<String>, Error> {
    let (tip, hidden) = match range {
        CommitRange::All { tip } => (resolve(repo, tip)?, None),
        CommitRange::Between { old, new } => (resolve(repo, new)?, Some(resolve(repo, old)?)),
    };

    repo.rev_walk([tip])
        .with_hidden(hidden)
        .all()
        .map_err(|err| Error::History {
            message: format!("cannot walk history from {tip}: {err}"),
        })?
        .map(|info| {
            info.map(|info| info.id.to_string()).map_err(|err| Error::History {
                message: format!("history walk from {tip} failed: {err}"),
            })
        })
        .collect()
}
