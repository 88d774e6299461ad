use std::path::Path;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use repomon_git::GitError;
use tracing::debug;

use crate::repository::RepoContext;

/// One named branch inside one repository.
///
/// Analysis results live in a single snapshot behind a lock and are replaced
/// as a whole at the end of each `analyze` call; readers see the previous
/// pass's values until the swap (last-writer-wins on pass completion).
pub struct Branch {
    repo: Arc<RepoContext>,
    name: String,
    state: RwLock<BranchState>,
}

#[derive(Debug, Clone)]
struct BranchState {
    unstaged_changed_paths: Vec<String>,
    untracked_paths: Vec<String>,
    /// Commits reachable from origin/<name> but not <name>; -1 = not computed.
    commits_to_pull: i64,
    /// Commits reachable from <name> but not origin/<name>; -1 = not computed.
    commits_to_push: i64,
    has_remote: bool,
    last_analyze_time: Duration,
}

impl Default for BranchState {
    fn default() -> Self {
        Self {
            unstaged_changed_paths: Vec::new(),
            untracked_paths: Vec::new(),
            commits_to_pull: -1,
            commits_to_push: -1,
            has_remote: false,
            last_analyze_time: Duration::ZERO,
        }
    }
}

impl Branch {
    pub(crate) fn new(repo: Arc<RepoContext>, name: String) -> Self {
        Self {
            repo,
            name,
            state: RwLock::new(BranchState::default()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether this branch is the owning repository's checked-out branch.
    pub fn is_current_branch(&self) -> bool {
        self.repo.current_branch == self.name
    }

    /// Paths changed between the working tree and this branch's tip.
    pub fn unstaged_changed_file_paths(&self) -> Vec<String> {
        self.read().unstaged_changed_paths.clone()
    }

    /// Final path components of the changed paths.
    pub fn unstaged_file_names(&self) -> Vec<String> {
        self.read()
            .unstaged_changed_paths
            .iter()
            .map(|p| {
                Path::new(p)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| p.clone())
            })
            .collect()
    }

    pub fn untracked_file_paths(&self) -> Vec<String> {
        self.read().untracked_paths.clone()
    }

    pub fn has_changes(&self) -> bool {
        !self.read().unstaged_changed_paths.is_empty()
    }

    pub fn has_remote(&self) -> bool {
        self.read().has_remote
    }

    pub fn commits_to_pull(&self) -> i64 {
        self.read().commits_to_pull
    }

    pub fn commits_to_push(&self) -> i64 {
        self.read().commits_to_push
    }

    pub fn is_remote_ahead(&self) -> bool {
        self.read().commits_to_pull > 0
    }

    pub fn is_local_ahead(&self) -> bool {
        self.read().commits_to_push > 0
    }

    pub fn last_analyze_time(&self) -> Duration {
        self.read().last_analyze_time
    }

    pub fn is_analyzed(&self) -> bool {
        self.read().last_analyze_time > Duration::ZERO
    }

    /// Re-derive this branch's state from git.
    ///
    /// Runs, against the owning repository's working directory: a working-tree
    /// diff, an untracked-file listing, a remote-head presence test, and (when
    /// a remote head exists) ahead/behind counts in both directions. Any
    /// failing subprocess propagates; previously recorded state is untouched.
    pub async fn analyze(&self) -> Result<(), GitError> {
        let start = Instant::now();
        let path = &self.repo.path;

        let unstaged = repomon_git::split_lines(
            &repomon_git::run(&["diff", "--name-only", &self.name], path).await?,
        );
        let untracked = repomon_git::split_lines(
            &repomon_git::run(&["ls-files", "--others", "--exclude-standard"], path).await?,
        );

        let heads =
            repomon_git::run(&["ls-remote", "--heads", "origin", &self.name], path).await?;
        let has_remote = !heads.is_empty();

        let (commits_to_pull, commits_to_push) = if has_remote {
            let pull_range = format!("{0}..origin/{0}", self.name);
            let push_range = format!("origin/{0}..{0}", self.name);
            let pull = repomon_git::parse_count(
                &repomon_git::run(&["rev-list", "--count", &pull_range], path).await?,
            )?;
            let push = repomon_git::parse_count(
                &repomon_git::run(&["rev-list", "--count", &push_range], path).await?,
            )?;
            (pull, push)
        } else {
            (-1, -1)
        };

        let snapshot = BranchState {
            unstaged_changed_paths: unstaged,
            untracked_paths: untracked,
            commits_to_pull,
            commits_to_push,
            has_remote,
            last_analyze_time: start.elapsed(),
        };
        *self.state.write().expect("branch state lock poisoned") = snapshot;

        debug!(
            branch = %self.name,
            repo = %self.repo.name,
            duration_ms = start.elapsed().as_millis() as u64,
            "branch analyzed"
        );
        Ok(())
    }

    /// Raw diff text between `against` (typically `HEAD`) and this branch.
    /// On demand, never cached.
    pub async fn diff(&self, against: &str) -> Result<String, GitError> {
        repomon_git::run(&["diff", against, &self.name], &self.repo.path).await
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, BranchState> {
        self.state.read().expect("branch state lock poisoned")
    }
}
