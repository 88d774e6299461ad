use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::branch::Branch;
use crate::error::CoreError;
use crate::events::StateChanged;
use crate::fanout::Fanout;

/// Immutable identity shared between a repository and its branches.
pub(crate) struct RepoContext {
    pub(crate) path: PathBuf,
    pub(crate) name: String,
    pub(crate) current_branch: String,
}

/// One discovered git working copy and its locally-known branches.
///
/// The branch set is fixed at open time; analysis only refreshes per-branch
/// state. Branch churn in the working copy requires re-opening (in practice,
/// re-discovering the owning folder).
pub struct Repository {
    ctx: Arc<RepoContext>,
    branches: Vec<Arc<Branch>>,
    main_branch_name: String,
    last_analyze_time: RwLock<Duration>,
}

impl Repository {
    /// Open a working copy: fetch remote-tracking refs, resolve the current
    /// branch, and list local branches.
    ///
    /// This runs at discovery time, not on the refresh schedule, so the object
    /// graph is queryable before the first pass. A fetch failure fails the
    /// whole open.
    pub async fn open(path: PathBuf) -> Result<Self, CoreError> {
        let raw = path.to_string_lossy().into_owned();
        let trimmed = raw
            .strip_suffix('/')
            .or_else(|| raw.strip_suffix('\\'))
            .unwrap_or(&raw);
        let path = PathBuf::from(trimmed);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| trimmed.to_string());

        let start = Instant::now();
        repomon_git::run(&["fetch", "--all"], &path).await?;
        let current_branch =
            repomon_git::run(&["rev-parse", "--abbrev-ref", "HEAD"], &path).await?;
        let listing =
            repomon_git::run(&["branch", "--list", "--format=%(refname:short)"], &path).await?;
        let names: Vec<String> = repomon_git::split_lines(&listing)
            .iter()
            .map(|b| b.trim_matches(['\'', '*', ' ']).to_string())
            .filter(|b| !b.is_empty())
            .collect();

        let ctx = Arc::new(RepoContext {
            path,
            name,
            current_branch,
        });
        let branches: Vec<Arc<Branch>> = names
            .into_iter()
            .map(|n| Arc::new(Branch::new(ctx.clone(), n)))
            .collect();

        // "main" wins when a branch by that name exists, otherwise "master".
        // A repo with neither keeps a name matching no branch and is never
        // reported main-up-to-date.
        let main_branch_name = if branches
            .iter()
            .any(|b| b.name().eq_ignore_ascii_case("main"))
        {
            "main"
        } else {
            "master"
        }
        .to_string();

        debug!(
            repo = %ctx.name,
            branches = branches.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "repository opened"
        );

        Ok(Self {
            ctx,
            branches,
            main_branch_name,
            last_analyze_time: RwLock::new(Duration::ZERO),
        })
    }

    pub fn path(&self) -> &Path {
        &self.ctx.path
    }

    pub fn name(&self) -> &str {
        &self.ctx.name
    }

    pub fn current_branch(&self) -> &str {
        &self.ctx.current_branch
    }

    pub fn main_branch_name(&self) -> &str {
        &self.main_branch_name
    }

    pub fn branches(&self) -> &[Arc<Branch>] {
        &self.branches
    }

    pub fn last_analyze_time(&self) -> Duration {
        *self
            .last_analyze_time
            .read()
            .expect("analyze time lock poisoned")
    }

    pub fn is_analyzed(&self) -> bool {
        self.last_analyze_time() > Duration::ZERO
    }

    /// True only when the main branch exists and is neither ahead of nor
    /// behind its remote.
    pub fn is_main_up_to_date(&self) -> bool {
        self.branches
            .iter()
            .find(|b| b.name().eq_ignore_ascii_case(&self.main_branch_name))
            .map(|b| !b.is_remote_ahead() && !b.is_local_ahead())
            .unwrap_or(false)
    }

    /// Re-analyze every branch, then send one state-changed event.
    ///
    /// The event is sent once per call, regardless of branch failures, so
    /// upstream consumers get per-repository progress without every branch
    /// needing its own subscriber. A parallel region joins all branch tasks
    /// and returns the first error; branches that completed keep their
    /// recorded state.
    pub async fn analyze(
        &self,
        events: &broadcast::Sender<StateChanged>,
        fanout: Fanout,
    ) -> Result<(), CoreError> {
        let start = Instant::now();
        let result = match fanout {
            Fanout::Parallel => {
                let handles: Vec<_> = self
                    .branches
                    .iter()
                    .map(|branch| {
                        let branch = branch.clone();
                        tokio::spawn(async move { branch.analyze().await })
                    })
                    .collect();
                let mut first_err = None;
                for handle in handles {
                    match handle.await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            if first_err.is_none() {
                                first_err = Some(CoreError::Git(e));
                            }
                        }
                        Err(e) => {
                            if first_err.is_none() {
                                first_err = Some(CoreError::Join(e));
                            }
                        }
                    }
                }
                match first_err {
                    Some(e) => Err(e),
                    None => Ok(()),
                }
            }
            Fanout::Sequential => {
                let mut result = Ok(());
                for branch in &self.branches {
                    if let Err(e) = branch.analyze().await {
                        result = Err(CoreError::Git(e));
                        break;
                    }
                }
                result
            }
        };

        *self
            .last_analyze_time
            .write()
            .expect("analyze time lock poisoned") = start.elapsed();
        let _ = events.send(StateChanged);
        info!(
            repo = %self.ctx.name,
            duration_ms = start.elapsed().as_millis() as u64,
            "repository analyzed"
        );
        result
    }

    /// Re-analyze a single named branch out of band. No-op when the name is
    /// not a known branch.
    pub async fn check_branch(&self, name: &str) -> Result<(), CoreError> {
        debug!(branch = name, repo = %self.ctx.name, "out-of-band branch check");
        match self.branches.iter().find(|b| b.name() == name) {
            Some(branch) => Ok(branch.analyze().await?),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Repository: {}", self.ctx.name)?;
        writeln!(f, "Path: {}", self.ctx.path.display())?;
        writeln!(f, "Current Branch: {}", self.ctx.current_branch)?;
        writeln!(f, "Branches:")?;
        for branch in &self.branches {
            writeln!(
                f,
                "  - {} (Current: {}, Has Changes: {}, Remote Ahead: {}, Local Ahead: {})",
                branch.name(),
                branch.is_current_branch(),
                branch.has_changes(),
                branch.is_remote_ahead(),
                branch.is_local_ahead()
            )?;
            if branch.has_changes() {
                writeln!(f, "    Unstaged Changes:")?;
                for file in branch.unstaged_changed_file_paths() {
                    writeln!(f, "        {file}")?;
                }
            }
        }
        Ok(())
    }
}
