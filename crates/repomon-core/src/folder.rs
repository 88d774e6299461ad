use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use tokio::sync::broadcast;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::CoreError;
use crate::events::StateChanged;
use crate::fanout::Fanout;
use crate::repository::Repository;

/// One watched root directory and the working copies discovered beneath it.
pub struct Folder {
    path: String,
    repos: Vec<Arc<Repository>>,
    last_analyze_time: RwLock<Duration>,
}

impl Folder {
    /// Walk the folder's subtree for `.git` directories and open a
    /// [`Repository`] for each working-copy root, in parallel.
    ///
    /// A repository that fails to open (a failed fetch, usually) is logged
    /// and skipped; its siblings always survive the fan-out.
    pub async fn discover(path: &str) -> Self {
        let root = expand_path(path);
        let start = Instant::now();

        let mut handles = Vec::new();
        for entry in WalkDir::new(&root).into_iter().filter_map(Result::ok) {
            if entry.file_type().is_dir() && entry.file_name() == ".git" {
                if let Some(repo_root) = entry.path().parent() {
                    let repo_root = repo_root.to_path_buf();
                    handles.push(tokio::spawn(
                        async move { Repository::open(repo_root).await },
                    ));
                }
            }
        }

        let mut repos = Vec::new();
        for handle in handles {
            match handle.await {
                Ok(Ok(repo)) => repos.push(Arc::new(repo)),
                Ok(Err(e)) => warn!(error = %e, "skipping repository that failed to open"),
                Err(e) => warn!(error = %e, "repository open task panicked"),
            }
        }

        debug!(
            folder = path,
            repos = repos.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "folder discovered"
        );

        Self {
            path: path.to_string(),
            repos,
            last_analyze_time: RwLock::new(Duration::ZERO),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn repos(&self) -> &[Arc<Repository>] {
        &self.repos
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

    /// Re-analyze every owned repository per the fan-out policy.
    pub async fn analyze(
        &self,
        events: &broadcast::Sender<StateChanged>,
        fanout: Fanout,
    ) -> Result<(), CoreError> {
        let start = Instant::now();
        let result = match fanout {
            Fanout::Parallel => {
                let handles: Vec<_> = self
                    .repos
                    .iter()
                    .map(|repo| {
                        let repo = repo.clone();
                        let events = events.clone();
                        tokio::spawn(async move {
                            repo.analyze(&events, Fanout::Sequential).await
                        })
                    })
                    .collect();
                let mut first_err = None;
                for handle in handles {
                    match handle.await {
                        Ok(Ok(())) => {}
                        Ok(Err(e)) => {
                            if first_err.is_none() {
                                first_err = Some(e);
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
                for repo in &self.repos {
                    if let Err(e) = repo.analyze(events, Fanout::Sequential).await {
                        result = Err(e);
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
        result
    }
}

/// Expand a leading `~` and `$VAR` references in a configured path.
pub(crate) fn expand_path(raw: &str) -> PathBuf {
    let with_home = match raw.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') || rest.starts_with('\\') => {
            match dirs::home_dir() {
                Some(home) => format!("{}{}", home.display(), rest),
                None => raw.to_string(),
            }
        }
        _ => raw.to_string(),
    };

    let mut out = String::with_capacity(with_home.len());
    let mut chars = with_home.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }
        let mut name = String::new();
        while let Some(&n) = chars.peek() {
            if n.is_ascii_alphanumeric() || n == '_' {
                name.push(n);
                chars.next();
            } else {
                break;
            }
        }
        match std::env::var(&name) {
            Ok(value) => out.push_str(&value),
            Err(_) => {
                out.push('$');
                out.push_str(&name);
            }
        }
    }
    PathBuf::from(out)
}

#[cfg(test)]
mod tests {
    use super::expand_path;
    use std::path::PathBuf;

    #[test]
    fn expands_home_prefix() {
        let home = dirs::home_dir().unwrap();
        assert_eq!(expand_path("~/repos"), home.join("repos"));
        assert_eq!(expand_path("~"), home);
    }

    #[test]
    fn expands_env_vars() {
        std::env::set_var("REPOMON_TEST_DIR", "/srv/code");
        assert_eq!(
            expand_path("$REPOMON_TEST_DIR/work"),
            PathBuf::from("/srv/code/work")
        );
    }

    #[test]
    fn leaves_plain_and_unknown_paths_alone() {
        assert_eq!(expand_path("/var/repos"), PathBuf::from("/var/repos"));
        assert_eq!(
            expand_path("/x/$NO_SUCH_REPOMON_VAR"),
            PathBuf::from("/x/$NO_SUCH_REPOMON_VAR")
        );
    }
}
