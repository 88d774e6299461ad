use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("git error: {0}")]
    Git(#[from] repomon_git::GitError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("analysis task panicked: {0}")]
    Join(#[from] tokio::task::JoinError),
}
