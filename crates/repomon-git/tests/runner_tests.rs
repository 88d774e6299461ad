use std::path::Path;
use std::process::Command;

use repomon_git::GitError;
use tempfile::TempDir;

/// Helper: run a git command synchronously for fixture setup.
fn git(dir: &Path, args: &[&str]) {
    let status = Command::new("git")
        .args([
            "-c",
            "user.name=Test User",
            "-c",
            "user.email=test@example.com",
        ])
        .args(args)
        .current_dir(dir)
        .status()
        .unwrap();
    assert!(status.success(), "fixture git {:?} failed", args);
}

fn init_repo() -> TempDir {
    let dir = TempDir::new().unwrap();
    git(dir.path(), &["init", "--initial-branch=main"]);
    std::fs::write(dir.path().join("README.md"), "hello\n").unwrap();
    git(dir.path(), &["add", "."]);
    git(dir.path(), &["commit", "-m", "initial commit"]);
    dir
}

#[tokio::test]
async fn run_returns_trimmed_stdout_on_success() {
    let repo = init_repo();

    let branch = repomon_git::run(&["rev-parse", "--abbrev-ref", "HEAD"], repo.path())
        .await
        .unwrap();

    assert_eq!(branch, "main");
}

#[tokio::test]
async fn run_surfaces_exit_code_and_stderr_on_failure() {
    let dir = TempDir::new().unwrap();

    let err = repomon_git::run(&["rev-parse", "--abbrev-ref", "HEAD"], dir.path())
        .await
        .unwrap_err();

    match err {
        GitError::Command { code, stderr } => {
            assert_eq!(code, 128);
            assert!(
                stderr.contains("not a git repository"),
                "unexpected stderr: {stderr}"
            );
        }
        other => panic!("expected Command error, got {other:?}"),
    }
}

#[tokio::test]
async fn rev_list_count_parses_as_number() {
    let repo = init_repo();

    let output = repomon_git::run(&["rev-list", "--count", "HEAD"], repo.path())
        .await
        .unwrap();

    assert_eq!(repomon_git::parse_count(&output).unwrap(), 1);
}
