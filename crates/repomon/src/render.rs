//! Terminal rendering of the folder -> repository -> branch tree.
//!
//! Called on every state-changed event; it only reads the hierarchy, so
//! mid-pass renders show the previous pass's values for branches not yet
//! swapped.

use colored::Colorize;
use repomon_core::FolderSet;

/// Uncolored summary built from each repository's `Display` impl; suited to
/// piping into other tools.
pub fn render_plain(folders: &FolderSet) {
    for folder in folders.folders() {
        println!("{}", folder.path());
        for repo in folder.repos() {
            print!("{repo}");
        }
        println!();
    }
}

pub fn render(folders: &FolderSet) {
    for folder in folders.folders() {
        println!("{}", folder.path().bold());
        if folder.repos().is_empty() {
            println!("  {}", "(no repositories found)".dimmed());
        }
        for repo in folder.repos() {
            let marker = if repo.is_main_up_to_date() {
                "ok".green()
            } else {
                "!!".red()
            };
            println!(
                "  [{}] {} on {}",
                marker,
                repo.name().cyan().bold(),
                repo.current_branch()
            );
            for branch in repo.branches() {
                let current = if branch.is_current_branch() { "*" } else { " " };
                let mut notes = Vec::new();
                if branch.has_remote() {
                    if branch.is_remote_ahead() {
                        notes.push(
                            format!("{} to pull", branch.commits_to_pull())
                                .yellow()
                                .to_string(),
                        );
                    }
                    if branch.is_local_ahead() {
                        notes.push(
                            format!("{} to push", branch.commits_to_push())
                                .yellow()
                                .to_string(),
                        );
                    }
                    if !branch.is_remote_ahead() && !branch.is_local_ahead() {
                        notes.push("in sync".green().to_string());
                    }
                } else {
                    notes.push("no remote".dimmed().to_string());
                }
                if branch.has_changes() {
                    notes.push(
                        format!("{} changed", branch.unstaged_changed_file_paths().len())
                            .red()
                            .to_string(),
                    );
                }
                let untracked = branch.untracked_file_paths().len();
                if untracked > 0 {
                    notes.push(format!("{untracked} untracked").red().to_string());
                }
                println!("    {current} {}: {}", branch.name(), notes.join(", "));
                for file in branch.unstaged_changed_file_paths() {
                    println!("        {}", file.dimmed());
                }
            }
        }
        println!();
    }
}
