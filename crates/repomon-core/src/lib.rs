//! # repomon-core
//!
//! The scanning and refresh engine behind repomon.
//!
//! A [`FolderSet`] owns watched root folders; each [`Folder`] owns the git
//! working copies discovered beneath it; each [`Repository`] owns its
//! [`Branch`] set. An analysis pass walks that hierarchy, re-deriving
//! per-branch state (ahead/behind remote, local changes) through the
//! `repomon-git` subprocess runner, and broadcasts a [`StateChanged`] event
//! as each repository finishes.
//!
//! The [`AutoRefresher`] drives passes on a configurable interval with at
//! most one pass in flight at a time.

mod branch;
mod error;
mod events;
mod fanout;
mod folder;
mod folders;
mod refresher;
mod repository;

pub use branch::Branch;
pub use error::CoreError;
pub use events::StateChanged;
pub use fanout::Fanout;
pub use folder::Folder;
pub use folders::{FolderSet, SettingsSink};
pub use refresher::AutoRefresher;
pub use repository::Repository;
