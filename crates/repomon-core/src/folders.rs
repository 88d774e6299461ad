use std::sync::{Arc, RwLock};
use std::time::Instant;

use tokio::sync::broadcast;
use tracing::debug;

use crate::error::CoreError;
use crate::events::{StateChanged, EVENT_CAPACITY};
use crate::fanout::Fanout;
use crate::folder::{expand_path, Folder};

/// Collaborator that persists the watched-folder list.
///
/// The set never serializes itself; it calls this on every successful
/// add/remove and treats the write as fire-and-forget.
pub trait SettingsSink: Send + Sync {
    fn save_folders(&self, paths: &[String]);
}

/// The set of watched root folders; owner of the state-changed channel.
///
/// Folder order is add order. Paths are not deduplicated here; callers are
/// expected to check `folder_paths` before adding.
pub struct FolderSet {
    folders: RwLock<Vec<Arc<Folder>>>,
    events: broadcast::Sender<StateChanged>,
    sink: Option<Arc<dyn SettingsSink>>,
}

impl FolderSet {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            folders: RwLock::new(Vec::new()),
            events,
            sink: None,
        }
    }

    pub fn with_sink(mut self, sink: Arc<dyn SettingsSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Subscribe to state-changed events. One event arrives per repository
    /// per analysis pass.
    pub fn subscribe(&self) -> broadcast::Receiver<StateChanged> {
        self.events.subscribe()
    }

    /// Watch a new root folder, discovering its repositories eagerly.
    /// No-op when the path is empty or does not exist on the filesystem.
    pub async fn add_folder(&self, path: &str) {
        if path.is_empty() {
            return;
        }
        let normalized = normalize(path);
        if !expand_path(&normalized).is_dir() {
            debug!(path = %normalized, "ignoring folder that does not exist");
            return;
        }
        let folder = Folder::discover(&normalized).await;
        self.folders
            .write()
            .expect("folder list lock poisoned")
            .push(Arc::new(folder));
        self.persist();
    }

    /// Stop watching a folder. No-op when the path is not tracked.
    pub fn remove_folder(&self, path: &str) {
        if path.is_empty() {
            return;
        }
        let normalized = normalize(path);
        let removed = {
            let mut folders = self.folders.write().expect("folder list lock poisoned");
            match folders.iter().position(|f| f.path() == normalized) {
                Some(pos) => {
                    folders.remove(pos);
                    true
                }
                None => false,
            }
        };
        if removed {
            self.persist();
        }
    }

    pub fn folder_paths(&self) -> Vec<String> {
        self.folders
            .read()
            .expect("folder list lock poisoned")
            .iter()
            .map(|f| f.path().to_string())
            .collect()
    }

    pub fn folders(&self) -> Vec<Arc<Folder>> {
        self.folders
            .read()
            .expect("folder list lock poisoned")
            .clone()
    }

    /// Run one full analysis pass: parallel over folders, sequential below.
    ///
    /// Joins every folder task and returns the first error; folders that
    /// completed keep their recorded state.
    pub async fn analyze(&self) -> Result<(), CoreError> {
        let folders = self.folders();
        let start = Instant::now();

        let handles: Vec<_> = folders
            .into_iter()
            .map(|folder| {
                let events = self.events.clone();
                tokio::spawn(async move { folder.analyze(&events, Fanout::Sequential).await })
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

        debug!(
            duration_ms = start.elapsed().as_millis() as u64,
            "analyzed all folders"
        );
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn persist(&self) {
        if let Some(sink) = &self.sink {
            sink.save_folders(&self.folder_paths());
        }
    }
}

impl Default for FolderSet {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip one trailing path separator, matching how folder identity is stored.
fn normalize(path: &str) -> String {
    path.strip_suffix('/')
        .or_else(|| path.strip_suffix('\\'))
        .unwrap_or(path)
        .to_string()
}
