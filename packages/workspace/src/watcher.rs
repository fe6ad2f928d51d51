//! External change detection for an entry's `content.json`

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher as NotifyWatcher};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::entry::CONTENT_FILE;

#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("Failed to create watcher: {0}")]
    CreateError(#[from] notify::Error),

    #[error("Entry folder does not exist: {0}")]
    MissingFolder(PathBuf),
}

pub type WatcherResult<T> = Result<T, WatcherError>;

/// Watches one entry folder and reports writes to its content file
pub struct ContentWatcher {
    _watcher: RecommendedWatcher,
    receiver: Receiver<notify::Result<Event>>,
    content_path: PathBuf,
}

impl ContentWatcher {
    pub fn new(entry_dir: impl AsRef<Path>) -> WatcherResult<Self> {
        let entry_dir = entry_dir.as_ref();
        if !entry_dir.is_dir() {
            return Err(WatcherError::MissingFolder(entry_dir.to_path_buf()));
        }
        let (tx, rx) = channel();

        let mut watcher = RecommendedWatcher::new(
            move |res| {
                let _ = tx.send(res);
            },
            Config::default(),
        )?;

        watcher.watch(entry_dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
            content_path: entry_dir.join(CONTENT_FILE),
        })
    }

    pub fn content_path(&self) -> &Path {
        &self.content_path
    }

    /// Wait up to `timeout` for the content file to be created or modified
    pub fn next_change(&self, timeout: Duration) -> Option<PathBuf> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.receiver.recv_timeout(remaining) {
                Ok(Ok(event)) => {
                    if let Some(path) = self.content_change(&event) {
                        return Some(path);
                    }
                }
                Ok(Err(e)) => warn!(error = %e, "Watch error"),
                Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => return None,
            }
        }
    }

    /// Drain pending events, reporting whether the content file changed
    pub fn try_next_change(&self) -> Option<PathBuf> {
        let mut changed = None;
        while let Ok(result) = self.receiver.try_recv() {
            if let Ok(event) = result {
                if let Some(path) = self.content_change(&event) {
                    changed = Some(path);
                }
            }
        }
        changed
    }

    fn content_change(&self, event: &Event) -> Option<PathBuf> {
        if !matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_)) {
            return None;
        }
        let hit = event
            .paths
            .iter()
            .find(|path| path.file_name().map_or(false, |name| name == CONTENT_FILE))?;
        debug!(path = %hit.display(), kind = ?event.kind, "Content file changed");
        Some(hit.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::thread;

    #[test]
    fn test_reports_content_writes() {
        let dir = tempfile::tempdir().unwrap();
        let watcher = ContentWatcher::new(dir.path()).unwrap();

        let target = dir.path().join(CONTENT_FILE);
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(100));
            fs::write(target, "[]").unwrap();
        });

        let changed = watcher.next_change(Duration::from_secs(5));
        assert_eq!(
            changed.and_then(|p| p.file_name().map(|n| n.to_os_string())),
            Some(CONTENT_FILE.into())
        );
    }

    #[test]
    fn test_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ContentWatcher::new(dir.path().join("gone")),
            Err(WatcherError::MissingFolder(_))
        ));
    }
}
