//! Context-menu actions for attachments: open with the default
//! application, reveal in the file manager, save a copy elsewhere

use jotter_assets::AssetStore;
use jotter_editor::{AssetActions, HostError};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use std::thread::{self, JoinHandle};
use tracing::{debug, info, instrument, warn};

use crate::fs_store::FsAssetStore;

/// Program and arguments that hand `target` to the desktop
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Opener {
    pub program: String,
    pub args: Vec<String>,
}

impl Opener {
    /// Open a file with its default application
    pub fn open(target: &Path) -> Self {
        let target = target.display().to_string();
        if cfg!(target_os = "macos") {
            Self::new("open", vec![target])
        } else if cfg!(windows) {
            Self::new("cmd", vec!["/C".into(), "start".into(), String::new(), target])
        } else {
            Self::new("xdg-open", vec![target])
        }
    }

    /// Show a file in the platform file manager
    pub fn reveal(target: &Path) -> Self {
        if cfg!(target_os = "macos") {
            Self::new("open", vec!["-R".into(), target.display().to_string()])
        } else if cfg!(windows) {
            Self::new("explorer", vec![format!("/select,{}", target.display())])
        } else {
            let folder = target.parent().unwrap_or(target);
            Self::new("xdg-open", vec![folder.display().to_string()])
        }
    }

    fn new(program: &str, args: Vec<String>) -> Self {
        Self {
            program: program.to_string(),
            args,
        }
    }

    /// Launch the program and wait for it on a separate thread so the
    /// exited child is reaped
    fn spawn(&self) -> Result<JoinHandle<Option<ExitStatus>>, HostError> {
        let mut child = Command::new(&self.program).args(&self.args).spawn()?;
        let program = self.program.clone();
        let reaper = thread::Builder::new()
            .name("opener-wait".to_string())
            .spawn(move || match child.wait() {
                Ok(status) => {
                    debug!(program = %program, %status, "Opener exited");
                    Some(status)
                }
                Err(e) => {
                    warn!(program = %program, error = %e, "Failed to wait for opener");
                    None
                }
            })?;
        Ok(reaper)
    }
}

/// [`AssetActions`] for files stored by an [`FsAssetStore`]
#[derive(Debug, Clone)]
pub struct FsAssetActions {
    store: FsAssetStore,
}

impl FsAssetActions {
    pub fn new(store: FsAssetStore) -> Self {
        Self { store }
    }

    fn existing(&self, asset_path: &str) -> Result<PathBuf, HostError> {
        let path = self.store.resolve(asset_path)?;
        if !self.store.exists(asset_path) {
            return Err(format!("Attachment missing on disk: {}", asset_path).into());
        }
        Ok(path)
    }
}

impl AssetActions for FsAssetActions {
    fn open_externally(&self, asset_path: &str) -> Result<(), HostError> {
        Opener::open(&self.existing(asset_path)?).spawn()?;
        Ok(())
    }

    fn reveal(&self, asset_path: &str) -> Result<(), HostError> {
        Opener::reveal(&self.existing(asset_path)?).spawn()?;
        Ok(())
    }

    #[instrument(skip(self), fields(destination = %destination.display()))]
    fn save_copy(&self, asset_path: &str, destination: &Path) -> Result<(), HostError> {
        let source = self.existing(asset_path)?;
        fs::copy(&source, destination)?;
        info!(asset_path, "Saved a copy of attachment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_copy_writes_destination() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsAssetStore::new(dir.path().join("entry"));
        store.write("assets/abc.pdf", b"%PDF").unwrap();

        let actions = FsAssetActions::new(store);
        let destination = dir.path().join("Report.pdf");
        actions.save_copy("assets/abc.pdf", &destination).unwrap();

        assert_eq!(fs::read(destination).unwrap(), b"%PDF");
    }

    #[test]
    fn test_missing_attachment_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let actions = FsAssetActions::new(FsAssetStore::new(dir.path()));

        let err = actions.open_externally("assets/gone.png").unwrap_err();
        assert!(err.to_string().contains("gone.png"));
        assert!(actions.reveal("content.json").is_err());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_reveal_opens_containing_folder() {
        let opener = Opener::reveal(Path::new("/data/e1/assets/a.png"));
        assert_eq!(opener.program, "xdg-open");
        assert_eq!(opener.args, vec!["/data/e1/assets".to_string()]);
    }

    #[cfg(unix)]
    #[test]
    fn test_opener_child_is_waited_for() {
        let opener = Opener::new("true", Vec::new());
        let status = opener.spawn().unwrap().join().unwrap();
        assert!(status.is_some_and(|s| s.success()));
    }

    #[test]
    fn test_missing_opener_program_is_an_error() {
        let opener = Opener::new("jotter-no-such-opener", Vec::new());
        assert!(opener.spawn().is_err());
    }
}
