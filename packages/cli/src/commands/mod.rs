pub mod attach;
pub mod gc;
pub mod new;
pub mod progress;
pub mod show;

pub use attach::{attach, AttachArgs};
pub use gc::{gc, GcArgs};
pub use new::{new, NewArgs};
pub use progress::{progress, ProgressArgs};
pub use show::{show, ShowArgs};

use anyhow::{anyhow, Result};
use jotter_editor::{Notification, NotificationLevel};

/// Turn error toasts left on a session into a command failure
pub(crate) fn fail_on_errors(notifications: Vec<Notification>) -> Result<()> {
    let errors: Vec<String> = notifications
        .into_iter()
        .filter(|n| n.level == NotificationLevel::Error)
        .map(|n| n.message)
        .collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(anyhow!(errors.join("; ")))
    }
}
