//! Command orchestration helpers from UI actions to backend command queue.

use crossbeam_channel::{Sender, TrySendError};

use crate::backend_bridge::commands::BackendCommand;

/// Queues `cmd` without blocking the frame. Returns whether it was queued so
/// callers only mark a form as submitting when a request will actually run.
pub fn dispatch_backend_command(
    cmd_tx: &Sender<BackendCommand>,
    cmd: BackendCommand,
    status: &mut String,
) -> bool {
    let cmd_name = cmd.name();
    match cmd_tx.try_send(cmd) {
        Ok(()) => {
            tracing::debug!(command = cmd_name, "queued ui->backend command");
            true
        }
        Err(TrySendError::Full(_)) => {
            tracing::warn!(command = cmd_name, "ui->backend queue full");
            *status = "UI command queue is full; please retry".to_string();
            false
        }
        Err(TrySendError::Disconnected(_)) => {
            tracing::error!(command = cmd_name, "backend worker is gone");
            *status =
                "Backend worker disconnected (possible startup failure); restart the app".to_string();
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use crossbeam_channel::bounded;

    use super::*;

    #[test]
    fn full_queue_reports_a_retry_hint() {
        let (tx, _rx) = bounded(1);
        let mut status = String::new();
        assert!(dispatch_backend_command(&tx, BackendCommand::RefreshPosts, &mut status));
        assert!(!dispatch_backend_command(&tx, BackendCommand::RefreshPosts, &mut status));
        assert!(status.contains("queue is full"));
    }

    #[test]
    fn disconnected_worker_is_reported() {
        let (tx, rx) = bounded(1);
        drop(rx);
        let mut status = String::new();
        assert!(!dispatch_backend_command(&tx, BackendCommand::SignOut, &mut status));
        assert!(status.contains("disconnected"));
    }
}
