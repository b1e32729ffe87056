//! Composes Schema Engine, Compressor, Crypto Envelope, Integrity, Storage,
//! and Manifest into the backup/restore state machines of spec §4.8-§4.9.

pub mod backup;
mod pipeline;
pub mod restore;

pub use backup::{run_backup, BackupOptions};
pub use pipeline::through_bounded_channel;
pub use restore::{run_restore, RestoreOptions};

/// Cooperative cancellation (spec §5): each stage checks this at a chunk
/// boundary, finishes the in-flight chunk, and propagates downstream.
/// Modeled on a `watch<bool>` rather than `tokio-util`'s `CancellationToken`
/// since the workspace doesn't otherwise depend on `tokio-util`.
#[derive(Clone)]
pub struct CancellationToken {
    receiver: tokio::sync::watch::Receiver<bool>,
}

pub struct CancellationHandle {
    sender: tokio::sync::watch::Sender<bool>,
}

impl CancellationHandle {
    pub fn new() -> (Self, CancellationToken) {
        let (sender, receiver) = tokio::sync::watch::channel(false);
        (Self { sender }, CancellationToken { receiver })
    }

    pub fn cancel(&self) {
        let _ = self.sender.send(true);
    }
}

impl CancellationToken {
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Mode matrix (spec §4.8): compression always precedes encryption, and
/// the output extension is determined by whether either is enabled.
pub fn output_extension(compression: bool, encryption: bool) -> &'static str {
    if compression || encryption {
        "backy"
    } else {
        "sql"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_matrix_extensions() {
        assert_eq!(output_extension(false, false), "sql");
        assert_eq!(output_extension(true, false), "backy");
        assert_eq!(output_extension(false, true), "backy");
        assert_eq!(output_extension(true, true), "backy");
    }

    #[tokio::test]
    async fn cancellation_handle_trips_the_token() {
        let (handle, token) = CancellationHandle::new();
        assert!(!token.is_cancelled());
        handle.cancel();
        assert!(token.is_cancelled());
    }
}
