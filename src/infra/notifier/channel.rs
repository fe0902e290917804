//! Channel-backed notifier handing notices to a delivery worker.

use anyhow::anyhow;
use async_trait::async_trait;
use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use crate::core::{AppResult, AttendanceNotice, Notifier};

/// Pushes notices onto a bounded channel drained by the enclosing application.
///
/// Never blocks: a full or closed channel is reported as an error, which the
/// service logs without affecting the committed change.
#[derive(Debug, Clone)]
pub struct ChannelNotifier {
    tx: Sender<AttendanceNotice>,
}

impl ChannelNotifier {
    /// Create a notifier and the receiving end with room for `capacity` notices.
    pub fn bounded(capacity: usize) -> (Self, Receiver<AttendanceNotice>) {
        let (tx, rx) = bounded(capacity);
        (Self { tx }, rx)
    }
}

#[async_trait]
impl Notifier for ChannelNotifier {
    async fn deliver(&self, notice: AttendanceNotice) -> AppResult<()> {
        match self.tx.try_send(notice) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(notice)) => {
                tracing::warn!(member = %notice.member, "notice channel full");
                Err(anyhow!("notice channel full"))
            }
            Err(TrySendError::Disconnected(_)) => Err(anyhow!("notice channel closed")),
        }
    }
}
