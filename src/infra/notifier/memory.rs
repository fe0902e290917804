//! In-memory notifier backend.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{AppResult, AttendanceNotice, Notifier};
use crate::util::serde::MemberId;

/// Per-member inbox for development/testing. Clones share the inbox.
#[derive(Debug, Clone, Default)]
pub struct InMemoryNotifier {
    messages: Arc<Mutex<HashMap<MemberId, Vec<AttendanceNotice>>>>,
}

impl InMemoryNotifier {
    /// Create an empty notifier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch notices for a member, optionally since a timestamp.
    pub fn fetch(&self, member: &MemberId, since_ms: Option<u128>, limit: usize) -> Vec<AttendanceNotice> {
        self.messages
            .lock()
            .get(member)
            .map(|notices| {
                notices
                    .iter()
                    .filter(|n| since_ms.is_none_or(|s| n.created_at_ms >= s))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Total notices delivered.
    pub fn len(&self) -> usize {
        self.messages.lock().values().map(Vec::len).sum()
    }

    /// Whether nothing was delivered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl Notifier for InMemoryNotifier {
    async fn deliver(&self, notice: AttendanceNotice) -> AppResult<()> {
        self.messages
            .lock()
            .entry(notice.member.clone())
            .or_default()
            .push(notice);
        Ok(())
    }
}
