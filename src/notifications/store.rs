//! Client-side notification cache
//!
//! [`NotificationSyncStore`] holds the current user's notifications and the
//! unread badge count. It is refreshed wholesale from the backend on a fixed
//! period and on demand, and patched in place after mark-as-read and delete.
//!
//! An entry is unread iff its recipient list is non-empty. Background refresh
//! failures are logged and swallowed; failures of user-initiated mutations are
//! returned to the caller.
//!
//! Refreshes and mutations are not serialized against each other. A slow
//! refresh that completes after a mutation overwrites the mutation's local
//! patch with the server's older view until the next refresh.

use crate::config::NotificationConfig;
use crate::error::ApiError;
use crate::models::NotificationEntry;
use crate::notifications::api::NotificationApi;
use crate::sync::{PollHandle, PollScheduler, Pollable};
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Read-only view of the store
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NotificationSnapshot {
    /// Entries in server order
    pub entries: Vec<NotificationEntry>,
    /// Unread badge count
    pub unread_count: usize,
}

impl NotificationSnapshot {
    /// Most recent entry
    pub fn latest(&self) -> Option<&NotificationEntry> {
        self.entries.first()
    }

    /// First `n` entries
    pub fn recent(&self, n: usize) -> &[NotificationEntry] {
        &self.entries[..n.min(self.entries.len())]
    }

    /// Entry by ID
    pub fn get(&self, id: &str) -> Option<&NotificationEntry> {
        self.entries.iter().find(|e| e.id == id)
    }
}

/// Count entries that contribute to the unread badge
pub fn count_unread(entries: &[NotificationEntry]) -> usize {
    entries.iter().filter(|e| e.is_unread()).count()
}

/// What a mark-as-read request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkReadOutcome {
    /// The backend acknowledged the entry
    Marked,
    /// No cached entry has that ID
    NotFound,
    /// Someone already acknowledged the entry
    AlreadyRead,
    /// Another call for the same entry is awaiting the backend
    InProgress,
}

/// Marks an entry ID as having a mark-as-read call in flight until dropped
struct ReadClaim<'a> {
    pending: &'a Mutex<HashSet<String>>,
    id: String,
}

impl Drop for ReadClaim<'_> {
    fn drop(&mut self) {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.id);
    }
}

/// Authoritative in-memory view of the user's notifications
pub struct NotificationSyncStore {
    api: Arc<dyn NotificationApi>,
    scheduler: PollScheduler,
    state: watch::Sender<NotificationSnapshot>,
    session_active: AtomicBool,
    poller: Mutex<Option<PollHandle>>,
    pending_reads: Mutex<HashSet<String>>,
}

impl std::fmt::Debug for NotificationSyncStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationSyncStore")
            .field("poll_interval", &self.scheduler.period())
            .field("session_active", &self.is_session_active())
            .field("unread_count", &self.unread_count())
            .finish()
    }
}

impl NotificationSyncStore {
    /// Create an empty store
    ///
    /// Construction does no IO and spawns nothing; call [`start`](Self::start)
    /// to begin polling.
    pub fn new(
        api: Arc<dyn NotificationApi>,
        config: &NotificationConfig,
        session_active: bool,
    ) -> Self {
        Self::with_poll_interval(api, config.poll_interval(), session_active)
    }

    /// Create an empty store with an explicit poll interval
    pub fn with_poll_interval(
        api: Arc<dyn NotificationApi>,
        poll_interval: Duration,
        session_active: bool,
    ) -> Self {
        let (state, _) = watch::channel(NotificationSnapshot::default());
        Self {
            api,
            scheduler: PollScheduler::new(poll_interval),
            state,
            session_active: AtomicBool::new(session_active),
            poller: Mutex::new(None),
            pending_reads: Mutex::new(HashSet::new()),
        }
    }

    /// Current entries
    pub fn entries(&self) -> Vec<NotificationEntry> {
        self.state.borrow().entries.clone()
    }

    /// Current unread badge count
    pub fn unread_count(&self) -> usize {
        self.state.borrow().unread_count
    }

    /// Entries and count together
    pub fn snapshot(&self) -> NotificationSnapshot {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<NotificationSnapshot> {
        self.state.subscribe()
    }

    /// Whether an authenticated session exists
    pub fn is_session_active(&self) -> bool {
        self.session_active.load(Ordering::SeqCst)
    }

    /// Interval between background refreshes
    pub fn poll_interval(&self) -> Duration {
        self.scheduler.period()
    }

    /// Replace the cache with the backend's current list
    ///
    /// Without a session the cache is emptied and no request is made. Fetch
    /// failures are logged and leave the previous entries in place.
    pub async fn refresh(&self) {
        if !self.is_session_active() {
            self.clear();
            return;
        }

        match self.api.list().await {
            Ok(entries) => {
                // Session may have ended while the request was in flight
                if !self.is_session_active() {
                    self.clear();
                    return;
                }
                let unread_count = count_unread(&entries);
                debug!(
                    entries = entries.len(),
                    unread = unread_count,
                    "Notifications refreshed"
                );
                self.state.send_replace(NotificationSnapshot {
                    entries,
                    unread_count,
                });
            }
            Err(err) => {
                warn!(error = %err, "Notification refresh failed");
                if !self.is_session_active() {
                    self.clear();
                }
            }
        }
    }

    /// Mark one entry as read
    ///
    /// Skips the backend when the entry is not cached, was already
    /// acknowledged, or has a mark-as-read call for it still in flight. On
    /// success the entry is replaced by the server's version and the unread
    /// count drops by one, never below zero.
    ///
    /// The count is decremented even when the replaced entry had no
    /// recipients, so it can differ from [`count_unread`] over the entries
    /// until the next refresh recomputes it.
    pub async fn mark_as_read(&self, id: &str) -> Result<MarkReadOutcome, ApiError> {
        let skip = {
            let state = self.state.borrow();
            match state.get(id) {
                None => Some(MarkReadOutcome::NotFound),
                Some(entry) if entry.is_acknowledged() => Some(MarkReadOutcome::AlreadyRead),
                Some(_) => None,
            }
        };
        if let Some(outcome) = skip {
            debug!(id = id, outcome = ?outcome, "Skipping mark-as-read");
            return Ok(outcome);
        }

        let Some(_claim) = self.claim_read(id) else {
            debug!(id = id, "Mark-as-read already in flight");
            return Ok(MarkReadOutcome::InProgress);
        };

        let updated = self.api.mark_as_read(id).await.map_err(|err| {
            warn!(id = id, error = %err, "Failed to mark notification as read");
            err
        })?;

        self.state.send_modify(|state| {
            if let Some(slot) = state.entries.iter_mut().find(|e| e.id == id) {
                *slot = updated;
            }
            state.unread_count = state.unread_count.saturating_sub(1);
        });
        info!(id = id, "Notification marked as read");
        Ok(MarkReadOutcome::Marked)
    }

    /// Hide one entry from the current user
    ///
    /// On success the row stays in the list with its recipients cleared, so it
    /// no longer counts as unread.
    pub async fn delete_notification(&self, id: &str) -> Result<(), ApiError> {
        self.api.delete(id).await.map_err(|err| {
            warn!(id = id, error = %err, "Failed to delete notification");
            err
        })?;

        self.state.send_modify(|state| {
            if let Some(entry) = state.entries.iter_mut().find(|e| e.id == id) {
                entry.recipient_ids.clear();
            }
            state.unread_count = count_unread(&state.entries);
        });
        info!(id = id, "Notification deleted");
        Ok(())
    }

    /// Begin background polling: one refresh now, then every poll interval
    ///
    /// No-op without a session or when polling is already running. Must be
    /// called from within a Tokio runtime.
    pub fn start(self: &Arc<Self>) {
        if !self.is_session_active() {
            debug!("No session, not starting notification polling");
            return;
        }

        let mut poller = self.poller();
        if poller.as_ref().is_some_and(|h| !h.is_finished()) {
            return;
        }

        let target: Weak<dyn Pollable> = Arc::downgrade(self) as Weak<dyn Pollable>;
        *poller = Some(self.scheduler.spawn(target));
        info!(
            interval_secs = self.scheduler.period().as_secs(),
            "Notification polling started"
        );
    }

    /// Cancel background polling
    ///
    /// Returns whether a poll task was running. Calling it again is a no-op.
    pub fn stop(&self) -> bool {
        match self.poller().take() {
            Some(mut handle) => {
                handle.cancel();
                info!("Notification polling stopped");
                true
            }
            None => false,
        }
    }

    /// Whether a poll task is currently registered
    pub fn is_polling(&self) -> bool {
        self.poller().as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Open or close the session gate
    ///
    /// Opening starts polling; closing stops it and empties the cache.
    pub fn set_session_active(self: &Arc<Self>, active: bool) {
        let was_active = self.session_active.swap(active, Ordering::SeqCst);
        if was_active != active {
            info!(active = active, "Notification session changed");
        }

        if active {
            self.start();
        } else {
            self.stop();
            self.clear();
        }
    }

    fn clear(&self) {
        self.state.send_if_modified(|state| {
            if state.entries.is_empty() && state.unread_count == 0 {
                return false;
            }
            *state = NotificationSnapshot::default();
            true
        });
    }

    fn claim_read(&self, id: &str) -> Option<ReadClaim<'_>> {
        let mut pending = self
            .pending_reads
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !pending.insert(id.to_string()) {
            return None;
        }
        Some(ReadClaim {
            pending: &self.pending_reads,
            id: id.to_string(),
        })
    }

    fn poller(&self) -> MutexGuard<'_, Option<PollHandle>> {
        self.poller.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Pollable for NotificationSyncStore {
    fn name(&self) -> &str {
        "notifications"
    }

    async fn poll(&self) {
        self.refresh().await;
    }
}

impl Drop for NotificationSyncStore {
    fn drop(&mut self) {
        self.stop();
    }
}
