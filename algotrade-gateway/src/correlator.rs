//! Request/response correlator.
//!
//! Allocates the per-connection `user_request_id` sequence and tracks one
//! waiter per outstanding identifier. The waiter is registered before the
//! frame is transmitted so a reply can never race the registration.

use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;

use algotrade_core::CommandReply;

/// Matches asynchronous replies to their originating commands by identifier.
///
/// The identifier counter starts at zero on every new connection and is
/// never reused while a request is pending. Any number of callers may
/// register concurrently; the dispatcher is the only resolver.
pub struct Correlator {
    next_id: AtomicU64,
    pending: DashMap<String, oneshot::Sender<CommandReply>>,
}

impl Correlator {
    pub fn new() -> Self {
        Correlator {
            next_id: AtomicU64::new(0),
            pending: DashMap::new(),
        }
    }

    /// Allocate the next identifier and register a waiter for it.
    ///
    /// Returns the zero-padded identifier and the receiver the caller awaits.
    pub fn register(&self) -> (String, oneshot::Receiver<CommandReply>) {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let rid = format!("{id:010}");

        let (tx, rx) = oneshot::channel();
        self.pending.insert(rid.clone(), tx);
        (rid, rx)
    }

    /// Deliver a reply to the waiter registered under `rid`.
    ///
    /// Unknown or already-resolved identifiers are ignored; returns whether
    /// a waiter was actually resolved.
    pub fn resolve(&self, rid: &str, reply: CommandReply) -> bool {
        match self.pending.remove(rid) {
            Some((_, tx)) => {
                // The caller may have timed out between lookup and delivery;
                // a dropped receiver is not an error.
                let _ = tx.send(reply);
                true
            }
            None => {
                tracing::trace!("No pending request for id {}", rid);
                false
            }
        }
    }

    /// Remove a waiter whose caller gave up (timeout). Keeps the table from
    /// growing with abandoned requests.
    pub fn abandon(&self, rid: &str) {
        self.pending.remove(rid);
    }

    /// Fail every outstanding request by dropping its waiter. Each caller
    /// wakes with a closed-channel error instead of waiting out its timeout.
    pub fn fail_all(&self) {
        let outstanding = self.pending.len();
        if outstanding > 0 {
            tracing::warn!("Failing {} outstanding request(s)", outstanding);
        }
        self.pending.clear();
    }

    pub fn is_pending(&self, rid: &str) -> bool {
        self.pending.contains_key(rid)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

impl Default for Correlator {
    fn default() -> Self {
        Self::new()
    }
}
