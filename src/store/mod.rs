//! Client-side entity caches.
//!
//! One store per entity family (decks + their card lists, bookmarks, user
//! profile/settings, selection state). Stores are cheap clonable handles
//! over shared state; construct them explicitly per session (there is no
//! ambient global instance) so tests can run isolated copies.
//!
//! Locks are never held across awaits: every operation reads what it needs,
//! performs the network call, then reconciles under the lock in one step.
//! The view only ever observes fully reconciled state.

mod bookmarks;
mod decks;
mod session;
mod user;

#[cfg(test)]
pub(crate) mod testing;

pub use bookmarks::BookmarkStore;
pub use decks::{DeckStore, DeckViewData};
pub use session::SessionStore;
pub use user::UserStore;

use std::collections::HashMap;
use std::sync::Arc;

use crate::api::WordbookGateway;
use crate::auth::TokenProvider;

/// The full set of per-session stores, constructed once over one gateway
/// and one token source.
#[derive(Clone)]
pub struct Stores {
  pub decks: DeckStore,
  pub bookmarks: BookmarkStore,
  pub session: SessionStore,
  pub user: UserStore,
}

impl Stores {
  pub fn new(gateway: Arc<dyn WordbookGateway>, tokens: Arc<dyn TokenProvider>) -> Self {
    Self {
      decks: DeckStore::new(gateway.clone(), tokens.clone()),
      bookmarks: BookmarkStore::new(gateway.clone(), tokens.clone()),
      session: SessionStore::new(),
      user: UserStore::new(gateway, tokens),
    }
  }

  /// Drop all cached state, e.g. on logout.
  pub fn reset_all(&self) {
    self.decks.reset();
    self.bookmarks.reset();
    self.session.reset();
    self.user.reset();
  }
}

/// Per-key monotonic request sequencing.
///
/// Concurrent fetches against the same cache key have no cancellation
/// model; instead each fetch records a sequence number when it starts and
/// its completion is applied only if no newer request (or invalidation)
/// superseded it. A slow stale response can therefore never clobber the
/// result of a later fetch or a delete.
#[derive(Debug, Default)]
pub(crate) struct RequestGuard {
  latest: HashMap<String, u64>,
  next: u64,
}

impl RequestGuard {
  /// Register a new request for `key` and return its sequence number.
  pub fn begin(&mut self, key: &str) -> u64 {
    self.next += 1;
    self.latest.insert(key.to_string(), self.next);
    self.next
  }

  /// Whether `seq` is still the latest request issued for `key`.
  pub fn is_current(&self, key: &str, seq: u64) -> bool {
    self.latest.get(key) == Some(&seq)
  }

  /// Supersede any in-flight request for `key` without issuing a new one.
  pub fn invalidate(&mut self, key: &str) {
    self.next += 1;
    self.latest.insert(key.to_string(), self.next);
  }
}

#[cfg(test)]
mod tests {
  use super::RequestGuard;

  #[test]
  fn newer_request_supersedes_older() {
    let mut guard = RequestGuard::default();
    let first = guard.begin("words:d1");
    let second = guard.begin("words:d1");

    assert!(!guard.is_current("words:d1", first));
    assert!(guard.is_current("words:d1", second));
  }

  #[test]
  fn keys_are_independent() {
    let mut guard = RequestGuard::default();
    let d1 = guard.begin("words:d1");
    guard.begin("words:d2");

    assert!(guard.is_current("words:d1", d1));
  }

  #[test]
  fn invalidate_discards_in_flight() {
    let mut guard = RequestGuard::default();
    let seq = guard.begin("words:d1");
    guard.invalidate("words:d1");

    assert!(!guard.is_current("words:d1", seq));
  }
}
