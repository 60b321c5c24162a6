//! Bookmark cache: the user's bookmark records plus the derived card-id
//! set, kept in step within single state transitions.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::api::{ApiError, WordbookGateway};
use crate::auth::TokenProvider;
use crate::models::Bookmark;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
  Idle,
  Loading,
  Loaded,
}

struct BookmarkState {
  bookmarks: Vec<Bookmark>,
  /// Always the `card_id` projection of `bookmarks`; both are written in
  /// the same transition.
  card_ids: HashSet<String>,
  load_state: LoadState,
  error: Option<String>,
}

impl Default for BookmarkState {
  fn default() -> Self {
    Self {
      bookmarks: Vec::new(),
      card_ids: HashSet::new(),
      load_state: LoadState::Idle,
      error: None,
    }
  }
}

#[derive(Clone)]
pub struct BookmarkStore {
  gateway: Arc<dyn WordbookGateway>,
  tokens: Arc<dyn TokenProvider>,
  state: Arc<Mutex<BookmarkState>>,
}

impl BookmarkStore {
  pub fn new(gateway: Arc<dyn WordbookGateway>, tokens: Arc<dyn TokenProvider>) -> Self {
    Self {
      gateway,
      tokens,
      state: Arc::new(Mutex::new(BookmarkState::default())),
    }
  }

  /// Pure read; never fetches.
  pub fn is_bookmarked(&self, card_id: &str) -> bool {
    self.state.lock().unwrap().card_ids.contains(card_id)
  }

  pub fn bookmarks(&self) -> Vec<Bookmark> {
    self.state.lock().unwrap().bookmarks.clone()
  }

  pub fn bookmarked_card_ids(&self) -> HashSet<String> {
    self.state.lock().unwrap().card_ids.clone()
  }

  pub fn is_loaded(&self) -> bool {
    self.state.lock().unwrap().load_state == LoadState::Loaded
  }

  pub fn is_loading(&self) -> bool {
    self.state.lock().unwrap().load_state == LoadState::Loading
  }

  pub fn error(&self) -> Option<String> {
    self.state.lock().unwrap().error.clone()
  }

  pub fn clear_error(&self) {
    self.state.lock().unwrap().error = None;
  }

  pub fn reset(&self) {
    *self.state.lock().unwrap() = BookmarkState::default();
  }

  /// Fetch the full bookmark list once.
  ///
  /// A no-op when already loaded or a load is in flight, so rapid
  /// double-invocation produces a single gateway call. Requires a signed-in
  /// identity. A failed load returns the store to the not-loaded state so
  /// the next call can retry.
  pub async fn load_bookmarks(&self) -> Result<(), ApiError> {
    let token = {
      let mut state = self.state.lock().unwrap();
      if state.load_state != LoadState::Idle {
        return Ok(());
      }
      match self.tokens.current_token() {
        Some(token) => {
          state.load_state = LoadState::Loading;
          token
        }
        None => {
          state.error = Some(ApiError::AuthRequired.to_string());
          return Err(ApiError::AuthRequired);
        }
      }
    };

    let result = self.gateway.list_bookmarks(&token).await;

    let mut state = self.state.lock().unwrap();
    match result {
      Ok(bookmarks) => {
        state.card_ids = bookmarks.iter().map(|b| b.card_id.clone()).collect();
        state.bookmarks = bookmarks;
        state.load_state = LoadState::Loaded;
        state.error = None;
        debug!(count = state.bookmarks.len(), "bookmarks loaded");
        Ok(())
      }
      Err(error) => {
        state.load_state = LoadState::Idle;
        state.error = Some(error.to_string());
        Err(error)
      }
    }
  }

  /// Flip a card's bookmark.
  ///
  /// The direction is decided from local membership; the collections are
  /// only touched after the remote call confirms, and records and id set
  /// change together. Returns the new membership.
  pub async fn toggle_bookmark(&self, card_id: &str) -> Result<bool, ApiError> {
    let token = match self.tokens.current_token() {
      Some(token) => token,
      None => {
        self.state.lock().unwrap().error = Some(ApiError::AuthRequired.to_string());
        return Err(ApiError::AuthRequired);
      }
    };

    let currently_bookmarked = self.is_bookmarked(card_id);

    if currently_bookmarked {
      let result = self.gateway.delete_bookmark_by_card(card_id, &token).await;
      let mut state = self.state.lock().unwrap();
      match result {
        Ok(()) => {
          state.bookmarks.retain(|b| b.card_id != card_id);
          state.card_ids.remove(card_id);
          state.error = None;
          Ok(false)
        }
        Err(error) => {
          state.error = Some(error.to_string());
          Err(error)
        }
      }
    } else {
      let result = self.gateway.create_bookmark(card_id, &token).await;
      let mut state = self.state.lock().unwrap();
      match result {
        Ok(bookmark) => {
          // Set semantics even if the server briefly allowed a duplicate.
          state.bookmarks.retain(|b| b.card_id != bookmark.card_id);
          state.card_ids.insert(bookmark.card_id.clone());
          state.bookmarks.push(bookmark);
          state.error = None;
          Ok(true)
        }
        Err(error) => {
          state.error = Some(error.to_string());
          Err(error)
        }
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashSet;
  use std::time::Duration;

  use chrono::{TimeZone, Utc};

  use super::*;
  use crate::api::MemoryGateway;
  use crate::auth::StaticTokenProvider;
  use crate::models::{Card, Definition};
  use crate::store::testing::RecordingGateway;

  fn seed_card(gateway: &MemoryGateway, id: &str) {
    let at = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
    gateway.seed_card(Card {
      id: id.to_string(),
      english: "word".to_string(),
      definitions: vec![Definition {
        part_of_speech: "noun".to_string(),
        japanese: vec!["語".to_string()],
      }],
      synonyms: Vec::new(),
      example_sentences: Vec::new(),
      phonetics: None,
      wordbook_id: "d1".to_string(),
      created_at: at,
      updated_at: at,
    });
  }

  fn projection(store: &BookmarkStore) -> HashSet<String> {
    store
      .bookmarks()
      .iter()
      .map(|b| b.card_id.clone())
      .collect()
  }

  #[tokio::test]
  async fn concurrent_loads_issue_one_gateway_call() {
    let gateway = RecordingGateway::new(MemoryGateway::new());
    gateway.delay("list_bookmarks", Duration::from_millis(20));
    let store = BookmarkStore::new(gateway.clone(), StaticTokenProvider::signed_in());

    let (first, second) = tokio::join!(store.load_bookmarks(), store.load_bookmarks());

    first.unwrap();
    second.unwrap();
    assert_eq!(gateway.calls("list_bookmarks"), 1);
    assert!(store.is_loaded());
  }

  #[tokio::test]
  async fn load_after_load_is_a_noop() {
    let gateway = RecordingGateway::new(MemoryGateway::new());
    let store = BookmarkStore::new(gateway.clone(), StaticTokenProvider::signed_in());

    store.load_bookmarks().await.unwrap();
    store.load_bookmarks().await.unwrap();

    assert_eq!(gateway.calls("list_bookmarks"), 1);
  }

  #[tokio::test]
  async fn load_requires_identity() {
    let gateway = RecordingGateway::new(MemoryGateway::new());
    let store = BookmarkStore::new(gateway.clone(), StaticTokenProvider::signed_out());

    let result = store.load_bookmarks().await;

    assert!(matches!(result, Err(ApiError::AuthRequired)));
    assert_eq!(gateway.calls("list_bookmarks"), 0);
    assert!(!store.is_loaded());
  }

  #[tokio::test]
  async fn failed_load_can_be_retried() {
    let gateway = RecordingGateway::new(MemoryGateway::new());
    gateway.fail("list_bookmarks");
    let store = BookmarkStore::new(gateway.clone(), StaticTokenProvider::signed_in());

    assert!(store.load_bookmarks().await.is_err());
    assert!(!store.is_loaded());

    gateway.unfail("list_bookmarks");
    store.load_bookmarks().await.unwrap();

    assert!(store.is_loaded());
    assert_eq!(gateway.calls("list_bookmarks"), 2);
  }

  #[tokio::test]
  async fn toggling_keeps_ids_and_records_in_step() {
    let gateway = RecordingGateway::new(MemoryGateway::new());
    seed_card(gateway.inner(), "w1");
    seed_card(gateway.inner(), "w2");
    let store = BookmarkStore::new(gateway.clone(), StaticTokenProvider::signed_in());
    store.load_bookmarks().await.unwrap();

    assert!(store.toggle_bookmark("w1").await.unwrap());
    assert_eq!(store.bookmarked_card_ids(), projection(&store));

    assert!(store.toggle_bookmark("w2").await.unwrap());
    assert_eq!(store.bookmarked_card_ids(), projection(&store));

    assert!(!store.toggle_bookmark("w1").await.unwrap());
    assert_eq!(store.bookmarked_card_ids(), projection(&store));

    assert!(store.is_bookmarked("w2"));
    assert!(!store.is_bookmarked("w1"));
  }

  #[tokio::test]
  async fn failed_toggle_leaves_membership_unchanged() {
    let gateway = RecordingGateway::new(MemoryGateway::new());
    seed_card(gateway.inner(), "w1");
    let store = BookmarkStore::new(gateway.clone(), StaticTokenProvider::signed_in());
    store.load_bookmarks().await.unwrap();

    gateway.fail("create_bookmark");
    assert!(store.toggle_bookmark("w1").await.is_err());

    assert!(!store.is_bookmarked("w1"));
    assert!(store.bookmarks().is_empty());
    assert!(store.error().is_some());
  }

  #[tokio::test]
  async fn failed_untoggle_keeps_the_bookmark() {
    let gateway = RecordingGateway::new(MemoryGateway::new());
    seed_card(gateway.inner(), "w1");
    let store = BookmarkStore::new(gateway.clone(), StaticTokenProvider::signed_in());
    store.load_bookmarks().await.unwrap();
    store.toggle_bookmark("w1").await.unwrap();

    gateway.fail("delete_bookmark_by_card");
    assert!(store.toggle_bookmark("w1").await.is_err());

    assert!(store.is_bookmarked("w1"));
    assert_eq!(store.bookmarked_card_ids(), projection(&store));
  }

  #[tokio::test]
  async fn is_bookmarked_never_fetches() {
    let gateway = RecordingGateway::new(MemoryGateway::new());
    let store = BookmarkStore::new(gateway.clone(), StaticTokenProvider::signed_in());

    assert!(!store.is_bookmarked("w1"));

    assert_eq!(gateway.calls("list_bookmarks"), 0);
    assert_eq!(gateway.calls("bookmark_exists"), 0);
  }
}
