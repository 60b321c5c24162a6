//! Test doubles for the store suites.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::api::types::{
  CardPayload, DeckDraft, DeckPatch, SearchQuery, SearchResponse, SettingsPatch,
};
use crate::api::{ApiError, MemoryGateway, WordbookGateway};
use crate::models::{Bookmark, Card, Deck, UserProfile, UserSettings};

/// Wraps [`MemoryGateway`] with per-method call counts, injected failures,
/// and injected delays, so tests can assert on traffic and interleavings.
pub(crate) struct RecordingGateway {
  inner: MemoryGateway,
  calls: Mutex<HashMap<&'static str, u32>>,
  failing: Mutex<HashSet<&'static str>>,
  delays: Mutex<HashMap<&'static str, Duration>>,
}

impl RecordingGateway {
  pub fn new(inner: MemoryGateway) -> Arc<Self> {
    Arc::new(Self {
      inner,
      calls: Mutex::new(HashMap::new()),
      failing: Mutex::new(HashSet::new()),
      delays: Mutex::new(HashMap::new()),
    })
  }

  pub fn inner(&self) -> &MemoryGateway {
    &self.inner
  }

  /// How many times `method` was called.
  pub fn calls(&self, method: &str) -> u32 {
    *self.calls.lock().unwrap().get(method).unwrap_or(&0)
  }

  /// Make every subsequent call to `method` fail until [`Self::unfail`].
  pub fn fail(&self, method: &'static str) {
    self.failing.lock().unwrap().insert(method);
  }

  pub fn unfail(&self, method: &str) {
    self.failing.lock().unwrap().remove(method);
  }

  /// Delay every subsequent call to `method` before it reaches the inner
  /// gateway.
  pub fn delay(&self, method: &'static str, delay: Duration) {
    self.delays.lock().unwrap().insert(method, delay);
  }

  async fn enter(&self, method: &'static str) -> Result<(), ApiError> {
    *self.calls.lock().unwrap().entry(method).or_insert(0) += 1;

    let delay = self.delays.lock().unwrap().get(method).copied();
    if let Some(delay) = delay {
      tokio::time::sleep(delay).await;
    }

    if self.failing.lock().unwrap().contains(method) {
      return Err(ApiError::Api {
        status: 500,
        message: format!("injected failure in {}", method),
      });
    }
    Ok(())
  }
}

#[async_trait]
impl WordbookGateway for RecordingGateway {
  async fn list_owned_decks(&self, token: &str) -> Result<Vec<Deck>, ApiError> {
    self.enter("list_owned_decks").await?;
    self.inner.list_owned_decks(token).await
  }

  async fn list_public_decks(&self, token: &str) -> Result<Vec<Deck>, ApiError> {
    self.enter("list_public_decks").await?;
    self.inner.list_public_decks(token).await
  }

  async fn get_deck(&self, deck_id: &str, token: &str) -> Result<Deck, ApiError> {
    self.enter("get_deck").await?;
    self.inner.get_deck(deck_id, token).await
  }

  async fn search_decks(
    &self,
    query: &SearchQuery,
    token: &str,
  ) -> Result<SearchResponse, ApiError> {
    self.enter("search_decks").await?;
    self.inner.search_decks(query, token).await
  }

  async fn create_deck(&self, draft: &DeckDraft, token: &str) -> Result<Deck, ApiError> {
    self.enter("create_deck").await?;
    self.inner.create_deck(draft, token).await
  }

  async fn update_deck(
    &self,
    deck_id: &str,
    patch: &DeckPatch,
    token: &str,
  ) -> Result<Deck, ApiError> {
    self.enter("update_deck").await?;
    self.inner.update_deck(deck_id, patch, token).await
  }

  async fn delete_deck(&self, deck_id: &str, token: &str) -> Result<(), ApiError> {
    self.enter("delete_deck").await?;
    self.inner.delete_deck(deck_id, token).await
  }

  async fn duplicate_deck(
    &self,
    source_id: &str,
    draft: &DeckDraft,
    token: &str,
  ) -> Result<Deck, ApiError> {
    self.enter("duplicate_deck").await?;
    self.inner.duplicate_deck(source_id, draft, token).await
  }

  async fn list_cards(&self, deck_id: &str, token: &str) -> Result<Vec<Card>, ApiError> {
    self.enter("list_cards").await?;
    self.inner.list_cards(deck_id, token).await
  }

  async fn create_card(
    &self,
    deck_id: &str,
    payload: &CardPayload,
    token: &str,
  ) -> Result<Card, ApiError> {
    self.enter("create_card").await?;
    self.inner.create_card(deck_id, payload, token).await
  }

  async fn update_card(
    &self,
    card_id: &str,
    payload: &CardPayload,
    token: &str,
  ) -> Result<Card, ApiError> {
    self.enter("update_card").await?;
    self.inner.update_card(card_id, payload, token).await
  }

  async fn delete_card(&self, card_id: &str, token: &str) -> Result<(), ApiError> {
    self.enter("delete_card").await?;
    self.inner.delete_card(card_id, token).await
  }

  async fn list_bookmarks(&self, token: &str) -> Result<Vec<Bookmark>, ApiError> {
    self.enter("list_bookmarks").await?;
    self.inner.list_bookmarks(token).await
  }

  async fn create_bookmark(&self, card_id: &str, token: &str) -> Result<Bookmark, ApiError> {
    self.enter("create_bookmark").await?;
    self.inner.create_bookmark(card_id, token).await
  }

  async fn delete_bookmark(&self, bookmark_id: &str, token: &str) -> Result<(), ApiError> {
    self.enter("delete_bookmark").await?;
    self.inner.delete_bookmark(bookmark_id, token).await
  }

  async fn delete_bookmark_by_card(&self, card_id: &str, token: &str) -> Result<(), ApiError> {
    self.enter("delete_bookmark_by_card").await?;
    self.inner.delete_bookmark_by_card(card_id, token).await
  }

  async fn bookmark_exists(&self, card_id: &str, token: &str) -> Result<bool, ApiError> {
    self.enter("bookmark_exists").await?;
    self.inner.bookmark_exists(card_id, token).await
  }

  async fn get_profile(&self, token: &str) -> Result<UserProfile, ApiError> {
    self.enter("get_profile").await?;
    self.inner.get_profile(token).await
  }

  async fn update_profile(
    &self,
    profile: &UserProfile,
    token: &str,
  ) -> Result<UserProfile, ApiError> {
    self.enter("update_profile").await?;
    self.inner.update_profile(profile, token).await
  }

  async fn get_settings(&self, token: &str) -> Result<UserSettings, ApiError> {
    self.enter("get_settings").await?;
    self.inner.get_settings(token).await
  }

  async fn update_settings(
    &self,
    patch: &SettingsPatch,
    token: &str,
  ) -> Result<UserSettings, ApiError> {
    self.enter("update_settings").await?;
    self.inner.update_settings(patch, token).await
  }
}
