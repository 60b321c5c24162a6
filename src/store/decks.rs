//! Deck and card cache with fetch/mutate orchestration.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, warn};

use super::{RequestGuard, SessionStore};
use crate::api::types::{CardPayload, DeckDraft, DeckPatch};
use crate::api::{ApiError, WordbookGateway};
use crate::auth::TokenProvider;
use crate::models::{Card, Deck};

/// Cache key for the combined owned+public fetch.
const DECKS_KEY: &str = "decks";

fn words_key(deck_id: &str) -> String {
  format!("words:{}", deck_id)
}

#[derive(Default)]
struct DeckState {
  owned: Vec<Deck>,
  public: Vec<Deck>,
  /// Owned ∪ public, owned first, deduplicated by id.
  all: Vec<Deck>,
  /// Card lists keyed by deck id, sorted by `created_at` ascending.
  /// An entry exists only after a successful fetch and is dropped only on
  /// deck deletion; a populated list stays readable while refreshes run.
  words: HashMap<String, Vec<Card>>,
  /// Stamp of the last successful combined fetch. Owned/public fetched
  /// individually do not refresh it.
  combined_fetched_at: Option<DateTime<Utc>>,
  in_flight: u32,
  error: Option<String>,
  requests: RequestGuard,
}

impl DeckState {
  fn rebuild_all(&mut self) {
    let mut all = self.owned.clone();
    for deck in &self.public {
      if !all.iter().any(|d| d.id == deck.id) {
        all.push(deck.clone());
      }
    }
    self.all = all;
  }
}

/// Result of opening a deck's detail view.
#[derive(Debug, Clone)]
pub struct DeckViewData {
  /// Display name, empty when the owned list does not contain the deck.
  pub name: String,
  pub cards: Vec<Card>,
}

/// Single source of truth for deck and card collections.
///
/// All reads the view performs and all writes it requests go through here.
/// Mutations call the gateway first and reconcile the cache only on
/// confirmed success; a failure surfaces through [`DeckStore::error`] and
/// leaves the cache untouched.
#[derive(Clone)]
pub struct DeckStore {
  gateway: Arc<dyn WordbookGateway>,
  tokens: Arc<dyn TokenProvider>,
  /// Freshness window for the combined owned+public fetch. Card lists have
  /// no TTL; they are invalidated by the mutations that go through this
  /// store.
  stale_after: Duration,
  state: Arc<Mutex<DeckState>>,
}

impl DeckStore {
  pub fn new(gateway: Arc<dyn WordbookGateway>, tokens: Arc<dyn TokenProvider>) -> Self {
    Self {
      gateway,
      tokens,
      stale_after: Duration::minutes(5),
      state: Arc::new(Mutex::new(DeckState::default())),
    }
  }

  /// Override the freshness window for the combined fetch.
  pub fn with_stale_after(mut self, stale_after: Duration) -> Self {
    self.stale_after = stale_after;
    self
  }

  // ----------------------------------------------------------------------
  // Reads: snapshots only, never a fetch.
  // ----------------------------------------------------------------------

  pub fn owned_decks(&self) -> Vec<Deck> {
    self.state.lock().unwrap().owned.clone()
  }

  pub fn public_decks(&self) -> Vec<Deck> {
    self.state.lock().unwrap().public.clone()
  }

  pub fn all_decks(&self) -> Vec<Deck> {
    self.state.lock().unwrap().all.clone()
  }

  /// Cached card list for a deck, `None` until the first successful fetch.
  pub fn words_in_deck(&self, deck_id: &str) -> Option<Vec<Card>> {
    self.state.lock().unwrap().words.get(deck_id).cloned()
  }

  /// Name of a deck, looked up in the owned list first.
  pub fn deck_name(&self, deck_id: &str) -> Option<String> {
    let state = self.state.lock().unwrap();
    state
      .owned
      .iter()
      .chain(state.all.iter())
      .find(|d| d.id == deck_id)
      .map(|d| d.name.clone())
  }

  pub fn is_loading(&self) -> bool {
    self.state.lock().unwrap().in_flight > 0
  }

  pub fn error(&self) -> Option<String> {
    self.state.lock().unwrap().error.clone()
  }

  pub fn clear_error(&self) {
    self.state.lock().unwrap().error = None;
  }

  /// Drop every cached collection and flag. Used on logout and in tests.
  pub fn reset(&self) {
    *self.state.lock().unwrap() = DeckState::default();
  }

  // ----------------------------------------------------------------------
  // Fetches
  // ----------------------------------------------------------------------

  /// Replace the owned collection with the gateway's response.
  ///
  /// On failure the prior cache is left untouched and the error recorded;
  /// there is no automatic retry.
  pub async fn fetch_owned_decks(&self) -> Result<(), ApiError> {
    let token = self.token()?;
    self.begin();

    let result = self.gateway.list_owned_decks(&token).await;

    let mut state = self.state.lock().unwrap();
    state.in_flight -= 1;
    match result {
      Ok(decks) => {
        state.owned = decks;
        state.rebuild_all();
        state.error = None;
        Ok(())
      }
      Err(error) => {
        state.error = Some(error.to_string());
        Err(error)
      }
    }
  }

  /// Same contract as [`DeckStore::fetch_owned_decks`], for the public
  /// collection.
  pub async fn fetch_public_decks(&self) -> Result<(), ApiError> {
    let token = self.token()?;
    self.begin();

    let result = self.gateway.list_public_decks(&token).await;

    let mut state = self.state.lock().unwrap();
    state.in_flight -= 1;
    match result {
      Ok(decks) => {
        state.public = decks;
        state.rebuild_all();
        state.error = None;
        Ok(())
      }
      Err(error) => {
        state.error = Some(error.to_string());
        Err(error)
      }
    }
  }

  /// Combined owned+public fetch behind the freshness gate.
  ///
  /// A non-empty union fetched within the freshness window is returned
  /// as-is with no gateway traffic. Otherwise both halves are fetched
  /// concurrently; a failed half degrades to an empty list for that half
  /// instead of aborting the other. The stamp is renewed whenever at least
  /// one half succeeded.
  pub async fn fetch_all_decks(&self) -> Result<Vec<Deck>, ApiError> {
    {
      let state = self.state.lock().unwrap();
      if let Some(fetched_at) = state.combined_fetched_at {
        if Utc::now() - fetched_at < self.stale_after && !state.all.is_empty() {
          debug!("combined deck cache is fresh, serving {} decks", state.all.len());
          return Ok(state.all.clone());
        }
      }
    }

    let token = self.token()?;
    let seq = {
      let mut state = self.state.lock().unwrap();
      state.in_flight += 1;
      state.requests.begin(DECKS_KEY)
    };

    let (owned_result, public_result) = futures::join!(
      self.gateway.list_owned_decks(&token),
      self.gateway.list_public_decks(&token),
    );

    let mut state = self.state.lock().unwrap();
    state.in_flight -= 1;

    if !state.requests.is_current(DECKS_KEY, seq) {
      warn!("discarding superseded combined deck fetch");
      return Ok(state.all.clone());
    }

    let state = &mut *state;
    match (owned_result, public_result) {
      (Err(owned_error), Err(public_error)) => {
        debug!(%public_error, "both halves of the combined fetch failed");
        state.error = Some(owned_error.to_string());
        Err(owned_error)
      }
      (owned_result, public_result) => {
        let mut half_failure = None;
        state.owned = owned_result.unwrap_or_else(|error| {
          half_failure = Some(error.to_string());
          Vec::new()
        });
        state.public = public_result.unwrap_or_else(|error| {
          half_failure = Some(error.to_string());
          Vec::new()
        });
        state.rebuild_all();
        state.combined_fetched_at = Some(Utc::now());
        state.error = half_failure;

        debug!(
          owned = state.owned.len(),
          public = state.public.len(),
          "combined deck fetch reconciled"
        );
        Ok(state.all.clone())
      }
    }
  }

  /// Cache-first read of one deck's card list; fetches only on a miss.
  pub async fn ensure_words_loaded(&self, deck_id: &str) -> Result<Vec<Card>, ApiError> {
    if let Some(cards) = self.words_in_deck(deck_id) {
      return Ok(cards);
    }
    self.refresh_words(deck_id).await
  }

  /// Unconditional card-list fetch for a deck.
  ///
  /// Completions that are no longer the latest issued request for the deck
  /// are discarded, so a slow response cannot repopulate a deck that was
  /// deleted or clobber a later refresh.
  pub async fn refresh_words(&self, deck_id: &str) -> Result<Vec<Card>, ApiError> {
    let token = self.token()?;
    let key = words_key(deck_id);
    let seq = {
      let mut state = self.state.lock().unwrap();
      state.in_flight += 1;
      state.requests.begin(&key)
    };

    let result = self.gateway.list_cards(deck_id, &token).await;

    let mut state = self.state.lock().unwrap();
    state.in_flight -= 1;
    match result {
      Ok(mut cards) => {
        if !state.requests.is_current(&key, seq) {
          warn!(deck_id, "discarding superseded card fetch");
          return Ok(state.words.get(deck_id).cloned().unwrap_or_default());
        }
        sort_cards(&mut cards);
        state.words.insert(deck_id.to_string(), cards.clone());
        state.error = None;
        Ok(cards)
      }
      Err(error) => {
        state.error = Some(error.to_string());
        Err(error)
      }
    }
  }

  /// Composite read for opening a deck's detail view: selects the deck,
  /// populates the owned list on first load, resolves the display name,
  /// and ensures the deck's cards are cached.
  ///
  /// The owned list not containing the deck is not a fault; the name
  /// degrades to an empty string.
  pub async fn initialize_deck_data(
    &self,
    session: &SessionStore,
    deck_id: &str,
  ) -> Result<DeckViewData, ApiError> {
    session.select_deck(deck_id);

    if self.owned_decks().is_empty() {
      if let Err(error) = self.fetch_owned_decks().await {
        debug!(%error, "owned-deck fetch failed while opening deck, continuing without names");
      }
    }

    let name = self.deck_name(deck_id).unwrap_or_default();
    let cards = self.ensure_words_loaded(deck_id).await?;
    Ok(DeckViewData { name, cards })
  }

  // ----------------------------------------------------------------------
  // Deck mutations
  // ----------------------------------------------------------------------

  /// Create a wordbook, then re-fetch the owned collection so the cache
  /// picks up the server-assigned id and timestamps.
  pub async fn create_deck(&self, draft: &DeckDraft) -> Result<Deck, ApiError> {
    if draft.name.trim().is_empty() {
      return Err(self.fail(ApiError::Validation("wordbook name is required".into())));
    }
    let token = self.token()?;
    self.begin();

    let result = self.gateway.create_deck(draft, &token).await;

    let created = {
      let mut state = self.state.lock().unwrap();
      state.in_flight -= 1;
      match result {
        Ok(deck) => {
          state.error = None;
          deck
        }
        Err(error) => {
          state.error = Some(error.to_string());
          return Err(error);
        }
      }
    };

    if let Err(error) = self.fetch_owned_decks().await {
      warn!(%error, "owned-deck refetch after create failed");
    }
    Ok(created)
  }

  /// Partial update. On success the confirmed deck is merged field-by-field
  /// into every collection holding it; on failure nothing changes locally.
  pub async fn update_deck(&self, deck_id: &str, patch: &DeckPatch) -> Result<Deck, ApiError> {
    let token = self.token()?;
    self.begin();

    let result = self.gateway.update_deck(deck_id, patch, &token).await;

    let mut state = self.state.lock().unwrap();
    state.in_flight -= 1;
    let state = &mut *state;
    match result {
      Ok(updated) => {
        for collection in [&mut state.owned, &mut state.public, &mut state.all] {
          if let Some(deck) = collection.iter_mut().find(|d| d.id == updated.id) {
            merge_deck(deck, &updated);
          }
        }
        state.error = None;
        Ok(updated)
      }
      Err(error) => {
        state.error = Some(error.to_string());
        Err(error)
      }
    }
  }

  /// Delete a wordbook. On success the deck leaves every collection and its
  /// card-cache entry is dropped in the same transition; any in-flight card
  /// fetch for it is superseded. On failure the cache is untouched and the
  /// caller must not assume deletion happened.
  pub async fn delete_deck(&self, deck_id: &str) -> Result<(), ApiError> {
    let token = self.token()?;
    self.begin();

    let result = self.gateway.delete_deck(deck_id, &token).await;

    let mut state = self.state.lock().unwrap();
    state.in_flight -= 1;
    match result {
      Ok(()) => {
        state.owned.retain(|d| d.id != deck_id);
        state.public.retain(|d| d.id != deck_id);
        state.all.retain(|d| d.id != deck_id);
        state.words.remove(deck_id);
        state.requests.invalidate(&words_key(deck_id));
        state.error = None;
        debug!(deck_id, "deck removed from all collections");
        Ok(())
      }
      Err(error) => {
        state.error = Some(error.to_string());
        Err(error)
      }
    }
  }

  /// Create a copy of an existing wordbook. The copy is always private
  /// regardless of the source's visibility or the draft's flag.
  pub async fn duplicate_deck(&self, source_id: &str, draft: &DeckDraft) -> Result<Deck, ApiError> {
    if draft.name.trim().is_empty() {
      return Err(self.fail(ApiError::Validation("wordbook name is required".into())));
    }
    let draft = DeckDraft {
      is_public: false,
      ..draft.clone()
    };
    let token = self.token()?;
    self.begin();

    let result = self.gateway.duplicate_deck(source_id, &draft, &token).await;

    let copy = {
      let mut state = self.state.lock().unwrap();
      state.in_flight -= 1;
      match result {
        Ok(deck) => {
          state.error = None;
          deck
        }
        Err(error) => {
          state.error = Some(error.to_string());
          return Err(error);
        }
      }
    };

    if let Err(error) = self.fetch_owned_decks().await {
      warn!(%error, "owned-deck refetch after duplicate failed");
    }
    Ok(copy)
  }

  // ----------------------------------------------------------------------
  // Card mutations: gateway first, then re-fetch the deck's card list.
  // Re-fetch-after-write trades a round trip for consistency; the cached
  // list is never patched ahead of confirmation.
  // ----------------------------------------------------------------------

  pub async fn add_card(&self, deck_id: &str, payload: &CardPayload) -> Result<Card, ApiError> {
    if payload.english.trim().is_empty() {
      return Err(self.fail(ApiError::Validation("word is required".into())));
    }
    let token = self.token()?;
    self.begin();

    let result = self.gateway.create_card(deck_id, payload, &token).await;
    let card = self.finish_card_mutation(result)?;

    self.refresh_words(deck_id).await?;
    Ok(card)
  }

  pub async fn update_card(
    &self,
    deck_id: &str,
    card_id: &str,
    payload: &CardPayload,
  ) -> Result<Card, ApiError> {
    if payload.english.trim().is_empty() {
      return Err(self.fail(ApiError::Validation("word is required".into())));
    }
    let token = self.token()?;
    self.begin();

    let result = self.gateway.update_card(card_id, payload, &token).await;
    let card = self.finish_card_mutation(result)?;

    self.refresh_words(deck_id).await?;
    Ok(card)
  }

  pub async fn delete_card(&self, deck_id: &str, card_id: &str) -> Result<(), ApiError> {
    let token = self.token()?;
    self.begin();

    let result = self.gateway.delete_card(card_id, &token).await;
    self.finish_card_mutation(result)?;

    self.refresh_words(deck_id).await?;
    Ok(())
  }

  // ----------------------------------------------------------------------
  // Internals
  // ----------------------------------------------------------------------

  fn token(&self) -> Result<String, ApiError> {
    match self.tokens.current_token() {
      Some(token) => Ok(token),
      None => Err(self.fail(ApiError::AuthRequired)),
    }
  }

  fn begin(&self) {
    self.state.lock().unwrap().in_flight += 1;
  }

  fn fail(&self, error: ApiError) -> ApiError {
    self.state.lock().unwrap().error = Some(error.to_string());
    error
  }

  fn finish_card_mutation<T>(&self, result: Result<T, ApiError>) -> Result<T, ApiError> {
    let mut state = self.state.lock().unwrap();
    state.in_flight -= 1;
    match result {
      Ok(value) => {
        state.error = None;
        Ok(value)
      }
      Err(error) => {
        state.error = Some(error.to_string());
        Err(error)
      }
    }
  }
}

/// Stable sort by creation time; the gateway's response order breaks ties.
fn sort_cards(cards: &mut [Card]) {
  cards.sort_by_key(|c| c.created_at);
}

/// Field-level merge of a confirmed update into a cached deck. Fields the
/// update response omits (the owner display name outside public listings)
/// survive from the cached copy.
fn merge_deck(existing: &mut Deck, updated: &Deck) {
  let owner_display_name = existing.owner_display_name.take();
  *existing = updated.clone();
  if existing.owner_display_name.is_none() {
    existing.owner_display_name = owner_display_name;
  }
}
