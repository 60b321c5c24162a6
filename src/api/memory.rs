//! In-memory gateway used by `--offline` mode and the test suite.
//!
//! Behaves like a well-formed server: assigns ids and timestamps, keeps
//! `num_words` in step with card mutations, and cascades deck deletion to
//! cards and their bookmarks.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::error::ApiError;
use super::types::{
  CardPayload, DeckDraft, DeckPatch, SearchQuery, SearchResponse, SettingsPatch, SortBy,
  SortOrder, DEFAULT_SEARCH_LIMIT,
};
use super::WordbookGateway;
use crate::models::{Bookmark, Card, Deck, Definition, UserProfile, UserSettings};

const USER_ID: &str = "local-user";

#[derive(Default)]
struct MemoryState {
  decks: Vec<Deck>,
  owned_ids: HashSet<String>,
  cards: Vec<Card>,
  bookmarks: Vec<Bookmark>,
  profile: Option<UserProfile>,
  settings: Option<UserSettings>,
  next_id: u64,
}

impl MemoryState {
  fn next_id(&mut self, prefix: &str) -> String {
    self.next_id += 1;
    format!("{}-{}", prefix, self.next_id)
  }

  fn deck_mut(&mut self, deck_id: &str) -> Result<&mut Deck, ApiError> {
    self
      .decks
      .iter_mut()
      .find(|d| d.id == deck_id)
      .ok_or_else(|| ApiError::NotFound(format!("wordbook {}", deck_id)))
  }

  fn bump_num_words(&mut self, deck_id: &str) {
    let count = self.cards.iter().filter(|c| c.wordbook_id == deck_id).count() as u32;
    if let Some(deck) = self.decks.iter_mut().find(|d| d.id == deck_id) {
      deck.num_words = count;
      deck.updated_at = Utc::now();
    }
  }
}

pub struct MemoryGateway {
  state: Mutex<MemoryState>,
}

impl Default for MemoryGateway {
  fn default() -> Self {
    Self::new()
  }
}

impl MemoryGateway {
  pub fn new() -> Self {
    Self {
      state: Mutex::new(MemoryState::default()),
    }
  }

  /// Insert a deck as server-side state, bypassing the create endpoint.
  pub fn seed_deck(&self, deck: Deck, owned: bool) {
    let mut state = self.state.lock().unwrap();
    if owned {
      state.owned_ids.insert(deck.id.clone());
    }
    state.decks.push(deck);
  }

  /// Insert a card as server-side state, keeping `num_words` in step.
  pub fn seed_card(&self, card: Card) {
    let mut state = self.state.lock().unwrap();
    let deck_id = card.wordbook_id.clone();
    state.cards.push(card);
    state.bump_num_words(&deck_id);
  }

  /// A gateway pre-populated with a couple of wordbooks, for offline mode.
  pub fn with_sample_data() -> Self {
    let gateway = Self::new();
    {
      let mut state = gateway.state.lock().unwrap();
      let base = Utc::now() - Duration::days(7);

      let toeic = Deck {
        id: "wb-sample-1".to_string(),
        name: "TOEIC core".to_string(),
        description: Some("High-frequency TOEIC vocabulary".to_string()),
        is_public: false,
        num_words: 2,
        created_at: base,
        updated_at: base,
        owner_display_name: None,
      };
      let travel = Deck {
        id: "wb-sample-2".to_string(),
        name: "Travel phrases".to_string(),
        description: None,
        is_public: true,
        num_words: 1,
        created_at: base + Duration::days(1),
        updated_at: base + Duration::days(1),
        owner_display_name: Some("demo".to_string()),
      };
      state.owned_ids.insert(toeic.id.clone());
      state.owned_ids.insert(travel.id.clone());

      state.cards.push(sample_card(
        "w-sample-1",
        &toeic.id,
        "deadline",
        "名詞",
        &["締め切り", "期限"],
        base,
      ));
      state.cards.push(sample_card(
        "w-sample-2",
        &toeic.id,
        "postpone",
        "動詞",
        &["延期する"],
        base + Duration::hours(1),
      ));
      state.cards.push(sample_card(
        "w-sample-3",
        &travel.id,
        "itinerary",
        "名詞",
        &["旅程"],
        base + Duration::days(1),
      ));

      state.decks.push(toeic);
      state.decks.push(travel);
    }
    gateway
  }
}

fn sample_card(
  id: &str,
  deck_id: &str,
  english: &str,
  part_of_speech: &str,
  japanese: &[&str],
  created_at: chrono::DateTime<Utc>,
) -> Card {
  Card {
    id: id.to_string(),
    english: english.to_string(),
    definitions: vec![Definition {
      part_of_speech: part_of_speech.to_string(),
      japanese: japanese.iter().map(|j| j.to_string()).collect(),
    }],
    synonyms: Vec::new(),
    example_sentences: Vec::new(),
    phonetics: None,
    wordbook_id: deck_id.to_string(),
    created_at,
    updated_at: created_at,
  }
}

#[async_trait]
impl WordbookGateway for MemoryGateway {
  async fn list_owned_decks(&self, _token: &str) -> Result<Vec<Deck>, ApiError> {
    let state = self.state.lock().unwrap();
    Ok(
      state
        .decks
        .iter()
        .filter(|d| state.owned_ids.contains(&d.id))
        .cloned()
        .collect(),
    )
  }

  async fn list_public_decks(&self, _token: &str) -> Result<Vec<Deck>, ApiError> {
    let state = self.state.lock().unwrap();
    Ok(state.decks.iter().filter(|d| d.is_public).cloned().collect())
  }

  async fn get_deck(&self, deck_id: &str, _token: &str) -> Result<Deck, ApiError> {
    let state = self.state.lock().unwrap();
    state
      .decks
      .iter()
      .find(|d| d.id == deck_id)
      .cloned()
      .ok_or_else(|| ApiError::NotFound(format!("wordbook {}", deck_id)))
  }

  async fn search_decks(
    &self,
    query: &SearchQuery,
    _token: &str,
  ) -> Result<SearchResponse, ApiError> {
    let state = self.state.lock().unwrap();

    let needle = query.q.as_deref().unwrap_or("").to_lowercase();
    let mut hits: Vec<Deck> = state
      .decks
      .iter()
      .filter(|d| {
        if !needle.is_empty() {
          let in_name = d.name.to_lowercase().contains(&needle);
          let in_description = d
            .description
            .as_deref()
            .map(|s| s.to_lowercase().contains(&needle))
            .unwrap_or(false);
          if !in_name && !in_description {
            return false;
          }
        }
        if let Some(is_public) = query.is_public {
          if d.is_public != is_public {
            return false;
          }
        }
        if let Some(is_owned) = query.is_owned {
          if state.owned_ids.contains(&d.id) != is_owned {
            return false;
          }
        }
        if let Some(min_words) = query.min_words {
          if d.num_words < min_words {
            return false;
          }
        }
        true
      })
      .cloned()
      .collect();

    match query.sort_by.unwrap_or(SortBy::CreatedAt) {
      SortBy::CreatedAt => hits.sort_by_key(|d| d.created_at),
      SortBy::UpdatedAt => hits.sort_by_key(|d| d.updated_at),
      SortBy::NumWords => hits.sort_by_key(|d| d.num_words),
    }
    if query.sort_order.unwrap_or(SortOrder::Asc) == SortOrder::Desc {
      hits.reverse();
    }

    let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT).max(1);
    let page = query.page.unwrap_or(1).max(1);
    let total = hits.len() as u32;
    let total_pages = total.div_ceil(limit).max(1);
    let start = ((page - 1) * limit) as usize;
    let wordbooks: Vec<Deck> = hits.into_iter().skip(start).take(limit as usize).collect();

    Ok(SearchResponse {
      wordbooks,
      total,
      page,
      total_pages,
      has_next: page < total_pages,
      has_prev: page > 1,
      query: query.q.clone(),
    })
  }

  async fn create_deck(&self, draft: &DeckDraft, _token: &str) -> Result<Deck, ApiError> {
    let mut state = self.state.lock().unwrap();
    let now = Utc::now();
    let deck = Deck {
      id: state.next_id("wb"),
      name: draft.name.clone(),
      description: draft.description.clone(),
      is_public: draft.is_public,
      num_words: 0,
      created_at: now,
      updated_at: now,
      owner_display_name: None,
    };
    state.owned_ids.insert(deck.id.clone());
    state.decks.push(deck.clone());
    Ok(deck)
  }

  async fn update_deck(
    &self,
    deck_id: &str,
    patch: &DeckPatch,
    _token: &str,
  ) -> Result<Deck, ApiError> {
    let mut state = self.state.lock().unwrap();
    let deck = state.deck_mut(deck_id)?;
    if let Some(name) = &patch.name {
      deck.name = name.clone();
    }
    if let Some(description) = &patch.description {
      deck.description = Some(description.clone());
    }
    if let Some(is_public) = patch.is_public {
      deck.is_public = is_public;
    }
    deck.updated_at = Utc::now();
    Ok(deck.clone())
  }

  async fn delete_deck(&self, deck_id: &str, _token: &str) -> Result<(), ApiError> {
    let mut state = self.state.lock().unwrap();
    if !state.decks.iter().any(|d| d.id == deck_id) {
      return Err(ApiError::NotFound(format!("wordbook {}", deck_id)));
    }
    state.decks.retain(|d| d.id != deck_id);
    state.owned_ids.remove(deck_id);
    let removed: HashSet<String> = state
      .cards
      .iter()
      .filter(|c| c.wordbook_id == deck_id)
      .map(|c| c.id.clone())
      .collect();
    state.cards.retain(|c| c.wordbook_id != deck_id);
    state.bookmarks.retain(|b| !removed.contains(&b.card_id));
    Ok(())
  }

  async fn duplicate_deck(
    &self,
    source_id: &str,
    draft: &DeckDraft,
    _token: &str,
  ) -> Result<Deck, ApiError> {
    let mut state = self.state.lock().unwrap();
    let source = state
      .decks
      .iter()
      .find(|d| d.id == source_id)
      .cloned()
      .ok_or_else(|| ApiError::NotFound(format!("wordbook {}", source_id)))?;

    let now = Utc::now();
    let copy = Deck {
      id: state.next_id("wb"),
      name: draft.name.clone(),
      description: draft.description.clone().or(source.description),
      is_public: draft.is_public,
      num_words: source.num_words,
      created_at: now,
      updated_at: now,
      owner_display_name: None,
    };

    let source_cards: Vec<Card> = state
      .cards
      .iter()
      .filter(|c| c.wordbook_id == source_id)
      .cloned()
      .collect();
    for card in source_cards {
      let id = state.next_id("w");
      state.cards.push(Card {
        id,
        wordbook_id: copy.id.clone(),
        ..card
      });
    }

    state.owned_ids.insert(copy.id.clone());
    state.decks.push(copy.clone());
    Ok(copy)
  }

  async fn list_cards(&self, deck_id: &str, _token: &str) -> Result<Vec<Card>, ApiError> {
    let state = self.state.lock().unwrap();
    Ok(
      state
        .cards
        .iter()
        .filter(|c| c.wordbook_id == deck_id)
        .cloned()
        .collect(),
    )
  }

  async fn create_card(
    &self,
    deck_id: &str,
    payload: &CardPayload,
    _token: &str,
  ) -> Result<Card, ApiError> {
    let mut state = self.state.lock().unwrap();
    if !state.decks.iter().any(|d| d.id == deck_id) {
      return Err(ApiError::NotFound(format!("wordbook {}", deck_id)));
    }
    let now = Utc::now();
    let card = Card {
      id: state.next_id("w"),
      english: payload.english.clone(),
      definitions: payload.definitions.clone(),
      synonyms: payload.synonyms.clone(),
      example_sentences: payload.example_sentences.clone(),
      phonetics: payload.phonetics.clone(),
      wordbook_id: deck_id.to_string(),
      created_at: now,
      updated_at: now,
    };
    state.cards.push(card.clone());
    state.bump_num_words(deck_id);
    Ok(card)
  }

  async fn update_card(
    &self,
    card_id: &str,
    payload: &CardPayload,
    _token: &str,
  ) -> Result<Card, ApiError> {
    let mut state = self.state.lock().unwrap();
    let card = state
      .cards
      .iter_mut()
      .find(|c| c.id == card_id)
      .ok_or_else(|| ApiError::NotFound(format!("word {}", card_id)))?;
    card.english = payload.english.clone();
    card.definitions = payload.definitions.clone();
    card.synonyms = payload.synonyms.clone();
    card.example_sentences = payload.example_sentences.clone();
    card.phonetics = payload.phonetics.clone();
    card.updated_at = Utc::now();
    Ok(card.clone())
  }

  async fn delete_card(&self, card_id: &str, _token: &str) -> Result<(), ApiError> {
    let mut state = self.state.lock().unwrap();
    let deck_id = state
      .cards
      .iter()
      .find(|c| c.id == card_id)
      .map(|c| c.wordbook_id.clone())
      .ok_or_else(|| ApiError::NotFound(format!("word {}", card_id)))?;
    state.cards.retain(|c| c.id != card_id);
    state.bookmarks.retain(|b| b.card_id != card_id);
    state.bump_num_words(&deck_id);
    Ok(())
  }

  async fn list_bookmarks(&self, _token: &str) -> Result<Vec<Bookmark>, ApiError> {
    let state = self.state.lock().unwrap();
    Ok(state.bookmarks.clone())
  }

  async fn create_bookmark(&self, card_id: &str, _token: &str) -> Result<Bookmark, ApiError> {
    let mut state = self.state.lock().unwrap();
    if let Some(existing) = state.bookmarks.iter().find(|b| b.card_id == card_id) {
      return Ok(existing.clone());
    }
    let bookmark = Bookmark {
      id: state.next_id("bm"),
      card_id: card_id.to_string(),
      user_id: USER_ID.to_string(),
      created_at: Utc::now(),
    };
    state.bookmarks.push(bookmark.clone());
    Ok(bookmark)
  }

  async fn delete_bookmark(&self, bookmark_id: &str, _token: &str) -> Result<(), ApiError> {
    let mut state = self.state.lock().unwrap();
    let before = state.bookmarks.len();
    state.bookmarks.retain(|b| b.id != bookmark_id);
    if state.bookmarks.len() == before {
      return Err(ApiError::NotFound(format!("bookmark {}", bookmark_id)));
    }
    Ok(())
  }

  async fn delete_bookmark_by_card(&self, card_id: &str, _token: &str) -> Result<(), ApiError> {
    let mut state = self.state.lock().unwrap();
    let before = state.bookmarks.len();
    state.bookmarks.retain(|b| b.card_id != card_id);
    if state.bookmarks.len() == before {
      return Err(ApiError::NotFound(format!("bookmark for word {}", card_id)));
    }
    Ok(())
  }

  async fn bookmark_exists(&self, card_id: &str, _token: &str) -> Result<bool, ApiError> {
    let state = self.state.lock().unwrap();
    Ok(state.bookmarks.iter().any(|b| b.card_id == card_id))
  }

  async fn get_profile(&self, _token: &str) -> Result<UserProfile, ApiError> {
    let state = self.state.lock().unwrap();
    Ok(state.profile.clone().unwrap_or(UserProfile {
      display_name: "demo".to_string(),
    }))
  }

  async fn update_profile(
    &self,
    profile: &UserProfile,
    _token: &str,
  ) -> Result<UserProfile, ApiError> {
    let mut state = self.state.lock().unwrap();
    state.profile = Some(profile.clone());
    Ok(profile.clone())
  }

  async fn get_settings(&self, _token: &str) -> Result<UserSettings, ApiError> {
    let state = self.state.lock().unwrap();
    Ok(state.settings.clone().unwrap_or(UserSettings {
      flip_animation: true,
      simple_card_mode: false,
    }))
  }

  async fn update_settings(
    &self,
    patch: &SettingsPatch,
    _token: &str,
  ) -> Result<UserSettings, ApiError> {
    let mut state = self.state.lock().unwrap();
    let mut settings = state.settings.clone().unwrap_or(UserSettings {
      flip_animation: true,
      simple_card_mode: false,
    });
    if let Some(flip_animation) = patch.flip_animation {
      settings.flip_animation = flip_animation;
    }
    if let Some(simple_card_mode) = patch.simple_card_mode {
      settings.simple_card_mode = simple_card_mode;
    }
    state.settings = Some(settings.clone());
    Ok(settings)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone, Utc};

  use super::*;

  const TOKEN: &str = "t";

  fn deck(id: &str, name: &str, is_public: bool, num_words: u32, day: u32) -> Deck {
    let at = Utc.with_ymd_and_hms(2025, 6, day, 0, 0, 0).unwrap();
    Deck {
      id: id.to_string(),
      name: name.to_string(),
      description: None,
      is_public,
      num_words,
      created_at: at,
      updated_at: at,
      owner_display_name: None,
    }
  }

  #[tokio::test]
  async fn get_deck_returns_seeded_state() {
    let gateway = MemoryGateway::new();
    gateway.seed_deck(deck("d1", "TOEIC", false, 0, 1), true);

    let fetched = gateway.get_deck("d1", TOKEN).await.unwrap();

    assert_eq!(fetched.name, "TOEIC");
    assert!(matches!(
      gateway.get_deck("nope", TOKEN).await,
      Err(ApiError::NotFound(_))
    ));
  }

  #[tokio::test]
  async fn search_filters_sorts_and_paginates() {
    let gateway = MemoryGateway::new();
    gateway.seed_deck(deck("d1", "TOEIC core", false, 10, 1), true);
    gateway.seed_deck(deck("d2", "TOEIC advanced", true, 40, 2), true);
    gateway.seed_deck(deck("d3", "Travel", true, 5, 3), false);

    let query = SearchQuery {
      q: Some("toeic".to_string()),
      min_words: Some(10),
      sort_by: Some(SortBy::NumWords),
      sort_order: Some(SortOrder::Desc),
      limit: Some(1),
      ..SearchQuery::default()
    };
    let response = gateway.search_decks(&query, TOKEN).await.unwrap();

    assert_eq!(response.total, 2);
    assert_eq!(response.total_pages, 2);
    assert!(response.has_next);
    assert!(!response.has_prev);
    assert_eq!(response.wordbooks.len(), 1);
    assert_eq!(response.wordbooks[0].id, "d2");
    assert_eq!(response.query.as_deref(), Some("toeic"));
  }

  #[tokio::test]
  async fn duplicate_copies_cards_under_new_ids() {
    let gateway = MemoryGateway::with_sample_data();

    let draft = DeckDraft {
      name: "TOEIC copy".to_string(),
      is_public: false,
      ..DeckDraft::default()
    };
    let copy = gateway.duplicate_deck("wb-sample-1", &draft, TOKEN).await.unwrap();

    let original = gateway.list_cards("wb-sample-1", TOKEN).await.unwrap();
    let copied = gateway.list_cards(&copy.id, TOKEN).await.unwrap();
    assert_eq!(copied.len(), original.len());
    assert!(copied.iter().all(|c| c.wordbook_id == copy.id));
    assert!(copied.iter().all(|c| original.iter().all(|o| o.id != c.id)));
  }

  #[tokio::test]
  async fn deck_deletion_cascades_to_cards_and_bookmarks() {
    let gateway = MemoryGateway::with_sample_data();
    gateway.create_bookmark("w-sample-1", TOKEN).await.unwrap();

    gateway.delete_deck("wb-sample-1", TOKEN).await.unwrap();

    assert!(gateway.list_cards("wb-sample-1", TOKEN).await.unwrap().is_empty());
    assert!(!gateway.bookmark_exists("w-sample-1", TOKEN).await.unwrap());
  }

  #[tokio::test]
  async fn bookmarks_are_a_set_per_card() {
    let gateway = MemoryGateway::with_sample_data();

    let first = gateway.create_bookmark("w-sample-1", TOKEN).await.unwrap();
    let second = gateway.create_bookmark("w-sample-1", TOKEN).await.unwrap();
    assert_eq!(first.id, second.id);

    assert!(gateway.bookmark_exists("w-sample-1", TOKEN).await.unwrap());
    gateway.delete_bookmark(&first.id, TOKEN).await.unwrap();
    assert!(!gateway.bookmark_exists("w-sample-1", TOKEN).await.unwrap());
  }

  #[tokio::test]
  async fn card_mutations_keep_num_words_in_step() {
    let gateway = MemoryGateway::new();
    gateway.seed_deck(deck("d1", "TOEIC", false, 0, 1), true);

    let payload = CardPayload {
      english: "deadline".to_string(),
      definitions: vec![Definition {
        part_of_speech: "名詞".to_string(),
        japanese: vec!["締め切り".to_string()],
      }],
      ..CardPayload::default()
    };
    let card = gateway.create_card("d1", &payload, TOKEN).await.unwrap();
    assert_eq!(gateway.get_deck("d1", TOKEN).await.unwrap().num_words, 1);

    gateway.delete_card(&card.id, TOKEN).await.unwrap();
    assert_eq!(gateway.get_deck("d1", TOKEN).await.unwrap().num_words, 0);
  }

  #[tokio::test]
  async fn sample_cards_carry_distinct_creation_times() {
    let gateway = MemoryGateway::with_sample_data();

    let cards = gateway.list_cards("wb-sample-1", TOKEN).await.unwrap();

    assert_eq!(cards.len(), 2);
    assert!(cards[1].created_at - cards[0].created_at >= Duration::hours(1));
  }
}
