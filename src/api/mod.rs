//! Remote entity gateway: request/response functions per entity family.
//!
//! The stores talk to the server exclusively through [`WordbookGateway`],
//! so tests and the `--offline` mode can substitute [`MemoryGateway`]
//! for the reqwest-backed [`HttpGateway`].

mod client;
mod error;
pub mod memory;
pub mod types;

pub use client::HttpGateway;
pub use error::ApiError;
pub use memory::MemoryGateway;

use async_trait::async_trait;

use crate::models::{Bookmark, Card, Deck, UserProfile, UserSettings};
use types::{CardPayload, DeckDraft, DeckPatch, SearchQuery, SearchResponse, SettingsPatch};

/// Gateway to the wordbook service.
///
/// Every method takes the caller's bearer token and returns either the
/// decoded payload or an [`ApiError`]. GET endpoints are idempotent;
/// POST/PUT/DELETE are not.
#[async_trait]
pub trait WordbookGateway: Send + Sync {
  // Wordbooks
  async fn list_owned_decks(&self, token: &str) -> Result<Vec<Deck>, ApiError>;
  async fn list_public_decks(&self, token: &str) -> Result<Vec<Deck>, ApiError>;
  async fn get_deck(&self, deck_id: &str, token: &str) -> Result<Deck, ApiError>;
  async fn search_decks(&self, query: &SearchQuery, token: &str)
    -> Result<SearchResponse, ApiError>;
  async fn create_deck(&self, draft: &DeckDraft, token: &str) -> Result<Deck, ApiError>;
  async fn update_deck(&self, deck_id: &str, patch: &DeckPatch, token: &str)
    -> Result<Deck, ApiError>;
  async fn delete_deck(&self, deck_id: &str, token: &str) -> Result<(), ApiError>;
  async fn duplicate_deck(&self, source_id: &str, draft: &DeckDraft, token: &str)
    -> Result<Deck, ApiError>;

  // Cards
  async fn list_cards(&self, deck_id: &str, token: &str) -> Result<Vec<Card>, ApiError>;
  async fn create_card(&self, deck_id: &str, payload: &CardPayload, token: &str)
    -> Result<Card, ApiError>;
  async fn update_card(&self, card_id: &str, payload: &CardPayload, token: &str)
    -> Result<Card, ApiError>;
  async fn delete_card(&self, card_id: &str, token: &str) -> Result<(), ApiError>;

  // Bookmarks
  async fn list_bookmarks(&self, token: &str) -> Result<Vec<Bookmark>, ApiError>;
  async fn create_bookmark(&self, card_id: &str, token: &str) -> Result<Bookmark, ApiError>;
  async fn delete_bookmark(&self, bookmark_id: &str, token: &str) -> Result<(), ApiError>;
  async fn delete_bookmark_by_card(&self, card_id: &str, token: &str) -> Result<(), ApiError>;
  async fn bookmark_exists(&self, card_id: &str, token: &str) -> Result<bool, ApiError>;

  // User
  async fn get_profile(&self, token: &str) -> Result<UserProfile, ApiError>;
  async fn update_profile(&self, profile: &UserProfile, token: &str)
    -> Result<UserProfile, ApiError>;
  async fn get_settings(&self, token: &str) -> Result<UserSettings, ApiError>;
  async fn update_settings(&self, patch: &SettingsPatch, token: &str)
    -> Result<UserSettings, ApiError>;
}
