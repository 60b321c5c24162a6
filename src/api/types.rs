//! Wire shapes for requests and responses that are not domain entities.

use serde::{Deserialize, Serialize};

use crate::models::{Definition, ExampleSentence, Phonetics};

/// Body for creating or duplicating a wordbook.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeckDraft {
  pub name: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  pub is_public: bool,
}

/// Partial update for a wordbook. Omitted fields are left untouched
/// by the server.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DeckPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_public: Option<bool>,
}

/// Body for creating or replacing a card.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CardPayload {
  pub english: String,
  pub definitions: Vec<Definition>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub synonyms: Vec<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub example_sentences: Vec<ExampleSentence>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub phonetics: Option<Phonetics>,
}

/// Partial update for user settings.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SettingsPatch {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub flip_animation: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub simple_card_mode: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
  CreatedAt,
  UpdatedAt,
  NumWords,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
  Asc,
  Desc,
}

/// Query parameters for wordbook search.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchQuery {
  #[serde(skip_serializing_if = "Option::is_none")]
  pub q: Option<String>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_public: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub is_owned: Option<bool>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub min_words: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sort_by: Option<SortBy>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub sort_order: Option<SortOrder>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub page: Option<u32>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub limit: Option<u32>,
}

/// Default page size the server applies when `limit` is omitted.
pub const DEFAULT_SEARCH_LIMIT: u32 = 20;

/// Paged search response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
  pub wordbooks: Vec<crate::models::Deck>,
  pub total: u32,
  pub page: u32,
  pub total_pages: u32,
  pub has_next: bool,
  pub has_prev: bool,
  pub query: Option<String>,
}

/// Error body the server returns alongside non-2xx statuses.
#[derive(Debug, Deserialize)]
pub struct ErrorBody {
  pub error: String,
}

/// Response for the bookmark existence check.
#[derive(Debug, Deserialize)]
pub struct ExistsResponse {
  pub exists: bool,
}
