use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A wordbook: a named, ownable collection of cards, optionally public.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deck {
  pub id: String,
  pub name: String,
  pub description: Option<String>,
  pub is_public: bool,
  pub num_words: u32,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  /// Display name of the owning account, when the server includes it
  /// (public listings and search results).
  #[serde(default)]
  pub owner_display_name: Option<String>,
}

/// One sense of a word: part of speech plus its Japanese glosses in order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Definition {
  pub part_of_speech: String,
  pub japanese: Vec<String>,
}

/// A bilingual example sentence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExampleSentence {
  pub english: String,
  pub japanese: String,
}

/// Pronunciation data for a word, all fields optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Phonetics {
  pub text: Option<String>,
  pub audio: Option<String>,
  pub source_url: Option<String>,
}

/// A single vocabulary entry belonging to one wordbook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Card {
  pub id: String,
  pub english: String,
  pub definitions: Vec<Definition>,
  #[serde(default)]
  pub synonyms: Vec<String>,
  #[serde(default)]
  pub example_sentences: Vec<ExampleSentence>,
  #[serde(default)]
  pub phonetics: Option<Phonetics>,
  pub wordbook_id: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

/// A user-specific marker on a card. At most one per (user, card).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
  pub id: String,
  pub card_id: String,
  pub user_id: String,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
  pub display_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSettings {
  pub flip_animation: bool,
  pub simple_card_mode: bool,
}
