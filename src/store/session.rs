//! Selection and navigation state: which deck is active, and where the
//! user was in each deck.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct SessionState {
  selected_deck_id: Option<String>,
  /// Last-viewed card index per deck, kept across deck switches.
  card_indexes: HashMap<String, usize>,
}

/// Tracks at most one active deck and a per-deck card position.
///
/// Deliberately does not fetch anything: what is selected and what is
/// loaded are separate concerns, and callers decide whether the selected
/// deck's cards still need loading.
#[derive(Clone, Default)]
pub struct SessionStore {
  state: Arc<Mutex<SessionState>>,
}

impl SessionStore {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn select_deck(&self, deck_id: &str) {
    self.state.lock().unwrap().selected_deck_id = Some(deck_id.to_string());
  }

  pub fn clear_selection(&self) {
    self.state.lock().unwrap().selected_deck_id = None;
  }

  pub fn selected_deck(&self) -> Option<String> {
    self.state.lock().unwrap().selected_deck_id.clone()
  }

  /// Record the card position for the selected deck. A no-op when nothing
  /// is selected. Bounds are the caller's responsibility; only the view
  /// knows the current card count.
  pub fn navigate_card(&self, index: usize) {
    let mut state = self.state.lock().unwrap();
    if let Some(deck_id) = state.selected_deck_id.clone() {
      state.card_indexes.insert(deck_id, index);
    }
  }

  /// Card position for the selected deck; 0 when untracked or nothing is
  /// selected.
  pub fn current_card_index(&self) -> usize {
    let state = self.state.lock().unwrap();
    state
      .selected_deck_id
      .as_ref()
      .and_then(|id| state.card_indexes.get(id))
      .copied()
      .unwrap_or(0)
  }

  pub fn reset(&self) {
    *self.state.lock().unwrap() = SessionState::default();
  }
}
