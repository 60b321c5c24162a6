use crate::commands::{self, Command};
use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::store::{BookmarkStore, DeckStore, SessionStore, Stores, UserStore};
use crate::ui;
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// Input mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
  Normal,
  Command,
  /// Waiting for y/n on a destructive action
  Confirm,
}

/// View state - each variant owns its navigation-local data; entity data is
/// read from store snapshots at draw time.
#[derive(Debug)]
pub enum ViewState {
  DeckList {
    selected: usize,
  },
  CardBrowser {
    deck_id: String,
    flipped: bool,
  },
}

/// Main application state
pub struct App {
  /// Navigation stack - root is always at index 0
  view_stack: Vec<ViewState>,

  /// Current input mode
  mode: Mode,

  /// Command input buffer (after pressing :)
  command_input: String,

  /// Selected autocomplete suggestion index
  selected_suggestion: usize,

  /// Deck pending deletion while the confirm prompt is up
  pending_delete: Option<(String, String)>,

  /// Application configuration
  config: Config,

  decks: DeckStore,
  bookmarks: BookmarkStore,
  session: SessionStore,
  user: UserStore,

  /// Event sender for async store tasks
  event_tx: mpsc::UnboundedSender<Event>,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: Config, stores: Stores) -> Self {
    let (tx, _rx) = mpsc::unbounded_channel();

    Self {
      view_stack: vec![ViewState::DeckList { selected: 0 }],
      mode: Mode::Normal,
      command_input: String::new(),
      selected_suggestion: 0,
      pending_delete: None,
      config,
      decks: stores.decks,
      bookmarks: stores.bookmarks,
      session: stores.session,
      user: stores.user,
      event_tx: tx,
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    // Create event handler
    let mut events = EventHandler::new(Duration::from_millis(250));
    self.event_tx = events.sender();

    // Initial data load
    self.load_initial_data();

    // Main loop
    while !self.should_quit {
      // Draw UI
      terminal.draw(|frame| ui::draw(frame, self))?;

      // Handle events
      if let Some(event) = events.next().await {
        self.handle_event(event);
      }
    }

    // Cleanup terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    Ok(())
  }

  fn load_initial_data(&self) {
    let decks = self.decks.clone();
    let bookmarks = self.bookmarks.clone();
    let user = self.user.clone();
    let tx = self.event_tx.clone();

    tokio::spawn(async move {
      if let Err(error) = decks.fetch_all_decks().await {
        warn!(%error, "initial deck fetch failed");
      }
      if let Err(error) = bookmarks.load_bookmarks().await {
        warn!(%error, "initial bookmark load failed");
      }
      if let Err(error) = user.load_settings().await {
        warn!(%error, "initial settings load failed");
      }
      if let Err(error) = user.load_profile().await {
        warn!(%error, "initial profile load failed");
      }
      let _ = tx.send(Event::DataChanged);
    });
  }

  fn handle_event(&mut self, event: Event) {
    match event {
      Event::Key(key) => self.handle_key(key),
      // Redraw happens on every loop iteration; nothing else to do here.
      Event::Tick | Event::DataChanged => {}
    }
  }

  fn handle_key(&mut self, key: crossterm::event::KeyEvent) {
    match self.mode {
      Mode::Normal => self.handle_normal_mode_key(key),
      Mode::Command => self.handle_command_mode_key(key),
      Mode::Confirm => self.handle_confirm_mode_key(key),
    }
  }

  fn handle_normal_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      // Quit
      KeyCode::Char('q') => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        } else {
          self.should_quit = true;
        }
      }
      KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
        self.should_quit = true;
      }
      KeyCode::Esc => {
        if self.view_stack.len() > 1 {
          self.view_stack.pop();
        }
      }

      // Navigation
      KeyCode::Up | KeyCode::Char('k') => self.move_selection(-1),
      KeyCode::Down | KeyCode::Char('j') => self.move_selection(1),
      KeyCode::Left | KeyCode::Char('h') => self.navigate_card(-1),
      KeyCode::Right | KeyCode::Char('l') => self.navigate_card(1),
      KeyCode::Enter => self.enter_selected(),

      // Card browser actions
      KeyCode::Char(' ') | KeyCode::Char('f') => self.flip_card(),
      KeyCode::Char('b') => self.toggle_bookmark(),

      // Deck list actions
      KeyCode::Char('x') => self.request_delete(),
      KeyCode::Char('r') => self.refresh_current_view(),

      // Mode switches
      KeyCode::Char(':') => {
        self.mode = Mode::Command;
        self.command_input.clear();
      }

      _ => {}
    }
  }

  fn handle_command_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      KeyCode::Esc => {
        self.mode = Mode::Normal;
        self.command_input.clear();
        self.selected_suggestion = 0;
      }
      KeyCode::Enter => {
        self.execute_command();
        self.mode = Mode::Normal;
        self.selected_suggestion = 0;
      }
      KeyCode::Tab | KeyCode::Down => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = (self.selected_suggestion + 1) % suggestions.len();
        }
      }
      KeyCode::BackTab | KeyCode::Up => {
        let suggestions = commands::get_suggestions(&self.command_input);
        if !suggestions.is_empty() {
          self.selected_suggestion = if self.selected_suggestion == 0 {
            suggestions.len() - 1
          } else {
            self.selected_suggestion - 1
          };
        }
      }
      KeyCode::Backspace => {
        self.command_input.pop();
        self.selected_suggestion = 0;
      }
      KeyCode::Char(c) => {
        self.command_input.push(c);
        self.selected_suggestion = 0;
      }
      _ => {}
    }
  }

  fn handle_confirm_mode_key(&mut self, key: crossterm::event::KeyEvent) {
    match key.code {
      KeyCode::Char('y') | KeyCode::Char('Y') => {
        if let Some((deck_id, _)) = self.pending_delete.take() {
          let decks = self.decks.clone();
          let session = self.session.clone();
          let tx = self.event_tx.clone();
          tokio::spawn(async move {
            match decks.delete_deck(&deck_id).await {
              Ok(()) => {
                if session.selected_deck().as_deref() == Some(deck_id.as_str()) {
                  session.clear_selection();
                }
              }
              Err(error) => warn!(%error, %deck_id, "deck deletion failed"),
            }
            let _ = tx.send(Event::DataChanged);
          });
        }
        self.mode = Mode::Normal;
      }
      KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
        self.pending_delete = None;
        self.mode = Mode::Normal;
      }
      _ => {}
    }
  }

  fn execute_command(&mut self) {
    // Get the command to execute - either from selected suggestion or direct input
    let suggestions = commands::get_suggestions(&self.command_input);
    let cmd = if !suggestions.is_empty() && self.selected_suggestion < suggestions.len() {
      suggestions[self.selected_suggestion].name.to_string()
    } else {
      self.command_input.trim().to_lowercase()
    };

    match cmd.as_str() {
      "decks" => {
        self.view_stack.truncate(1);
        self.view_stack[0] = ViewState::DeckList { selected: 0 };
        self.spawn_fetch_all();
      }
      "refresh" => self.refresh_current_view(),
      "quit" => {
        self.should_quit = true;
      }
      _ => {
        // Unknown command
      }
    }
    self.command_input.clear();
  }

  fn spawn_fetch_all(&self) {
    let decks = self.decks.clone();
    let tx = self.event_tx.clone();
    tokio::spawn(async move {
      if let Err(error) = decks.fetch_all_decks().await {
        warn!(%error, "deck fetch failed");
      }
      let _ = tx.send(Event::DataChanged);
    });
  }

  fn refresh_current_view(&self) {
    match self.view_stack.last() {
      // Explicit refresh bypasses the freshness gate on the combined fetch.
      Some(ViewState::DeckList { .. }) | None => {
        let decks = self.decks.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
          let (owned, public) = tokio::join!(decks.fetch_owned_decks(), decks.fetch_public_decks());
          if let Err(error) = owned.and(public) {
            warn!(%error, "deck refresh failed");
          }
          let _ = tx.send(Event::DataChanged);
        });
      }
      Some(ViewState::CardBrowser { deck_id, .. }) => {
        let decks = self.decks.clone();
        let deck_id = deck_id.clone();
        let tx = self.event_tx.clone();
        tokio::spawn(async move {
          if let Err(error) = decks.refresh_words(&deck_id).await {
            warn!(%error, %deck_id, "card refresh failed");
          }
          let _ = tx.send(Event::DataChanged);
        });
      }
    }
  }

  fn move_selection(&mut self, delta: i32) {
    let deck_count = self.decks.all_decks().len();
    if let Some(ViewState::DeckList { selected }) = self.view_stack.last_mut() {
      if deck_count > 0 {
        *selected = (*selected as i32 + delta).rem_euclid(deck_count as i32) as usize;
      }
    }
  }

  /// Step through the selected deck's cards. Bounds live here, not in the
  /// session store: only the view knows the current card count.
  fn navigate_card(&mut self, delta: i32) {
    let card_count = match self.view_stack.last() {
      Some(ViewState::CardBrowser { deck_id, .. }) => self
        .decks
        .words_in_deck(deck_id)
        .map(|cards| cards.len())
        .unwrap_or(0),
      _ => return,
    };
    if card_count == 0 {
      return;
    }

    let current = self.session.current_card_index();
    let next = (current as i32 + delta).clamp(0, card_count as i32 - 1) as usize;
    if next != current {
      self.session.navigate_card(next);
      if let Some(ViewState::CardBrowser { flipped, .. }) = self.view_stack.last_mut() {
        *flipped = false;
      }
    }
  }

  fn enter_selected(&mut self) {
    if let Some(ViewState::DeckList { selected }) = self.view_stack.last() {
      let Some(deck) = self.decks.all_decks().get(*selected).cloned() else {
        return;
      };

      self.view_stack.push(ViewState::CardBrowser {
        deck_id: deck.id.clone(),
        flipped: false,
      });

      let decks = self.decks.clone();
      let session = self.session.clone();
      let tx = self.event_tx.clone();
      tokio::spawn(async move {
        if let Err(error) = decks.initialize_deck_data(&session, &deck.id).await {
          warn!(%error, deck_id = %deck.id, "failed to open deck");
        }
        let _ = tx.send(Event::DataChanged);
      });
    }
  }

  fn flip_card(&mut self) {
    if let Some(ViewState::CardBrowser { flipped, .. }) = self.view_stack.last_mut() {
      *flipped = !*flipped;
    }
  }

  fn toggle_bookmark(&self) {
    if let Some(ViewState::CardBrowser { deck_id, .. }) = self.view_stack.last() {
      let index = self.session.current_card_index();
      let Some(card) = self
        .decks
        .words_in_deck(deck_id)
        .and_then(|cards| cards.get(index).cloned())
      else {
        return;
      };

      let bookmarks = self.bookmarks.clone();
      let tx = self.event_tx.clone();
      tokio::spawn(async move {
        if let Err(error) = bookmarks.toggle_bookmark(&card.id).await {
          warn!(%error, card_id = %card.id, "bookmark toggle failed");
        }
        let _ = tx.send(Event::DataChanged);
      });
    }
  }

  fn request_delete(&mut self) {
    if let Some(ViewState::DeckList { selected }) = self.view_stack.last() {
      if let Some(deck) = self.decks.all_decks().get(*selected) {
        self.pending_delete = Some((deck.id.clone(), deck.name.clone()));
        self.mode = Mode::Confirm;
      }
    }
  }

  // Accessors for UI rendering
  pub fn current_view(&self) -> Option<&ViewState> {
    self.view_stack.last()
  }

  pub fn mode(&self) -> &Mode {
    &self.mode
  }

  pub fn command_input(&self) -> &str {
    &self.command_input
  }

  pub fn title(&self) -> String {
    self.config.display_title()
  }

  pub fn decks(&self) -> &DeckStore {
    &self.decks
  }

  pub fn bookmarks(&self) -> &BookmarkStore {
    &self.bookmarks
  }

  pub fn session(&self) -> &SessionStore {
    &self.session
  }

  pub fn user(&self) -> &UserStore {
    &self.user
  }

  /// The first store error worth surfacing in the footer.
  pub fn current_error(&self) -> Option<String> {
    self
      .decks
      .error()
      .or_else(|| self.bookmarks.error())
      .or_else(|| self.user.error())
  }

  pub fn confirm_prompt(&self) -> Option<String> {
    self
      .pending_delete
      .as_ref()
      .map(|(_, name)| format!("Delete wordbook '{}' and all its words? (y/n)", name))
  }

  pub fn autocomplete_suggestions(&self) -> Vec<&'static Command> {
    commands::get_suggestions(&self.command_input)
  }

  pub fn selected_suggestion(&self) -> usize {
    self.selected_suggestion
  }
}
