//! Single-entity caches for the user's profile and settings: fetched once,
//! replaced only by a confirmed update.

use std::sync::{Arc, Mutex};

use crate::api::types::SettingsPatch;
use crate::api::{ApiError, WordbookGateway};
use crate::auth::TokenProvider;
use crate::models::{UserProfile, UserSettings};

#[derive(Default)]
struct UserState {
  profile: Option<UserProfile>,
  settings: Option<UserSettings>,
  in_flight: u32,
  error: Option<String>,
}

#[derive(Clone)]
pub struct UserStore {
  gateway: Arc<dyn WordbookGateway>,
  tokens: Arc<dyn TokenProvider>,
  state: Arc<Mutex<UserState>>,
}

impl UserStore {
  pub fn new(gateway: Arc<dyn WordbookGateway>, tokens: Arc<dyn TokenProvider>) -> Self {
    Self {
      gateway,
      tokens,
      state: Arc::new(Mutex::new(UserState::default())),
    }
  }

  pub fn profile(&self) -> Option<UserProfile> {
    self.state.lock().unwrap().profile.clone()
  }

  pub fn settings(&self) -> Option<UserSettings> {
    self.state.lock().unwrap().settings.clone()
  }

  pub fn is_loading(&self) -> bool {
    self.state.lock().unwrap().in_flight > 0
  }

  pub fn error(&self) -> Option<String> {
    self.state.lock().unwrap().error.clone()
  }

  pub fn reset(&self) {
    *self.state.lock().unwrap() = UserState::default();
  }

  /// Cache-first profile read; the gateway is hit only on a miss.
  pub async fn load_profile(&self) -> Result<UserProfile, ApiError> {
    if let Some(profile) = self.profile() {
      return Ok(profile);
    }
    let token = self.token()?;
    self.begin();

    let result = self.gateway.get_profile(&token).await;

    let mut state = self.state.lock().unwrap();
    state.in_flight -= 1;
    match result {
      Ok(profile) => {
        state.profile = Some(profile.clone());
        state.error = None;
        Ok(profile)
      }
      Err(error) => {
        state.error = Some(error.to_string());
        Err(error)
      }
    }
  }

  /// Replace the display name; the cached profile is only updated with the
  /// confirmed response.
  pub async fn update_profile(&self, display_name: &str) -> Result<UserProfile, ApiError> {
    if display_name.trim().is_empty() {
      let error = ApiError::Validation("display name is required".into());
      self.state.lock().unwrap().error = Some(error.to_string());
      return Err(error);
    }
    let token = self.token()?;
    self.begin();

    let profile = UserProfile {
      display_name: display_name.to_string(),
    };
    let result = self.gateway.update_profile(&profile, &token).await;

    let mut state = self.state.lock().unwrap();
    state.in_flight -= 1;
    match result {
      Ok(profile) => {
        state.profile = Some(profile.clone());
        state.error = None;
        Ok(profile)
      }
      Err(error) => {
        state.error = Some(error.to_string());
        Err(error)
      }
    }
  }

  /// Cache-first settings read.
  pub async fn load_settings(&self) -> Result<UserSettings, ApiError> {
    if let Some(settings) = self.settings() {
      return Ok(settings);
    }
    let token = self.token()?;
    self.begin();

    let result = self.gateway.get_settings(&token).await;

    let mut state = self.state.lock().unwrap();
    state.in_flight -= 1;
    match result {
      Ok(settings) => {
        state.settings = Some(settings.clone());
        state.error = None;
        Ok(settings)
      }
      Err(error) => {
        state.error = Some(error.to_string());
        Err(error)
      }
    }
  }

  /// Partial settings update; the cache takes the server's confirmed
  /// merge, not the patch.
  pub async fn update_settings(&self, patch: &SettingsPatch) -> Result<UserSettings, ApiError> {
    let token = self.token()?;
    self.begin();

    let result = self.gateway.update_settings(patch, &token).await;

    let mut state = self.state.lock().unwrap();
    state.in_flight -= 1;
    match result {
      Ok(settings) => {
        state.settings = Some(settings.clone());
        state.error = None;
        Ok(settings)
      }
      Err(error) => {
        state.error = Some(error.to_string());
        Err(error)
      }
    }
  }

  fn token(&self) -> Result<String, ApiError> {
    match self.tokens.current_token() {
      Some(token) => Ok(token),
      None => {
        self.state.lock().unwrap().error = Some(ApiError::AuthRequired.to_string());
        Err(ApiError::AuthRequired)
      }
    }
  }

  fn begin(&self) {
    self.state.lock().unwrap().in_flight += 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::api::MemoryGateway;
  use crate::auth::StaticTokenProvider;
  use crate::store::testing::RecordingGateway;

  fn store_over(gateway: &std::sync::Arc<RecordingGateway>) -> UserStore {
    UserStore::new(gateway.clone(), StaticTokenProvider::signed_in())
  }

  #[tokio::test]
  async fn profile_is_fetched_once() {
    let gateway = RecordingGateway::new(MemoryGateway::new());
    let store = store_over(&gateway);

    store.load_profile().await.unwrap();
    store.load_profile().await.unwrap();

    assert_eq!(gateway.calls("get_profile"), 1);
  }

  #[tokio::test]
  async fn update_profile_replaces_the_cache_with_the_confirmed_response() {
    let gateway = RecordingGateway::new(MemoryGateway::new());
    let store = store_over(&gateway);
    store.load_profile().await.unwrap();

    store.update_profile("kenji").await.unwrap();

    assert_eq!(store.profile().unwrap().display_name, "kenji");
    // Next read is served from cache.
    store.load_profile().await.unwrap();
    assert_eq!(gateway.calls("get_profile"), 1);
  }

  #[tokio::test]
  async fn update_profile_requires_a_name() {
    let gateway = RecordingGateway::new(MemoryGateway::new());
    let store = store_over(&gateway);

    let result = store.update_profile("  ").await;

    assert!(matches!(result, Err(ApiError::Validation(_))));
    assert_eq!(gateway.calls("update_profile"), 0);
  }

  #[tokio::test]
  async fn failed_settings_update_keeps_cached_settings() {
    let gateway = RecordingGateway::new(MemoryGateway::new());
    let store = store_over(&gateway);
    let before = store.load_settings().await.unwrap();

    gateway.fail("update_settings");
    let patch = SettingsPatch {
      flip_animation: Some(false),
      ..SettingsPatch::default()
    };
    assert!(store.update_settings(&patch).await.is_err());

    assert_eq!(store.settings().unwrap(), before);
    assert!(store.error().is_some());
  }

  #[tokio::test]
  async fn settings_update_takes_the_server_merge() {
    let gateway = RecordingGateway::new(MemoryGateway::new());
    let store = store_over(&gateway);
    store.load_settings().await.unwrap();

    let patch = SettingsPatch {
      simple_card_mode: Some(true),
      ..SettingsPatch::default()
    };
    let settings = store.update_settings(&patch).await.unwrap();

    assert!(settings.simple_card_mode);
    // The field the patch omitted keeps its server-side value.
    assert!(settings.flip_animation);
  }
}
