use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use async_trait::async_trait;

use super::error::ApiError;
use super::types::{
  CardPayload, DeckDraft, DeckPatch, ErrorBody, ExistsResponse, SearchQuery, SearchResponse,
  SettingsPatch,
};
use super::WordbookGateway;
use crate::models::{Bookmark, Card, Deck, UserProfile, UserSettings};

/// Reqwest-backed gateway to the wordbook service.
#[derive(Clone)]
pub struct HttpGateway {
  http: reqwest::Client,
  base: String,
}

impl HttpGateway {
  /// Create a gateway for the given API base URL.
  pub fn new(base: Url) -> Self {
    Self {
      http: reqwest::Client::new(),
      base: base.as_str().trim_end_matches('/').to_string(),
    }
  }

  fn endpoint(&self, path: &str) -> String {
    format!("{}/{}", self.base, path)
  }

  fn get(&self, path: &str, token: &str) -> RequestBuilder {
    self.http.get(self.endpoint(path)).bearer_auth(token)
  }

  fn post<B: Serialize>(&self, path: &str, body: &B, token: &str) -> RequestBuilder {
    self.http.post(self.endpoint(path)).bearer_auth(token).json(body)
  }

  fn patch<B: Serialize>(&self, path: &str, body: &B, token: &str) -> RequestBuilder {
    self.http.patch(self.endpoint(path)).bearer_auth(token).json(body)
  }

  fn put<B: Serialize>(&self, path: &str, body: &B, token: &str) -> RequestBuilder {
    self.http.put(self.endpoint(path)).bearer_auth(token).json(body)
  }

  fn delete(&self, path: &str, token: &str) -> RequestBuilder {
    self.http.delete(self.endpoint(path)).bearer_auth(token)
  }

  async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
    let response = request.send().await?;
    let response = check_status(response).await?;
    Ok(response.json().await?)
  }

  /// Send a request whose success response carries no body of interest.
  async fn send_empty(&self, request: RequestBuilder) -> Result<(), ApiError> {
    let response = request.send().await?;
    check_status(response).await?;
    Ok(())
  }
}

/// Treat every non-2xx uniformly as a failure, pulling the message out of
/// the `{"error": ...}` body when the server sent one.
async fn check_status(response: Response) -> Result<Response, ApiError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let message = match response.json::<ErrorBody>().await {
    Ok(body) => body.error,
    Err(_) => generic_message(status),
  };
  debug!(status = status.as_u16(), %message, "api request failed");

  Err(ApiError::Api {
    status: status.as_u16(),
    message,
  })
}

fn generic_message(status: StatusCode) -> String {
  format!("request failed with status {}", status.as_u16())
}

#[async_trait]
impl WordbookGateway for HttpGateway {
  async fn list_owned_decks(&self, token: &str) -> Result<Vec<Deck>, ApiError> {
    self.send(self.get("wordbooks/mine", token)).await
  }

  async fn list_public_decks(&self, token: &str) -> Result<Vec<Deck>, ApiError> {
    self.send(self.get("wordbooks/public", token)).await
  }

  async fn get_deck(&self, deck_id: &str, token: &str) -> Result<Deck, ApiError> {
    self.send(self.get(&format!("wordbooks/{}", deck_id), token)).await
  }

  async fn search_decks(
    &self,
    query: &SearchQuery,
    token: &str,
  ) -> Result<SearchResponse, ApiError> {
    let request = self.get("wordbooks/search", token).query(query);
    self.send(request).await
  }

  async fn create_deck(&self, draft: &DeckDraft, token: &str) -> Result<Deck, ApiError> {
    self.send(self.post("wordbooks", draft, token)).await
  }

  async fn update_deck(
    &self,
    deck_id: &str,
    patch: &DeckPatch,
    token: &str,
  ) -> Result<Deck, ApiError> {
    self
      .send(self.patch(&format!("wordbooks/{}", deck_id), patch, token))
      .await
  }

  async fn delete_deck(&self, deck_id: &str, token: &str) -> Result<(), ApiError> {
    self
      .send_empty(self.delete(&format!("wordbooks/{}", deck_id), token))
      .await
  }

  async fn duplicate_deck(
    &self,
    source_id: &str,
    draft: &DeckDraft,
    token: &str,
  ) -> Result<Deck, ApiError> {
    self
      .send(self.post(&format!("wordbooks/{}/duplicate", source_id), draft, token))
      .await
  }

  async fn list_cards(&self, deck_id: &str, token: &str) -> Result<Vec<Card>, ApiError> {
    self
      .send(self.get(&format!("wordbooks/{}/words", deck_id), token))
      .await
  }

  async fn create_card(
    &self,
    deck_id: &str,
    payload: &CardPayload,
    token: &str,
  ) -> Result<Card, ApiError> {
    self
      .send(self.post(&format!("wordbooks/{}/words", deck_id), payload, token))
      .await
  }

  async fn update_card(
    &self,
    card_id: &str,
    payload: &CardPayload,
    token: &str,
  ) -> Result<Card, ApiError> {
    self
      .send(self.put(&format!("words/{}", card_id), payload, token))
      .await
  }

  async fn delete_card(&self, card_id: &str, token: &str) -> Result<(), ApiError> {
    self
      .send_empty(self.delete(&format!("words/{}", card_id), token))
      .await
  }

  async fn list_bookmarks(&self, token: &str) -> Result<Vec<Bookmark>, ApiError> {
    self.send(self.get("bookmarks", token)).await
  }

  async fn create_bookmark(&self, card_id: &str, token: &str) -> Result<Bookmark, ApiError> {
    let body = serde_json::json!({ "card_id": card_id });
    self.send(self.post("bookmarks", &body, token)).await
  }

  async fn delete_bookmark(&self, bookmark_id: &str, token: &str) -> Result<(), ApiError> {
    self
      .send_empty(self.delete(&format!("bookmarks/{}", bookmark_id), token))
      .await
  }

  async fn delete_bookmark_by_card(&self, card_id: &str, token: &str) -> Result<(), ApiError> {
    self
      .send_empty(self.delete(&format!("bookmarks/by-card/{}", card_id), token))
      .await
  }

  async fn bookmark_exists(&self, card_id: &str, token: &str) -> Result<bool, ApiError> {
    let response: ExistsResponse = self
      .send(self.get(&format!("bookmarks/exists/{}", card_id), token))
      .await?;
    Ok(response.exists)
  }

  async fn get_profile(&self, token: &str) -> Result<UserProfile, ApiError> {
    self.send(self.get("users/me", token)).await
  }

  async fn update_profile(
    &self,
    profile: &UserProfile,
    token: &str,
  ) -> Result<UserProfile, ApiError> {
    self.send(self.put("users/me", profile, token)).await
  }

  async fn get_settings(&self, token: &str) -> Result<UserSettings, ApiError> {
    self.send(self.get("users/me/settings", token)).await
  }

  async fn update_settings(
    &self,
    patch: &SettingsPatch,
    token: &str,
  ) -> Result<UserSettings, ApiError> {
    self.send(self.patch("users/me/settings", patch, token)).await
  }
}
