//! Bearer-token access for the identity provider.

use std::sync::Arc;

/// Source of the current bearer token.
///
/// `None` means "not signed in": operations must abort before any network
/// call rather than retry.
pub trait TokenProvider: Send + Sync {
  fn current_token(&self) -> Option<String>;
}

/// Reads the token from the environment.
///
/// Checks TANGO_API_TOKEN first, then TANGO_TOKEN as fallback.
pub struct EnvTokenProvider;

impl TokenProvider for EnvTokenProvider {
  fn current_token(&self) -> Option<String> {
    std::env::var("TANGO_API_TOKEN")
      .or_else(|_| std::env::var("TANGO_TOKEN"))
      .ok()
      .filter(|t| !t.is_empty())
  }
}

/// Fixed token, used by offline mode and tests.
pub struct StaticTokenProvider(pub Option<String>);

impl StaticTokenProvider {
  pub fn signed_in() -> Arc<Self> {
    Arc::new(Self(Some("static-token".to_string())))
  }

  pub fn signed_out() -> Arc<Self> {
    Arc::new(Self(None))
  }
}

impl TokenProvider for StaticTokenProvider {
  fn current_token(&self) -> Option<String> {
    self.0.clone()
  }
}
