use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  /// Custom title for the header (defaults to the API host if not set)
  pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  pub base_url: String,
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./tango.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/tango/config.yaml
  /// 4. ~/.config/tango/config.yaml
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Err(eyre!(
        "No configuration file found. Create one at ~/.config/tango/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  /// Configuration for `--offline` mode, where no file is required and the
  /// base URL is never dialed.
  pub fn offline() -> Self {
    Self {
      api: ApiConfig {
        base_url: "http://localhost/".to_string(),
      },
      title: Some("tango (offline)".to_string()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("tango.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("tango").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    let config: Config = serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))?;

    Ok(config)
  }

  /// Parsed and validated API base URL.
  pub fn api_base_url(&self) -> Result<Url> {
    Url::parse(&self.api.base_url)
      .map_err(|e| eyre!("Invalid api.base_url '{}': {}", self.api.base_url, e))
  }

  /// Title shown in the header.
  pub fn display_title(&self) -> String {
    if let Some(title) = &self.title {
      return title.clone();
    }
    self
      .api_base_url()
      .ok()
      .and_then(|u| u.host_str().map(String::from))
      .unwrap_or_else(|| "tango".to_string())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_a_minimal_config() {
    let config: Config = serde_yaml::from_str("api:\n  base_url: https://api.example.com/v1\n")
      .expect("config should parse");

    assert_eq!(config.api.base_url, "https://api.example.com/v1");
    assert_eq!(config.display_title(), "api.example.com");
  }

  #[test]
  fn title_overrides_host() {
    let config: Config =
      serde_yaml::from_str("api:\n  base_url: https://api.example.com\ntitle: my words\n")
        .unwrap();

    assert_eq!(config.display_title(), "my words");
  }
}
