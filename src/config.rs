use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
  pub api: ApiConfig,
  #[serde(default)]
  pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
  /// Base URL of the marketplace server, e.g. https://api.example.com/v1
  pub url: String,
  /// Per-request timeout in seconds
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheConfig {
  /// How long a cached collection request stays fresh, in seconds
  #[serde(default = "default_collection_ttl_secs")]
  pub collection_ttl_secs: u64,
  /// How long a cached phone number stays fresh, in seconds.
  /// Unset means phone numbers never expire within a session.
  #[serde(default)]
  pub phone_ttl_secs: Option<u64>,
}

impl Default for CacheConfig {
  fn default() -> Self {
    Self {
      collection_ttl_secs: default_collection_ttl_secs(),
      phone_ttl_secs: None,
    }
  }
}

fn default_timeout_secs() -> u64 {
  30
}

fn default_collection_ttl_secs() -> u64 {
  300
}

impl CacheConfig {
  /// Maximum age for cached collection requests.
  ///
  /// Errors when the configured TTL cannot be represented as a duration.
  pub fn collection_max_age(&self) -> Result<chrono::Duration> {
    Self::max_age_from_secs(self.collection_ttl_secs, "cache.collection_ttl_secs")
  }

  /// Maximum age for cached phone numbers, `None` for no expiry.
  pub fn phone_max_age(&self) -> Result<Option<chrono::Duration>> {
    self
      .phone_ttl_secs
      .map(|secs| Self::max_age_from_secs(secs, "cache.phone_ttl_secs"))
      .transpose()
  }

  fn max_age_from_secs(secs: u64, setting: &str) -> Result<chrono::Duration> {
    i64::try_from(secs)
      .ok()
      .and_then(chrono::Duration::try_seconds)
      .ok_or_else(|| eyre!("Invalid {}: {} seconds is out of range", setting, secs))
  }
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./recicla.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/recicla/config.yaml
  /// 4. ~/.config/recicla/config.yaml
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
        "No configuration file found. Create one at ~/.config/recicla/config.yaml\n\
                 See config.example.yaml for the format."
      )),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("recicla.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("recicla").join("config.yaml");
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

  /// Get the API token from environment variables.
  ///
  /// Checks RECICLA_TOKEN first, then RECICLA_API_TOKEN as fallback.
  pub fn get_api_token() -> Result<String> {
    std::env::var("RECICLA_TOKEN")
      .or_else(|_| std::env::var("RECICLA_API_TOKEN"))
      .map_err(|_| {
        eyre!("API token not found. Set RECICLA_TOKEN or RECICLA_API_TOKEN environment variable.")
      })
  }
}
