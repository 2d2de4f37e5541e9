use crate::api::api_types::{ApiColeta, ApiTelefone};
use crate::api::types::{CollectionRequest, PhoneNumber, RequestStatus};
use crate::config::Config;
use color_eyre::{eyre::eyre, Result};
use reqwest::StatusCode;
use url::Url;

/// Marketplace API client wrapper
#[derive(Clone)]
pub struct ApiClient {
  http: reqwest::Client,
  base_url: Url,
  token: String,
}

impl ApiClient {
  pub fn new(config: &Config) -> Result<Self> {
    let token = Config::get_api_token()?;
    Self::with_token(config, token)
  }

  /// Build a client with an explicit bearer token instead of reading the
  /// environment. Used by tests and by anything that manages tokens itself.
  pub fn with_token(config: &Config, token: String) -> Result<Self> {
    // Url::join drops the last path segment of a base without a trailing
    // slash, so normalize before parsing.
    let mut base = config.api.url.clone();
    if !base.ends_with('/') {
      base.push('/');
    }
    let base_url =
      Url::parse(&base).map_err(|e| eyre!("Invalid API url '{}': {}", config.api.url, e))?;

    let http = reqwest::Client::builder()
      .timeout(std::time::Duration::from_secs(config.api.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self {
      http,
      base_url,
      token,
    })
  }

  /// Get a single collection request by id
  pub async fn get_request(&self, id: u64) -> Result<CollectionRequest> {
    let url = self.endpoint(&format!("coletas/{}", id))?;
    let response = self
      .http
      .get(url)
      .bearer_auth(&self.token)
      .send()
      .await
      .map_err(|e| eyre!("Failed to get collection request {}: {}", id, e))?;

    let raw: ApiColeta = Self::check_status(response, "collection request")
      .await?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse collection request {}: {}", id, e))?;

    Ok(raw.into_domain())
  }

  /// List all collection requests visible to the authenticated user
  pub async fn list_requests(&self) -> Result<Vec<CollectionRequest>> {
    let url = self.endpoint("coletas")?;
    let response = self
      .http
      .get(url)
      .bearer_auth(&self.token)
      .send()
      .await
      .map_err(|e| eyre!("Failed to list collection requests: {}", e))?;

    let raw: Vec<ApiColeta> = Self::check_status(response, "collection request list")
      .await?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse collection request list: {}", e))?;

    Ok(raw.into_iter().map(ApiColeta::into_domain).collect())
  }

  /// Get a user's contact phone number.
  ///
  /// A 404 means the user has no number on file; that is a valid answer,
  /// returned as `Ok(None)` so callers can cache it like any other result.
  pub async fn get_phone(&self, user_id: u64) -> Result<Option<PhoneNumber>> {
    let url = self.endpoint(&format!("usuarios/{}/telefone", user_id))?;
    let response = self
      .http
      .get(url)
      .bearer_auth(&self.token)
      .send()
      .await
      .map_err(|e| eyre!("Failed to get phone for user {}: {}", user_id, e))?;

    if response.status() == StatusCode::NOT_FOUND {
      return Ok(None);
    }

    let raw: ApiTelefone = Self::check_status(response, "phone number")
      .await?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse phone for user {}: {}", user_id, e))?;

    Ok(Some(raw.into()))
  }

  /// Ask the server to move a collection request to a new status.
  ///
  /// The server enforces which transitions are legal; an illegal one comes
  /// back as an error response. Returns the updated record.
  pub async fn update_request_status(
    &self,
    id: u64,
    status: RequestStatus,
  ) -> Result<CollectionRequest> {
    let url = self.endpoint(&format!("coletas/{}", id))?;
    let body = serde_json::json!({ "status_solicitacao": status });
    let response = self
      .http
      .patch(url)
      .bearer_auth(&self.token)
      .json(&body)
      .send()
      .await
      .map_err(|e| eyre!("Failed to update collection request {}: {}", id, e))?;

    let raw: ApiColeta = Self::check_status(response, "status update")
      .await?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse updated collection request {}: {}", id, e))?;

    Ok(raw.into_domain())
  }

  fn endpoint(&self, path: &str) -> Result<Url> {
    self
      .base_url
      .join(path)
      .map_err(|e| eyre!("Failed to build endpoint url for '{}': {}", path, e))
  }

  async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
      return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(eyre!("Server returned {} for {}: {}", status, what, body))
  }
}
