//! Authenticated session owning the API client and its caches.

use std::sync::Arc;

use color_eyre::Result;
use tracing::{debug, info};

use crate::api::types::{CollectionRequest, PhoneNumber, RequestStatus};
use crate::api::ApiClient;
use crate::cache::LookupCache;
use crate::config::Config;
use crate::events::{Refresh, RefreshBus, RefreshListener};
use crate::ordering;

/// One signed-in user's view of the marketplace.
///
/// The session owns the lookup caches, so their contents live exactly as
/// long as the session does and two sessions never share state. Reads go
/// through the caches; mutations go straight to the server and then
/// invalidate whatever they made stale, announcing the change on the
/// refresh bus.
#[derive(Clone)]
pub struct Session {
  api: ApiClient,
  requests: Arc<LookupCache<u64, CollectionRequest>>,
  phones: Arc<LookupCache<u64, Option<PhoneNumber>>>,
  bus: RefreshBus,
}

impl Session {
  pub fn new(config: &Config) -> Result<Self> {
    let api = ApiClient::new(config)?;
    Self::with_client(api, config)
  }

  /// Build a session around an existing client. Tests use this to point a
  /// session at a mock server.
  pub fn with_client(api: ApiClient, config: &Config) -> Result<Self> {
    Ok(Self {
      api,
      requests: Arc::new(LookupCache::new(Some(config.cache.collection_max_age()?))),
      phones: Arc::new(LookupCache::new(config.cache.phone_max_age()?)),
      bus: RefreshBus::new(),
    })
  }

  /// Get a collection request, served from cache while fresh.
  pub async fn request(&self, id: u64) -> Result<CollectionRequest> {
    let api = self.api.clone();
    let result = self
      .requests
      .get_with(id, |id| async move { api.get_request(id).await })
      .await?;
    Ok(result.value)
  }

  /// Get a collection request fresh from the server, replacing whatever was
  /// cached. Backs pull-to-refresh.
  pub async fn request_refreshed(&self, id: u64) -> Result<CollectionRequest> {
    let api = self.api.clone();
    let result = self
      .requests
      .refresh_with(id, |id| async move { api.get_request(id).await })
      .await?;
    Ok(result.value)
  }

  /// Get a user's contact phone number, cached for the whole session by
  /// default. `None` means the user has no number on file, and that answer
  /// is cached too.
  pub async fn contact_phone(&self, user_id: u64) -> Result<Option<PhoneNumber>> {
    let api = self.api.clone();
    let result = self
      .phones
      .get_with(user_id, |id| async move { api.get_phone(id).await })
      .await?;
    Ok(result.value)
  }

  /// Look up several users' phone numbers concurrently, preserving input
  /// order in the result. Duplicate ids may fetch more than once; the cache
  /// does not de-duplicate in-flight lookups.
  pub async fn contact_phones(&self, user_ids: &[u64]) -> Result<Vec<(u64, Option<PhoneNumber>)>> {
    futures::future::try_join_all(user_ids.iter().map(|&id| {
      let session = self.clone();
      async move {
        let phone = session.contact_phone(id).await?;
        Ok::<_, color_eyre::Report>((id, phone))
      }
    }))
    .await
  }

  /// List all visible collection requests, sorted for display.
  ///
  /// Lists are always fetched; only individual records are cached. The
  /// list is where new requests appear, so serving it stale would hide
  /// exactly the changes the user opened the screen to see.
  pub async fn list_requests(&self) -> Result<Vec<CollectionRequest>> {
    let mut requests = self.api.list_requests().await?;
    ordering::sort_for_display(&mut requests);
    Ok(requests)
  }

  /// Move a request to a new status on the server.
  ///
  /// On success the cached copy is dropped and both the request and the
  /// list are announced as changed, in that order. The updated record is
  /// returned for immediate display; the next cached lookup refetches.
  pub async fn transition_request(
    &self,
    id: u64,
    status: RequestStatus,
  ) -> Result<CollectionRequest> {
    let updated = self.api.update_request_status(id, status).await?;
    self.requests.invalidate(&id)?;
    self.bus.publish(Refresh::Request(id));
    self.bus.publish(Refresh::RequestList);
    info!(id, status = %status, "collection request transitioned");
    Ok(updated)
  }

  /// Subscribe to refresh announcements from this session.
  pub fn refresh_listener(&self) -> RefreshListener {
    self.bus.subscribe()
  }

  /// Drop everything cached and announce the end of the session.
  pub fn logout(&self) -> Result<()> {
    self.requests.clear()?;
    self.phones.clear()?;
    self.bus.publish(Refresh::SessionEnded);
    debug!("session caches cleared");
    Ok(())
  }

  /// Entry counts of the request and phone caches. Diagnostics only.
  pub fn cache_sizes(&self) -> Result<(usize, usize)> {
    Ok((self.requests.len()?, self.phones.len()?))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{ApiConfig, CacheConfig};

  const COLETA_JSON: &str = r#"{
    "id": 42,
    "cliente_id": 7,
    "cliente_nome": "Maria Souza",
    "parceiro_id": null,
    "parceiro_nome": null,
    "material_nome": "Papelão",
    "peso_material": 12.5,
    "quantidade_material": 3,
    "endereco_completo": "Rua das Flores 100, São Paulo",
    "status_solicitacao": "pending",
    "observacoes_solicitacao": null,
    "status_pagamento": "pending",
    "valor_pagamento": 45.9,
    "criado_em": "2024-03-01T12:00:00Z",
    "atualizado_em": "2024-03-02T08:30:00Z",
    "imagens_coletas": [],
    "cliente_telefone": null,
    "parceiro_telefone": null
  }"#;

  fn test_session(server: &mockito::ServerGuard) -> Session {
    let config = Config {
      api: ApiConfig {
        url: server.url(),
        timeout_secs: 5,
      },
      cache: CacheConfig::default(),
    };
    let api = ApiClient::with_token(&config, "test-token".to_string()).unwrap();
    Session::with_client(api, &config).unwrap()
  }

  #[tokio::test]
  async fn test_repeat_lookup_is_served_from_cache() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/coletas/42")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(COLETA_JSON)
      .expect(1)
      .create_async()
      .await;

    let session = test_session(&server);
    let first = session.request(42).await.unwrap();
    let second = session.request(42).await.unwrap();

    mock.assert_async().await;
    assert_eq!(first.id, second.id);
    assert_eq!(session.cache_sizes().unwrap(), (1, 0));
  }

  #[tokio::test]
  async fn test_refreshed_lookup_hits_server_again() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/coletas/42")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(COLETA_JSON)
      .expect(2)
      .create_async()
      .await;

    let session = test_session(&server);
    session.request(42).await.unwrap();
    session.request_refreshed(42).await.unwrap();

    mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_transition_invalidates_and_notifies() {
    let mut server = mockito::Server::new_async().await;
    let get_mock = server
      .mock("GET", "/coletas/42")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(COLETA_JSON)
      .expect(2)
      .create_async()
      .await;
    let patch_body = COLETA_JSON.replace(
      "\"status_solicitacao\": \"pending\"",
      "\"status_solicitacao\": \"accepted\"",
    );
    let patch_mock = server
      .mock("PATCH", "/coletas/42")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(patch_body)
      .create_async()
      .await;

    let session = test_session(&server);
    let mut listener = session.refresh_listener();

    session.request(42).await.unwrap();
    let updated = session
      .transition_request(42, RequestStatus::Accepted)
      .await
      .unwrap();
    assert_eq!(updated.status, RequestStatus::Accepted);

    // Announcements arrive in order: the record first, then the list.
    assert_eq!(listener.try_next(), Some(Refresh::Request(42)));
    assert_eq!(listener.try_next(), Some(Refresh::RequestList));
    assert_eq!(listener.try_next(), None);

    // The cached copy was dropped, so this lookup fetches again.
    session.request(42).await.unwrap();
    get_mock.assert_async().await;
    patch_mock.assert_async().await;
  }

  #[tokio::test]
  async fn test_missing_phone_is_cached_negative() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/usuarios/9/telefone")
      .with_status(404)
      .expect(1)
      .create_async()
      .await;

    let session = test_session(&server);
    assert_eq!(session.contact_phone(9).await.unwrap(), None);
    assert_eq!(session.contact_phone(9).await.unwrap(), None);

    mock.assert_async().await;
    assert_eq!(session.cache_sizes().unwrap(), (0, 1));
  }

  #[tokio::test]
  async fn test_contact_phones_preserves_input_order() {
    let mut server = mockito::Server::new_async().await;
    let known = server
      .mock("GET", "/usuarios/7/telefone")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(r#"{ "numero": "+55 11 91234-5678" }"#)
      .create_async()
      .await;
    let missing = server
      .mock("GET", "/usuarios/9/telefone")
      .with_status(404)
      .create_async()
      .await;

    let session = test_session(&server);
    let phones = session.contact_phones(&[7, 9]).await.unwrap();

    known.assert_async().await;
    missing.assert_async().await;
    assert_eq!(phones.len(), 2);
    assert_eq!(phones[0].0, 7);
    assert_eq!(phones[0].1.as_ref().unwrap().number, "+55 11 91234-5678");
    assert_eq!(phones[1], (9, None));
  }

  #[tokio::test]
  async fn test_list_requests_comes_back_sorted() {
    let mut server = mockito::Server::new_async().await;
    let finalized = COLETA_JSON
      .replace("\"id\": 42", "\"id\": 1")
      .replace(
        "\"status_solicitacao\": \"pending\"",
        "\"status_solicitacao\": \"finalized\"",
      );
    let pending = COLETA_JSON.replace("\"id\": 42", "\"id\": 2");
    let mock = server
      .mock("GET", "/coletas")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(format!("[{},{}]", finalized, pending))
      .create_async()
      .await;

    let session = test_session(&server);
    let requests = session.list_requests().await.unwrap();

    mock.assert_async().await;
    let ids: Vec<u64> = requests.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![2, 1]);
  }

  #[tokio::test]
  async fn test_logout_clears_caches_and_notifies() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
      .mock("GET", "/coletas/42")
      .with_status(200)
      .with_header("content-type", "application/json")
      .with_body(COLETA_JSON)
      .expect(2)
      .create_async()
      .await;

    let session = test_session(&server);
    let mut listener = session.refresh_listener();

    session.request(42).await.unwrap();
    session.logout().unwrap();

    assert_eq!(listener.try_next(), Some(Refresh::SessionEnded));
    assert_eq!(session.cache_sizes().unwrap(), (0, 0));

    // Everything was dropped, so the next lookup fetches again.
    session.request(42).await.unwrap();
    mock.assert_async().await;
  }
}
