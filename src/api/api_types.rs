//! Serde-deserializable types matching server API responses.
//!
//! The server speaks Portuguese field names; these structs mirror the wire
//! format exactly so deserialization stays mechanical, and conversion into
//! the English-named domain types happens in one place. Records that fail to
//! parse are rejected here and never reach the cache.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::types::{CollectionRequest, PaymentStatus, PhoneNumber, RequestStatus};

// ============================================================================
// Collection request payloads
// ============================================================================

/// One collection request as returned by `/coletas` endpoints.
///
/// Partner fields are null until a partner accepts the request, and the
/// joined phone numbers are only present on the detail endpoint.
#[derive(Debug, Deserialize)]
pub struct ApiColeta {
  pub id: u64,
  pub cliente_id: u64,
  pub cliente_nome: String,
  pub parceiro_id: Option<u64>,
  pub parceiro_nome: Option<String>,
  pub material_nome: String,
  pub peso_material: f64,
  pub quantidade_material: u32,
  pub endereco_completo: String,
  pub status_solicitacao: RequestStatus,
  pub observacoes_solicitacao: Option<String>,
  pub status_pagamento: PaymentStatus,
  pub valor_pagamento: f64,
  pub criado_em: DateTime<Utc>,
  pub atualizado_em: DateTime<Utc>,
  #[serde(default)]
  pub imagens_coletas: Vec<String>,
  pub cliente_telefone: Option<String>,
  pub parceiro_telefone: Option<String>,
}

// ============================================================================
// Phone lookup payload
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiTelefone {
  pub numero: String,
}

// ============================================================================
// Conversions to domain types
// ============================================================================

impl ApiColeta {
  pub fn into_domain(self) -> CollectionRequest {
    CollectionRequest {
      id: self.id,
      client_id: self.cliente_id,
      client_name: self.cliente_nome,
      partner_id: self.parceiro_id,
      partner_name: self.parceiro_nome,
      material: self.material_nome,
      weight_kg: self.peso_material,
      quantity: self.quantidade_material,
      address: self.endereco_completo,
      status: self.status_solicitacao,
      notes: self.observacoes_solicitacao,
      payment_status: self.status_pagamento,
      payment_amount: self.valor_pagamento,
      created_at: self.criado_em,
      updated_at: self.atualizado_em,
      image_urls: self.imagens_coletas,
      client_phone: self.cliente_telefone,
      partner_phone: self.parceiro_telefone,
    }
  }
}

impl From<ApiTelefone> for PhoneNumber {
  fn from(raw: ApiTelefone) -> Self {
    PhoneNumber { number: raw.numero }
  }
}
