//! Domain types used throughout the client.
//!
//! These are the parsed, typed forms the rest of the crate works with. The
//! raw JSON shapes the server speaks live in [`super::api_types`] and are
//! converted at the API boundary, so invalid records are rejected before
//! they reach any screen or cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle state of a collection request.
///
/// The server owns all transitions; the client only displays the current
/// state and asks for the next one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
  /// Created by a client, waiting for a partner to accept
  Pending,
  /// A partner committed to the pickup
  Accepted,
  /// The material has been picked up
  Collected,
  /// Payment settled, request closed
  Finalized,
  /// Abandoned before completion
  Cancelled,
}

impl RequestStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      RequestStatus::Pending => "pending",
      RequestStatus::Accepted => "accepted",
      RequestStatus::Collected => "collected",
      RequestStatus::Finalized => "finalized",
      RequestStatus::Cancelled => "cancelled",
    }
  }

  /// Whether the request still needs action from someone.
  pub fn is_open(&self) -> bool {
    matches!(
      self,
      RequestStatus::Pending | RequestStatus::Accepted | RequestStatus::Collected
    )
  }
}

impl fmt::Display for RequestStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for RequestStatus {
  type Err = String;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_lowercase().as_str() {
      "pending" => Ok(RequestStatus::Pending),
      "accepted" => Ok(RequestStatus::Accepted),
      "collected" => Ok(RequestStatus::Collected),
      "finalized" => Ok(RequestStatus::Finalized),
      "cancelled" => Ok(RequestStatus::Cancelled),
      other => Err(format!(
        "Unknown request status '{}' (expected pending, accepted, collected, finalized or cancelled)",
        other
      )),
    }
  }
}

/// Payment state of a finished (or in-flight) collection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Paid,
}

impl PaymentStatus {
  pub fn as_str(&self) -> &'static str {
    match self {
      PaymentStatus::Pending => "pending",
      PaymentStatus::Paid => "paid",
    }
  }
}

impl fmt::Display for PaymentStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

/// A user's contact phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneNumber {
  pub number: String,
}

/// One recycling collection request, fully denormalized for display.
///
/// The server joins in the client and partner names, the material and the
/// payment record so a single lookup is enough to render a detail screen.
/// Partner fields are `None` until a partner accepts the request.
#[derive(Debug, Clone)]
pub struct CollectionRequest {
  pub id: u64,
  pub client_id: u64,
  pub client_name: String,
  pub partner_id: Option<u64>,
  pub partner_name: Option<String>,
  pub material: String,
  pub weight_kg: f64,
  pub quantity: u32,
  pub address: String,
  pub status: RequestStatus,
  pub notes: Option<String>,
  pub payment_status: PaymentStatus,
  pub payment_amount: f64,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  pub image_urls: Vec<String>,
  pub client_phone: Option<String>,
  pub partner_phone: Option<String>,
}
