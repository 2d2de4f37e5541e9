//! Display ordering for collection request lists.
//!
//! Requests that still need someone's attention sort before finished ones,
//! and within the same state newer requests come first. The ordering belongs
//! to the client; the server returns lists in storage order.

use crate::api::types::{CollectionRequest, RequestStatus};

/// Rank of a status in list views. Lower sorts first.
pub fn display_rank(status: RequestStatus) -> u8 {
  match status {
    RequestStatus::Pending => 0,
    RequestStatus::Accepted => 1,
    RequestStatus::Collected => 2,
    RequestStatus::Finalized => 3,
    RequestStatus::Cancelled => 4,
  }
}

/// Sort requests for display: status rank, then newest first.
///
/// The sort is stable, so requests with the same rank and timestamp keep
/// their incoming order.
pub fn sort_for_display(requests: &mut [CollectionRequest]) {
  requests.sort_by(|a, b| {
    display_rank(a.status)
      .cmp(&display_rank(b.status))
      .then_with(|| b.created_at.cmp(&a.created_at))
  });
}
