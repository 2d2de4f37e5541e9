//! Refresh notifications between the session and its consumers.
//!
//! When a mutation or logout changes what the caches may serve, the session
//! publishes a [`Refresh`] event here instead of calling screens back
//! directly. Any number of listeners can subscribe; none is required, and a
//! listener that subscribes late only sees events published after it joined.

use tokio::sync::broadcast;

/// What changed and therefore needs refetching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
  /// A single collection request changed
  Request(u64),
  /// The request list changed (membership or ordering)
  RequestList,
  /// The session ended and every cached value with it
  SessionEnded,
}

const CHANNEL_CAPACITY: usize = 32;

/// Broadcast channel for [`Refresh`] events.
///
/// Clones share the same channel, so a session can hand out as many handles
/// as it likes. Dropping all listeners is fine; publishing then reaches
/// nobody and reports zero receivers.
#[derive(Debug, Clone)]
pub struct RefreshBus {
  tx: broadcast::Sender<Refresh>,
}

impl RefreshBus {
  pub fn new() -> Self {
    let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
    Self { tx }
  }

  /// Subscribe to refresh events published from now on.
  pub fn subscribe(&self) -> RefreshListener {
    RefreshListener {
      rx: self.tx.subscribe(),
    }
  }

  /// Publish an event to all current listeners, returning how many received
  /// it. A send error only means there were no receivers, which is fine.
  pub fn publish(&self, event: Refresh) -> usize {
    self.tx.send(event).unwrap_or(0)
  }

  pub fn subscriber_count(&self) -> usize {
    self.tx.receiver_count()
  }
}

impl Default for RefreshBus {
  fn default() -> Self {
    Self::new()
  }
}

/// One subscriber's view of the refresh stream.
pub struct RefreshListener {
  rx: broadcast::Receiver<Refresh>,
}

impl RefreshListener {
  /// Wait for the next event. `None` means the bus is gone.
  ///
  /// A listener that falls behind the channel capacity skips the missed
  /// events rather than erroring; a missed refresh only means the next
  /// lookup refetches slightly later.
  pub async fn next(&mut self) -> Option<Refresh> {
    loop {
      match self.rx.recv().await {
        Ok(event) => return Some(event),
        Err(broadcast::error::RecvError::Lagged(_)) => continue,
        Err(broadcast::error::RecvError::Closed) => return None,
      }
    }
  }

  /// Non-blocking variant of [`next`](Self::next): `None` when no event is
  /// waiting.
  pub fn try_next(&mut self) -> Option<Refresh> {
    loop {
      match self.rx.try_recv() {
        Ok(event) => return Some(event),
        Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
        Err(_) => return None,
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn test_publish_reaches_all_listeners() {
    let bus = RefreshBus::new();
    let mut first = bus.subscribe();
    let mut second = bus.subscribe();

    let delivered = bus.publish(Refresh::Request(42));
    assert_eq!(delivered, 2);
    assert_eq!(first.next().await, Some(Refresh::Request(42)));
    assert_eq!(second.next().await, Some(Refresh::Request(42)));
  }

  #[tokio::test]
  async fn test_subscriber_count_tracks_drops() {
    let bus = RefreshBus::new();
    assert_eq!(bus.subscriber_count(), 0);

    let listener = bus.subscribe();
    let other = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 2);

    drop(listener);
    assert_eq!(bus.subscriber_count(), 1);
    drop(other);
    assert_eq!(bus.subscriber_count(), 0);
  }

  #[tokio::test]
  async fn test_publish_without_listeners_reaches_nobody() {
    let bus = RefreshBus::new();
    assert_eq!(bus.publish(Refresh::RequestList), 0);
  }

  #[tokio::test]
  async fn test_late_subscriber_sees_no_history() {
    let bus = RefreshBus::new();
    bus.publish(Refresh::Request(1));
    bus.publish(Refresh::SessionEnded);

    let mut listener = bus.subscribe();
    assert_eq!(listener.try_next(), None);

    bus.publish(Refresh::Request(2));
    assert_eq!(listener.try_next(), Some(Refresh::Request(2)));
  }

  #[tokio::test]
  async fn test_try_next_on_empty_stream() {
    let bus = RefreshBus::new();
    let mut listener = bus.subscribe();
    assert_eq!(listener.try_next(), None);
  }

  #[tokio::test]
  async fn test_lagging_listener_skips_to_oldest_retained() {
    let bus = RefreshBus::new();
    let mut listener = bus.subscribe();

    // Publish past the channel capacity before the listener reads anything,
    // so the oldest events are dropped out from under it.
    let lost = 8;
    for id in 0..(CHANNEL_CAPACITY + lost) {
      bus.publish(Refresh::Request(id as u64));
    }

    assert_eq!(listener.next().await, Some(Refresh::Request(lost as u64)));
    assert_eq!(listener.next().await, Some(Refresh::Request(lost as u64 + 1)));
  }

  #[tokio::test]
  async fn test_try_next_skips_lagged_events() {
    let bus = RefreshBus::new();
    let mut listener = bus.subscribe();

    for id in 0..(CHANNEL_CAPACITY + 1) {
      bus.publish(Refresh::Request(id as u64));
    }

    assert_eq!(listener.try_next(), Some(Refresh::Request(1)));
  }

  #[tokio::test]
  async fn test_dropped_bus_ends_the_stream() {
    let bus = RefreshBus::new();
    let mut listener = bus.subscribe();

    bus.publish(Refresh::SessionEnded);
    drop(bus);

    // Events already in the channel drain first, then the stream ends.
    assert_eq!(listener.next().await, Some(Refresh::SessionEnded));
    assert_eq!(listener.next().await, None);
    assert_eq!(listener.try_next(), None);
  }
}
