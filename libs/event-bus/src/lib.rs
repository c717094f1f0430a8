//! Event bus for the unified trading engine
//!
//! In-process publish/subscribe backbone. Every subscriber owns a bounded
//! queue; `publish` never blocks. When a subscriber's queue is full the
//! event is dropped for that subscriber only and its drop counter is
//! incremented.
//!
//! Events are shared as `Arc<Event>` so fan-out does not clone payloads.

pub mod subscription;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc;
use tracing::{debug, warn};
use types::events::{Event, EventKind};

pub use subscription::Subscription;

/// Default per-subscriber queue capacity
pub const DEFAULT_SUBSCRIBER_CAPACITY: usize = 1024;

struct Subscriber {
    id: u64,
    name: String,
    filter: Option<Vec<EventKind>>,
    tx: mpsc::Sender<Arc<Event>>,
    dropped: Arc<AtomicU64>,
}

impl Subscriber {
    fn wants(&self, kind: EventKind) -> bool {
        self.filter.as_ref().map_or(true, |kinds| kinds.contains(&kind))
    }
}

/// Per-subscriber counters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriberStats {
    pub id: u64,
    pub name: String,
    pub queue_depth: usize,
    pub dropped: u64,
}

/// Bus-wide counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    pub subscribers: usize,
    pub published: u64,
    pub delivered: u64,
    pub dropped: u64,
}

#[derive(Default)]
struct Inner {
    subscribers: RwLock<Vec<Subscriber>>,
    next_id: AtomicU64,
    published: AtomicU64,
    delivered: AtomicU64,
    dropped: AtomicU64,
}

/// Cloneable handle to a shared bus
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Inner>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber receiving every event kind
    pub fn subscribe(&self, name: impl Into<String>, capacity: usize) -> Subscription {
        self.register(name.into(), capacity, None)
    }

    /// Register a subscriber receiving only the given kinds
    pub fn subscribe_filtered(&self, name: impl Into<String>, capacity: usize, kinds: &[EventKind]) -> Subscription {
        self.register(name.into(), capacity, Some(kinds.to_vec()))
    }

    fn register(&self, name: String, capacity: usize, filter: Option<Vec<EventKind>>) -> Subscription {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let dropped = Arc::new(AtomicU64::new(0));

        debug!(subscriber_id = id, subscriber = %name, capacity, "Registered event bus subscriber");

        self.inner.subscribers.write().push(Subscriber {
            id,
            name: name.clone(),
            filter,
            tx,
            dropped: dropped.clone(),
        });

        Subscription::new(id, name, rx, dropped)
    }

    /// Publish an event to every interested subscriber
    ///
    /// Returns the number of queues the event was delivered to. Subscribers
    /// whose receiver has been dropped are pruned.
    pub fn publish(&self, event: Event) -> usize {
        let event = Arc::new(event);
        let kind = event.kind();
        let mut delivered = 0;
        let mut closed = false;

        self.inner.published.fetch_add(1, Ordering::Relaxed);

        {
            let subscribers = self.inner.subscribers.read();
            for subscriber in subscribers.iter().filter(|s| s.wants(kind)) {
                match subscriber.tx.try_send(Arc::clone(&event)) {
                    Ok(()) => delivered += 1,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        let dropped = subscriber.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                        self.inner.dropped.fetch_add(1, Ordering::Relaxed);
                        warn!(
                            subscriber_id = subscriber.id,
                            subscriber = %subscriber.name,
                            event_kind = ?kind,
                            dropped,
                            "Event bus: subscriber queue full, dropping event"
                        );
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => closed = true,
                }
            }
        }

        if closed {
            self.prune_closed();
        }

        self.inner.delivered.fetch_add(delivered as u64, Ordering::Relaxed);
        delivered
    }

    fn prune_closed(&self) {
        let mut subscribers = self.inner.subscribers.write();
        subscribers.retain(|s| {
            let open = !s.tx.is_closed();
            if !open {
                debug!(subscriber_id = s.id, subscriber = %s.name, "Pruned closed subscriber");
            }
            open
        });
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.read().len()
    }

    /// Total events dropped across all subscribers
    pub fn dropped_total(&self) -> u64 {
        self.inner.dropped.load(Ordering::Relaxed)
    }

    pub fn stats(&self) -> BusStats {
        BusStats {
            subscribers: self.subscriber_count(),
            published: self.inner.published.load(Ordering::Relaxed),
            delivered: self.inner.delivered.load(Ordering::Relaxed),
            dropped: self.dropped_total(),
        }
    }

    pub fn subscriber_stats(&self) -> Vec<SubscriberStats> {
        self.inner
            .subscribers
            .read()
            .iter()
            .map(|s| SubscriberStats {
                id: s.id,
                name: s.name.clone(),
                queue_depth: s.tx.max_capacity() - s.tx.capacity(),
                dropped: s.dropped.load(Ordering::Relaxed),
            })
            .collect()
    }
}
