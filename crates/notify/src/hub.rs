//! Fans anomaly events out to live subscriptions.
//!
//! Every subscription owns an unbounded queue, so `dispatch` never waits on
//! a consumer. A subscriber that stops draining its queue keeps growing it
//! until it is unsubscribed or dropped.

use std::collections::{HashMap, HashSet};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tracing::debug;

use waitwatch_core::{AnomalyEvent, EventSink};

struct Subscriber {
    /// Ride ids this subscriber wants; empty means all.
    filter: HashSet<String>,
    tx: mpsc::UnboundedSender<AnomalyEvent>,
}

impl Subscriber {
    fn wants(&self, event: &AnomalyEvent) -> bool {
        self.filter.is_empty() || self.filter.contains(&event.entity_id)
    }
}

#[derive(Default)]
struct HubInner {
    next_id: AtomicU64,
    subscribers: RwLock<HashMap<u64, Subscriber>>,
}

impl HubInner {
    fn remove(&self, id: u64) -> bool {
        self.subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id)
            .is_some()
    }
}

/// Registry of live subscriptions. Cheap to clone; clones share state.
#[derive(Clone, Default)]
pub struct NotificationHub {
    inner: Arc<HubInner>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscription for the given ride ids (empty = every ride).
    ///
    /// The subscription sees every dispatch that starts after this returns.
    pub fn subscribe<I, S>(&self, ride_ids: I) -> Subscription
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let filter: HashSet<String> = ride_ids.into_iter().map(Into::into).collect();
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);

        debug!(subscription = id, rides = filter.len(), "subscription added");
        self.inner
            .subscribers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, Subscriber { filter, tx });

        Subscription {
            id,
            rx,
            hub: Arc::downgrade(&self.inner),
        }
    }

    /// Remove a subscription. Events already queued for it are discarded
    /// with it.
    pub fn unsubscribe(&self, subscription: Subscription) {
        drop(subscription);
    }

    /// Queue `event` for every subscription that wants it and return how
    /// many received it. Never blocks.
    ///
    /// Subscriptions whose receiving side is gone are pruned.
    pub fn dispatch(&self, event: &AnomalyEvent) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();
        {
            let subscribers = self
                .inner
                .subscribers
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            for (id, subscriber) in subscribers.iter() {
                if !subscriber.wants(event) {
                    continue;
                }
                if subscriber.tx.send(event.clone()).is_ok() {
                    delivered += 1;
                } else {
                    closed.push(*id);
                }
            }
        }
        for id in closed {
            if self.inner.remove(id) {
                debug!(subscription = id, "pruned closed subscription");
            }
        }
        delivered
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl EventSink for NotificationHub {
    fn publish(&self, events: Vec<AnomalyEvent>) {
        for event in &events {
            let delivered = self.dispatch(event);
            debug!(
                ride_id = %event.entity_id,
                event = %event.kind,
                delivered,
                "event dispatched"
            );
        }
    }
}

/// Receiving end of one subscription.
///
/// Dropping it unsubscribes. It is also a [`Stream`] of events, which is how
/// the SSE endpoint consumes it.
pub struct Subscription {
    id: u64,
    rx: mpsc::UnboundedReceiver<AnomalyEvent>,
    hub: Weak<HubInner>,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait for the next event. Returns `None` once the hub is gone.
    pub async fn recv(&mut self) -> Option<AnomalyEvent> {
        self.rx.recv().await
    }

    /// Next queued event without waiting.
    pub fn try_recv(&mut self) -> Option<AnomalyEvent> {
        self.rx.try_recv().ok()
    }
}

impl Stream for Subscription {
    type Item = AnomalyEvent;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            if hub.remove(self.id) {
                debug!(subscription = self.id, "subscription removed");
            }
        }
    }
}
