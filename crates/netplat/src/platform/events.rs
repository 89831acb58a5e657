//! Cache change notifications.
//!
//! Every change the cache accepts is published as a [`CacheChange`] to all
//! live subscribers, in the order the changes were absorbed. A change
//! always carries whole objects: subscribers re-derive their state from
//! `new` (or from cache lookups) instead of diffing fields.
//!
//! # Example
//!
//! ```ignore
//! use netplat::platform::{CacheOp, FakePlatform, Platform};
//! use tokio_stream::StreamExt;
//!
//! let mut platform = FakePlatform::new();
//! let mut changes = platform.subscribe();
//!
//! platform.link_add(&BridgeLink::new("br0"))?;
//!
//! // Synchronous event loop
//! for change in changes.drain() {
//!     println!("{}", change);
//! }
//!
//! // Or as an async stream
//! while let Some(change) = changes.next().await {
//!     if change.op == CacheOp::Removed { /* ... */ }
//! }
//! ```

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_stream::Stream;
use tracing::warn;

use super::cache::{CacheOp, CacheUpdate};
use super::object::{Link, ObjectKind, ObjectRef};

/// A classified change to the cache.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct CacheChange {
    pub op: CacheOp,
    pub kind: ObjectKind,
    pub old: Option<ObjectRef>,
    pub new: Option<ObjectRef>,
}

impl CacheChange {
    /// Build a change from a cache update. Unchanged updates yield `None`.
    pub fn from_update(update: &CacheUpdate) -> Option<Self> {
        if !update.is_change() {
            return None;
        }
        let kind = update.object()?.kind();
        Some(Self {
            op: update.op,
            kind,
            old: update.old.clone(),
            new: update.new.clone(),
        })
    }

    /// The object this change is about (`new`, or `old` for removals).
    pub fn object(&self) -> Option<&ObjectRef> {
        self.new.as_ref().or(self.old.as_ref())
    }

    /// The interface the changed object belongs to.
    pub fn ifindex(&self) -> i32 {
        self.object().map_or(0, |obj| obj.ifindex())
    }

    /// The link, if this is a link change.
    pub fn as_link(&self) -> Option<&Link> {
        self.object().and_then(|obj| obj.as_link())
    }

    pub fn is_link(&self) -> bool {
        self.kind == ObjectKind::Link
    }

    pub fn is_removed(&self) -> bool {
        self.op == CacheOp::Removed
    }
}

impl std::fmt::Display for CacheChange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.op, self.kind)?;
        if let Some(obj) = self.object() {
            write!(f, ": {}", obj)?;
        }
        Ok(())
    }
}

/// Sending half of one subscription.
#[derive(Debug)]
enum Subscriber {
    Unbounded(mpsc::UnboundedSender<CacheChange>),
    Bounded {
        tx: mpsc::Sender<CacheChange>,
        lagged: Arc<AtomicBool>,
    },
}

impl Subscriber {
    /// Queue a change. Returns false once the subscriber is gone.
    fn deliver(&self, change: &CacheChange) -> bool {
        match self {
            Self::Unbounded(tx) => tx.send(change.clone()).is_ok(),
            Self::Bounded { tx, lagged } => match tx.try_send(change.clone()) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(capacity = tx.max_capacity(), "subscriber lagged, dropping it");
                    lagged.store(true, Ordering::Release);
                    false
                }
                Err(TrySendError::Closed(_)) => false,
            },
        }
    }

    fn is_closed(&self) -> bool {
        match self {
            Self::Unbounded(tx) => tx.is_closed(),
            Self::Bounded { tx, .. } => tx.is_closed(),
        }
    }
}

/// Fans out changes to every subscriber.
///
/// Publishing never blocks. A [`subscribe`](Notifier::subscribe) queue
/// grows until its consumer drains it. A
/// [`subscribe_bounded`](Notifier::subscribe_bounded) queue holds at most
/// `capacity` changes; a subscriber that falls behind is disconnected and
/// its stream reports [`ChangeStream::is_lagged`], after which the consumer
/// resyncs from the cache.
#[derive(Debug, Default)]
pub struct Notifier {
    subscribers: Vec<Subscriber>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber with an unbounded queue.
    pub fn subscribe(&mut self) -> ChangeStream {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(Subscriber::Unbounded(tx));
        ChangeStream {
            rx: Receiver::Unbounded(rx),
            lagged: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Register a subscriber that queues at most `capacity` changes.
    ///
    /// A zero capacity is raised to one.
    pub fn subscribe_bounded(&mut self, capacity: usize) -> ChangeStream {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let lagged = Arc::new(AtomicBool::new(false));
        self.subscribers.push(Subscriber::Bounded {
            tx,
            lagged: lagged.clone(),
        });
        ChangeStream {
            rx: Receiver::Bounded(rx),
            lagged,
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.iter().filter(|sub| !sub.is_closed()).count()
    }

    /// Publish a cache update. Unchanged updates are dropped.
    ///
    /// Returns true if a change was published.
    pub fn publish(&mut self, update: &CacheUpdate) -> bool {
        match CacheChange::from_update(update) {
            Some(change) => {
                self.send(change);
                true
            }
            None => false,
        }
    }

    /// Publish a change to every live subscriber, dropping closed and
    /// lagging ones.
    pub fn send(&mut self, change: CacheChange) {
        self.subscribers.retain(|sub| sub.deliver(&change));
    }
}

#[derive(Debug)]
enum Receiver {
    Unbounded(mpsc::UnboundedReceiver<CacheChange>),
    Bounded(mpsc::Receiver<CacheChange>),
}

/// Receiving side of a subscription.
///
/// Implements [`Stream`] for async consumers and offers non-blocking
/// accessors for a synchronous event loop. The stream ends when the
/// notifier goes away or drops this subscriber for lagging.
#[derive(Debug)]
pub struct ChangeStream {
    rx: Receiver,
    lagged: Arc<AtomicBool>,
}

impl ChangeStream {
    /// Take the next queued change without waiting.
    pub fn try_next_change(&mut self) -> Option<CacheChange> {
        match &mut self.rx {
            Receiver::Unbounded(rx) => rx.try_recv().ok(),
            Receiver::Bounded(rx) => rx.try_recv().ok(),
        }
    }

    /// Take every queued change.
    pub fn drain(&mut self) -> Vec<CacheChange> {
        std::iter::from_fn(|| self.try_next_change()).collect()
    }

    /// Returns true if changes were lost because the queue was full.
    pub fn is_lagged(&self) -> bool {
        self.lagged.load(Ordering::Acquire)
    }
}

impl Stream for ChangeStream {
    type Item = CacheChange;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        match &mut self.rx {
            Receiver::Unbounded(rx) => rx.poll_recv(cx),
            Receiver::Bounded(rx) => rx.poll_recv(cx),
        }
    }
}
