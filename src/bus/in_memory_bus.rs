//! Synchronous in-memory bus for tests and single-process scenarios.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::message::{Message, MessageType};

use super::message_bus::{MessageBus, PublishError, Subscription, SubscriptionHandle};

type SubscriptionTable = HashMap<MessageType, Vec<(u64, Subscription)>>;

/// In-memory bus that delivers inline.
///
/// Features:
/// - Thread-safe (can be shared across threads via `Clone`)
/// - `publish` runs every subscriber of the message's type before returning,
///   in subscription order, and stops at the first subscriber error
/// - No lock is held while a subscriber runs, so handlers may publish
///
/// ## Example
///
/// ```ignore
/// use std::sync::Arc;
/// use sourced_dispatch::bus::{InMemoryBus, MessageBus};
///
/// let bus = InMemoryBus::new();
/// bus.subscribe(MessageType::of::<OrderPlaced>(), Arc::new(|message| {
///     println!("got {:?}", message);
///     Ok(())
/// }))?;
///
/// bus.publish_message(OrderPlaced { order_id: "o-1".into() })?;
/// ```
#[derive(Clone, Default)]
pub struct InMemoryBus {
    subscriptions: Arc<RwLock<SubscriptionTable>>,
    next_id: Arc<AtomicU64>,
}

impl InMemoryBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live subscriptions for `message_type`.
    pub fn subscriber_count(&self, message_type: &MessageType) -> usize {
        self.subscriptions
            .read()
            .map(|table| table.get(message_type).map_or(0, Vec::len))
            .unwrap_or(0)
    }
}

impl MessageBus for InMemoryBus {
    fn publish(&self, message: Arc<dyn Message>) -> Result<(), PublishError> {
        let message_type = message.message_type();

        // Snapshot so subscribers can publish or subscribe re-entrantly.
        let subscribers: Vec<Subscription> = self
            .subscriptions
            .read()
            .map_err(|_| PublishError::LockPoisoned("publish"))?
            .get(&message_type)
            .map(|subs| subs.iter().map(|(_, s)| Arc::clone(s)).collect())
            .unwrap_or_default();

        debug!(
            %message_type,
            subscribers = subscribers.len(),
            "publishing message"
        );

        for subscriber in subscribers {
            subscriber(&*message)?;
        }
        Ok(())
    }

    fn subscribe(
        &self,
        message_type: MessageType,
        handler: Subscription,
    ) -> Result<SubscriptionHandle, PublishError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.subscriptions
            .write()
            .map_err(|_| PublishError::LockPoisoned("subscribe"))?
            .entry(message_type)
            .or_default()
            .push((id, handler));

        debug!(%message_type, id, "subscribed");
        Ok(SubscriptionHandle { id, message_type })
    }

    fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<bool, PublishError> {
        let mut table = self
            .subscriptions
            .write()
            .map_err(|_| PublishError::LockPoisoned("unsubscribe"))?;

        let Some(subs) = table.get_mut(&handle.message_type) else {
            return Ok(false);
        };
        let before = subs.len();
        subs.retain(|(id, _)| *id != handle.id);
        let removed = subs.len() != before;
        if subs.is_empty() {
            table.remove(&handle.message_type);
        }
        Ok(removed)
    }
}

impl fmt::Debug for InMemoryBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let types = self.subscriptions.read().map(|t| t.len()).unwrap_or(0);
        f.debug_struct("InMemoryBus")
            .field("subscribed_types", &types)
            .finish()
    }
}
