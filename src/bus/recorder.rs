//! Recording decorator over a [`MessageBus`].

use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::message::{Message, MessageType};

use super::message_bus::{MessageBus, PublishError, Subscription, SubscriptionHandle};

/// Ordered, append-only log of published messages.
///
/// Cloning shares the log. `clear` is the only removal; callers that clear
/// while other threads publish get whatever order the lock hands out, so
/// clear between scenarios, not during one.
#[derive(Clone, Default)]
pub struct RecordedMessageLog {
    entries: Arc<Mutex<Vec<Arc<dyn Message>>>>,
}

impl RecordedMessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `message`. A poisoned log is recovered and logged, so a
    /// panicking reader never stops recording.
    pub(crate) fn append(&self, message: Arc<dyn Message>) {
        let mut entries = self.entries.lock().unwrap_or_else(|poisoned| {
            warn!(
                message_type = %message.message_type(),
                "recorded message log was poisoned, recovering"
            );
            poisoned.into_inner()
        });
        entries.push(message);
    }

    /// Recorded messages of type `T`, in recording order.
    pub fn query<T: Message + Clone>(&self) -> Vec<T> {
        self.snapshot()
            .iter()
            .filter_map(|message| message.as_any().downcast_ref::<T>().cloned())
            .collect()
    }

    /// All recorded messages, in recording order.
    pub fn snapshot(&self) -> Vec<Arc<dyn Message>> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn message_types(&self) -> Vec<MessageType> {
        self.snapshot().iter().map(|m| m.message_type()).collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        match self.entries.lock() {
            Ok(mut entries) => entries.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl fmt::Debug for RecordedMessageLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.snapshot().iter()).finish()
    }
}

/// Transparent decorator that records every published message.
///
/// `publish` appends to the log, then forwards the message unchanged to the
/// wrapped bus. Recording cannot fail, so every publish is forwarded.
/// `subscribe` and `unsubscribe` go straight to the wrapped bus.
///
/// ## Example
///
/// ```ignore
/// let bus = EventBusRecorder::new(InMemoryBus::new());
/// bus.publish_message(OrderPlaced { order_id: "o-1".into() })?;
///
/// let placed: Vec<OrderPlaced> = bus.query();
/// assert_eq!(placed[0].order_id, "o-1");
///
/// bus.clear();
/// assert!(bus.query::<OrderPlaced>().is_empty());
/// ```
pub struct EventBusRecorder<B: MessageBus> {
    inner: B,
    log: RecordedMessageLog,
}

impl<B: MessageBus> EventBusRecorder<B> {
    pub fn new(inner: B) -> Self {
        Self::with_log(inner, RecordedMessageLog::new())
    }

    /// Record into an existing log, e.g. one shared by several recorders.
    pub fn with_log(inner: B, log: RecordedMessageLog) -> Self {
        Self { inner, log }
    }

    /// Recorded messages of type `T`, in recording order.
    pub fn query<T: Message + Clone>(&self) -> Vec<T> {
        self.log.query()
    }

    pub fn messages(&self) -> Vec<Arc<dyn Message>> {
        self.log.snapshot()
    }

    pub fn message_types(&self) -> Vec<MessageType> {
        self.log.message_types()
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// Empty the log. Use between independent scenarios.
    pub fn clear(&self) {
        self.log.clear();
    }

    pub fn log(&self) -> &RecordedMessageLog {
        &self.log
    }

    pub fn inner(&self) -> &B {
        &self.inner
    }

    pub fn into_inner(self) -> B {
        self.inner
    }
}

impl<B: MessageBus> MessageBus for EventBusRecorder<B> {
    fn publish(&self, message: Arc<dyn Message>) -> Result<(), PublishError> {
        self.log.append(Arc::clone(&message));
        self.inner.publish(message)
    }

    fn subscribe(
        &self,
        message_type: MessageType,
        handler: Subscription,
    ) -> Result<SubscriptionHandle, PublishError> {
        self.inner.subscribe(message_type, handler)
    }

    fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<bool, PublishError> {
        self.inner.unsubscribe(handle)
    }
}

impl<B: MessageBus + fmt::Debug> fmt::Debug for EventBusRecorder<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBusRecorder")
            .field("inner", &self.inner)
            .field("recorded", &self.log.len())
            .finish()
    }
}
