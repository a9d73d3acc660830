//! Core publish/subscribe trait.

use std::sync::Arc;

use thiserror::Error;

use crate::error::DispatchError;
use crate::message::{Message, MessageType};

/// Callback run for each published message of a subscribed type.
pub type Subscription = Arc<dyn Fn(&dyn Message) -> Result<(), PublishError> + Send + Sync>;

/// Error type for publish and subscribe operations.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The bus rejected the message.
    #[error("message rejected: {0}")]
    Rejected(String),
    /// A bus table lock was poisoned.
    #[error("bus lock poisoned during {0}")]
    LockPoisoned(&'static str),
    /// A subscribed dispatcher reported handler failures.
    #[error("dispatch failed: {0}")]
    Dispatch(#[source] Box<DispatchError>),
}

impl From<DispatchError> for PublishError {
    fn from(err: DispatchError) -> Self {
        PublishError::Dispatch(Box::new(err))
    }
}

/// Returned by [`MessageBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    pub id: u64,
    pub message_type: MessageType,
}

/// Trait for publish/subscribe buses.
///
/// Implementations might include:
/// - `InMemoryBus` - synchronous, for tests and single-process apps
/// - `EventBusRecorder` - decorator that records what was published
/// - broker-backed buses living outside this crate
pub trait MessageBus: Send + Sync {
    /// Publish a message to every subscriber of its type.
    fn publish(&self, message: Arc<dyn Message>) -> Result<(), PublishError>;

    /// Subscribe `handler` to messages of `message_type`.
    fn subscribe(
        &self,
        message_type: MessageType,
        handler: Subscription,
    ) -> Result<SubscriptionHandle, PublishError>;

    /// Remove a subscription. Returns `false` if it was already gone.
    fn unsubscribe(&self, handle: &SubscriptionHandle) -> Result<bool, PublishError>;

    /// Publish multiple messages, in order.
    ///
    /// Default implementation publishes sequentially and stops at the first
    /// error.
    fn publish_batch(&self, messages: Vec<Arc<dyn Message>>) -> Result<(), PublishError> {
        for message in messages {
            self.publish(message)?;
        }
        Ok(())
    }

    /// Publish a concrete message value.
    fn publish_message<M: Message>(&self, message: M) -> Result<(), PublishError>
    where
        Self: Sized,
    {
        self.publish(Arc::new(message))
    }
}
