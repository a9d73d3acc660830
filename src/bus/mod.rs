//! Message bus - publish/subscribe plumbing and the recording decorator.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              EventBusRecorder<B> (optional)                  │
//! │  - appends every published message to a RecordedMessageLog  │
//! │  - forwards publish/subscribe unchanged to B                │
//! └─────────────────────────────────────────────────────────────┘
//!                            │
//!                            ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   MessageBus trait                           │
//! │  publish(message) / subscribe(type, handler) / unsubscribe  │
//! └─────────────────────────────────────────────────────────────┘
//!          │                                      │
//!          ▼                                      ▼
//! ┌─────────────────┐                 ┌─────────────────────────┐
//! │  InMemoryBus    │                 │  broker-backed bus      │
//! │  (included)     │                 │  (external)             │
//! └─────────────────┘                 └─────────────────────────┘
//! ```
//!
//! ## Usage in tests
//!
//! ```ignore
//! let bus = EventBusRecorder::new(InMemoryBus::new());
//! dispatcher.subscribe_to(&bus)?;
//!
//! bus.publish_message(OrderPlaced { order_id: "o-1".into() })?;
//! assert_eq!(bus.query::<OrderPlaced>().len(), 1);
//!
//! bus.clear();
//! ```

mod in_memory_bus;
mod message_bus;
mod recorder;

pub use in_memory_bus::InMemoryBus;
pub use message_bus::{MessageBus, PublishError, Subscription, SubscriptionHandle};
pub use recorder::{EventBusRecorder, RecordedMessageLog};
