//! Messages - commands and domain events routed by runtime type.
//!
//! Every message carries exactly one [`MessageType`], fixed by its Rust type.
//! Routing keys on the type identity, so the set of message types stays open:
//! any crate can add new messages without touching a central enum.
//!
//! ## Example
//!
//! ```ignore
//! use sourced_dispatch::{Message, MessageType};
//!
//! #[derive(Debug, Clone, Message)]
//! struct OrderPlaced {
//!     order_id: String,
//! }
//!
//! let event = OrderPlaced { order_id: "o-1".into() };
//! assert_eq!(event.message_type(), MessageType::of::<OrderPlaced>());
//! ```

mod message_type;

pub use message_type::{Message, MessageType, TypeInfo};
