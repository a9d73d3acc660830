//! Handler registry - the routing table from message type to handlers.
//!
//! Handlers declare what they consume through the [`Handles<M>`] capability.
//! The registry stores one [`HandlerDescriptor`] per registration, keyed by
//! [`MessageType`](crate::MessageType), in insertion order. That order is the
//! dispatch order.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use sourced_dispatch::{HandlerRegistry, Handles, HandlerError};
//!
//! struct AuditLog;
//!
//! impl Handles<OrderPlaced> for AuditLog {
//!     fn handle(&self, message: &OrderPlaced) -> Result<(), HandlerError> {
//!         tracing::info!(order_id = %message.order_id, "order placed");
//!         Ok(())
//!     }
//! }
//!
//! let registry = HandlerRegistry::new();
//! registry.register::<_, OrderPlaced>(Arc::new(AuditLog))?;
//! registry.register_factory::<_, OrderPlaced, _>(|| Billing::connect())?;
//! ```

mod handler;
mod registry;

pub use handler::{HandlerDescriptor, HandlerFactory, HandlerSet, HandlerSource, Handles};
pub use registry::HandlerRegistry;
