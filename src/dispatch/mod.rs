//! Dispatcher - routes one message to every handler registered for its type.
//!
//! ```text
//! message ──▶ MessageType ──▶ HandlerRegistry::resolve
//!                                   │ (registration order)
//!                                   ▼
//!                 InvokerCache::get_or_build ──▶ invoke(handler, [message])
//!                                   │
//!                                   ▼
//!                 DispatchListener(s) ──▶ DispatchOutcome
//! ```
//!
//! Handler failures follow a [`FailurePolicy`]: fail-fast (default) stops at
//! the first failure, collect-all keeps going and reports every failure.
//! A message with no handlers is a success with zero invocations.

mod dispatcher;
mod listener;
mod outcome;

pub use dispatcher::Dispatcher;
pub use listener::{DispatchListener, TracingListener};
pub use outcome::{DispatchOutcome, DispatchSummary, FailurePolicy};
