//! Type-directed command and event dispatch.
//!
//! Handlers register for message types in a [`HandlerRegistry`]. A
//! [`Dispatcher`] routes each message to its handlers in registration order,
//! invoking them through [`CompiledInvoker`]s memoized in an [`InvokerCache`].
//! The [`bus`] module provides an in-memory publish/subscribe bus and the
//! [`EventBusRecorder`](bus::EventBusRecorder) decorator used by tests to
//! assert on what was published.

pub mod bus;
mod config;
mod dispatch;
mod error;
mod invoker;
mod message;
mod registry;

pub use config::{ConfigError, DispatcherConfig, FAILURE_POLICY_ENV};
pub use dispatch::{
    DispatchListener, DispatchOutcome, DispatchSummary, Dispatcher, FailurePolicy,
    TracingListener,
};
pub use error::{DispatchError, HandlerError};
pub use invoker::{
    CompiledInvoker, Erased, InvokeError, InvokeResult, InvokerCache, InvokerFactory,
    MethodBody, MethodDescriptor, MethodId, ParamInfo, ParamPassing, ReturnKind, MAX_ARITY,
};
pub use message::{Message, MessageType, TypeInfo};
pub use registry::{
    HandlerDescriptor, HandlerFactory, HandlerRegistry, HandlerSet, HandlerSource, Handles,
};

// Derive macros share their trait's name, as serde's do.
pub use sourced_dispatch_macros::{Handler, Message};
