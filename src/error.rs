//! Error types for registration, invocation and dispatch.

use thiserror::Error;

use crate::bus::PublishError;
use crate::invoker::InvokeError;
use crate::message::MessageType;

/// Error returned by handler code.
#[derive(Debug, Error)]
pub enum HandlerError {
    /// Business logic rejected the message (validation, invariant violation).
    #[error("rejected: {0}")]
    Rejected(String),
    /// Aggregate or resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Payload decode failed.
    #[error("decode failed: {0}")]
    DecodeFailed(String),
    /// A follow-up publish from inside the handler failed.
    #[error("publish error: {0}")]
    Publish(#[from] PublishError),
    /// Other error.
    #[error("handler error: {0}")]
    Other(Box<dyn std::error::Error + Send + Sync>),
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        HandlerError::DecodeFailed(err.to_string())
    }
}

/// Error type for the dispatch core.
///
/// Registration-time variants (`UnsupportedSignature`, `InvalidHandlerShape`)
/// are meant to abort wiring. Dispatch-time variants are reported through
/// [`DispatchOutcome`](crate::DispatchOutcome).
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The method cannot be compiled into an invoker.
    #[error("unsupported signature for {method}: {reason}")]
    UnsupportedSignature { method: String, reason: String },

    /// An erased argument could not be narrowed to the declared parameter type.
    #[error(
        "argument {position} of {handler} expected {expected}, got message {message_type}"
    )]
    ArgumentTypeMismatch {
        handler: &'static str,
        message_type: MessageType,
        position: usize,
        expected: &'static str,
    },

    /// The handler instance is not of the method's declaring type.
    #[error("handler instance for {message_type} is not a {expected}")]
    TargetTypeMismatch {
        message_type: MessageType,
        expected: &'static str,
    },

    /// Wrong number of arguments supplied to an invoker.
    #[error("{method} takes {expected} argument(s), got {actual}")]
    ArityMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },

    /// Registration-time rejection of a malformed handler.
    #[error("invalid handler {handler} for {message_type}: {reason}")]
    InvalidHandlerShape {
        handler: &'static str,
        message_type: MessageType,
        reason: String,
    },

    /// The handler's own logic failed.
    #[error("handler {handler} failed on {message_type}: {source}")]
    HandlerExecutionFailure {
        handler: &'static str,
        message_type: MessageType,
        #[source]
        source: HandlerError,
    },

    /// A shared table lock was poisoned by a panicking thread.
    #[error("lock poisoned during {0}")]
    LockPoisoned(&'static str),

    /// Several handler failures collected under the collect-all policy.
    #[error("{} handler(s) failed", .0.len())]
    Failures(Vec<DispatchError>),
}

impl DispatchError {
    /// Attach handler and message-type context to a raw invoker error.
    pub(crate) fn from_invoke(
        err: InvokeError,
        handler: &'static str,
        message_type: MessageType,
    ) -> Self {
        match err {
            InvokeError::ArgumentTypeMismatch { position, expected } => {
                DispatchError::ArgumentTypeMismatch {
                    handler,
                    message_type,
                    position,
                    expected,
                }
            }
            InvokeError::TargetTypeMismatch { expected } => DispatchError::TargetTypeMismatch {
                message_type,
                expected,
            },
            InvokeError::ArityMismatch {
                method,
                expected,
                actual,
            } => DispatchError::ArityMismatch {
                method,
                expected,
                actual,
            },
            InvokeError::Handler(source) => DispatchError::HandlerExecutionFailure {
                handler,
                message_type,
                source,
            },
        }
    }

    /// Whether this failure came from the handler's own logic.
    pub fn is_handler_failure(&self) -> bool {
        matches!(self, DispatchError::HandlerExecutionFailure { .. })
    }
}
