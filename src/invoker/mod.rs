//! Invokers - reusable erased callables bound to one method.
//!
//! ```text
//! MethodDescriptor ──InvokerFactory::build──▶ CompiledInvoker
//!        │                                         ▲
//!        └──────────InvokerCache::get_or_build─────┘ (once per MethodId)
//! ```
//!
//! The factory validates the signature and wraps the descriptor's
//! monomorphized body; the cache makes sure every caller observes one
//! canonical invoker per method identity.

mod cache;
mod factory;
mod method;

pub use cache::InvokerCache;
pub use factory::{CompiledInvoker, InvokerFactory, MAX_ARITY};
pub use method::{
    Erased, InvokeResult, MethodBody, MethodDescriptor, MethodId, ParamInfo, ParamPassing,
    ReturnKind,
};

use thiserror::Error;

use crate::error::HandlerError;

/// Failure raised by a compiled invoker.
///
/// Carries no handler or message context; the dispatcher adds that when it
/// turns this into a [`DispatchError`](crate::DispatchError).
#[derive(Debug, Error)]
pub enum InvokeError {
    #[error("argument {position} cannot be narrowed to {expected}")]
    ArgumentTypeMismatch {
        position: usize,
        expected: &'static str,
    },
    #[error("target is not a {expected}")]
    TargetTypeMismatch { expected: &'static str },
    #[error("{method} takes {expected} argument(s), got {actual}")]
    ArityMismatch {
        method: String,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Handler(HandlerError),
}
