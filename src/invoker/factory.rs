use std::any::Any;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::DispatchError;

use super::method::{InvokeResult, MethodBody, MethodDescriptor, MethodId, ParamPassing, ReturnKind};
use super::InvokeError;

/// Upper bound on parameters an invoker accepts.
pub const MAX_ARITY: usize = 16;

/// Turns a [`MethodDescriptor`] into a [`CompiledInvoker`].
///
/// Stateless; callers cache the result (see [`InvokerCache`](super::InvokerCache)).
#[derive(Debug, Default, Clone, Copy)]
pub struct InvokerFactory;

impl InvokerFactory {
    pub fn new() -> Self {
        Self
    }

    /// Check that `method` can be represented as an invoker.
    pub fn validate(&self, method: &MethodDescriptor) -> Result<(), DispatchError> {
        if method.params().len() > MAX_ARITY {
            return Err(DispatchError::UnsupportedSignature {
                method: method.id().to_string(),
                reason: format!(
                    "{} parameters exceed the limit of {}",
                    method.params().len(),
                    MAX_ARITY
                ),
            });
        }

        if let Some(position) = method
            .params()
            .iter()
            .position(|p| p.passing == ParamPassing::Exclusive)
        {
            return Err(DispatchError::UnsupportedSignature {
                method: method.id().to_string(),
                reason: format!(
                    "parameter {} is taken by exclusive reference, erased arguments are shared",
                    position
                ),
            });
        }

        Ok(())
    }

    /// Build an invoker for `method`.
    ///
    /// The descriptor is only read; the invoker keeps its own handle on the
    /// method body and identity.
    pub fn build(&self, method: &MethodDescriptor) -> Result<CompiledInvoker, DispatchError> {
        self.validate(method)?;

        let id = method.id();
        debug!(method = %id, arity = method.params().len(), "built invoker");

        Ok(CompiledInvoker {
            inner: Arc::new(InvokerInner {
                arity: method.params().len(),
                returns: method.returns(),
                body: method.body(),
                id,
            }),
        })
    }
}

struct InvokerInner {
    id: MethodId,
    arity: usize,
    returns: ReturnKind,
    body: Arc<MethodBody>,
}

/// A reusable callable bound to one method signature.
///
/// Cloning is cheap and keeps referential identity, see [`CompiledInvoker::ptr_eq`].
#[derive(Clone)]
pub struct CompiledInvoker {
    inner: Arc<InvokerInner>,
}

impl CompiledInvoker {
    /// Invoke the method on `target` with erased `args`.
    ///
    /// Returns `Ok(None)` for methods returning `()`.
    pub fn invoke(&self, target: &dyn Any, args: &[&dyn Any]) -> InvokeResult {
        if args.len() != self.inner.arity {
            return Err(InvokeError::ArityMismatch {
                method: self.inner.id.to_string(),
                expected: self.inner.arity,
                actual: args.len(),
            });
        }
        (self.inner.body)(target, args)
    }

    pub fn method(&self) -> &MethodId {
        &self.inner.id
    }

    pub fn arity(&self) -> usize {
        self.inner.arity
    }

    pub fn returns(&self) -> ReturnKind {
        self.inner.returns
    }

    /// Whether both handles point at the same built invoker.
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Arc::ptr_eq(&a.inner, &b.inner)
    }
}

impl fmt::Debug for CompiledInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledInvoker")
            .field("method", &self.inner.id)
            .field("returns", &self.inner.returns)
            .finish()
    }
}
