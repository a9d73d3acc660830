use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::message::{Message, TypeInfo};
use crate::registry::Handles;

use super::InvokeError;

/// Erased return value of an invoked method.
pub type Erased = Box<dyn Any + Send>;

/// Result of an erased call. `Ok(None)` is the "no result" sentinel for
/// methods returning `()`.
pub type InvokeResult = Result<Option<Erased>, InvokeError>;

/// Erased method body: `(target, arguments) -> result`.
pub type MethodBody = dyn Fn(&dyn Any, &[&dyn Any]) -> InvokeResult + Send + Sync;

/// How a parameter is passed to the method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamPassing {
    /// `&T` - can be fed from a shared erased argument.
    Shared,
    /// `&mut T` - erased arguments are shared, so this cannot be supplied.
    Exclusive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamInfo {
    pub ty: TypeInfo,
    pub passing: ParamPassing,
}

impl ParamInfo {
    pub fn shared<T: Any>() -> Self {
        Self {
            ty: TypeInfo::of::<T>(),
            passing: ParamPassing::Shared,
        }
    }

    pub fn exclusive<T: Any>() -> Self {
        Self {
            ty: TypeInfo::of::<T>(),
            passing: ParamPassing::Exclusive,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnKind {
    Unit,
    Value(TypeInfo),
}

impl ReturnKind {
    fn of<R: Any>() -> Self {
        if TypeId::of::<R>() == TypeId::of::<()>() {
            ReturnKind::Unit
        } else {
            ReturnKind::Value(TypeInfo::of::<R>())
        }
    }
}

/// Identity of a method: declaring type, name, parameter types and body.
///
/// Two overloads on the same type (e.g. `Handles<A>` and `Handles<B>`) share
/// a name but differ in parameters, so they get distinct identities. The body
/// is keyed by the type of the closure it was built from: descriptors built
/// from the same closure expression share an identity, two different
/// closures never do. State captured by the closure is not part of the key.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MethodId {
    declaring: TypeInfo,
    name: &'static str,
    params: Vec<TypeInfo>,
    body: TypeId,
}

impl MethodId {
    pub fn declaring(&self) -> TypeInfo {
        self.declaring
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}(", self.declaring.name(), self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(param.name())?;
        }
        f.write_str(")")
    }
}

impl fmt::Debug for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Description of a method on some target type, with its erased body.
///
/// The typed constructors monomorphize the narrowing from `&dyn Any` to the
/// concrete target and parameter types once, at construction. `raw` accepts a
/// hand-built body for descriptors assembled at runtime.
#[derive(Clone)]
pub struct MethodDescriptor {
    declaring: TypeInfo,
    name: &'static str,
    params: Vec<ParamInfo>,
    returns: ReturnKind,
    body: Arc<MethodBody>,
    body_key: TypeId,
}

impl MethodDescriptor {
    /// A method taking no arguments besides the target.
    pub fn nullary<T, R, F>(name: &'static str, f: F) -> Self
    where
        T: Any,
        R: Any + Send,
        F: Fn(&T) -> Result<R, HandlerError> + Send + Sync + 'static,
    {
        let body = move |target: &dyn Any, _args: &[&dyn Any]| -> InvokeResult {
            let target = narrow_target::<T>(target)?;
            erase(f(target))
        };
        Self {
            declaring: TypeInfo::of::<T>(),
            name,
            params: Vec::new(),
            returns: ReturnKind::of::<R>(),
            body: Arc::new(body),
            body_key: TypeId::of::<F>(),
        }
    }

    /// A method taking one shared argument.
    pub fn unary<T, A, R, F>(name: &'static str, f: F) -> Self
    where
        T: Any,
        A: Any,
        R: Any + Send,
        F: Fn(&T, &A) -> Result<R, HandlerError> + Send + Sync + 'static,
    {
        let body = move |target: &dyn Any, args: &[&dyn Any]| -> InvokeResult {
            let target = narrow_target::<T>(target)?;
            let a = narrow_arg::<A>(args, 0)?;
            erase(f(target, a))
        };
        Self {
            declaring: TypeInfo::of::<T>(),
            name,
            params: vec![ParamInfo::shared::<A>()],
            returns: ReturnKind::of::<R>(),
            body: Arc::new(body),
            body_key: TypeId::of::<F>(),
        }
    }

    /// A method taking two shared arguments.
    pub fn binary<T, A, B, R, F>(name: &'static str, f: F) -> Self
    where
        T: Any,
        A: Any,
        B: Any,
        R: Any + Send,
        F: Fn(&T, &A, &B) -> Result<R, HandlerError> + Send + Sync + 'static,
    {
        let body = move |target: &dyn Any, args: &[&dyn Any]| -> InvokeResult {
            let target = narrow_target::<T>(target)?;
            let a = narrow_arg::<A>(args, 0)?;
            let b = narrow_arg::<B>(args, 1)?;
            erase(f(target, a, b))
        };
        Self {
            declaring: TypeInfo::of::<T>(),
            name,
            params: vec![ParamInfo::shared::<A>(), ParamInfo::shared::<B>()],
            returns: ReturnKind::of::<R>(),
            body: Arc::new(body),
            body_key: TypeId::of::<F>(),
        }
    }

    /// The `handle` method of `H`'s `Handles<M>` capability.
    pub fn handler<H, M>() -> Self
    where
        H: Handles<M>,
        M: Message,
    {
        Self::unary::<H, M, (), _>("handle", |handler: &H, message: &M| handler.handle(message))
    }

    /// A descriptor assembled at runtime. The body does its own narrowing.
    pub fn raw<F>(
        declaring: TypeInfo,
        name: &'static str,
        params: Vec<ParamInfo>,
        returns: ReturnKind,
        body: F,
    ) -> Self
    where
        F: Fn(&dyn Any, &[&dyn Any]) -> InvokeResult + Send + Sync + 'static,
    {
        Self {
            declaring,
            name,
            params,
            returns,
            body: Arc::new(body),
            body_key: TypeId::of::<F>(),
        }
    }

    pub fn id(&self) -> MethodId {
        MethodId {
            declaring: self.declaring,
            name: self.name,
            params: self.params.iter().map(|p| p.ty).collect(),
            body: self.body_key,
        }
    }

    pub fn declaring(&self) -> TypeInfo {
        self.declaring
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    pub fn returns(&self) -> ReturnKind {
        self.returns
    }

    pub(crate) fn body(&self) -> Arc<MethodBody> {
        Arc::clone(&self.body)
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("id", &self.id())
            .field("returns", &self.returns)
            .finish()
    }
}

fn narrow_target<T: Any>(target: &dyn Any) -> Result<&T, InvokeError> {
    target
        .downcast_ref::<T>()
        .ok_or_else(|| InvokeError::TargetTypeMismatch {
            expected: std::any::type_name::<T>(),
        })
}

fn narrow_arg<'a, A: Any>(args: &[&'a dyn Any], position: usize) -> Result<&'a A, InvokeError> {
    args.get(position)
        .copied()
        .and_then(|arg| arg.downcast_ref::<A>())
        .ok_or_else(|| InvokeError::ArgumentTypeMismatch {
            position,
            expected: std::any::type_name::<A>(),
        })
}

fn erase<R: Any + Send>(result: Result<R, HandlerError>) -> InvokeResult {
    let value = result.map_err(InvokeError::Handler)?;
    if TypeId::of::<R>() == TypeId::of::<()>() {
        Ok(None)
    } else {
        Ok(Some(Box::new(value)))
    }
}
