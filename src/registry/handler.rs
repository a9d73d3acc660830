use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::invoker::MethodDescriptor;
use crate::message::{Message, MessageType};

/// Capability marker: "handles messages of type `M`".
pub trait Handles<M: Message>: Send + Sync + 'static {
    fn handle(&self, message: &M) -> Result<(), HandlerError>;
}

/// Every message type a handler serves, with the method for each.
///
/// Usually generated by `#[derive(Handler)]` with `#[handles(...)]`.
pub trait HandlerSet: Send + Sync + 'static {
    fn handled_messages() -> Vec<(MessageType, MethodDescriptor)>;
}

/// Produces a handler instance on demand.
pub type HandlerFactory = dyn Fn() -> Arc<dyn Any + Send + Sync> + Send + Sync;

/// Where a handler instance comes from.
#[derive(Clone)]
pub enum HandlerSource {
    /// One shared instance, possibly also held by the application.
    Instance(Arc<dyn Any + Send + Sync>),
    /// A fresh instance per dispatch, from the application's resolver.
    Factory(Arc<HandlerFactory>),
}

impl HandlerSource {
    pub fn instance<H: Any + Send + Sync>(handler: Arc<H>) -> Self {
        HandlerSource::Instance(handler)
    }

    pub fn factory<H, F>(factory: F) -> Self
    where
        H: Any + Send + Sync,
        F: Fn() -> H + Send + Sync + 'static,
    {
        HandlerSource::Factory(Arc::new(move || Arc::new(factory()) as Arc<dyn Any + Send + Sync>))
    }

    /// Resolve the handler instance.
    pub fn resolve(&self) -> Arc<dyn Any + Send + Sync> {
        match self {
            HandlerSource::Instance(instance) => Arc::clone(instance),
            HandlerSource::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for HandlerSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerSource::Instance(_) => f.write_str("Instance"),
            HandlerSource::Factory(_) => f.write_str("Factory"),
        }
    }
}

/// One registration: handler source, accepted message type, method to invoke.
#[derive(Debug, Clone)]
pub struct HandlerDescriptor {
    source: HandlerSource,
    message_type: MessageType,
    method: MethodDescriptor,
}

impl HandlerDescriptor {
    pub(crate) fn new(
        source: HandlerSource,
        message_type: MessageType,
        method: MethodDescriptor,
    ) -> Self {
        Self {
            source,
            message_type,
            method,
        }
    }

    /// Name of the handler type, for logs and errors.
    pub fn handler_name(&self) -> &'static str {
        self.method.declaring().name()
    }

    pub fn message_type(&self) -> MessageType {
        self.message_type
    }

    pub fn method(&self) -> &MethodDescriptor {
        &self.method
    }

    pub fn source(&self) -> &HandlerSource {
        &self.source
    }

    pub fn instance(&self) -> Arc<dyn Any + Send + Sync> {
        self.source.resolve()
    }
}
