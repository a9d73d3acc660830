use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::DispatchError;
use crate::invoker::{InvokerFactory, MethodDescriptor};
use crate::message::{Message, MessageType};

use super::handler::{HandlerDescriptor, HandlerSet, HandlerSource, Handles};

/// Routing table from [`MessageType`] to the handlers registered for it.
///
/// Registrations accumulate in insertion order with no de-duplication; the
/// same handler may be registered for several message types. Registration
/// rejects malformed handlers up front so a misconfigured application never
/// reaches a ready state.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    factory: InvokerFactory,
    table: RwLock<HashMap<MessageType, Vec<HandlerDescriptor>>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a shared handler instance for `M`.
    pub fn register<H, M>(&self, handler: Arc<H>) -> Result<(), DispatchError>
    where
        H: Handles<M>,
        M: Message,
    {
        self.register_method(
            HandlerSource::instance(handler),
            M::static_type(),
            MethodDescriptor::handler::<H, M>(),
        )
    }

    /// Register a handler factory for `M`. A fresh handler is produced for
    /// every dispatch.
    pub fn register_factory<H, M, F>(&self, factory: F) -> Result<(), DispatchError>
    where
        H: Handles<M>,
        M: Message,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.register_method(
            HandlerSource::factory(factory),
            M::static_type(),
            MethodDescriptor::handler::<H, M>(),
        )
    }

    /// Register a handler factory for every message type `H` handles.
    ///
    /// All entries are checked before any is inserted, so a failure leaves
    /// the table untouched.
    pub fn register_all<H, F>(&self, factory: F) -> Result<(), DispatchError>
    where
        H: HandlerSet,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.register_set(HandlerSource::factory(factory), H::handled_messages())
    }

    /// Register one shared instance for every message type `H` handles.
    pub fn register_all_instance<H: HandlerSet>(
        &self,
        handler: Arc<H>,
    ) -> Result<(), DispatchError> {
        self.register_set(HandlerSource::instance(handler), H::handled_messages())
    }

    /// Register an arbitrary method as the handler for `message_type`.
    ///
    /// The method must take exactly one parameter and have a supported
    /// signature. Its parameter type is not compared with `message_type`; a
    /// mismatch surfaces as `ArgumentTypeMismatch` when a message is
    /// dispatched.
    pub fn register_method(
        &self,
        source: HandlerSource,
        message_type: MessageType,
        method: MethodDescriptor,
    ) -> Result<(), DispatchError> {
        self.check_shape(&source, message_type, &method)?;
        let descriptor = HandlerDescriptor::new(source, message_type, method);

        let mut table = self
            .table
            .write()
            .map_err(|_| DispatchError::LockPoisoned("registry write"))?;
        Self::insert(&mut table, descriptor);
        Ok(())
    }

    fn register_set(
        &self,
        source: HandlerSource,
        methods: Vec<(MessageType, MethodDescriptor)>,
    ) -> Result<(), DispatchError> {
        for (message_type, method) in &methods {
            self.check_shape(&source, *message_type, method)?;
        }

        let mut table = self
            .table
            .write()
            .map_err(|_| DispatchError::LockPoisoned("registry write"))?;
        for (message_type, method) in methods {
            Self::insert(
                &mut table,
                HandlerDescriptor::new(source.clone(), message_type, method),
            );
        }
        Ok(())
    }

    fn insert(
        table: &mut HashMap<MessageType, Vec<HandlerDescriptor>>,
        descriptor: HandlerDescriptor,
    ) {
        debug!(
            handler = descriptor.handler_name(),
            message_type = %descriptor.message_type(),
            "registered handler"
        );
        table
            .entry(descriptor.message_type())
            .or_default()
            .push(descriptor);
    }

    fn check_shape(
        &self,
        source: &HandlerSource,
        message_type: MessageType,
        method: &MethodDescriptor,
    ) -> Result<(), DispatchError> {
        let handler = method.declaring().name();

        if method.params().len() != 1 {
            return Err(DispatchError::InvalidHandlerShape {
                handler,
                message_type,
                reason: format!(
                    "{} must take exactly one message parameter, found {}",
                    method.name(),
                    method.params().len()
                ),
            });
        }

        self.factory.validate(method)?;

        if let HandlerSource::Instance(instance) = source {
            if (**instance).type_id() != method.declaring().type_id() {
                return Err(DispatchError::InvalidHandlerShape {
                    handler,
                    message_type,
                    reason: "instance is not of the method's declaring type".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Handlers registered for `message_type`, in registration order.
    ///
    /// An unregistered type yields an empty list.
    pub fn resolve(
        &self,
        message_type: &MessageType,
    ) -> Result<Vec<HandlerDescriptor>, DispatchError> {
        let table = self
            .table
            .read()
            .map_err(|_| DispatchError::LockPoisoned("registry read"))?;
        Ok(table.get(message_type).cloned().unwrap_or_default())
    }

    /// Every message type with at least one registration.
    pub fn message_types(&self) -> Result<Vec<MessageType>, DispatchError> {
        let table = self
            .table
            .read()
            .map_err(|_| DispatchError::LockPoisoned("registry read"))?;
        Ok(table.keys().copied().collect())
    }

    /// Number of registrations for `message_type`.
    pub fn count(&self, message_type: &MessageType) -> usize {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.get(message_type).map_or(0, Vec::len)
    }

    /// Total number of registrations.
    pub fn len(&self) -> usize {
        let table = self.table.read().unwrap_or_else(PoisonError::into_inner);
        table.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
