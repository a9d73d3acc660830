use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, Mutex};

use tracing::{debug, debug_span, warn};

use crate::bus::{MessageBus, PublishError, SubscriptionHandle};
use crate::config::DispatcherConfig;
use crate::error::DispatchError;
use crate::invoker::InvokerCache;
use crate::message::{Message, MessageType};
use crate::registry::{HandlerDescriptor, HandlerRegistry};

use super::listener::{DispatchListener, TracingListener};
use super::outcome::{DispatchOutcome, FailurePolicy};

/// Routes messages to their registered handlers.
///
/// Dispatch is synchronous: every handler for a message runs inline, in
/// registration order, before `dispatch` returns.
///
/// ## Example
///
/// ```ignore
/// let registry = Arc::new(HandlerRegistry::new());
/// registry.register::<_, OrderPlaced>(Arc::new(AuditLog))?;
/// registry.register::<_, OrderPlaced>(Arc::new(Billing))?;
///
/// let dispatcher = Dispatcher::new(registry)
///     .with_policy(FailurePolicy::CollectAll)
///     .listener(Arc::new(TracingListener));
///
/// let outcome = dispatcher.dispatch(&OrderPlaced { order_id: "o-1".into() });
/// assert_eq!(outcome.invoked, 2);
/// ```
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    cache: Arc<InvokerCache>,
    policy: FailurePolicy,
    listeners: Vec<Arc<dyn DispatchListener>>,
    /// (bus address, message type) pairs already subscribed by `subscribe_to`.
    subscribed: Mutex<HashSet<(usize, MessageType)>>,
}

impl Dispatcher {
    /// Create a fail-fast dispatcher with its own invoker cache.
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self {
            registry,
            cache: Arc::new(InvokerCache::new()),
            policy: FailurePolicy::default(),
            listeners: Vec::new(),
            subscribed: Mutex::new(HashSet::new()),
        }
    }

    pub fn from_config(registry: Arc<HandlerRegistry>, config: &DispatcherConfig) -> Self {
        let dispatcher = Self::new(registry).with_policy(config.failure_policy);
        if config.trace_handlers {
            dispatcher.listener(Arc::new(TracingListener))
        } else {
            dispatcher
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Share an invoker cache with other dispatchers.
    pub fn with_cache(mut self, cache: Arc<InvokerCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Add a listener. Listeners run in the order they were added.
    pub fn listener(mut self, listener: Arc<dyn DispatchListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    pub fn registry(&self) -> &Arc<HandlerRegistry> {
        &self.registry
    }

    pub fn cache(&self) -> &Arc<InvokerCache> {
        &self.cache
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Dispatch `message` to every handler registered for its type.
    pub fn dispatch(&self, message: &dyn Message) -> DispatchOutcome {
        let message_type = message.message_type();
        let span = debug_span!("dispatch", message_type = %message_type);
        let _enter = span.enter();

        let mut outcome = DispatchOutcome::new(message_type);

        let handlers = match self.registry.resolve(&message_type) {
            Ok(handlers) => handlers,
            Err(err) => {
                warn!(error = %err, "handler lookup failed");
                outcome.failures.push(err);
                return outcome;
            }
        };

        if handlers.is_empty() {
            debug!("no handlers registered");
            return outcome;
        }

        for handler in &handlers {
            outcome.invoked += 1;

            match self.invoke(message, handler) {
                Ok(()) => {
                    for listener in &self.listeners {
                        listener.on_handled(message, handler);
                    }
                }
                Err(err) => {
                    warn!(handler = handler.handler_name(), error = %err, "handler failed");
                    for listener in &self.listeners {
                        listener.on_failed(message, handler, &err);
                    }
                    outcome.failures.push(err);
                    if self.policy == FailurePolicy::FailFast {
                        break;
                    }
                }
            }
        }

        debug!(
            invoked = outcome.invoked,
            failures = outcome.failures.len(),
            "dispatched"
        );
        outcome
    }

    fn invoke(
        &self,
        message: &dyn Message,
        handler: &HandlerDescriptor,
    ) -> Result<(), DispatchError> {
        let invoker = self.cache.get_or_build(handler.method())?;
        let target = handler.instance();

        invoker
            .invoke(&*target, &[message.as_any()])
            .map(|_| ())
            .map_err(|err| {
                DispatchError::from_invoke(err, handler.handler_name(), handler.message_type())
            })
    }

    /// Subscribe this dispatcher to `bus` for every registered message type.
    ///
    /// Calling it again for the same bus only subscribes the types registered
    /// since the last call, so each type is dispatched once per publish.
    /// Returns the handles of the new subscriptions. A failed dispatch is
    /// reported to the publisher as [`PublishError::Dispatch`].
    pub fn subscribe_to<B>(
        self: &Arc<Self>,
        bus: &B,
    ) -> Result<Vec<SubscriptionHandle>, PublishError>
    where
        B: MessageBus + ?Sized,
    {
        let bus_key = bus as *const B as *const () as usize;
        let mut subscribed = self
            .subscribed
            .lock()
            .map_err(|_| PublishError::LockPoisoned("subscribe_to"))?;

        let mut handles = Vec::new();
        for message_type in self.registry.message_types()? {
            if subscribed.contains(&(bus_key, message_type)) {
                continue;
            }

            let dispatcher = Arc::clone(self);
            let handle = bus.subscribe(
                message_type,
                Arc::new(move |message: &dyn Message| -> Result<(), PublishError> {
                    dispatcher
                        .dispatch(message)
                        .into_result()
                        .map(|_| ())
                        .map_err(PublishError::from)
                }),
            )?;
            subscribed.insert((bus_key, message_type));
            handles.push(handle);
        }

        debug!(subscribed = handles.len(), "subscribed dispatcher to bus");
        Ok(handles)
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("policy", &self.policy)
            .field("handlers", &self.registry.len())
            .field("cached_invokers", &self.cache.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
