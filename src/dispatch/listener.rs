use tracing::{info, warn};

use crate::error::DispatchError;
use crate::message::Message;
use crate::registry::HandlerDescriptor;

/// Observer of dispatch results, owned by a [`Dispatcher`](super::Dispatcher).
///
/// Listeners run inline after each handler, in the order they were added.
pub trait DispatchListener: Send + Sync {
    fn on_handled(&self, _message: &dyn Message, _handler: &HandlerDescriptor) {}

    fn on_failed(
        &self,
        _message: &dyn Message,
        _handler: &HandlerDescriptor,
        _error: &DispatchError,
    ) {
    }
}

/// Logs one `message -> handler` line per invocation.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingListener;

impl DispatchListener for TracingListener {
    fn on_handled(&self, message: &dyn Message, handler: &HandlerDescriptor) {
        info!(
            message_type = %message.message_type(),
            handler = handler.handler_name(),
            "{} -> {}",
            message.message_type(),
            handler.handler_name()
        );
    }

    fn on_failed(&self, message: &dyn Message, handler: &HandlerDescriptor, error: &DispatchError) {
        warn!(
            message_type = %message.message_type(),
            handler = handler.handler_name(),
            %error,
            "{} -> {} failed",
            message.message_type(),
            handler.handler_name()
        );
    }
}
