mod handler;
mod message;

use proc_macro::TokenStream;

// ============================================================================
// #[derive(Message)] derive macro
// ============================================================================

/// Derive macro for the `Message` trait.
///
/// # Usage
///
/// ```ignore
/// #[derive(Debug, Clone, Message)]
/// struct OrderPlaced {
///     pub order_id: String,
/// }
///
/// #[derive(Debug, Clone, Message)]
/// #[message(name = "shipping.delayed")]
/// struct ShipmentDelayed {
///     pub order_id: String,
///     pub days: u32,
/// }
/// ```
///
/// - `#[message(name = "...")]` sets the display name used in logs and errors.
///   If omitted, defaults to the struct name.
///
/// Routing always uses the type identity, never the display name, so two
/// message types may share a name without colliding.
#[proc_macro_derive(Message, attributes(message))]
pub fn derive_message(input: TokenStream) -> TokenStream {
    message::derive_message(input)
}

// ============================================================================
// #[derive(Handler)] derive macro
// ============================================================================

/// Derive macro for the `HandlerSet` trait.
///
/// Lists every message type the handler serves. The type must implement
/// `Handles<M>` for each listed `M`.
///
/// # Usage
///
/// ```ignore
/// #[derive(Handler)]
/// #[handles(OrderPlaced, OrderCancelled)]
/// struct OrderProjection {
///     views: Arc<Mutex<Vec<String>>>,
/// }
///
/// impl Handles<OrderPlaced> for OrderProjection { /* ... */ }
/// impl Handles<OrderCancelled> for OrderProjection { /* ... */ }
///
/// registry.register_all(|| OrderProjection::new(views.clone()))?;
/// ```
///
/// Several `#[handles(...)]` attributes are merged in declaration order,
/// which is also the order the registrations are made in.
#[proc_macro_derive(Handler, attributes(handles))]
pub fn derive_handler(input: TokenStream) -> TokenStream {
    handler::derive_handler(input)
}
