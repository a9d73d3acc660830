//! Dispatch integration tests.
//!
//! Covers routing order, failure policies, invoker caching, derived handler
//! sets and the recording bus, using a small order/shipment domain.

mod ordering;
mod invokers;
mod recorder;
