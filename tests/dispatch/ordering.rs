//! Routing: registration order, zero handlers, argument mismatches.

use std::sync::Arc;

use sourced_dispatch::bus::{EventBusRecorder, InMemoryBus, MessageBus};
use sourced_dispatch::{
    DispatchError, Dispatcher, HandlerRegistry, HandlerSource, Message, MethodDescriptor,
};

use crate::support::{
    entries, init_tracing, journal, order, AuditLog, Billing, Journal, OrderPlaced,
    ShipmentDelayed, ShipmentNotifier,
};

#[test]
fn handlers_run_in_registration_order() {
    init_tracing();
    let calls = journal();
    let registry = Arc::new(HandlerRegistry::new());
    registry
        .register::<_, OrderPlaced>(Arc::new(AuditLog { journal: calls.clone() }))
        .unwrap();
    registry
        .register::<_, OrderPlaced>(Arc::new(Billing {
            journal: calls.clone(),
            limit_cents: 10_000,
        }))
        .unwrap();

    let dispatcher = Arc::new(Dispatcher::new(registry));
    let bus = EventBusRecorder::new(InMemoryBus::new());
    dispatcher.subscribe_to(&bus).unwrap();

    let placed = order("o-1");
    bus.publish_message(placed.clone()).unwrap();

    assert_eq!(entries(&calls), vec!["audit:o-1", "billing:o-1"]);
    assert_eq!(bus.query::<OrderPlaced>(), vec![placed]);
}

#[test]
fn every_registration_is_invoked_once() {
    let calls = journal();
    let registry = Arc::new(HandlerRegistry::new());
    for _ in 0..5 {
        registry
            .register::<_, OrderPlaced>(Arc::new(AuditLog { journal: calls.clone() }))
            .unwrap();
    }

    let outcome = Dispatcher::new(registry).dispatch(&order("o-2"));

    assert!(outcome.is_success());
    assert_eq!(outcome.invoked, 5);
    assert_eq!(entries(&calls).len(), 5);
}

#[test]
fn no_handlers_is_success_and_still_recorded() {
    init_tracing();
    let registry = Arc::new(HandlerRegistry::new());
    let dispatcher = Dispatcher::new(registry);

    let delayed = ShipmentDelayed {
        order_id: "o-3".into(),
        days: 2,
    };
    let outcome = dispatcher.dispatch(&delayed);
    assert_eq!(outcome.invoked, 0);
    assert!(outcome.is_success());
    assert_eq!(outcome.message_type, ShipmentDelayed::static_type());

    let bus = EventBusRecorder::new(InMemoryBus::new());
    bus.publish_message(delayed.clone()).unwrap();
    assert_eq!(bus.query::<ShipmentDelayed>(), vec![delayed]);
}

#[test]
fn mismatched_parameter_fails_at_dispatch_not_registration() {
    let calls = journal();
    let registry = Arc::new(HandlerRegistry::new());

    // ShipmentNotifier::handle takes ShipmentDelayed, registered for OrderPlaced.
    registry
        .register_method(
            HandlerSource::instance(Arc::new(ShipmentNotifier { journal: calls.clone() })),
            OrderPlaced::static_type(),
            MethodDescriptor::handler::<ShipmentNotifier, ShipmentDelayed>(),
        )
        .unwrap();

    let outcome = Dispatcher::new(registry).dispatch(&order("o-4"));

    assert_eq!(outcome.invoked, 1);
    assert_eq!(outcome.failures.len(), 1);
    match &outcome.failures[0] {
        DispatchError::ArgumentTypeMismatch {
            position,
            message_type,
            ..
        } => {
            assert_eq!(*position, 0);
            assert_eq!(*message_type, OrderPlaced::static_type());
        }
        other => panic!("expected ArgumentTypeMismatch, got {other:?}"),
    }
    assert!(entries(&calls).is_empty());
}

#[test]
fn display_names_come_from_the_derive() {
    assert_eq!(OrderPlaced::static_type().name(), "OrderPlaced");
    assert_eq!(ShipmentDelayed::static_type().name(), "shipping.delayed");
    assert_eq!(order("o-5").message_type(), OrderPlaced::static_type());
}

/// Front desk with two same-named methods wired up by hand.
struct Desk {
    journal: Journal,
}

#[test]
fn same_named_methods_keep_their_own_bodies() {
    let calls = journal();
    let desk = Arc::new(Desk {
        journal: calls.clone(),
    });
    let registry = Arc::new(HandlerRegistry::new());

    registry
        .register_method(
            HandlerSource::instance(desk.clone()),
            OrderPlaced::static_type(),
            MethodDescriptor::unary::<Desk, OrderPlaced, (), _>("on", |desk, message| {
                desk.journal.lock().unwrap().push(format!("audit:{}", message.order_id));
                Ok(())
            }),
        )
        .unwrap();
    registry
        .register_method(
            HandlerSource::instance(desk),
            OrderPlaced::static_type(),
            MethodDescriptor::unary::<Desk, OrderPlaced, (), _>("on", |desk, message| {
                desk.journal.lock().unwrap().push(format!("bill:{}", message.order_id));
                Ok(())
            }),
        )
        .unwrap();

    let dispatcher = Dispatcher::new(registry);
    let outcome = dispatcher.dispatch(&order("o-1"));

    assert_eq!(outcome.invoked, 2);
    assert!(outcome.is_success());
    assert_eq!(entries(&calls), vec!["audit:o-1", "bill:o-1"]);
    assert_eq!(dispatcher.cache().len(), 2);
}
