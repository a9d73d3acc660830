//! The recording bus: what tests assert against.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

use sourced_dispatch::bus::{
    EventBusRecorder, InMemoryBus, MessageBus, PublishError, RecordedMessageLog, Subscription,
    SubscriptionHandle,
};
use sourced_dispatch::{Dispatcher, HandlerRegistry, Message, MessageType};

use crate::support::{
    entries, journal, order, AuditLog, OrderCancelled, OrderPlaced, ShipmentDelayed,
};

/// Counts forwarded publishes and drops them.
#[derive(Default)]
struct CountingBus {
    published: AtomicUsize,
}

impl MessageBus for CountingBus {
    fn publish(&self, _message: Arc<dyn Message>) -> Result<(), PublishError> {
        self.published.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn subscribe(
        &self,
        message_type: MessageType,
        _handler: Subscription,
    ) -> Result<SubscriptionHandle, PublishError> {
        Ok(SubscriptionHandle { id: 0, message_type })
    }

    fn unsubscribe(&self, _handle: &SubscriptionHandle) -> Result<bool, PublishError> {
        Ok(false)
    }
}

#[test]
fn every_publish_is_forwarded_exactly_once() {
    let bus = EventBusRecorder::new(CountingBus::default());

    for i in 0..4 {
        bus.publish_message(order(&format!("o-{i}"))).unwrap();
    }
    bus.publish_batch(vec![
        Arc::new(OrderCancelled {
            order_id: "o-0".into(),
        }) as Arc<dyn Message>,
        Arc::new(ShipmentDelayed {
            order_id: "o-1".into(),
            days: 1,
        }),
    ])
    .unwrap();

    assert_eq!(bus.inner().published.load(Ordering::SeqCst), 6);
    assert_eq!(bus.len(), 6);
}

#[test]
fn query_filters_by_type_in_recording_order() {
    let bus = EventBusRecorder::new(InMemoryBus::new());

    bus.publish_message(order("o-1")).unwrap();
    bus.publish_message(OrderCancelled {
        order_id: "o-1".into(),
    })
    .unwrap();
    bus.publish_message(order("o-2")).unwrap();

    let placed: Vec<String> = bus
        .query::<OrderPlaced>()
        .into_iter()
        .map(|m| m.order_id)
        .collect();
    assert_eq!(placed, vec!["o-1", "o-2"]);
    assert_eq!(bus.query::<OrderCancelled>().len(), 1);
    assert!(bus.query::<ShipmentDelayed>().is_empty());
}

#[test]
fn clear_isolates_scenarios() {
    let calls = journal();
    let registry = Arc::new(HandlerRegistry::new());
    registry
        .register::<_, OrderPlaced>(Arc::new(AuditLog { journal: calls.clone() }))
        .unwrap();
    let dispatcher = Arc::new(Dispatcher::new(registry));
    let bus = EventBusRecorder::new(InMemoryBus::new());
    dispatcher.subscribe_to(&bus).unwrap();

    // Scenario one
    bus.publish_message(order("o-1")).unwrap();
    assert_eq!(bus.query::<OrderPlaced>().len(), 1);

    bus.clear();
    assert!(bus.is_empty());
    assert!(bus.query::<OrderPlaced>().is_empty());
    assert!(bus.query::<OrderCancelled>().is_empty());

    // Scenario two
    bus.publish_message(order("o-2")).unwrap();
    assert_eq!(bus.query::<OrderPlaced>(), vec![order("o-2")]);
    assert_eq!(entries(&calls), vec!["audit:o-1", "audit:o-2"]);
}

#[test]
fn recorders_can_share_a_log() {
    let log = RecordedMessageLog::new();
    let left = EventBusRecorder::with_log(InMemoryBus::new(), log.clone());
    let right = EventBusRecorder::with_log(CountingBus::default(), log.clone());

    left.publish_message(order("o-1")).unwrap();
    right.publish_message(order("o-2")).unwrap();

    assert_eq!(log.query::<OrderPlaced>(), vec![order("o-1"), order("o-2")]);
    assert_eq!(right.inner().published.load(Ordering::SeqCst), 1);
}

#[test]
fn recorded_messages_are_the_published_instances() {
    let bus = EventBusRecorder::new(InMemoryBus::new());
    let message: Arc<dyn Message> = Arc::new(order("o-9"));

    bus.publish(Arc::clone(&message)).unwrap();

    let recorded = bus.messages();
    assert_eq!(recorded.len(), 1);
    assert!(Arc::ptr_eq(&recorded[0], &message));
}

#[test]
fn concurrent_publishers_are_all_recorded() {
    let bus = Arc::new(EventBusRecorder::new(CountingBus::default()));
    let threads = 8;
    let per_thread = 25;
    let barrier = Arc::new(Barrier::new(threads));

    let workers: Vec<_> = (0..threads)
        .map(|t| {
            let bus = Arc::clone(&bus);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for i in 0..per_thread {
                    bus.publish_message(order(&format!("o-{t}-{i}"))).unwrap();
                }
            })
        })
        .collect();

    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(bus.len(), threads * per_thread);
    assert_eq!(bus.query::<OrderPlaced>().len(), threads * per_thread);
    assert_eq!(
        bus.inner().published.load(Ordering::SeqCst),
        threads * per_thread
    );
}
