//! Invoker building and caching, seen from outside the dispatcher.

use std::any::Any;
use std::sync::{Arc, Barrier};
use std::thread;

use sourced_dispatch::{
    CompiledInvoker, DispatchError, Dispatcher, FailurePolicy, HandlerRegistry, InvokeError,
    InvokerCache, InvokerFactory, MethodDescriptor, ParamInfo, ReturnKind, TypeInfo, MAX_ARITY,
};

use crate::support::{entries, journal, order, AuditLog, Billing, OrderPlaced};

struct PriceList {
    vat_percent: u64,
}

fn gross() -> MethodDescriptor {
    MethodDescriptor::binary::<PriceList, u64, u64, u64, _>("gross", |prices, net, qty| {
        Ok(net * qty * (100 + prices.vat_percent) / 100)
    })
}

#[test]
fn cached_invoker_is_referentially_stable() {
    let cache = InvokerCache::new();

    let first = cache.get_or_build(&gross()).unwrap();
    let second = cache.get_or_build(&gross()).unwrap();

    assert!(CompiledInvoker::ptr_eq(&first, &second));
    assert_eq!(cache.builds(), 1);
}

#[test]
fn invoker_returns_boxed_value() {
    let invoker = InvokerFactory::new().build(&gross()).unwrap();
    let prices = PriceList { vat_percent: 20 };

    let args: [&dyn Any; 2] = [&100u64, &3u64];
    let value = invoker
        .invoke(&prices, &args)
        .unwrap()
        .expect("gross returns a value");

    assert_eq!(*value.downcast::<u64>().unwrap(), 360);
    assert_eq!(invoker.arity(), 2);
    assert!(matches!(invoker.returns(), ReturnKind::Value(_)));
}

#[test]
fn invoker_checks_arity_and_types() {
    let invoker = InvokerFactory::new().build(&gross()).unwrap();
    let prices = PriceList { vat_percent: 0 };

    let one: [&dyn Any; 1] = [&1u64];
    let wrong: [&dyn Any; 2] = [&1u64, &"three"];
    let fine: [&dyn Any; 2] = [&1u64, &2u64];

    assert!(matches!(
        invoker.invoke(&prices, &one),
        Err(InvokeError::ArityMismatch {
            expected: 2,
            actual: 1,
            ..
        })
    ));
    assert!(matches!(
        invoker.invoke(&prices, &wrong),
        Err(InvokeError::ArgumentTypeMismatch { position: 1, .. })
    ));
    assert!(matches!(
        invoker.invoke(&"not prices", &fine),
        Err(InvokeError::TargetTypeMismatch { .. })
    ));
}

#[test]
fn oversized_signature_is_rejected() {
    let method = MethodDescriptor::raw(
        TypeInfo::of::<PriceList>(),
        "sprawling",
        (0..=MAX_ARITY).map(|_| ParamInfo::shared::<u64>()).collect(),
        ReturnKind::Unit,
        |_, _| Ok(None),
    );

    assert!(matches!(
        InvokerFactory::new().build(&method),
        Err(DispatchError::UnsupportedSignature { .. })
    ));
}

#[test]
fn dispatchers_can_share_one_cache() {
    let calls = journal();
    let registry = Arc::new(HandlerRegistry::new());
    registry
        .register::<_, OrderPlaced>(Arc::new(AuditLog { journal: calls.clone() }))
        .unwrap();
    registry
        .register::<_, OrderPlaced>(Arc::new(Billing {
            journal: calls.clone(),
            limit_cents: 1_000_000,
        }))
        .unwrap();

    let cache = Arc::new(InvokerCache::new());
    let a = Dispatcher::new(registry.clone()).with_cache(cache.clone());
    let b = Dispatcher::new(registry)
        .with_cache(cache.clone())
        .with_policy(FailurePolicy::CollectAll);

    a.dispatch(&order("o-1"));
    b.dispatch(&order("o-2"));

    assert_eq!(cache.len(), 2);
    assert_eq!(cache.builds(), 2);
    assert_eq!(entries(&calls).len(), 4);
}

#[test]
fn concurrent_dispatch_converges_on_one_invoker_per_method() {
    let calls = journal();
    let registry = Arc::new(HandlerRegistry::new());
    registry
        .register::<_, OrderPlaced>(Arc::new(AuditLog { journal: calls.clone() }))
        .unwrap();
    let dispatcher = Arc::new(Dispatcher::new(registry));

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let workers: Vec<_> = (0..threads)
        .map(|i| {
            let dispatcher = Arc::clone(&dispatcher);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                dispatcher.dispatch(&order(&format!("o-{i}"))).is_success()
            })
        })
        .collect();

    for worker in workers {
        assert!(worker.join().unwrap());
    }

    let canonical = dispatcher
        .cache()
        .get_or_build(&MethodDescriptor::handler::<AuditLog, OrderPlaced>())
        .unwrap();
    let again = dispatcher
        .cache()
        .get_or_build(&MethodDescriptor::handler::<AuditLog, OrderPlaced>())
        .unwrap();

    assert!(CompiledInvoker::ptr_eq(&canonical, &again));
    assert_eq!(dispatcher.cache().len(), 1);
    assert_eq!(entries(&calls).len(), threads);
}
