use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

use tracing::debug;

use crate::error::DispatchError;

use super::factory::{CompiledInvoker, InvokerFactory};
use super::method::{MethodDescriptor, MethodId};

/// Memoizes [`InvokerFactory`] output per [`MethodId`].
///
/// Entries are never evicted; the set of handler methods is fixed by the
/// application's wiring. On a concurrent first use, every racer may build,
/// but only the first insert becomes canonical and the others discard their
/// invoker and return the canonical one.
#[derive(Debug, Default)]
pub struct InvokerCache {
    factory: InvokerFactory,
    entries: RwLock<HashMap<MethodId, CompiledInvoker>>,
    builds: AtomicUsize,
}

impl InvokerCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_factory(factory: InvokerFactory) -> Self {
        Self {
            factory,
            ..Self::default()
        }
    }

    /// Return the canonical invoker for `method`, building it on first use.
    pub fn get_or_build(
        &self,
        method: &MethodDescriptor,
    ) -> Result<CompiledInvoker, DispatchError> {
        let id = method.id();

        if let Some(invoker) = self
            .entries
            .read()
            .map_err(|_| DispatchError::LockPoisoned("invoker cache read"))?
            .get(&id)
        {
            return Ok(invoker.clone());
        }

        // Build outside the write lock so slow builds don't block readers.
        let built = self.factory.build(method)?;
        self.builds.fetch_add(1, Ordering::Relaxed);

        let mut entries = self
            .entries
            .write()
            .map_err(|_| DispatchError::LockPoisoned("invoker cache write"))?;
        let canonical = entries.entry(id).or_insert_with(|| built.clone());
        if !CompiledInvoker::ptr_eq(canonical, &built) {
            debug!(method = %canonical.method(), "discarded duplicate invoker");
        }
        Ok(canonical.clone())
    }

    pub fn contains(&self, id: &MethodId) -> bool {
        self.entries
            .read()
            .map(|entries| entries.contains_key(id))
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.entries.read().map(|entries| entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful factory builds, race losers included.
    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::Relaxed)
    }
}
