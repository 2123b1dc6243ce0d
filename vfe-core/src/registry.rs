//! Handler chain
//!
//! An ordered list of [`EngineHandler`]s consulted most-recent-first.
//! Registering returns a [`HandlerGuard`]; dropping the guard takes the
//! handler out again, so a test can scope a handler to a block.

use crate::engine::{EngineHandler, FileEngine};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const TARGET: &str = "vfe::registry";

static GLOBAL: Lazy<Arc<HandlerRegistry>> = Lazy::new(|| Arc::new(HandlerRegistry::new()));

struct Entry {
    id: u64,
    handler: Arc<dyn EngineHandler>,
}

/// Registry of engine handlers.
///
/// Resolution works on a snapshot taken under the lock: a handler
/// registered or dropped while a resolution runs is neither skipped nor
/// asked twice by it.
pub struct HandlerRegistry {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
    /// Mirror of `entries.len()` so the common empty case skips the lock
    count: AtomicUsize,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            count: AtomicUsize::new(0),
        }
    }

    /// The process-wide registry
    pub fn global() -> Arc<HandlerRegistry> {
        Arc::clone(&GLOBAL)
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Put `handler` at the front of the chain.
    ///
    /// The handler stays registered for as long as the returned guard
    /// lives.
    #[must_use = "dropping the guard unregisters the handler"]
    pub fn register<H>(self: &Arc<Self>, handler: H) -> HandlerGuard
    where
        H: EngineHandler + 'static,
    {
        self.register_shared(Arc::new(handler))
    }

    /// [`register`](Self::register) for a handler that is shared elsewhere
    #[must_use = "dropping the guard unregisters the handler"]
    pub fn register_shared(self: &Arc<Self>, handler: Arc<dyn EngineHandler>) -> HandlerGuard {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let mut entries = self.lock();
        entries.push(Entry { id, handler });
        self.count.store(entries.len(), Ordering::Release);
        tracing::debug!(target: TARGET, id, handlers = entries.len(), "handler registered");
        HandlerGuard {
            registry: Arc::clone(self),
            id,
        }
    }

    fn unregister(&self, id: u64) -> bool {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        self.count.store(entries.len(), Ordering::Release);
        let removed = entries.len() != before;
        if removed {
            tracing::debug!(target: TARGET, id, handlers = entries.len(), "handler unregistered");
        }
        removed
    }

    /// Ask the handlers, newest first, for an engine for `path`.
    ///
    /// Stops at the first handler that produces one. `path` should already
    /// be normalized.
    pub fn resolve(&self, path: &str) -> Option<Box<dyn FileEngine>> {
        if self.count.load(Ordering::Acquire) == 0 {
            return None;
        }
        let snapshot: Vec<(u64, Arc<dyn EngineHandler>)> = self
            .lock()
            .iter()
            .rev()
            .map(|entry| (entry.id, Arc::clone(&entry.handler)))
            .collect();

        for (id, handler) in snapshot {
            if let Some(engine) = handler.create(path) {
                tracing::trace!(target: TARGET, id, path, "handler claimed path");
                return Some(engine);
            }
        }
        None
    }

    pub fn len(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every registration. Guards still alive become no-ops.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.clear();
        self.count.store(0, Ordering::Release);
        tracing::debug!(target: TARGET, "handler chain cleared");
    }
}

impl Default for HandlerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("handlers", &self.len())
            .finish()
    }
}

/// Keeps a handler registered; unregisters it on drop
pub struct HandlerGuard {
    registry: Arc<HandlerRegistry>,
    id: u64,
}

impl HandlerGuard {
    pub fn id(&self) -> u64 {
        self.id
    }
}

impl fmt::Debug for HandlerGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerGuard").field("id", &self.id).finish()
    }
}

impl Drop for HandlerGuard {
    fn drop(&mut self) {
        self.registry.unregister(self.id);
    }
}
