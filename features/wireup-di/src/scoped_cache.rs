use std::{
    collections::HashMap,
    sync::{Condvar, Mutex, MutexGuard, PoisonError},
    thread::{self, ThreadId},
};

use crate::{errors::RequireError, registry::Registry, types::{Instance, Key}};

/// Memoized values of the scoped bindings of one container
///
/// Every scoped provider binding gets a slot when the container is built,
/// so the map itself never changes and only the slots need locking.
#[derive(Default)]
pub(crate) struct ScopedCache {
    slots: HashMap<Key, Slot>,
}

#[derive(Default)]
struct Slot {
    state: Mutex<SlotState>,
    ready: Condvar,
}

#[derive(Default)]
enum SlotState {
    #[default]
    Vacant,
    /// The thread is running the provider, others wait on the condvar
    Computing(ThreadId),
    Ready(Instance),
}

/// Threads blocked on a computing slot, shared by every cache
///
/// Lock order is slot first, then this list.
static WAITING: Mutex<Vec<WaitEdge>> = Mutex::new(Vec::new());

/// `waiter` blocks on `slot`, which `owner` is computing
struct WaitEdge {
    waiter: ThreadId,
    slot: usize,
    owner: ThreadId,
}

fn waiting() -> MutexGuard<'static, Vec<WaitEdge>> {
    WAITING.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Registers `waiter` as blocked on `slot`, unless following the owners leads back to `waiter`
///
/// Returns false if waiting would never end.
fn start_waiting(waiter: ThreadId, slot: usize, owner: ThreadId) -> bool {
    let mut edges = waiting();
    let mut current = owner;
    // Each thread waits on at most one slot, so the chain is a path
    for _ in 0..=edges.len() {
        if current == waiter {
            return false;
        }
        match edges.iter().find(|edge| edge.waiter == current) {
            Some(edge) => current = edge.owner,
            None => break,
        }
    }
    edges.push(WaitEdge { waiter, slot, owner });
    true
}

fn stop_waiting(waiter: ThreadId) {
    waiting().retain(|edge| edge.waiter != waiter);
}

impl ScopedCache {
    pub(crate) fn for_registry(registry: &Registry) -> Self {
        let slots = registry
            .bindings()
            .filter(|binding| binding.is_scoped() && !binding.is_instance())
            .map(|binding| (binding.key(), Slot::default()))
            .collect();

        ScopedCache { slots }
    }

    /// Returns the cached value of `key`, running `produce` if there is none yet
    ///
    /// Concurrent callers for the same key block until the computing caller is done,
    /// so `produce` runs at most once per successful computation.
    /// Keys without a slot are not cached and `produce` is always called.
    ///
    /// A caller whose wait would close a cycle between threads, each computing a slot
    /// the next one needs, fails with [RequireError::CyclicResolution] instead of blocking.
    pub(crate) fn get_or_produce(
        &self,
        key: &Key,
        produce: impl FnOnce() -> Result<Instance, RequireError>,
    ) -> Result<Instance, RequireError> {
        let Some(slot) = self.slots.get(key) else {
            return produce();
        };

        let me = thread::current().id();
        let mut state = slot.lock();
        loop {
            match &*state {
                SlotState::Ready(instance) => {
                    tracing::trace!("Cache hit for {key}");
                    return Ok(instance.clone());
                }
                SlotState::Computing(owner) => {
                    if !start_waiting(me, slot.address(), *owner) {
                        tracing::error!("Resolving {key} would wait on itself across threads");
                        return Err(RequireError::CyclicResolution(*key));
                    }
                    state = slot
                        .ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                    stop_waiting(me);
                }
                SlotState::Vacant => break,
            }
        }
        *state = SlotState::Computing(me);
        drop(state);

        let guard = ComputingGuard { slot };
        let result = produce();
        guard.complete(result.as_ref().ok().cloned());

        result
    }

    /// Number of values computed so far
    pub(crate) fn ready_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| matches!(*slot.lock(), SlotState::Ready(_)))
            .count()
    }

    pub(crate) fn is_ready(&self, key: &Key) -> bool {
        self.slots
            .get(key)
            .is_some_and(|slot| matches!(*slot.lock(), SlotState::Ready(_)))
    }
}

impl Slot {
    fn lock(&self) -> MutexGuard<'_, SlotState> {
        // A panicking provider never holds the lock, the state stays consistent
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn address(&self) -> usize {
        self as *const Slot as usize
    }
}

/// Releases a slot in `Computing` state, also when the provider panics
struct ComputingGuard<'a> {
    slot: &'a Slot,
}
impl ComputingGuard<'_> {
    fn complete(self, instance: Option<Instance>) {
        let mut state = self.slot.lock();
        if let Some(instance) = instance {
            *state = SlotState::Ready(instance);
        }
        // Dropping self wakes the waiters, a vacant slot lets the next one compute
    }
}
impl Drop for ComputingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.slot.lock();
        if matches!(*state, SlotState::Computing(_)) {
            *state = SlotState::Vacant;
        }
        // Waiters are no longer blocked by this thread, even before they wake up
        let address = self.slot.address();
        waiting().retain(|edge| edge.slot != address);
        drop(state);
        self.slot.ready.notify_all();
    }
}
