//! Task capability and per-priority control blocks.
//!
//! A task is not a thread: it has no stack of its own. The kernel invokes
//! it with one event and it must run to completion before control returns
//! to the dispatch loop.

use heapless::Deque;

use crate::event::{Event, INIT_SIG};
use crate::kernel::Kernel;

/// Unique per task, statically assigned; higher value preempts lower.
pub type Priority = u8;

/// Background level; tasks live strictly above it.
pub const IDLE_PRIO: Priority = 0;

/// Level that nothing can preempt. The kernel boots at this level so that
/// events posted during setup stay queued until [`Kernel::run`].
pub const ISR_CEILING_PRIO: Priority = 0xFF;

/// Secondary interrupt level, below the ceiling but above every task.
pub const ISR_AUX_PRIO: Priority = 0xFE;

/// Hard ceiling on a task's event queue capacity.
pub const MAX_EVENTS: usize = 8;

/// A run-to-completion task.
///
/// `run` receives one event and must return; it is re-invoked for every
/// subsequent event posted to its priority. It may post events, take
/// semaphores, and use mailboxes and queues through the kernel handle,
/// except during the registration-time init call, when other tasks may
/// not exist yet.
pub trait Task {
    fn run(&mut self, kernel: &mut Kernel<'_>, event: Event);
}

/// Per-priority task control block. Owned by the scheduler core and
/// mutated only with the critical section held.
pub(crate) struct Tcb<'t> {
    /// Taken out of the slot while the task executes.
    pub(crate) entry: Option<&'t mut dyn Task>,
    /// Event most recently dispatched to this task; a semaphore wake-up
    /// re-posts its parameter.
    pub(crate) last_event: Event,
    /// Pending events, oldest first.
    pub(crate) events: Deque<Event, MAX_EVENTS>,
    /// Capacity fixed at registration; zero marks a free slot.
    pub(crate) capacity: u8,
}

impl<'t> Tcb<'t> {
    pub(crate) const INIT: Tcb<'t> = Tcb {
        entry: None,
        last_event: Event::new(INIT_SIG, 0),
        events: Deque::new(),
        capacity: 0,
    };

    pub(crate) fn registered(&self) -> bool {
        self.capacity > 0
    }
}
