//! Binary semaphores with priority-ordered wake-up.
//!
//! "Blocking" here never suspends the caller: a task that fails to take
//! the semaphore is recorded in the wait-set and must return from its
//! current invocation. When the holder signals, the highest-priority
//! waiter is woken by a posted event and re-attempts its operation from
//! the top on its next run.

use log::{debug, warn};

use crate::event::SEM_SIGNAL;
use crate::kernel::Kernel;
use crate::prioset::PrioSet;

/// Semaphore pool size. Mailboxes and queues draw their backing
/// semaphores from the same pool.
pub(crate) const MAX_SEMAPHORES: usize = 16;

/// Handle to a kernel-owned semaphore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SemId(pub(crate) u8);

/// Semaphore control block: a binary count and the set of priorities
/// blocked on it.
pub(crate) struct SemCb {
    pub(crate) available: bool,
    pub(crate) waiters: PrioSet,
}

impl SemCb {
    pub(crate) const fn new() -> Self {
        Self {
            available: true,
            waiters: PrioSet::empty(),
        }
    }
}

impl<'t> Kernel<'t> {
    /// Create a semaphore, initially available.
    ///
    /// # Panics
    ///
    /// Panics when the semaphore pool is exhausted.
    pub fn sem_create(&mut self) -> SemId {
        let id = self.sems.len() as u8;
        let ok = self.sems.push(SemCb::new()).is_ok();
        assert!(ok, "semaphore pool exhausted");
        SemId(id)
    }

    /// Try to take the semaphore. Returns `true` when the caller now
    /// holds it. On `false` the calling task's priority has been added
    /// to the wait-set and the task must return from this invocation.
    ///
    /// Task context only: the waiter is identified by the current
    /// priority.
    pub fn sem_wait(&mut self, sem: SemId) -> bool {
        critical_section::with(|_| {
            let prio = self.curr_prio;
            let cb = &mut self.sems[sem.0 as usize];
            if cb.available {
                cb.available = false;
                true
            } else {
                cb.waiters.insert(prio);
                false
            }
        })
    }

    /// Release the semaphore; the caller must hold it.
    ///
    /// With waiters present, exactly the highest-priority one is removed
    /// and woken by `post(p, SEM_SIGNAL, ...)`, and the semaphore is left
    /// available for that task to take on its next run. The wake-up
    /// carries the parameter of the waiter's *last dispatched* event, not
    /// the data its blocked operation wanted to hand over; the woken task
    /// re-derives its intent and retries.
    pub fn sem_signal(&mut self, sem: SemId) {
        let wake = critical_section::with(|_| {
            let cb = &mut self.sems[sem.0 as usize];
            match cb.waiters.highest() {
                None => {
                    cb.available = true;
                    None
                }
                Some(prio) => {
                    cb.waiters.remove(prio);
                    cb.available = true;
                    Some((prio, self.tasks[(prio - 1) as usize].last_event.par))
                }
            }
        });
        if let Some((prio, par)) = wake {
            debug!("sem_signal: waking priority {prio}");
            if !self.post(prio, SEM_SIGNAL, par) {
                warn!("sem_signal: wake-up for priority {prio} dropped, queue full");
            }
        }
    }

    /// Record the current task as blocked on `sem` without attempting the
    /// take. Used by the mailbox and queue when the resource itself has
    /// no room or no data, as opposed to lock contention.
    pub(crate) fn sem_block_current(&mut self, sem: SemId) {
        critical_section::with(|_| {
            let prio = self.curr_prio;
            self.sems[sem.0 as usize].waiters.insert(prio);
        });
    }
}
