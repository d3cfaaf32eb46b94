//! Scheduler core — ready-set tracking, current priority, and the
//! re-entrant dispatch loop.
//!
//! Scheduling model: a single stack with nested, synchronous,
//! priority-ordered preemption. `post` marks a priority ready and, when
//! the ready set rises above the caller's level, runs the higher task to
//! completion before returning. Each nested dispatch only admits
//! priorities strictly greater than the one active at its entry, so the
//! recursion is bounded by `MAX_PRIO`.

use heapless::Vec;
use log::warn;

use crate::event::{Event, Param, Signal};
use crate::mailbox::{MailboxCb, MAX_MAILBOXES};
use crate::prioset::{PrioSet, MAX_PRIO};
use crate::queue::{QueueCb, MAX_QUEUES};
use crate::semaphore::{SemCb, MAX_SEMAPHORES};
use crate::task::{Priority, Task, Tcb, IDLE_PRIO, ISR_CEILING_PRIO, MAX_EVENTS};

/// The kernel context: task table, ready-set, current priority, and the
/// control blocks of every synchronization primitive.
///
/// Created once before the scheduler starts and threaded by `&mut` into
/// every entry point; there is no teardown path. `'t` is the lifetime of
/// the registered task instances.
pub struct Kernel<'t> {
    pub(crate) tasks: [Tcb<'t>; MAX_PRIO as usize],
    pub(crate) ready: PrioSet,
    pub(crate) curr_prio: Priority,
    pub(crate) sems: Vec<SemCb, MAX_SEMAPHORES>,
    pub(crate) mailboxes: Vec<MailboxCb, MAX_MAILBOXES>,
    pub(crate) queues: Vec<QueueCb, MAX_QUEUES>,
}

impl<'t> Kernel<'t> {
    /// Create an empty kernel. The current priority starts at the
    /// interrupt ceiling, so nothing dispatches until [`Kernel::run`].
    pub const fn new() -> Self {
        Self {
            tasks: [Tcb::INIT; MAX_PRIO as usize],
            ready: PrioSet::empty(),
            curr_prio: ISR_CEILING_PRIO,
            sems: Vec::new(),
            mailboxes: Vec::new(),
            queues: Vec::new(),
        }
    }

    /// Priority of the code presently executing (0 = background).
    pub fn current_priority(&self) -> Priority {
        self.curr_prio
    }

    /// Register `entry` at `prio` with an event queue of `queue_capacity`,
    /// then immediately invoke it once with the init event.
    ///
    /// The init call happens outside the ready-set protocol: the task may
    /// perform one-time setup, but must not touch semaphores, mailboxes,
    /// or queues, since no control block exists yet for any other task.
    ///
    /// # Panics
    ///
    /// Panics when `prio` is out of `[1, MAX_PRIO]` or already taken, or
    /// when `queue_capacity` is zero or above [`MAX_EVENTS`].
    pub fn register_task(
        &mut self,
        entry: &'t mut dyn Task,
        prio: Priority,
        queue_capacity: u8,
        init_sig: Signal,
        init_par: Param,
    ) {
        assert!(
            prio >= 1 && prio <= MAX_PRIO,
            "task priority out of range: {prio}"
        );
        assert!(
            queue_capacity >= 1 && queue_capacity as usize <= MAX_EVENTS,
            "event queue capacity out of range: {queue_capacity}"
        );
        let idx = (prio - 1) as usize;
        assert!(!self.tasks[idx].registered(), "priority {prio} already registered");

        let init = Event::new(init_sig, init_par);
        self.tasks[idx].capacity = queue_capacity;
        self.tasks[idx].last_event = init;
        entry.run(self, init);
        self.tasks[idx].entry = Some(entry);
    }

    /// Lower the current priority to the background level and perform one
    /// scheduling pass, draining every event queued during setup.
    pub fn run(&mut self) {
        critical_section::with(|_| self.curr_prio = IDLE_PRIO);
        self.dispatch();
    }

    /// Enqueue an event for `prio`. Returns `false` when that task's
    /// event queue is full, a normal and recoverable outcome; the ready
    /// set is left untouched.
    ///
    /// When the queue transitions empty to non-empty, the dispatch loop
    /// is entered and may run one or more higher-priority tasks to
    /// completion before this call returns. Safe to call from interrupt
    /// context: all queue state is touched under the critical section.
    pub fn post(&mut self, prio: Priority, sig: Signal, par: Param) -> bool {
        debug_assert!(
            prio >= 1 && prio <= MAX_PRIO,
            "post priority out of range: {prio}"
        );
        let (accepted, became_ready) = critical_section::with(|_| {
            let tcb = &mut self.tasks[(prio - 1) as usize];
            if tcb.events.len() >= tcb.capacity as usize {
                return (false, false);
            }
            let first = tcb.events.is_empty();
            // capacity <= MAX_EVENTS, so the push cannot fail
            let _ = tcb.events.push_back(Event::new(sig, par));
            if first {
                self.ready.insert(prio);
            }
            (true, first)
        });
        if became_ready {
            self.dispatch();
        } else if !accepted {
            warn!("post: event queue full for priority {prio}");
        }
        accepted
    }

    /// Raise the current priority to `ceiling` (when above it), excluding
    /// every task at or below the ceiling from the region that follows.
    /// Returns the priority to hand back to [`Kernel::mutex_unlock`].
    pub fn mutex_lock(&mut self, ceiling: Priority) -> Priority {
        critical_section::with(|_| {
            let saved = self.curr_prio;
            if ceiling > self.curr_prio {
                self.curr_prio = ceiling;
            }
            saved
        })
    }

    /// Restore the priority saved by [`Kernel::mutex_lock`]. Lowering the
    /// priority may expose now-eligible ready tasks, so the dispatch loop
    /// runs before this returns.
    pub fn mutex_unlock(&mut self, saved: Priority) {
        let lowered = critical_section::with(|_| {
            if saved < self.curr_prio {
                self.curr_prio = saved;
                true
            } else {
                false
            }
        });
        if lowered {
            self.dispatch();
        }
    }

    /// Mark interrupt entry: raise the current priority to the interrupt
    /// level and return the preempted priority.
    pub fn isr_enter(&mut self, isr_prio: Priority) -> Priority {
        critical_section::with(|_| {
            let saved = self.curr_prio;
            self.curr_prio = isr_prio;
            saved
        })
    }

    /// Mark interrupt exit: restore the preempted priority and run any
    /// task the interrupt made ready.
    pub fn isr_exit(&mut self, saved: Priority) {
        critical_section::with(|_| self.curr_prio = saved);
        self.dispatch();
    }

    /// Run the highest ready task while one exists above the caller's
    /// priority. Each claimed event is recorded as the task's last event
    /// under the critical section; the task itself runs with the critical
    /// section released.
    fn dispatch(&mut self) {
        let pin = critical_section::with(|_| self.curr_prio);
        loop {
            let next = critical_section::with(|_| {
                let prio = match self.ready.highest() {
                    Some(p) if p > pin => p,
                    _ => return None,
                };
                let tcb = &mut self.tasks[(prio - 1) as usize];
                // ready bit set implies a queued event
                let event = tcb.events.pop_front()?;
                tcb.last_event = event;
                if tcb.events.is_empty() {
                    self.ready.remove(prio);
                }
                self.curr_prio = prio;
                Some((prio, event, tcb.entry.take()))
            });
            let Some((prio, event, entry)) = next else { break };
            // the entry is present: tasks on the call stack all sit at or
            // below `pin` and are never selected again
            if let Some(task) = entry {
                task.run(self, event);
                self.tasks[(prio - 1) as usize].entry = Some(task);
            }
        }
        critical_section::with(|_| self.curr_prio = pin);
    }
}
