//! A preemptive run-to-completion task kernel for single-core
//! microcontrollers:
//!
//! - Fixed-priority synchronous preemption on a single stack; tasks are
//!   plain run-to-completion functions, never context-switched out
//! - Static task table and ready-set bitmask, no heap, no `unsafe`
//! - Binary semaphores, single-slot mailboxes, and bounded byte queues
//!   built on the scheduler's priority ordering
//! - Interrupt safety delegated to the platform's `critical-section`
//!   implementation
//!
//! An interrupt source calls [`Kernel::post`]; if that raises the ready
//! set above the priority currently executing, the dispatch loop runs the
//! higher task to completion before `post` returns. Synchronization
//! operations never block the CPU: they fail fast, record the caller as a
//! waiter, and rely on a later invocation to retry.

#![cfg_attr(not(test), no_std)]

pub mod event;
pub mod kernel;
pub mod mailbox;
pub mod prioset;
pub mod queue;
pub mod semaphore;
pub mod task;

pub use event::{Event, Param, Signal, INIT_SIG, SEM_SIGNAL, USER_SIG};
pub use kernel::Kernel;
pub use mailbox::MailboxId;
pub use prioset::{PrioSet, MAX_PRIO};
pub use queue::{QueueId, MAX_QUEUE_CAPACITY};
pub use semaphore::SemId;
pub use task::{
    Priority, Task, IDLE_PRIO, ISR_AUX_PRIO, ISR_CEILING_PRIO, MAX_EVENTS,
};
