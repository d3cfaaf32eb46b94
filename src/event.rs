//! Events — the unit of work delivered to a task.
//!
//! An event is an immutable `(signal, parameter)` pair, copied by value
//! into the per-task event queues.

/// Signal tag identifying what happened.
///
/// Values `0` and `1` are reserved by the kernel; applications number
/// their own signals from [`USER_SIG`] upward.
pub type Signal = u8;

/// One byte of payload carried alongside the signal.
pub type Param = u8;

/// Delivered once per task, directly from `register_task`.
pub const INIT_SIG: Signal = 0;

/// Posted by `sem_signal` to wake the highest-priority waiter.
pub const SEM_SIGNAL: Signal = 1;

/// First signal value free for application use.
pub const USER_SIG: Signal = 2;

/// An immutable signal/parameter pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    pub sig: Signal,
    pub par: Param,
}

impl Event {
    pub const fn new(sig: Signal, par: Param) -> Self {
        Self { sig, par }
    }
}
