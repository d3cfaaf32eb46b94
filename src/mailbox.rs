//! Single-slot mailboxes.
//!
//! The slot stores a reference shared with the producer; the consumer
//! copies the byte out, after which the mailbox drops the reference. The
//! `'static` bound encodes the handoff contract: the producer's storage
//! must stay valid for as long as the item sits in the mailbox, so in
//! practice the item lives in application-owned static data.

use log::debug;

use crate::event::Param;
use crate::kernel::Kernel;
use crate::semaphore::SemId;

pub(crate) const MAX_MAILBOXES: usize = 4;

/// Handle to a kernel-owned mailbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MailboxId(pub(crate) u8);

/// Mailbox control block: a backing semaphore plus one slot, full or
/// empty.
pub(crate) struct MailboxCb {
    pub(crate) sem: SemId,
    pub(crate) slot: Option<&'static Param>,
}

impl<'t> Kernel<'t> {
    /// Create an empty mailbox and its backing semaphore.
    ///
    /// # Panics
    ///
    /// Panics when the mailbox or semaphore pool is exhausted.
    pub fn mailbox_create(&mut self) -> MailboxId {
        let sem = self.sem_create();
        let id = self.mailboxes.len() as u8;
        let ok = self.mailboxes.push(MailboxCb { sem, slot: None }).is_ok();
        assert!(ok, "mailbox pool exhausted");
        MailboxId(id)
    }

    /// Hand `data` to the mailbox.
    ///
    /// Returns `false` either because the slot is already full (the
    /// calling task is registered directly as a waiter: "no room", not
    /// lock contention) or because the backing semaphore is contended
    /// (the failed take already registered it). Either way the caller
    /// must retry on a later invocation.
    pub fn mailbox_send(&mut self, mb: MailboxId, data: &'static Param) -> bool {
        let (sem, full) = critical_section::with(|_| {
            let cb = &self.mailboxes[mb.0 as usize];
            (cb.sem, cb.slot.is_some())
        });
        if full {
            debug!("mailbox_send: mailbox full");
            self.sem_block_current(sem);
            return false;
        }
        if !self.sem_wait(sem) {
            return false;
        }
        critical_section::with(|_| self.mailboxes[mb.0 as usize].slot = Some(data));
        self.sem_signal(sem);
        true
    }

    /// Copy the mailbox contents out and empty the slot.
    ///
    /// `None` means no data was available (or the backing semaphore was
    /// contended); the caller has been registered as a waiter and must
    /// retry on a later invocation.
    pub fn mailbox_receive(&mut self, mb: MailboxId) -> Option<Param> {
        let (sem, empty) = critical_section::with(|_| {
            let cb = &self.mailboxes[mb.0 as usize];
            (cb.sem, cb.slot.is_none())
        });
        if empty {
            debug!("mailbox_receive: no data available");
            self.sem_block_current(sem);
            return None;
        }
        if !self.sem_wait(sem) {
            return None;
        }
        let data = critical_section::with(|_| self.mailboxes[mb.0 as usize].slot.take().copied());
        self.sem_signal(sem);
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{Event, INIT_SIG, SEM_SIGNAL, USER_SIG};
    use crate::task::Task;
    use std::cell::RefCell;
    use std::vec::Vec;

    const TICK: u8 = USER_SIG;

    struct Null;

    impl Task for Null {
        fn run(&mut self, _kernel: &mut Kernel<'_>, _event: Event) {}
    }

    /// Attempts a send on every tick and on every semaphore wake-up.
    struct RetrySender<'a> {
        mb: MailboxId,
        value: &'static u8,
        results: &'a RefCell<Vec<(u8, bool)>>,
    }

    impl Task for RetrySender<'_> {
        fn run(&mut self, kernel: &mut Kernel<'_>, event: Event) {
            if event.sig == INIT_SIG {
                return;
            }
            let ok = kernel.mailbox_send(self.mb, self.value);
            self.results.borrow_mut().push((event.sig, ok));
        }
    }

    static SEVEN: u8 = 7;
    static NINE: u8 = 9;

    #[test]
    fn test_send_then_receive_round_trip() {
        let mut kernel = Kernel::new();
        let mb = kernel.mailbox_create();
        assert!(kernel.mailbox_send(mb, &SEVEN));
        assert_eq!(kernel.mailbox_receive(mb), Some(7));
        assert!(kernel.mailboxes[0].slot.is_none());
        assert!(kernel.sems[0].available);
    }

    #[test]
    fn test_receive_on_empty_registers_waiter_and_keeps_state() {
        let mut t3 = Null;
        let mut kernel = Kernel::new();
        kernel.register_task(&mut t3, 3, 2, INIT_SIG, 0);
        let mb = kernel.mailbox_create();

        kernel.curr_prio = 3;
        assert_eq!(kernel.mailbox_receive(mb), None);
        assert!(kernel.mailboxes[0].slot.is_none());
        assert!(kernel.sems[0].waiters.contains(3));
        // the slot was never locked
        assert!(kernel.sems[0].available);
    }

    #[test]
    fn test_send_on_full_registers_waiter() {
        let mut t4 = Null;
        let mut kernel = Kernel::new();
        kernel.register_task(&mut t4, 4, 2, INIT_SIG, 0);
        let mb = kernel.mailbox_create();

        assert!(kernel.mailbox_send(mb, &SEVEN));
        kernel.curr_prio = 4;
        assert!(!kernel.mailbox_send(mb, &NINE));
        assert_eq!(kernel.mailboxes[0].slot, Some(&SEVEN));
        assert!(kernel.sems[0].waiters.contains(4));
    }

    #[test]
    fn test_blocked_sender_retries_after_wake_up() {
        let results = RefCell::new(Vec::new());
        let mut kernel = Kernel::new();
        let mb = kernel.mailbox_create();
        let mut sender = RetrySender { mb, value: &NINE, results: &results };
        kernel.register_task(&mut sender, 3, 2, INIT_SIG, 0);
        kernel.run();

        // fill the slot from the background, then tick the sender
        assert!(kernel.mailbox_send(mb, &SEVEN));
        kernel.post(3, TICK, 0);
        assert_eq!(*results.borrow(), vec![(TICK, false)]);

        // draining the slot wakes the sender, whose retry then succeeds
        assert_eq!(kernel.mailbox_receive(mb), Some(7));
        assert_eq!(
            *results.borrow(),
            vec![(TICK, false), (SEM_SIGNAL, true)]
        );
        assert_eq!(kernel.mailboxes[0].slot, Some(&NINE));
    }
}
