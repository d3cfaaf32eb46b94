//! Bounded circular byte queues.
//!
//! A fixed ring with capacity chosen at creation, guarded by a backing
//! semaphore. Producers and consumers never block the CPU: on a full or
//! empty ring the calling task is registered as a waiter and must return,
//! retrying when it is next invoked.

use log::debug;

use crate::kernel::Kernel;
use crate::semaphore::SemId;

pub(crate) const MAX_QUEUES: usize = 4;

/// Hard ceiling on a queue's capacity; the actual capacity is fixed per
/// queue at creation.
pub const MAX_QUEUE_CAPACITY: usize = 32;

/// Handle to a kernel-owned queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueId(pub(crate) u8);

/// Queue control block. Invariant: `head` and `tail` stay below
/// `capacity`, and `len` counts the valid slots between them.
pub(crate) struct QueueCb {
    pub(crate) sem: SemId,
    pub(crate) data: [u8; MAX_QUEUE_CAPACITY],
    pub(crate) head: u8,
    pub(crate) tail: u8,
    pub(crate) len: u8,
    pub(crate) capacity: u8,
}

impl<'t> Kernel<'t> {
    /// Create an empty queue holding up to `capacity` bytes.
    ///
    /// # Panics
    ///
    /// Panics when `capacity` is zero or above [`MAX_QUEUE_CAPACITY`],
    /// or when the queue or semaphore pool is exhausted.
    pub fn queue_create(&mut self, capacity: u8) -> QueueId {
        assert!(
            capacity >= 1 && capacity as usize <= MAX_QUEUE_CAPACITY,
            "queue capacity out of range: {capacity}"
        );
        let sem = self.sem_create();
        let id = self.queues.len() as u8;
        let cb = QueueCb {
            sem,
            data: [0; MAX_QUEUE_CAPACITY],
            head: 0,
            tail: 0,
            len: 0,
            capacity,
        };
        let ok = self.queues.push(cb).is_ok();
        assert!(ok, "queue pool exhausted");
        QueueId(id)
    }

    /// Append `data` at the head of the ring. Returns `false` when the
    /// queue is full or the backing semaphore is contended; either way
    /// the calling task is registered as a waiter and must retry on a
    /// later invocation.
    pub fn queue_enqueue(&mut self, q: QueueId, data: u8) -> bool {
        let (sem, full) = critical_section::with(|_| {
            let cb = &self.queues[q.0 as usize];
            (cb.sem, cb.len >= cb.capacity)
        });
        if full {
            debug!("queue_enqueue: no space available");
            self.sem_block_current(sem);
            return false;
        }
        if !self.sem_wait(sem) {
            return false;
        }
        critical_section::with(|_| {
            let cb = &mut self.queues[q.0 as usize];
            cb.data[cb.head as usize] = data;
            cb.head = (cb.head + 1) % cb.capacity;
            cb.len += 1;
        });
        self.sem_signal(sem);
        true
    }

    /// Remove and return the oldest byte in the ring. `None` means the
    /// queue was empty (or the backing semaphore contended); the calling
    /// task is registered as a waiter and must retry later.
    pub fn queue_dequeue(&mut self, q: QueueId) -> Option<u8> {
        let (sem, empty) = critical_section::with(|_| {
            let cb = &self.queues[q.0 as usize];
            (cb.sem, cb.len == 0)
        });
        if empty {
            debug!("queue_dequeue: no data available");
            self.sem_block_current(sem);
            return None;
        }
        if !self.sem_wait(sem) {
            return None;
        }
        let data = critical_section::with(|_| {
            let cb = &mut self.queues[q.0 as usize];
            let data = cb.data[cb.tail as usize];
            cb.tail = (cb.tail + 1) % cb.capacity;
            cb.len -= 1;
            data
        });
        self.sem_signal(sem);
        Some(data)
    }
}
