//! Bit-per-priority sets — the ready-set and the semaphore wait-sets.
//!
//! One machine word, bit `p - 1` meaning "priority `p` is a member".
//! Extraction of the highest member is a constant-time leading-zero count.

use crate::task::Priority;

/// Highest usable task priority; the set holds one bit per priority.
pub const MAX_PRIO: Priority = 32;

/// A set of priorities in `[1, MAX_PRIO]` packed into one word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrioSet(u32);

impl PrioSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn insert(&mut self, prio: Priority) {
        self.0 |= Self::mask(prio);
    }

    pub fn remove(&mut self, prio: Priority) {
        self.0 &= !Self::mask(prio);
    }

    pub fn contains(&self, prio: Priority) -> bool {
        self.0 & Self::mask(prio) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Numerically highest priority in the set, or `None` when empty.
    pub fn highest(&self) -> Option<Priority> {
        if self.0 == 0 {
            None
        } else {
            Some((u32::BITS - self.0.leading_zeros()) as Priority)
        }
    }

    fn mask(prio: Priority) -> u32 {
        debug_assert!(
            prio >= 1 && prio <= MAX_PRIO,
            "priority out of range: {prio}"
        );
        1 << (prio - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_has_no_highest() {
        let set = PrioSet::empty();
        assert!(set.is_empty());
        assert_eq!(set.highest(), None);
    }

    #[test]
    fn test_insert_remove_contains() {
        let mut set = PrioSet::empty();
        set.insert(4);
        assert!(set.contains(4));
        assert!(!set.contains(5));
        set.remove(4);
        assert!(set.is_empty());
    }

    #[test]
    fn test_highest_picks_numerically_largest() {
        let mut set = PrioSet::empty();
        set.insert(3);
        set.insert(6);
        set.insert(7);
        assert_eq!(set.highest(), Some(7));
        set.remove(7);
        assert_eq!(set.highest(), Some(6));
    }

    #[test]
    fn test_boundary_priorities() {
        let mut set = PrioSet::empty();
        set.insert(1);
        assert_eq!(set.highest(), Some(1));
        set.insert(MAX_PRIO);
        assert_eq!(set.highest(), Some(MAX_PRIO));
        assert!(set.contains(1));
    }

    #[test]
    fn test_remove_absent_is_a_no_op() {
        let mut set = PrioSet::empty();
        set.insert(2);
        set.remove(9);
        assert!(set.contains(2));
        assert_eq!(set.highest(), Some(2));
    }
}
