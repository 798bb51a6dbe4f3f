//! The pending table (`spec.md` §4.5): outstanding calls keyed by message
//! number. Typical outstanding-call counts are small, so a linear-scan
//! `Vec` beats a hash map; growth and removal mirror the source's policy
//! exactly (grow in blocks of 16, remove by swap-with-last).

use std::sync::Arc;

use crate::slot::SlotShared;

const GROWTH_BLOCK: usize = 16;

#[derive(Default)]
pub struct PendingTable {
    entries: Vec<(i64, Arc<SlotShared>)>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts a new outstanding call. Callers must hold the session's state
    /// lock across this call (enforced by `Session`, not by this type).
    pub fn insert(&mut self, msgno: i64, slot: Arc<SlotShared>) {
        if self.entries.len() % GROWTH_BLOCK == 0 {
            self.entries.reserve(GROWTH_BLOCK);
        }
        self.entries.push((msgno, slot));
    }

    /// Removes and returns the slot for `msgno`, if any. Unordered: swaps
    /// the last entry into the removed slot's place.
    pub fn remove(&mut self, msgno: i64) -> Option<Arc<SlotShared>> {
        let idx = self.entries.iter().position(|(m, _)| *m == msgno)?;
        Some(self.entries.swap_remove(idx).1)
    }

    /// Drains every outstanding slot, for broadcasting a session-death
    /// sentinel to all waiters at once.
    pub fn drain(&mut self) -> Vec<Arc<SlotShared>> {
        self.entries.drain(..).map(|(_, slot)| slot).collect()
    }

    /// Any one outstanding slot, for the receive pump's "hand off to exactly
    /// one replacement receiver" step. Which one is unspecified.
    pub fn any(&self) -> Option<Arc<SlotShared>> {
        self.entries.first().map(|(_, slot)| slot.clone())
    }
}
