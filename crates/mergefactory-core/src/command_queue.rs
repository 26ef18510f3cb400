//! Queue of player intents awaiting the next session advance.
//!
//! Front-ends submit actions at any time; the session drains the queue at
//! the start of each advance so every intent is applied on the single
//! simulation actor, in submission order, before the production tick.

use crate::action::Action;

// ---------------------------------------------------------------------------
// CommandQueue
// ---------------------------------------------------------------------------

/// Pending intents in submission order.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Vec<Action>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: Action) {
        self.pending.push(action);
    }

    /// Take every pending action in submission order.
    pub fn drain(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.pending)
    }

    /// Drop pending actions without applying them.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::MachineId;

    fn buy(slot: u8) -> Action {
        Action::BuyMachine { slot_index: slot }
    }

    // -----------------------------------------------------------------------
    // Test 1: new queue is empty
    // -----------------------------------------------------------------------
    #[test]
    fn new_queue_is_empty() {
        let queue = CommandQueue::new();
        assert_eq!(queue.pending_count(), 0);
        assert!(queue.is_empty());
    }

    // -----------------------------------------------------------------------
    // Test 2: drain preserves submission order
    // -----------------------------------------------------------------------
    #[test]
    fn drain_preserves_order() {
        let mut queue = CommandQueue::new();
        let scrap = Action::ScrapMachine {
            machine_id: MachineId::from("a"),
        };
        queue.push(buy(0));
        queue.push(scrap.clone());
        queue.push(Action::EndDisaster);
        assert_eq!(queue.pending_count(), 3);

        let drained = queue.drain();
        assert_eq!(drained, vec![buy(0), scrap, Action::EndDisaster]);
        assert!(queue.is_empty());
        assert!(queue.drain().is_empty());
    }

    // -----------------------------------------------------------------------
    // Test 3: clear drops pending
    // -----------------------------------------------------------------------
    #[test]
    fn clear_drops_pending() {
        let mut queue = CommandQueue::new();
        queue.push(buy(4));
        queue.clear();
        assert!(queue.drain().is_empty());
    }
}
