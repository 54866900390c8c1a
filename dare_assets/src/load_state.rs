//! Per-`AssetTypeInfo` state machine and the single-slot `opState` guard
//! (spec section 4.4).

use std::sync::atomic::{AtomicU8, Ordering};

/// `loadState` (spec section 3/4.4). Transitions happen under the type's
/// write lock, so this carries no atomic/CAS machinery of its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
    Unloading,
    /// Terminal for the session: a failed load never retries.
    Corrupted,
    /// Terminal until a restart or explicit undo-delete.
    Deleted,
}

/// `AOS_*` single-entry op slot (spec section 4.4). `SetOp` is a
/// compare-and-swap from `Idle`; `ClearOp` is idempotent from any other
/// state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpState {
    Idle = 0,
    Loading = 1,
    Unloading = 2,
    Downloading = 3,
    Caching = 4,
    Creating = 5,
    Deleted = 6,
    UndoDelete = 7,
}

impl OpState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => OpState::Idle,
            1 => OpState::Loading,
            2 => OpState::Unloading,
            3 => OpState::Downloading,
            4 => OpState::Caching,
            5 => OpState::Creating,
            6 => OpState::Deleted,
            7 => OpState::UndoDelete,
            _ => unreachable!("OpState only ever stores values produced by this type"),
        }
    }
}

/// Atomic storage for [`OpState`], embedded in `DynamicTuple` (spec section
/// 5: "opState | embedded atomic slot | `SetOp` is a compare-and-swap from
/// IDLE").
#[derive(Debug)]
pub struct OpSlot(AtomicU8);

impl OpSlot {
    pub fn new() -> Self {
        Self(AtomicU8::new(OpState::Idle as u8))
    }

    pub fn get(&self) -> OpState {
        OpState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Succeeds only if the current value is `Idle`; otherwise the caller
    /// backs off (spec section 4.4).
    pub fn set_op(&self, op: OpState) -> bool {
        self.0
            .compare_exchange(
                OpState::Idle as u8,
                op as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Idempotent from any non-idle value.
    pub fn clear_op(&self) {
        self.0.store(OpState::Idle as u8, Ordering::Release);
    }
}

impl Default for OpSlot {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn set_op_is_a_mutex_exactly_one_winner() {
        let slot = Arc::new(OpSlot::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let slot = slot.clone();
                thread::spawn(move || slot.set_op(OpState::Loading))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(slot.get(), OpState::Loading);
    }

    #[test]
    fn clear_op_is_idempotent() {
        let slot = OpSlot::new();
        assert!(slot.set_op(OpState::Creating));
        slot.clear_op();
        slot.clear_op();
        assert_eq!(slot.get(), OpState::Idle);
        assert!(slot.set_op(OpState::Downloading));
    }
}
