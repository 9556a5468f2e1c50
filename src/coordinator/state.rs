use std::fmt;

use serde::{Deserialize, Serialize};

/// Where one queued item is in its run.
///
/// With a ledger: PENDING → CLAIMED → EXECUTING → RECORDED, or
/// PENDING → SKIPPED when another process holds the claim. Without a ledger
/// the claim step is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemState {
    Pending,
    Claimed,
    Executing,
    Recorded,
    Skipped,
}

impl fmt::Display for ItemState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemState::Pending => write!(f, "PENDING"),
            ItemState::Claimed => write!(f, "CLAIMED"),
            ItemState::Executing => write!(f, "EXECUTING"),
            ItemState::Recorded => write!(f, "RECORDED"),
            ItemState::Skipped => write!(f, "SKIPPED"),
        }
    }
}

/// Something that happened to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    ClaimGranted,
    ClaimRefused,
    DryRun,
    Launch,
    Returned,
}

/// The result of evaluating an event against the current state.
#[derive(Debug, Clone, PartialEq)]
pub enum Transition {
    /// Move to this state.
    Next(ItemState),
    /// The event makes no sense here; the state is left as is.
    Invalid { from: ItemState, event: Event },
}

/// Transition table for a single item.
pub struct StateMachine;

impl StateMachine {
    pub fn next(state: ItemState, event: Event) -> Transition {
        let next = match (state, event) {
            (ItemState::Pending, Event::ClaimGranted) => ItemState::Claimed,
            (ItemState::Pending, Event::ClaimRefused) => ItemState::Skipped,
            (ItemState::Pending | ItemState::Claimed, Event::DryRun) => ItemState::Recorded,
            (ItemState::Pending | ItemState::Claimed, Event::Launch) => ItemState::Executing,
            (ItemState::Executing, Event::Returned) => ItemState::Recorded,
            (from, event) => return Transition::Invalid { from, event },
        };
        Transition::Next(next)
    }
}

/// Tracks one item's state and the states it passed through.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRun {
    pub state: ItemState,
    pub history: Vec<ItemState>,
}

impl Default for ItemRun {
    fn default() -> Self {
        Self {
            state: ItemState::Pending,
            history: Vec::new(),
        }
    }
}

impl ItemRun {
    /// Applies `event`, recording the old state on success.
    pub fn advance(&mut self, event: Event) -> Transition {
        let transition = StateMachine::next(self.state, event);
        if let Transition::Next(next) = transition {
            self.history.push(self.state);
            self.state = next;
        }
        transition
    }

    /// Every state visited, ending with the current one.
    pub fn transitions(&self) -> Vec<ItemState> {
        let mut all = self.history.clone();
        all.push(self.state);
        all
    }
}
