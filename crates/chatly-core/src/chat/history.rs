//! Bounded exchange history for one chat session.

use std::collections::VecDeque;

use chatly_types::turn::{Turn, MAX_TURNS};

/// Ordered log of the turns of one session.
///
/// The bound is enforced inside [`append`](Self::append): after every call
/// `len() <= limit()`. When an append overflows the bound, exactly one turn
/// is evicted from the head, so the most recent turns are always kept.
#[derive(Debug, Clone)]
pub struct ExchangeHistory {
    turns: VecDeque<Turn>,
    limit: usize,
}

impl ExchangeHistory {
    /// Empty history bounded at [`MAX_TURNS`].
    pub fn new() -> Self {
        Self::with_limit(MAX_TURNS)
    }

    /// Empty history with a custom bound (at least one turn).
    pub fn with_limit(limit: usize) -> Self {
        let limit = limit.max(1);
        Self {
            turns: VecDeque::with_capacity(limit + 1),
            limit,
        }
    }

    /// Add a turn at the tail, evicting the oldest turn if the bound is exceeded.
    pub fn append(&mut self, turn: Turn) {
        self.turns.push_back(turn);
        if self.turns.len() > self.limit {
            self.turns.pop_front();
        }
    }

    /// Owned copy of the current turns, oldest first.
    pub fn snapshot(&self) -> Vec<Turn> {
        self.turns.iter().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Turn> {
        self.turns.iter()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Drop every turn. Used when the owning session closes.
    pub fn clear(&mut self) {
        self.turns.clear();
        self.turns.shrink_to_fit();
    }
}

impl Default for ExchangeHistory {
    fn default() -> Self {
        Self::new()
    }
}
