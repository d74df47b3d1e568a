//! Policies selecting which history turns are forwarded to the backend.
//!
//! Policies only shape the request; the stored history always keeps every
//! turn.

use std::fmt;

use crate::types::{ChatHistory, ChatTurn};

/// Selects the turns forwarded with a question.
pub trait HistoryPolicy: Send + Sync + fmt::Debug {
    /// Turns to forward, seed first, in stored order.
    fn select(&self, history: &ChatHistory) -> Vec<ChatTurn>;

    /// Policy name for logs.
    fn name(&self) -> &str;
}

/// Forward the whole history.
#[derive(Debug, Clone, Copy, Default)]
pub struct FullHistory;

impl HistoryPolicy for FullHistory {
    fn select(&self, history: &ChatHistory) -> Vec<ChatTurn> {
        history.turns().to_vec()
    }

    fn name(&self) -> &str {
        "full"
    }
}

/// Forward the seed pair plus the most recent turns.
#[derive(Debug, Clone, Copy)]
pub struct RecentTurns {
    max_turns: usize,
}

impl RecentTurns {
    /// Keep at most `max_turns` non-seed turns, rounded down to whole
    /// question/answer pairs.
    pub fn new(max_turns: usize) -> Self {
        Self {
            max_turns: max_turns - max_turns % 2,
        }
    }

    /// Effective turn limit (always even).
    pub fn max_turns(&self) -> usize {
        self.max_turns
    }
}

impl HistoryPolicy for RecentTurns {
    fn select(&self, history: &ChatHistory) -> Vec<ChatTurn> {
        let visible = history.visible_turns();
        let skip = visible.len().saturating_sub(self.max_turns);
        history
            .seed()
            .iter()
            .chain(visible[skip..].iter())
            .cloned()
            .collect()
    }

    fn name(&self) -> &str {
        "recent"
    }
}
