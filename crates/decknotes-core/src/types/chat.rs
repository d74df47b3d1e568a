//! Chat history and state.

use serde::{Deserialize, Serialize};

use super::{ChatRole, ChatTurn};
use crate::error::{NotesError, NotesResult};
use crate::prompts::{seed_user_turn, SEED_MODEL_REPLY};

/// Number of synthetic turns that open every history.
pub const SEED_TURNS: usize = 2;

/// Ordered conversation log over one set of notes.
///
/// Always starts with the two seed turns and continues with strictly
/// alternating user/model pairs, so its length is always even. Values are
/// never mutated in place; appending produces a new history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<ChatTurn>", into = "Vec<ChatTurn>")]
pub struct ChatHistory {
    turns: Vec<ChatTurn>,
}

impl ChatHistory {
    /// Fresh two-turn history seeded with the notes text.
    pub fn seeded(notes: &str) -> Self {
        Self {
            turns: vec![
                ChatTurn::user(seed_user_turn(notes)),
                ChatTurn::model(SEED_MODEL_REPLY),
            ],
        }
    }

    /// Rebuild a history from stored turns, checking its shape.
    pub fn from_turns(turns: Vec<ChatTurn>) -> NotesResult<Self> {
        if turns.len() < SEED_TURNS || turns.len() % 2 != 0 {
            return Err(NotesError::validation(format!(
                "Chat history must hold an even number of turns (at least {}), got {}",
                SEED_TURNS,
                turns.len()
            )));
        }
        let mut expected = ChatRole::User;
        for (index, turn) in turns.iter().enumerate() {
            if turn.role != expected {
                return Err(NotesError::validation(format!(
                    "Chat turn {} should be from {}, found {}",
                    index,
                    expected.as_str(),
                    turn.role.as_str()
                )));
            }
            expected = expected.other();
        }
        Ok(Self { turns })
    }

    /// Every turn, seed included.
    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// The two seed turns.
    pub fn seed(&self) -> &[ChatTurn] {
        &self.turns[..SEED_TURNS]
    }

    /// Turns shown to the end user (seed skipped).
    pub fn visible_turns(&self) -> &[ChatTurn] {
        &self.turns[SEED_TURNS..]
    }

    /// Total number of turns.
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Always false: a history holds at least its seed.
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Number of completed question/answer exchanges.
    pub fn exchange_count(&self) -> usize {
        (self.turns.len() - SEED_TURNS) / 2
    }

    /// Most recent model answer outside the seed.
    pub fn last_answer(&self) -> Option<&str> {
        self.visible_turns()
            .last()
            .filter(|turn| turn.role == ChatRole::Model)
            .map(|turn| turn.content.as_str())
    }

    /// New history with one exchange appended.
    pub fn with_exchange(&self, question: impl Into<String>, answer: impl Into<String>) -> Self {
        let mut turns = Vec::with_capacity(self.turns.len() + 2);
        turns.extend_from_slice(&self.turns);
        turns.push(ChatTurn::user(question));
        turns.push(ChatTurn::model(answer));
        Self { turns }
    }

    /// Chat state for this history.
    pub fn state(&self) -> ChatState {
        if self.turns.len() > SEED_TURNS {
            ChatState::Active
        } else {
            ChatState::Seeded
        }
    }
}

impl TryFrom<Vec<ChatTurn>> for ChatHistory {
    type Error = NotesError;

    fn try_from(turns: Vec<ChatTurn>) -> Result<Self, Self::Error> {
        Self::from_turns(turns)
    }
}

impl From<ChatHistory> for Vec<ChatTurn> {
    fn from(history: ChatHistory) -> Self {
        history.turns
    }
}

/// Per-session chat state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatState {
    /// No notes yet.
    Empty,
    /// Notes generated, seed only.
    Seeded,
    /// At least one exchange.
    Active,
}

impl ChatState {
    /// State for an optional history.
    pub fn of(history: Option<&ChatHistory>) -> Self {
        history.map(ChatHistory::state).unwrap_or(ChatState::Empty)
    }
}
