//! Core types for decknotes.

mod chat;
mod message;
mod notes;
mod style;

pub use chat::*;
pub use message::*;
pub use notes::*;
pub use style::*;
