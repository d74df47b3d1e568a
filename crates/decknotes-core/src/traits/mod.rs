//! Core traits for decknotes providers.

mod backend;

pub use backend::*;
