// File: src/test_utils/mod.rs

pub mod fakes;
pub mod fixtures;

pub use fakes::{FakeHistory, MemoryCursorRepository, ScriptedHistory};
