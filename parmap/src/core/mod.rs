//! Deterministic, pure logic shared by the parmap controller.
//!
//! Core modules must be free of process-level side effects. They operate on
//! in-memory data (or any `BufRead`) and return deterministic outputs suitable
//! for tests.

pub mod capacity;
pub mod classifier;
pub mod tokenizer;
pub mod types;
