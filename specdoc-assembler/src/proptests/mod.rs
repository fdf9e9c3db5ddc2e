//! Property-based tests for the assembler
//!
//! These check invariants that must hold for any overlay edits and any
//! directive-free document, not just the hand-written cases in the unit tests.

mod generators;
mod invariants;
