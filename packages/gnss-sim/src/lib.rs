//! Synthetic IF-stream and nav-frame generator: the harness spec §8's
//! testable properties and end-to-end scenarios (S1-S6) run against.

pub mod ifgen;
pub mod navgen;
pub mod scenarios;
