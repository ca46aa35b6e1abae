//! # gnss-types
//!
//! Shared vocabulary for the pocket-receiver workspace: the signal/PRN-code
//! tables ("Code/signal tables" in spec §2, 5% of core, pure lookup), channel
//! and observation types, and the IF-data wire-format enum (spec §6).
//!
//! Used by both `receiver` (the acquisition/tracking/nav/PVT pipeline) and
//! `gnss-sim` (the synthetic IF-stream and nav-frame generator used by the
//! test suite) so neither has to depend on the other to agree on what a
//! `Signal` or an `Observation` is.

pub mod codes;
pub mod observation;
pub mod signal;

pub use observation::{
    ChannelPhase, FrameSync, IfTag, Observation, ObservationEpoch, RfFormat, SymbolSync,
    TowValidity,
};
pub use signal::{Constellation, Modulation, Signal, SignalDescriptor};
