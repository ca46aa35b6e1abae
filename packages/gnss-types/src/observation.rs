//! Shared vocabulary for channel state, observations, and IF wire formats —
//! the types the receiver core and the test synthesizer (`gnss-sim`) both
//! need to agree on without depending on each other.

use serde::{Deserialize, Serialize};

use crate::signal::Signal;

/// Channel state machine states, spec §4.5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelPhase {
    Idle,
    Search,
    Lock,
}

/// spec §3: "TOW-validity ∈ {invalid, valid, ambiguous-unresolved}".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TowValidity {
    Invalid,
    Valid,
    AmbiguousUnresolved,
}

/// Typed replacement for the imperative `ssync`/`fsync` field resets spec §9's
/// REDESIGN FLAG calls for ("a typed enum `FrameSync = NotSynced |
/// Synced{lock_at, rev}` makes the invariants enforceable").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FrameSync {
    NotSynced,
    Synced { lock_at: u64, reversed: bool },
}

impl FrameSync {
    pub fn is_synced(&self) -> bool {
        matches!(self, FrameSync::Synced { .. })
    }

    pub fn lock_at(&self) -> Option<u64> {
        match self {
            FrameSync::Synced { lock_at, .. } => Some(*lock_at),
            FrameSync::NotSynced => None,
        }
    }

    pub fn reversed(&self) -> bool {
        matches!(self, FrameSync::Synced { reversed: true, .. })
    }
}

/// Symbol-sync state: mirrors `FrameSync` but for the coarser bit-boundary
/// lock (`ssync` in spec §3/§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymbolSync {
    NotSynced,
    Synced { lock_at: u64 },
}

impl SymbolSync {
    pub fn is_synced(&self) -> bool {
        matches!(self, SymbolSync::Synced { .. })
    }
}

/// One satellite's record within an observation epoch (spec §3). `Nfreq +
/// Nextra` frequency slots collapse here to one `Observation` per
/// (signal, PRN) — the aggregator groups them by satellite when building the
/// wire-format messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    pub signal: Signal,
    pub prn: u16,
    /// RINEX-style observation code identifier, e.g. "1C", "5Q".
    pub rinex_code: String,
    /// Pseudorange (m). `None` if this frequency slot could not be formed.
    pub pseudorange_m: Option<f64>,
    /// Carrier phase (cycles).
    pub carrier_phase_cyc: Option<f64>,
    /// Doppler (Hz).
    pub doppler_hz: Option<f64>,
    pub cn0_db_hz: f64,
    /// Loss-of-lock indicator bits, spec §4.7: bit0 = PLL unlocked,
    /// bit1 = half-cycle ambiguity unknown.
    pub lli: u8,
}

/// spec §3 "Observation epoch: set of per-satellite records at epoch time
/// t_ep". Reset at each epoch boundary, emitted, reset again.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservationEpoch {
    pub t_ep_gpst_s: f64,
    pub observations: Vec<Observation>,
}

/// IF-data file formats, spec §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RfFormat {
    /// 1 byte per I sample, real-only.
    Int8,
    /// 2 bytes per sample (I then Q); Q negated on read.
    Int8x2,
    /// 1 byte packs 2 RF channels' I/Q (2 bits each) in sign-magnitude.
    Raw8,
    /// 2 bytes interleave 4 RF channels' I/Q.
    Raw16,
    /// 2 bytes, alternate interleave convention for 4 RF channels.
    Raw16I,
    /// 4 bytes interleave 8 RF channels' I/Q.
    Raw32,
}

impl RfFormat {
    /// Number of RF (front-end) channels packed per sample group.
    pub fn rf_channels(self) -> usize {
        match self {
            RfFormat::Int8 | RfFormat::Int8x2 => 1,
            RfFormat::Raw8 => 2,
            RfFormat::Raw16 | RfFormat::Raw16I => 4,
            RfFormat::Raw32 => 8,
        }
    }

    /// Bytes consumed per sample (all RF channels together).
    pub fn bytes_per_sample(self) -> usize {
        match self {
            RfFormat::Int8 => 1,
            RfFormat::Int8x2 => 2,
            RfFormat::Raw8 => 1,
            RfFormat::Raw16 | RfFormat::Raw16I => 2,
            RfFormat::Raw32 => 4,
        }
    }

    pub fn parse(s: &str) -> Option<RfFormat> {
        Some(match s.to_ascii_uppercase().as_str() {
            "INT8" => RfFormat::Int8,
            "INT8X2" => RfFormat::Int8x2,
            "RAW8" => RfFormat::Raw8,
            "RAW16" => RfFormat::Raw16,
            "RAW16I" => RfFormat::Raw16I,
            "RAW32" => RfFormat::Raw32,
            _ => return None,
        })
    }
}

/// Sidecar `.tag` file contents, spec §6: "records {program, start-time
/// (UTC), fmt, fs, fo[8], IQ[8], bits[8]}".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IfTag {
    pub program: String,
    pub start_time_utc: String,
    pub fmt: RfFormat,
    pub fs_hz: f64,
    pub fo_hz: Vec<f64>,
    pub iq: Vec<bool>,
    pub bits: Vec<u8>,
}
