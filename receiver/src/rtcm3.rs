//! RTCM3 MSM/ephemeris message encoding — spec §1 names this an external
//! collaborator ("the RTCM3 wire encoder"). This module defines the call
//! boundary only: the message kinds a real encoder would need observation
//! and ephemeris data for, no bit-level RTCM3 framing.

use gnss_types::ObservationEpoch;

use crate::ephemeris::GpsEphemeris;

/// RTCM3 message types this receiver could feed, left unencoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rtcm3MessageKind {
    Msm4,
    Msm7,
    GpsEphemeris,
}

/// Boundary trait an external RTCM3 encoder implements. The receiver core
/// only ever calls these two methods with the data it already has; how the
/// bits get packed is out of scope here (spec §1).
pub trait Rtcm3Encoder: Send + Sync {
    fn encode_observations(&self, epoch: &ObservationEpoch, kind: Rtcm3MessageKind) -> Vec<u8>;
    fn encode_ephemeris(&self, eph: &GpsEphemeris) -> Vec<u8>;
}

/// No-op encoder: returns empty frames. Lets the receiver run end to end
/// (and exercise the PVT/logging path) before a real RTCM3 encoder is wired
/// in.
pub struct NullRtcm3Encoder;

impl Rtcm3Encoder for NullRtcm3Encoder {
    fn encode_observations(&self, _epoch: &ObservationEpoch, _kind: Rtcm3MessageKind) -> Vec<u8> {
        Vec::new()
    }

    fn encode_ephemeris(&self, _eph: &GpsEphemeris) -> Vec<u8> {
        Vec::new()
    }
}
