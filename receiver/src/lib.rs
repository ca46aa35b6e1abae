//! Software-defined GNSS receiver core: IF samples in, pseudorange/
//! carrier-phase/Doppler observables and a PVT fix out.
//!
//! Module map mirrors the pipeline stages: [`source`]/[`ring`] ingest IF
//! samples, [`correlator`]/[`acquisition`]/[`tracking`] run the per-channel
//! signal-processing loop, [`fec`]/[`nav`]/[`ephemeris`] decode navigation
//! messages, [`channel`] is the per-(signal, PRN) state machine tying those
//! together, [`scheduler`] multiplexes many channels over shared IF rings,
//! and [`pvt`] aggregates locked channels' observations into epochs for an
//! external position solver. [`nmea`] encodes receiver output in scope;
//! [`rtcm3`] and [`usb`] define boundaries to collaborators out of scope.

pub mod acquisition;
pub mod channel;
pub mod codes;
pub mod config;
pub mod correlator;
pub mod ephemeris;
pub mod error;
pub mod fec;
pub mod logstream;
pub mod nav;
pub mod navdb;
pub mod nmea;
pub mod pvt;
pub mod receiver;
pub mod ring;
pub mod rtcm3;
pub mod scheduler;
pub mod source;
pub mod tracking;
pub mod usb;

pub use error::{ReceiverError, Result};
pub use receiver::Receiver;
