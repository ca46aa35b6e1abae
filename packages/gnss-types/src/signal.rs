//! Signal identity and the immutable descriptor table.
//!
//! Mirrors spec §3's "Signal descriptor (immutable, keyed by signal-ID string)":
//! constructed once at startup from tables, read-only thereafter. The tagged
//! `Signal` enum replaces the `if (!strcmp(sig, "L1CA"))` dispatch chains the
//! REDESIGN FLAGS call out — matching on `Signal` is exhaustive and checked at
//! compile time instead of falling through a string-compare ladder.

use serde::{Deserialize, Serialize};

/// One modulation arm of a signal-ID string. `Signal` is the full vocabulary
/// named across spec §1/§4.4's signal zoo (GPS L1CA/L1C/L2C/L5, Galileo
/// E1/E5/E6, BeiDou B1I/B1C/B2a/B2b/B3I, GLONASS L1/L2/L3, QZSS, NavIC, SBAS).
/// QZSS reuses the GPS-lettered signal IDs (L1CA, L1CD, L2CM, L5I, L6D/L6E)
/// and SBAS reuses L1CA/L5I; both are disambiguated from GPS by PRN range via
/// [`Signal::constellation_for_prn`], the same convention the nearest on-domain
/// reference implementation (`mfkiwl-gnss-rcv`) uses (`sv.prn >= 120 && <= 158`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Signal {
    L1CA,
    L1CD,
    L1CP,
    L2CM,
    L5I,
    L5Q,
    L6D,
    L6E,
    G1CA,
    G2CA,
    G1OCD,
    G3OCD,
    E1B,
    E1C,
    E5AI,
    E5BI,
    E6B,
    B1I,
    B1CD,
    B2AD,
    B2BI,
    B3I,
    I1SD,
    I5S,
}

/// Constellation a given (signal, PRN) pair belongs to. Not stored on
/// `SignalDescriptor` directly — several signal IDs (L1CA, L1C, L2CM, L5,
/// L6) are shared between GPS and QZSS and resolved by PRN range instead,
/// per spec §4.4's signal-zoo note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constellation {
    Gps,
    Glonass,
    Galileo,
    Beidou,
    Qzss,
    Navic,
    Sbas,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Modulation {
    Bpsk,
    Boc,
    /// Pilot + data pair sharing one carrier (e.g. L1CD/L1CP, E1B/E1C)
    PilotData,
}

/// spec §3: "carrier frequency fc (Hz), primary code chip sequence (±1),
/// primary code length Lc, primary code period T (s), optional secondary
/// code sequence and length, modulation type".
#[derive(Debug, Clone)]
pub struct SignalDescriptor {
    pub signal: Signal,
    pub fc_hz: f64,
    pub code_len_chips: usize,
    pub code_period_s: f64,
    pub secondary_len: Option<usize>,
    pub modulation: Modulation,
    /// Decoder time-tag offset `TOFF_<sig>` (s) — spec §4.4.
    pub toff_s: f64,
    /// Week-number alignment constant added to the decoded raw week field to
    /// reach the GPS week epoch, spec §4.4 ("+2048 for GPS LNAV, +1024 for
    /// Galileo and NavIC, +1356 for BeiDou").
    pub week_offset: i32,
}

impl Signal {
    /// spec §4.4's signal-zoo disambiguation: some signal IDs are shared
    /// between GPS and QZSS (PRN 193-202) or represent SBAS (PRN 120-158).
    pub fn constellation_for_prn(self, prn: u16) -> Constellation {
        use Signal::*;
        match self {
            G1CA | G2CA | G1OCD | G3OCD => Constellation::Glonass,
            E1B | E1C | E5AI | E5BI | E6B => Constellation::Galileo,
            B1I | B1CD | B2AD | B2BI | B3I => Constellation::Beidou,
            I1SD | I5S => Constellation::Navic,
            L1CA | L1CD | L1CP | L2CM | L5I | L5Q | L6D | L6E => {
                if (120..=158).contains(&prn) {
                    Constellation::Sbas
                } else if (193..=202).contains(&prn) {
                    Constellation::Qzss
                } else {
                    Constellation::Gps
                }
            }
        }
    }

    pub fn descriptor(self) -> SignalDescriptor {
        use Modulation::*;
        use Signal::*;
        match self {
            L1CA => SignalDescriptor {
                signal: self,
                fc_hz: 1_575_420_000.0,
                code_len_chips: 1023,
                code_period_s: 1e-3,
                secondary_len: None,
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 2048,
            },
            L1CD => SignalDescriptor {
                signal: self,
                fc_hz: 1_575_420_000.0,
                code_len_chips: 10_230,
                code_period_s: 10e-3,
                secondary_len: None,
                modulation: PilotData,
                toff_s: 0.0,
                week_offset: 2048,
            },
            L1CP => SignalDescriptor {
                signal: self,
                fc_hz: 1_575_420_000.0,
                code_len_chips: 10_230,
                code_period_s: 10e-3,
                secondary_len: Some(1800),
                modulation: PilotData,
                toff_s: 0.0,
                week_offset: 2048,
            },
            L2CM => SignalDescriptor {
                signal: self,
                fc_hz: 1_227_600_000.0,
                code_len_chips: 10_230,
                code_period_s: 20e-3,
                secondary_len: None,
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 2048,
            },
            L5I => SignalDescriptor {
                signal: self,
                fc_hz: 1_176_450_000.0,
                code_len_chips: 10_230,
                code_period_s: 1e-3,
                secondary_len: Some(10),
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 2048,
            },
            L5Q => SignalDescriptor {
                signal: self,
                fc_hz: 1_176_450_000.0,
                code_len_chips: 10_230,
                code_period_s: 1e-3,
                secondary_len: Some(20),
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 2048,
            },
            L6D => SignalDescriptor {
                signal: self,
                fc_hz: 1_278_750_000.0,
                code_len_chips: 5000,
                code_period_s: 1e-3,
                secondary_len: None,
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 2048,
            },
            L6E => SignalDescriptor {
                signal: self,
                fc_hz: 1_278_750_000.0,
                code_len_chips: 5000,
                code_period_s: 1e-3,
                secondary_len: None,
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 2048,
            },
            G1CA => SignalDescriptor {
                signal: self,
                fc_hz: 1_602_000_000.0,
                code_len_chips: 511,
                code_period_s: 1e-3,
                secondary_len: None,
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 0,
            },
            G2CA => SignalDescriptor {
                signal: self,
                fc_hz: 1_246_000_000.0,
                code_len_chips: 511,
                code_period_s: 1e-3,
                secondary_len: None,
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 0,
            },
            G1OCD => SignalDescriptor {
                signal: self,
                fc_hz: 1_600_995_000.0,
                code_len_chips: 4100,
                code_period_s: 1e-3,
                secondary_len: None,
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 0,
            },
            G3OCD => SignalDescriptor {
                signal: self,
                fc_hz: 1_202_025_000.0,
                code_len_chips: 10_230,
                code_period_s: 1e-3,
                secondary_len: None,
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 0,
            },
            E1B => SignalDescriptor {
                signal: self,
                fc_hz: 1_575_420_000.0,
                code_len_chips: 4092,
                code_period_s: 4e-3,
                secondary_len: None,
                modulation: PilotData,
                toff_s: 0.0,
                week_offset: 1024,
            },
            E1C => SignalDescriptor {
                signal: self,
                fc_hz: 1_575_420_000.0,
                code_len_chips: 4092,
                code_period_s: 4e-3,
                secondary_len: Some(25),
                modulation: PilotData,
                toff_s: 0.0,
                week_offset: 1024,
            },
            E5AI => SignalDescriptor {
                signal: self,
                fc_hz: 1_176_450_000.0,
                code_len_chips: 10_230,
                code_period_s: 1e-3,
                secondary_len: Some(20),
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 1024,
            },
            E5BI => SignalDescriptor {
                signal: self,
                fc_hz: 1_207_140_000.0,
                code_len_chips: 10_230,
                code_period_s: 1e-3,
                secondary_len: Some(4),
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 1024,
            },
            E6B => SignalDescriptor {
                signal: self,
                fc_hz: 1_278_750_000.0,
                code_len_chips: 5115,
                code_period_s: 1e-3,
                secondary_len: None,
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 1024,
            },
            B1I => SignalDescriptor {
                signal: self,
                fc_hz: 1_561_098_000.0,
                code_len_chips: 2046,
                code_period_s: 1e-3,
                secondary_len: Some(20),
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 1356,
            },
            B1CD => SignalDescriptor {
                signal: self,
                fc_hz: 1_575_420_000.0,
                code_len_chips: 10_230,
                code_period_s: 10e-3,
                secondary_len: None,
                modulation: PilotData,
                toff_s: 0.0,
                week_offset: 1356,
            },
            B2AD => SignalDescriptor {
                signal: self,
                fc_hz: 1_176_450_000.0,
                code_len_chips: 10_230,
                code_period_s: 1e-3,
                secondary_len: None,
                modulation: PilotData,
                toff_s: 0.0,
                week_offset: 1356,
            },
            B2BI => SignalDescriptor {
                signal: self,
                fc_hz: 1_207_140_000.0,
                code_len_chips: 10_230,
                code_period_s: 1e-3,
                secondary_len: None,
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 1356,
            },
            B3I => SignalDescriptor {
                signal: self,
                fc_hz: 1_268_520_000.0,
                code_len_chips: 10_230,
                code_period_s: 1e-3,
                secondary_len: Some(20),
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 1356,
            },
            I1SD => SignalDescriptor {
                signal: self,
                fc_hz: 1_575_420_000.0,
                code_len_chips: 1023,
                code_period_s: 1e-3,
                secondary_len: None,
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 1024,
            },
            I5S => SignalDescriptor {
                signal: self,
                fc_hz: 1_176_450_000.0,
                code_len_chips: 1023,
                code_period_s: 1e-3,
                secondary_len: None,
                modulation: Bpsk,
                toff_s: 0.0,
                week_offset: 1024,
            },
        }
    }

    /// Parse a signal-ID string as used in `-sys`/`-RFCH` receiver options
    /// (spec §6).
    pub fn parse(id: &str) -> Option<Signal> {
        use Signal::*;
        Some(match id {
            "L1CA" => L1CA,
            "L1CD" => L1CD,
            "L1CP" => L1CP,
            "L2CM" => L2CM,
            "L5I" => L5I,
            "L5Q" => L5Q,
            "L6D" => L6D,
            "L6E" => L6E,
            "G1CA" => G1CA,
            "G2CA" => G2CA,
            "G1OCD" => G1OCD,
            "G3OCD" => G3OCD,
            "E1B" => E1B,
            "E1C" => E1C,
            "E5AI" => E5AI,
            "E5BI" => E5BI,
            "E6B" => E6B,
            "B1I" => B1I,
            "B1CD" => B1CD,
            "B2AD" => B2AD,
            "B2BI" => B2BI,
            "B3I" => B3I,
            "I1SD" => I1SD,
            "I5S" => I5S,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        use Signal::*;
        match self {
            L1CA => "L1CA",
            L1CD => "L1CD",
            L1CP => "L1CP",
            L2CM => "L2CM",
            L5I => "L5I",
            L5Q => "L5Q",
            L6D => "L6D",
            L6E => "L6E",
            G1CA => "G1CA",
            G2CA => "G2CA",
            G1OCD => "G1OCD",
            G3OCD => "G3OCD",
            E1B => "E1B",
            E1C => "E1C",
            E5AI => "E5AI",
            E5BI => "E5BI",
            E6B => "E6B",
            B1I => "B1I",
            B1CD => "B1CD",
            B2AD => "B2AD",
            B2BI => "B2BI",
            B3I => "B3I",
            I1SD => "I1SD",
            I5S => "I5S",
        }
    }
}

impl std::fmt::Display for Signal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_roundtrips_through_as_str() {
        for s in [Signal::L1CA, Signal::E1B, Signal::B1CD, Signal::I5S] {
            assert_eq!(Signal::parse(s.as_str()), Some(s));
        }
    }

    #[test]
    fn l1ca_constellation_by_prn_range() {
        assert_eq!(Signal::L1CA.constellation_for_prn(5), Constellation::Gps);
        assert_eq!(Signal::L1CA.constellation_for_prn(195), Constellation::Qzss);
        assert_eq!(Signal::L1CA.constellation_for_prn(131), Constellation::Sbas);
    }
}
