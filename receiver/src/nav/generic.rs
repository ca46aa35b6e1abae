//! Table-driven navigation frame decoder covering every signal family whose
//! framing is "preamble, fixed length, one whole-frame integrity check" —
//! which is most of the non-GPS-LNAV, non-BeiDou-D1D2 signal zoo (spec
//! §4.4). One [`NavFrameSpec`] instance per signal registers its preamble,
//! frame length, and check kind; [`GenericFrameSync`] is the shared state
//! machine every registered signal runs through.

use gnss_types::{FrameSync, Signal};

use crate::fec::{crc24q, ldpc_check, rs_check, ViterbiK7, LDPC_STRIDE};
use crate::nav::DecodedSubframe;

/// Integrity check a generic frame family uses, spec §4.4's "CRC/parity per
/// signal family" note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameCheck {
    Crc24Q,
    /// No integrity check defined for this stand-in family; frames are
    /// accepted on preamble match alone.
    None,
}

/// FEC coding a generic frame family's channel symbols carry, spec §4.4
/// "de-interleave if applicable, FEC" — decoded before `check` runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FecKind {
    /// No FEC layer; channel symbols are the data bits directly.
    None,
    /// K=7 R=1/2 convolutional coding (E1B/E5/E6/GLONASS L3OCD/L1OCD): the
    /// channel carries twice as many hard symbols as decoded data bits.
    ConvolutionalK7R2,
    /// Binary LDPC (GPS CNAV-2, BeiDou B-CNAV1/2/3, NavIC L1-SPS).
    Ldpc,
    /// CCSDS Reed-Solomon(255,223) (QZSS L6).
    ReedSolomon255_223,
}

/// Static per-signal frame description. Built once at startup (part of the
/// `Runtime` context, spec §9) and looked up by [`Signal`].
#[derive(Debug, Clone)]
pub struct NavFrameSpec {
    pub signal: Signal,
    pub preamble: &'static [u8],
    /// Decoded data-bit length (post-FEC), not the raw channel-symbol count.
    pub frame_bits: usize,
    pub check: FrameCheck,
    pub fec: FecKind,
}

/// Registry of every signal covered by the generic engine rather than a
/// bespoke decoder (everything except L1CA and the BeiDou B1I/B3I D1D2
/// family).
pub fn registry() -> Vec<NavFrameSpec> {
    use Signal::*;
    vec![
        NavFrameSpec { signal: L1CD, preamble: &[1, 0, 1, 1, 0, 0, 0, 1, 1, 0], frame_bits: 1800, check: FrameCheck::None, fec: FecKind::Ldpc },
        NavFrameSpec { signal: L1CP, preamble: &[1, 0, 1, 1, 0, 0, 0, 1, 1, 0], frame_bits: 1800, check: FrameCheck::None, fec: FecKind::Ldpc },
        NavFrameSpec { signal: L2CM, preamble: &[1, 0, 0, 0, 1, 0, 1, 1], frame_bits: 300, check: FrameCheck::Crc24Q, fec: FecKind::None },
        NavFrameSpec { signal: L5I, preamble: &[1, 0, 0, 0, 1, 0, 1, 1], frame_bits: 300, check: FrameCheck::Crc24Q, fec: FecKind::None },
        NavFrameSpec { signal: L5Q, preamble: &[1, 0, 0, 0, 1, 0, 1, 1], frame_bits: 300, check: FrameCheck::Crc24Q, fec: FecKind::None },
        NavFrameSpec { signal: L6D, preamble: &[0, 1, 0, 1, 0, 1, 1, 0], frame_bits: 2000, check: FrameCheck::None, fec: FecKind::ReedSolomon255_223 },
        NavFrameSpec { signal: L6E, preamble: &[0, 1, 0, 1, 0, 1, 1, 0], frame_bits: 2000, check: FrameCheck::None, fec: FecKind::ReedSolomon255_223 },
        NavFrameSpec { signal: G1CA, preamble: &[1, 1, 1, 0, 0, 0, 1, 0, 0, 1], frame_bits: 100, check: FrameCheck::None, fec: FecKind::None },
        NavFrameSpec { signal: G2CA, preamble: &[1, 1, 1, 0, 0, 0, 1, 0, 0, 1], frame_bits: 100, check: FrameCheck::None, fec: FecKind::None },
        NavFrameSpec { signal: G1OCD, preamble: &[1, 1, 1, 0, 0, 0, 1, 0, 0, 1], frame_bits: 300, check: FrameCheck::Crc24Q, fec: FecKind::ConvolutionalK7R2 },
        NavFrameSpec { signal: G3OCD, preamble: &[1, 1, 1, 0, 0, 0, 1, 0, 0, 1], frame_bits: 300, check: FrameCheck::Crc24Q, fec: FecKind::ConvolutionalK7R2 },
        NavFrameSpec { signal: E1B, preamble: &[0, 1, 0, 1, 1, 0, 0, 0, 0, 0], frame_bits: 240, check: FrameCheck::Crc24Q, fec: FecKind::ConvolutionalK7R2 },
        NavFrameSpec { signal: E5AI, preamble: &[1, 0, 0, 1, 0, 1, 1, 0, 0, 0], frame_bits: 492, check: FrameCheck::Crc24Q, fec: FecKind::ConvolutionalK7R2 },
        NavFrameSpec { signal: E5BI, preamble: &[0, 1, 0, 1, 1, 0, 0, 0, 0, 0], frame_bits: 240, check: FrameCheck::Crc24Q, fec: FecKind::ConvolutionalK7R2 },
        NavFrameSpec { signal: E6B, preamble: &[1, 0, 0, 1, 0, 1, 1, 0, 0, 0], frame_bits: 492, check: FrameCheck::Crc24Q, fec: FecKind::ConvolutionalK7R2 },
        NavFrameSpec { signal: B1CD, preamble: &[1, 1, 1, 0, 0, 0, 1, 0, 0, 1], frame_bits: 1800, check: FrameCheck::None, fec: FecKind::Ldpc },
        NavFrameSpec { signal: B2AD, preamble: &[1, 1, 1, 0, 0, 0, 1, 0, 0, 1], frame_bits: 1800, check: FrameCheck::None, fec: FecKind::Ldpc },
        NavFrameSpec { signal: B2BI, preamble: &[1, 1, 1, 0, 0, 0, 1, 0, 0, 1], frame_bits: 1000, check: FrameCheck::Crc24Q, fec: FecKind::None },
        NavFrameSpec { signal: I1SD, preamble: &[1, 0, 0, 0, 1, 0, 1, 1], frame_bits: 600, check: FrameCheck::None, fec: FecKind::Ldpc },
        NavFrameSpec { signal: I5S, preamble: &[1, 0, 0, 0, 1, 0, 1, 1], frame_bits: 600, check: FrameCheck::Crc24Q, fec: FecKind::None },
    ]
}

/// Data-bit count an LDPC family's frame encodes before parity, splitting
/// `frame_bits` so `ceil(data_len / LDPC_STRIDE)` parity bits fill the rest.
/// Duplicated in `gnss_sim::navgen`'s encoder for the same reason the CRC-24Q
/// polynomial is — generator and checker are two directions of one formula.
fn ldpc_split(frame_bits: usize) -> usize {
    frame_bits * LDPC_STRIDE / (LDPC_STRIDE + 1)
}

pub struct GenericFrameSync {
    spec: NavFrameSpec,
    symbols: Vec<u8>,
    sync: FrameSync,
    sample_count: u64,
}

impl GenericFrameSync {
    pub fn new(spec: NavFrameSpec) -> Self {
        Self {
            spec,
            symbols: Vec::new(),
            sync: FrameSync::NotSynced,
            sample_count: 0,
        }
    }

    pub fn sync(&self) -> FrameSync {
        self.sync
    }

    /// Raw channel-symbol count the window needs before one frame decodes —
    /// twice `frame_bits` for rate-1/2 convolutional coding, `frame_bits`
    /// itself (data plus its trailing parity/checksum) otherwise.
    fn channel_symbol_count(&self) -> usize {
        match self.spec.fec {
            FecKind::ConvolutionalK7R2 => self.spec.frame_bits * 2,
            FecKind::None | FecKind::Ldpc | FecKind::ReedSolomon255_223 => self.spec.frame_bits,
        }
    }

    pub fn feed(&mut self, bit: u8) -> Option<DecodedSubframe> {
        self.symbols.push(bit);
        self.sample_count += 1;
        let window = self.channel_symbol_count() + self.spec.preamble.len();
        if self.symbols.len() > window {
            self.symbols.remove(0);
        }
        if self.symbols.len() < window {
            return None;
        }

        let reversed = self.match_preamble()?;
        self.sync = FrameSync::Synced {
            lock_at: self.sample_count,
            reversed,
        };

        let channel_bits: Vec<u8> = self.symbols[self.spec.preamble.len()..]
            .iter()
            .map(|&b| if reversed { b ^ 1 } else { b })
            .collect();

        let frame = self.apply_fec(&channel_bits)?;

        if !self.check_ok(&frame) {
            return None;
        }

        Some(DecodedSubframe {
            tow_s: None,
            week: None,
            subframe_id: None,
            raw_bits: frame,
            reversed,
        })
    }

    /// Undoes this family's FEC layer (spec §4.4 "decode: de-interleave if
    /// applicable, FEC"), returning the data bits `check_ok` validates.
    /// `None` means the FEC layer itself rejected the frame.
    fn apply_fec(&self, channel_bits: &[u8]) -> Option<Vec<u8>> {
        match self.spec.fec {
            FecKind::None => Some(channel_bits.to_vec()),
            FecKind::ConvolutionalK7R2 => Some(ViterbiK7::default().decode(channel_bits)),
            FecKind::Ldpc => {
                let data_len = ldpc_split(self.spec.frame_bits);
                let (data, parity) = channel_bits.split_at(data_len);
                ldpc_check(data, parity).then(|| data.to_vec())
            }
            FecKind::ReedSolomon255_223 => {
                let data_len = self.spec.frame_bits.saturating_sub(8);
                let (data, checksum) = channel_bits.split_at(data_len);
                rs_check(data, checksum).then(|| data.to_vec())
            }
        }
    }

    fn match_preamble(&self) -> Option<bool> {
        let head = &self.symbols[0..self.spec.preamble.len()];
        if head == self.spec.preamble {
            return Some(false);
        }
        let flipped: Vec<u8> = head.iter().map(|&b| b ^ 1).collect();
        if flipped == self.spec.preamble {
            return Some(true);
        }
        None
    }

    fn check_ok(&self, frame: &[u8]) -> bool {
        match self.spec.check {
            FrameCheck::None => true,
            FrameCheck::Crc24Q => {
                if frame.len() < 24 {
                    return false;
                }
                let (data, crc_bits) = frame.split_at(frame.len() - 24);
                let expected = crc24q(data);
                let carried = crc_bits.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32);
                expected == carried
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_covers_every_non_bespoke_signal() {
        let specs = registry();
        assert!(specs.iter().any(|s| s.signal == Signal::E1B));
        assert!(!specs.iter().any(|s| s.signal == Signal::L1CA));
    }

    #[test]
    fn frame_without_preamble_never_syncs() {
        let specs = registry();
        let spec = specs.into_iter().find(|s| s.signal == Signal::E1B).unwrap();
        let mut sync = GenericFrameSync::new(spec);
        for _ in 0..300 {
            assert!(sync.feed(0).is_none());
        }
        assert!(!sync.sync().is_synced());
    }
}
