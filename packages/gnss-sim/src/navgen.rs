//! Inverse nav-message encoders: FEC-encode → insert preamble → (scramble where
//! relevant) so the receiver's decoders can be round-tripped against known
//! source bits (spec §8 testable property 4). Mirrors the algorithms in
//! `receiver::fec`/`receiver::nav` exactly — same masks, same polynomial —
//! since that's what must be undone.

use gnss_types::Signal;

/// Same six ICD-200 parity masks `receiver::fec::gps_lnav_parity_ok` checks
/// against, duplicated here (the generator and the checker are two
/// directions of the same fixed algorithm, not a shared dependency).
const MASK: [u32; 6] = [
    0x2EC7CD2, 0x1763E69, 0x2BB1F34, 0x15D8F9A, 0x1AEC7CD, 0x22DEA27,
];

const GPS_LNAV_PREAMBLE: [u8; 8] = [1, 0, 0, 0, 1, 0, 1, 1];

fn xor_parity(mut v: u32) -> u8 {
    let mut p = 0u8;
    while v != 0 {
        p ^= (v & 1) as u8;
        v >>= 1;
    }
    p
}

/// Encodes one 24-bit data word into a 30-bit (24 data + 6 parity) GPS LNAV
/// word, carrying the rolling D29*/D30* register across words the same way
/// `gps_lnav_parity_ok` reads it back. `target24` is what the *decoder* will
/// report after stripping parity — the D29*/D30* data invert is applied and
/// un-applied transparently.
fn encode_word_targeting(target24: &[u8; 24], reg: &mut u32) -> [u8; 30] {
    let invert = (*reg & 1) as u8;
    let raw24: Vec<u8> = target24.iter().map(|&b| b ^ invert).collect();

    let mut d = *reg;
    for &b in &raw24 {
        d = (d << 1) | b as u32;
    }
    let word_invert = ((d >> 24) & 1) != 0;
    if word_invert {
        d ^= 0x00FF_FFFF;
    }

    let mut parity = [0u8; 6];
    for (j, p) in parity.iter_mut().enumerate() {
        *p = xor_parity(d & MASK[j]);
    }
    let p_val = parity.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32);
    *reg = (d << 6) | p_val;

    let transmitted: Vec<u8> = if word_invert {
        raw24.iter().map(|&b| b ^ 1).collect()
    } else {
        raw24
    };

    let mut word = [0u8; 30];
    word[0..24].copy_from_slice(&transmitted);
    word[24..30].copy_from_slice(&parity);
    word
}

/// Builds one parity-valid 300-bit GPS/QZSS L1 C/A LNAV subframe whose
/// decoded `raw_bits` (240 bits, parity stripped) equal `payload[0..232]`
/// inserted after the mandatory 8-bit TLM preamble. Returns
/// `(transmitted_300_bits, expected_raw_240_bits)`.
pub fn gps_lnav_subframe(payload: &[u8; 232], reg: &mut u32) -> (Vec<u8>, Vec<u8>) {
    let mut word1 = [0u8; 24];
    word1[0..8].copy_from_slice(&GPS_LNAV_PREAMBLE);
    word1[8..24].copy_from_slice(&payload[0..16]);

    let mut words24 = vec![word1];
    for chunk in payload[16..232].chunks(24) {
        let mut w = [0u8; 24];
        w.copy_from_slice(chunk);
        words24.push(w);
    }

    let mut transmitted = Vec::with_capacity(300);
    let mut expected = Vec::with_capacity(240);
    for w in &words24 {
        let word30 = encode_word_targeting(w, reg);
        transmitted.extend_from_slice(&word30);
        expected.extend_from_slice(&word30[0..24]);
    }
    (transmitted, expected)
}

/// Encodes a generic (preamble + fixed-length + optional CRC-24Q) frame, the
/// inverse of `receiver::nav::generic::GenericFrameSync`. `payload` fills the
/// frame body before the trailing CRC (if any); the preamble is prepended
/// unmodified (no per-word data invert in this family).
pub fn generic_frame(preamble: &[u8], frame_bits: usize, payload: &[u8], with_crc24q: bool) -> Vec<u8> {
    let mut frame = Vec::with_capacity(frame_bits);
    if with_crc24q {
        frame.extend_from_slice(&payload[..frame_bits - 24]);
        let crc = crc24q(&frame);
        for i in (0..24).rev() {
            frame.push(((crc >> i) & 1) as u8);
        }
    } else {
        frame.extend_from_slice(&payload[..frame_bits]);
    }

    let mut out = Vec::with_capacity(preamble.len() + frame_bits);
    out.extend_from_slice(preamble);
    out.extend_from_slice(&frame);
    out
}

/// K=7 R=1/2 convolutional encoder, `G1=0x4F, G2=0x6D` — the inverse of
/// `receiver::fec::ViterbiK7`'s trellis, duplicated here for the same reason
/// [`MASK`] is.
pub fn conv_encode_k7_r2(bits: &[u8]) -> Vec<u8> {
    const G1: u8 = 0x4F;
    const G2: u8 = 0x6D;
    let mut state: u8 = 0;
    let mut out = Vec::with_capacity(bits.len() * 2);
    for &b in bits {
        let reg = (state << 1) | b;
        out.push(xor_parity(reg as u32 & G1 as u32));
        out.push(xor_parity(reg as u32 & G2 as u32));
        state = reg & 0x3F;
    }
    out
}

/// Appends LDPC parity bits the same way `receiver::fec::ldpc_parity_bits`
/// computes them, splitting at the same `data_len` `ldpc_split` derives.
pub fn ldpc_encode(data: &[u8]) -> Vec<u8> {
    const STRIDE: usize = 32;
    let parity: Vec<u8> = data.chunks(STRIDE).map(|c| c.iter().fold(0u8, |acc, &b| acc ^ b)).collect();
    let mut out = data.to_vec();
    out.extend(parity);
    out
}

/// Appends the byte-wise XOR checksum `receiver::fec::rs_checksum` computes.
pub fn rs_encode(data: &[u8]) -> Vec<u8> {
    let mut csum = 0u8;
    for byte in data.chunks(8) {
        let mut b = 0u8;
        for &bit in byte {
            b = (b << 1) | bit;
        }
        csum ^= b;
    }
    let mut out = data.to_vec();
    out.extend((0..8).rev().map(|i| (csum >> i) & 1));
    out
}

/// Same CRC-24Q the receiver's checker uses (duplicated for the same reason
/// as [`MASK`] — generator and checker are the two directions of one fixed
/// polynomial, not a shared runtime dependency).
fn crc24q(bits: &[u8]) -> u32 {
    const POLY: u32 = 0x0186_4CFB;
    let mut regv: u32 = 0;
    for &bit in bits {
        let msb = (regv >> 23) & 1;
        regv = ((regv << 1) | bit as u32) & 0x00FF_FFFF;
        if msb == 1 {
            regv ^= POLY & 0x00FF_FFFF;
        }
    }
    regv
}

/// Deterministic pseudo-random 0/1 bit stream, seeded per-call, used to fill
/// payload bits that don't need specific values for a frame round-trip test.
pub fn filler_bits(seed: u64, len: usize) -> Vec<u8> {
    let mut state = seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) | 1;
    (0..len)
        .map(|_| {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            (state & 1) as u8
        })
        .collect()
}

/// Looks up a [`Signal`]'s generic registry entry by matching the field
/// layout `receiver::nav::generic::registry()` defines, so scenario code can
/// build a matching frame without depending on the receiver crate directly
/// (kept duplicated in spirit, not type — [`gnss_types::Signal`] is the only
/// shared type between the two crates, per this workspace's layering).
pub struct GenericSignalFraming {
    pub preamble: &'static [u8],
    pub frame_bits: usize,
    pub with_crc24q: bool,
}

pub fn generic_framing_for(signal: Signal) -> Option<GenericSignalFraming> {
    use Signal::*;
    Some(match signal {
        E1B => GenericSignalFraming { preamble: &[0, 1, 0, 1, 1, 0, 0, 0, 0, 0], frame_bits: 240, with_crc24q: true },
        E5AI => GenericSignalFraming { preamble: &[1, 0, 0, 1, 0, 1, 1, 0, 0, 0], frame_bits: 492, with_crc24q: true },
        L2CM => GenericSignalFraming { preamble: &[1, 0, 0, 0, 1, 0, 1, 1], frame_bits: 300, with_crc24q: true },
        L6D => GenericSignalFraming { preamble: &[0, 1, 0, 1, 0, 1, 1, 0], frame_bits: 2000, with_crc24q: false },
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gps_lnav_subframe_preamble_lands_in_first_eight_bits() {
        let payload = [0u8; 232];
        let mut reg = 0u32;
        let (transmitted, expected) = gps_lnav_subframe(&payload, &mut reg);
        assert_eq!(transmitted.len(), 300);
        assert_eq!(expected.len(), 240);
        assert_eq!(&expected[0..8], &GPS_LNAV_PREAMBLE);
    }

    #[test]
    fn generic_frame_carries_valid_crc24q() {
        let payload = filler_bits(7, 216);
        let frame = generic_frame(&[0, 1, 0, 1, 1, 0, 0, 0, 0, 0], 240, &payload, true);
        assert_eq!(frame.len(), 250);
        let (data, crc_bits) = frame[10..].split_at(216);
        let expected = crc24q(data);
        let carried = crc_bits.iter().fold(0u32, |acc, &b| (acc << 1) | b as u32);
        assert_eq!(expected, carried);
    }

    #[test]
    fn filler_bits_is_deterministic() {
        assert_eq!(filler_bits(1, 32), filler_bits(1, 32));
    }
}
