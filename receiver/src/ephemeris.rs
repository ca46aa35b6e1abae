//! Satellite ephemeris/clock-correction storage, spec §3's per-satellite nav
//! database entries ("eph: broadcast orbital elements + clock terms").
//!
//! GPS (and QZSS-shared) L1 C/A LNAV subframes 1-3 are decoded into the full
//! Keplerian element set, the worked example spec §4.4 describes end to end.
//! Every other constellation's ephemeris retains its decoded frame body as
//! `raw_bits` without a full field-by-field Keplerian decode — those ICDs
//! are outside this receiver's worked scope (see [`crate::fec`] module docs
//! for the same boundary applied to FEC).

use gnss_types::Signal;

const P2_5: f64 = 1.0 / 32.0;
const P2_19: f64 = 1.0 / 524_288.0;
const P2_29: f64 = 1.0 / 536_870_912.0;
const P2_31: f64 = 1.0 / 2_147_483_648.0;
const P2_33: f64 = 1.0 / 8_589_934_592.0;
const P2_43: f64 = 1.0 / 8_796_093_022_208.0;
const P2_55: f64 = 1.0 / 36_028_797_018_963_968.0;
const SC2RAD: f64 = std::f64::consts::PI;

/// Full GPS LNAV Keplerian ephemeris, spec §3's orbital-element set.
#[derive(Debug, Clone, Default)]
pub struct GpsEphemeris {
    pub prn: u16,
    pub week: u32,
    pub toc: u32,
    pub toe: u32,
    pub iode: u32,
    pub iodc: u32,
    pub sva: u32,
    pub svh: u32,
    pub tgd: f64,
    pub f0: f64,
    pub f1: f64,
    pub f2: f64,
    pub a: f64,
    pub ecc: f64,
    pub m0: f64,
    pub omg0: f64,
    pub omg: f64,
    pub omg_dot: f64,
    pub i0: f64,
    pub i_dot: f64,
    pub deln: f64,
    pub cuc: f64,
    pub cus: f64,
    pub crc: f64,
    pub crs: f64,
    pub cic: f64,
    pub cis: f64,
}

impl GpsEphemeris {
    pub fn new(prn: u16) -> Self {
        Self {
            prn,
            ..Default::default()
        }
    }

    /// Subframe 1: clock correction terms + IODC/health.
    pub fn decode_subframe1(&mut self, buf: &[u8]) {
        self.week = getbitu(buf, 60, 10) + 2048;
        self.sva = getbitu(buf, 72, 4);
        self.svh = getbitu(buf, 76, 6);
        self.iodc = getbitu2(buf, 82, 2, 210, 8);
        self.tgd = getbits(buf, 196, 8) as f64 * P2_31;
        self.toc = getbitu(buf, 218, 16) * 16;
        self.f2 = getbits(buf, 240, 8) as f64 * P2_55;
        self.f1 = getbits(buf, 248, 16) as f64 * P2_43;
        self.f0 = getbits(buf, 270, 22) as f64 * P2_31;
    }

    /// Subframe 2: semi-major axis, eccentricity, mean anomaly, IODE, toe.
    pub fn decode_subframe2(&mut self, buf: &[u8]) {
        self.iode = getbitu(buf, 60, 8);
        self.crs = getbits(buf, 68, 16) as f64 * P2_5;
        self.deln = getbits(buf, 90, 16) as f64 * P2_43 * SC2RAD;
        self.m0 = getbits2(buf, 106, 8, 120, 24) as f64 * P2_31 * SC2RAD;
        self.cuc = getbits(buf, 150, 16) as f64 * P2_29;
        self.ecc = getbitu2(buf, 166, 8, 180, 24) as f64 * P2_33;
        self.cus = getbits(buf, 210, 16) as f64 * P2_29;
        let sqrt_a = getbitu2(buf, 226, 8, 240, 24) as f64 * P2_19;
        self.a = sqrt_a * sqrt_a;
        self.toe = getbitu(buf, 270, 16) * 16;
    }

    /// Subframe 3: inclination, ascending node, argument of perigee.
    pub fn decode_subframe3(&mut self, buf: &[u8]) {
        self.cic = getbits(buf, 60, 16) as f64 * P2_29;
        self.omg0 = getbits2(buf, 76, 8, 90, 24) as f64 * P2_31 * SC2RAD;
        self.cis = getbits(buf, 120, 16) as f64 * P2_29;
        self.i0 = getbits2(buf, 136, 8, 150, 24) as f64 * P2_31 * SC2RAD;
        self.crc = getbits(buf, 180, 16) as f64 * P2_5;
        self.omg = getbits2(buf, 196, 8, 210, 24) as f64 * P2_31 * SC2RAD;
        self.omg_dot = getbits(buf, 240, 24) as f64 * P2_43 * SC2RAD;
        self.i_dot = getbits(buf, 278, 14) as f64 * P2_43 * SC2RAD;
    }
}

/// Other constellations' ephemeris: kept as the decoded, CRC/BCH-validated
/// frame body without further ICD-specific field extraction.
#[derive(Debug, Clone)]
pub struct RawEphemeris {
    pub signal: Signal,
    pub prn: u16,
    pub subframe_id: Option<u32>,
    pub raw_bits: Vec<u8>,
}

fn getbitu(buf: &[u8], pos: u32, len: u32) -> u32 {
    let mut v: u32 = 0;
    for i in pos..pos + len {
        v = (v << 1) | *buf.get(i as usize).unwrap_or(&0) as u32;
    }
    v
}

fn getbits(buf: &[u8], pos: u32, len: u32) -> i32 {
    let v = getbitu(buf, pos, len) as i64;
    let sign_bit = 1i64 << (len - 1);
    if v & sign_bit != 0 {
        (v - (sign_bit << 1)) as i32
    } else {
        v as i32
    }
}

fn getbitu2(buf: &[u8], pos1: u32, len1: u32, pos2: u32, len2: u32) -> u32 {
    (getbitu(buf, pos1, len1) << len2) | getbitu(buf, pos2, len2)
}

fn getbits2(buf: &[u8], pos1: u32, len1: u32, pos2: u32, len2: u32) -> i32 {
    let v = (getbitu(buf, pos1, len1) as i64) << len2 | getbitu(buf, pos2, len2) as i64;
    let total = len1 + len2;
    let sign_bit = 1i64 << (total - 1);
    if v & sign_bit != 0 {
        (v - (sign_bit << 1)) as i32
    } else {
        v as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subframe1_extracts_week_and_health() {
        let mut buf = vec![0u8; 300];
        // week field: bits 60..70, set to 100 (binary 0001100100)
        for (i, bit) in [0, 0, 0, 1, 1, 0, 0, 1, 0, 0].into_iter().enumerate() {
            buf[60 + i] = bit;
        }
        let mut eph = GpsEphemeris::new(1);
        eph.decode_subframe1(&buf);
        assert_eq!(eph.week, 2048 + 100);
    }

    #[test]
    fn getbits_handles_negative_values() {
        let buf = [1u8, 1, 1, 1]; // 4-bit two's complement: 1111 = -1
        assert_eq!(getbits(&buf, 0, 4), -1);
    }
}
