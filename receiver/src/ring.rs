//! `SampleRing`: opaque IF-sample ring buffer.
//!
//! spec §9 REDESIGN FLAG: "the packed-sample ring-buffer arithmetic (format
//! unpacking, wraparound indexing) should live behind one opaque type so
//! channel code never touches raw bytes." Every RF front-end format (spec §6)
//! unpacks to `Complex64` baseband samples here once; downstream code
//! (scheduler, channel, correlator) only ever sees `&[Complex64]` windows.

use rustfft::num_complex::Complex64;

use gnss_types::RfFormat;

/// Fixed-capacity circular buffer of unpacked baseband samples for one RF
/// channel. The producer task (spec §4.6) pushes raw bytes in; consumer
/// (channel) tasks read fixed-length windows out by absolute sample index.
pub struct SampleRing {
    fmt: RfFormat,
    rf_index: usize,
    capacity: usize,
    buf: Vec<Complex64>,
    /// Absolute index (since stream start) of `buf[0]`.
    base_index: u64,
    write_pos: usize,
    filled: usize,
}

impl SampleRing {
    pub fn new(fmt: RfFormat, rf_index: usize, capacity: usize) -> Self {
        Self {
            fmt,
            rf_index,
            capacity,
            buf: vec![Complex64::default(); capacity],
            base_index: 0,
            write_pos: 0,
            filled: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Absolute sample index of the oldest sample still retained.
    pub fn start_index(&self) -> u64 {
        self.base_index
    }

    /// Absolute sample index one past the newest sample written.
    pub fn end_index(&self) -> u64 {
        self.base_index + self.filled as u64
    }

    /// Unpack one raw frame (spec §6 RF formats) and push its sample for this
    /// ring's `rf_index` channel, evicting the oldest sample if full.
    pub fn push_raw_frame(&mut self, frame: &[u8]) {
        let sample = unpack_one(self.fmt, self.rf_index, frame);
        self.buf[self.write_pos] = sample;
        self.write_pos = (self.write_pos + 1) % self.capacity;
        if self.filled < self.capacity {
            self.filled += 1;
        } else {
            self.base_index += 1;
        }
    }

    /// Whether `from` names a sample this ring has already evicted, as
    /// opposed to one that simply hasn't arrived yet — the distinction
    /// `channel_worker_loop` needs to tell buffer overrun (spec §4.6) apart
    /// from ordinary waiting.
    pub fn is_evicted(&self, from: u64) -> bool {
        from < self.base_index
    }

    /// Copy out `len` samples starting at absolute index `from`, in order.
    /// Returns `None` if any part of the requested window has already been
    /// evicted or has not arrived yet.
    pub fn window(&self, from: u64, len: usize) -> Option<Vec<Complex64>> {
        if from < self.base_index || from + len as u64 > self.end_index() {
            return None;
        }
        let offset = (from - self.base_index) as usize;
        let mut out = Vec::with_capacity(len);
        for i in 0..len {
            let idx = (self.write_pos + self.capacity - self.filled + offset + i) % self.capacity;
            out.push(self.buf[idx]);
        }
        Some(out)
    }
}

/// Decode one front-end sample for `rf_index` out of one raw frame, per the
/// format's packing convention (spec §6). `Int8`/`Int8x2` are real-valued and
/// single-channel; the packed multi-channel formats carry sign-magnitude
/// pairs per RF channel.
fn unpack_one(fmt: RfFormat, rf_index: usize, frame: &[u8]) -> Complex64 {
    match fmt {
        RfFormat::Int8 => Complex64::new(frame[0] as i8 as f64, 0.0),
        RfFormat::Int8x2 => Complex64::new(frame[0] as i8 as f64, -(frame[1] as i8 as f64)),
        RfFormat::Raw8 => {
            let byte = frame[0];
            let shift = rf_index * 2;
            let bits = (byte >> shift) & 0b11;
            decode_2bit(bits)
        }
        RfFormat::Raw16 => {
            let word = u16::from_le_bytes([frame[0], frame[1]]);
            let shift = rf_index * 2;
            let bits = ((word >> shift) & 0b11) as u8;
            decode_2bit(bits)
        }
        RfFormat::Raw16I => {
            let word = u16::from_le_bytes([frame[0], frame[1]]);
            let shift = (3 - rf_index) * 2;
            let bits = ((word >> shift) & 0b11) as u8;
            decode_2bit(bits)
        }
        RfFormat::Raw32 => {
            let word = u32::from_le_bytes([frame[0], frame[1], frame[2], frame[3]]);
            let shift = rf_index * 2;
            let bits = ((word >> shift) & 0b11) as u8;
            decode_2bit(bits)
        }
    }
}

/// Sign-magnitude 2-bit sample decode: bit1 = sign, bit0 = magnitude boost
/// (front-end front-end ADC convention shared by the Raw8/16/32 formats).
fn decode_2bit(bits: u8) -> Complex64 {
    let sign = if bits & 0b10 != 0 { -1.0 } else { 1.0 };
    let mag = if bits & 0b01 != 0 { 3.0 } else { 1.0 };
    Complex64::new(sign * mag, 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ring_evicts_oldest_once_full() {
        let mut ring = SampleRing::new(RfFormat::Int8, 0, 4);
        for v in 0..6u8 {
            ring.push_raw_frame(&[v]);
        }
        assert_eq!(ring.start_index(), 2);
        assert_eq!(ring.end_index(), 6);
        let w = ring.window(2, 4).unwrap();
        assert_eq!(w.iter().map(|c| c.re as u8).collect::<Vec<_>>(), vec![2, 3, 4, 5]);
    }

    #[test]
    fn window_out_of_range_is_none() {
        let mut ring = SampleRing::new(RfFormat::Int8, 0, 4);
        ring.push_raw_frame(&[1]);
        assert!(ring.window(0, 4).is_none());
    }

    #[test]
    fn int8x2_negates_q() {
        let mut ring = SampleRing::new(RfFormat::Int8x2, 0, 2);
        ring.push_raw_frame(&[10u8, 20u8]);
        let w = ring.window(0, 1).unwrap();
        assert_eq!(w[0], Complex64::new(10.0, -20.0));
    }
}
