//! Channel state machine (spec §4.5): IDLE -> SEARCH -> LOCK, each channel
//! owning one (signal, PRN) hypothesis's acquisition, tracking, and
//! nav-decoding state for its lifetime.
//!
//! Tick-based, the way the nearest on-domain reference receiver structures
//! its per-channel `process_samples` dispatch: one call per code period,
//! the channel's own state decides which stage runs.

use rustfft::num_complex::Complex64;

use gnss_types::{ChannelPhase, Observation, Signal};

use crate::acquisition::AcquisitionEngine;
use crate::codes;
use crate::config::ReceiverOptions;
use crate::correlator::{corr_std, mix_carrier};
use crate::ephemeris::GpsEphemeris;
use crate::nav::beidou_d1d2::BeidouD1D2Decoder;
use crate::nav::generic::{registry, GenericFrameSync};
use crate::nav::gps_lnav::GpsLnavDecoder;
use crate::nav::{DecodedSubframe, SymbolSyncTracker};
use crate::tracking::{SecondaryCodeSync, TrackingLoop};

const SPEED_OF_LIGHT_MPS: f64 = 299_792_458.0;
/// Code-phase fold period for the §4.7 "ambiguous TOW" pseudorange branch —
/// the 100ms ambiguity window a receiver without a decoded week/TOW still
/// resolves range within.
const AMBIGUITY_FOLD_S: f64 = 0.1;

/// The decoder a locked channel runs its bitstream through, one of the three
/// shapes spec §4.4's signal zoo needs (spec §9 REDESIGN FLAG: tagged enum
/// over ad hoc function-pointer dispatch).
enum NavDecoder {
    GpsLnav(GpsLnavDecoder, GpsEphemeris),
    BeidouD1D2(BeidouD1D2Decoder),
    Generic(GenericFrameSync),
}

impl NavDecoder {
    fn for_signal(signal: Signal, prn: u16) -> Self {
        match signal {
            Signal::L1CA => NavDecoder::GpsLnav(GpsLnavDecoder::new(), GpsEphemeris::new(prn)),
            Signal::B1I | Signal::B3I => NavDecoder::BeidouD1D2(BeidouD1D2Decoder::new()),
            other => {
                let spec = registry()
                    .into_iter()
                    .find(|s| s.signal == other)
                    .unwrap_or_else(|| registry().remove(0));
                NavDecoder::Generic(GenericFrameSync::new(spec))
            }
        }
    }

    fn feed(&mut self, bit: u8) -> Option<DecodedSubframe> {
        match self {
            NavDecoder::GpsLnav(d, eph) => {
                let sub = d.feed(bit)?;
                match sub.subframe_id {
                    Some(1) => eph.decode_subframe1(&sub.raw_bits),
                    Some(2) => eph.decode_subframe2(&sub.raw_bits),
                    Some(3) => eph.decode_subframe3(&sub.raw_bits),
                    _ => {}
                }
                Some(sub)
            }
            NavDecoder::BeidouD1D2(d) => d.feed(bit),
            NavDecoder::Generic(d) => d.feed(bit),
        }
    }

    /// Whether this decoder currently holds frame sync, spec §4.7's LLI
    /// bit-1 half-cycle-ambiguity input (half-cycle ambiguity is resolved
    /// once either frame sync or secondary-code sync pins the polarity).
    fn is_frame_synced(&self) -> bool {
        match self {
            NavDecoder::GpsLnav(d, _) => d.sync().is_synced(),
            NavDecoder::BeidouD1D2(d) => d.is_synced(),
            NavDecoder::Generic(d) => d.sync().is_synced(),
        }
    }

    /// GPS clock-bias correction term folded into the §4.7 pseudorange
    /// construction's `nav.coff` (`-f0`, the broadcast clock offset); other
    /// constellations' decoders here don't expose a Keplerian clock model,
    /// so they contribute none.
    fn clock_offset_s(&self) -> f64 {
        match self {
            NavDecoder::GpsLnav(_, eph) => -eph.f0,
            _ => 0.0,
        }
    }
}

/// Per-signal carrier-phase alignment constant, spec §4.7's pilot/data
/// quarter- and half-cycle offsets layered on top of `-adr + 0.5*rev +
/// 0.5*(sec_pol==1)`.
fn carrier_phase_alignment(signal: Signal) -> f64 {
    use Signal::*;
    match signal {
        L1CD | L1CP | B1CD | B2AD => 0.25,
        L5Q => -0.25,
        E1C => 0.5,
        _ => 0.0,
    }
}

/// One channel's worth of acquisition/tracking/nav state, spec §4.5. The
/// scheduler owns channels by index (spec §9 REDESIGN FLAG: handle+index
/// ownership, no cyclic references back to the scheduler or receiver).
pub struct Channel {
    pub signal: Signal,
    pub prn: u16,
    phase: ChannelPhase,
    fc_hz: f64,
    fs_hz: f64,
    fi_hz: f64,
    samples_per_code: usize,
    code_period_s: f64,
    code_upsampled: Vec<Complex64>,
    acquisition: Option<AcquisitionEngine>,
    tracking: Option<TrackingLoop>,
    prev_prompt: Complex64,
    symbol_sync: Option<SymbolSyncTracker>,
    sec_sync: Option<SecondaryCodeSync>,
    nav: Option<NavDecoder>,
    last_tow_s: Option<u32>,
    /// Polarity the most recently decoded subframe was recovered under —
    /// the §4.7 `rev` term, held across code periods between decode events.
    last_reversed: bool,
    /// Code periods elapsed since the last completed decode, approximating
    /// `TOW_rx - TOW_ch` in the §4.7 pseudorange construction.
    periods_since_decode: u64,
    /// Doppler at the moment lock was last dropped — a re-acquisition hint
    /// (spec §4.2 `fd_ext`, scenario S3) for the next search this channel runs.
    last_doppler_hz: Option<f64>,
    idle_code_periods: u64,
}

impl Channel {
    pub fn new(signal: Signal, prn: u16, fs_hz: f64, fi_hz: f64) -> Self {
        let descriptor = signal.descriptor();
        let code = codes::primary_code(signal, prn as usize);
        let samples_per_code = (descriptor.code_period_s * fs_hz).round() as usize;
        let code_upsampled = upsample_code(&code, samples_per_code);

        Self {
            signal,
            prn,
            phase: ChannelPhase::Idle,
            fc_hz: descriptor.fc_hz,
            fs_hz,
            fi_hz,
            samples_per_code,
            code_period_s: descriptor.code_period_s,
            code_upsampled,
            acquisition: None,
            tracking: None,
            prev_prompt: Complex64::default(),
            symbol_sync: None,
            sec_sync: None,
            nav: None,
            last_tow_s: None,
            last_reversed: false,
            periods_since_decode: 0,
            last_doppler_hz: None,
            idle_code_periods: 0,
        }
    }

    pub fn phase(&self) -> ChannelPhase {
        self.phase
    }

    pub fn samples_per_code(&self) -> usize {
        self.samples_per_code
    }

    pub fn fc_hz(&self) -> f64 {
        self.fc_hz
    }

    /// Doppler this channel is currently tracking at, or `None` if not
    /// locked — a cross-signal Doppler assist source for sibling channels on
    /// the same PRN (spec §4.2 `fd_ext`, scenario S4).
    pub fn locked_doppler_hz(&self) -> Option<f64> {
        self.tracking.as_ref().map(|t| t.doppler_hz)
    }

    /// Doppler hint left behind by this channel's own last lock, spec §4.2
    /// `fd_ext` re-acquisition hint (scenario S3).
    pub fn last_doppler_hz(&self) -> Option<f64> {
        self.last_doppler_hz
    }

    /// Transitions out of IDLE into SEARCH, (re)initializing the acquisition
    /// engine. Called by the scheduler when it grants this channel a search
    /// slot (spec §4.6). `fd_ext`, when given, restricts acquisition to a
    /// single Doppler bin.
    pub fn start_search(&mut self, opts: &ReceiverOptions, fd_ext: Option<f64>) {
        self.acquisition = Some(AcquisitionEngine::new(
            opts,
            self.fi_hz,
            self.fs_hz,
            &self.code_upsampled,
            self.samples_per_code,
            fd_ext,
        ));
        self.phase = ChannelPhase::Search;
    }

    fn start_lock(&mut self, doppler_hz: f64, code_phase_samples: usize, cn0_db_hz: f64) {
        let code_off_sec = code_phase_samples as f64 / self.samples_per_code as f64 * self.code_period_s;
        let descriptor = self.signal.descriptor();
        let mut tracking = TrackingLoop::new(
            doppler_hz,
            code_off_sec,
            self.code_period_s,
            self.fi_hz,
            self.fc_hz,
            self.samples_per_code,
            descriptor.code_len_chips,
        );
        tracking.cn0_db_hz = cn0_db_hz;
        self.tracking = Some(tracking);
        self.symbol_sync = Some(SymbolSyncTracker::new(20.max(1)));
        self.sec_sync = descriptor
            .secondary_len
            .map(|len| SecondaryCodeSync::new(codes::secondary_code(self.signal, self.prn as usize, len)));
        self.nav = Some(NavDecoder::for_signal(self.signal, self.prn));
        self.phase = ChannelPhase::Lock;
        self.idle_code_periods = 0;
        self.periods_since_decode = 0;
    }

    fn drop_lock(&mut self) {
        self.last_doppler_hz = self.tracking.as_ref().map(|t| t.doppler_hz);
        self.tracking = None;
        self.symbol_sync = None;
        self.sec_sync = None;
        self.nav = None;
        self.phase = ChannelPhase::Idle;
    }

    /// Resets this channel to IDLE from any phase, discarding in-progress
    /// acquisition or tracking state without a doppler hint — the scheduler
    /// calls this when it finds this channel's backing samples evicted from
    /// the ring before it could consume them (spec §4.6 buffer overrun).
    pub fn force_idle(&mut self) {
        self.acquisition = None;
        self.tracking = None;
        self.symbol_sync = None;
        self.sec_sync = None;
        self.nav = None;
        self.phase = ChannelPhase::Idle;
    }

    /// Processes one code period's worth of raw (un-mixed) samples. Returns
    /// an observation whenever the channel is locked; `None` while
    /// idle/searching.
    pub fn process(&mut self, raw_samples: &[Complex64], opts: &ReceiverOptions) -> Option<Observation> {
        match self.phase {
            ChannelPhase::Idle => {
                self.idle_code_periods += 1;
                None
            }
            ChannelPhase::Search => {
                let engine = self.acquisition.as_mut()?;
                if let Some(result) = engine.feed(raw_samples, opts.thres_cn0_l) {
                    self.start_lock(result.doppler_hz, result.code_phase_samples, result.cn0_db_hz);
                }
                None
            }
            ChannelPhase::Lock => self.process_locked(raw_samples, opts),
        }
    }

    fn process_locked(&mut self, raw_samples: &[Complex64], opts: &ReceiverOptions) -> Option<Observation> {
        let tracking = self.tracking.as_mut()?;
        let code_idx = tracking.next_code_phase_index();

        let mut mixed = raw_samples.to_vec();
        mix_carrier(&mut mixed, self.fi_hz + tracking.doppler_hz, tracking.carrier_phase_cycles(), self.fs_hz);

        let sp_corr_samples = (opts.sp_corr * self.samples_per_code as f64 / self.signal.descriptor().code_len_chips as f64).max(1.0) as usize;
        let rotated_code = rotate_code(&self.code_upsampled, code_idx);
        let corr = corr_std(&mixed, &rotated_code, sp_corr_samples);

        tracking.update(&corr, self.prev_prompt, opts);
        self.prev_prompt = corr.prompt;

        if tracking.cn0_db_hz < opts.thres_cn0_u {
            self.drop_lock();
            return None;
        }

        let mut ip = if corr.prompt.norm() > 0.0 {
            corr.prompt.re / corr.prompt.norm()
        } else {
            0.0
        };
        if let Some(sec) = self.sec_sync.as_mut() {
            ip = sec.feed(ip);
        }

        let mut decoded_subframe = None;
        if let Some(sync) = self.symbol_sync.as_mut() {
            if let Some(bit) = sync.feed(ip, self.idle_code_periods) {
                self.idle_code_periods += 1;
                if let Some(nav) = self.nav.as_mut() {
                    decoded_subframe = nav.feed(bit);
                }
            }
        }

        self.periods_since_decode += 1;
        if let Some(sub) = &decoded_subframe {
            if let Some(tow) = sub.tow_s {
                self.last_tow_s = Some(tow);
            }
            self.last_reversed = sub.reversed;
            self.periods_since_decode = 0;
        }

        // spec §4.7 pseudorange construction: tau = (TOW_rx - TOW_ch) + coff
        // + nav.coff, folded into the ambiguous-TOW branch's [0.05, 0.15)
        // window until a known week/TOW lets `tau` be formed directly.
        let pseudorange_m = self.last_tow_s.map(|_| {
            let nav_coff = self.nav.as_ref().map(|n| n.clock_offset_s()).unwrap_or(0.0);
            let tau_raw = self.periods_since_decode as f64 * self.code_period_s + tracking.code_off_sec + nav_coff;
            let mut tau = tau_raw.rem_euclid(AMBIGUITY_FOLD_S);
            if tau < AMBIGUITY_FOLD_S / 2.0 {
                tau += AMBIGUITY_FOLD_S;
            }
            SPEED_OF_LIGHT_MPS * tau
        });

        let sec_term = match &self.sec_sync {
            Some(sec) if sec.is_synced() && sec.polarity() == 1 => 0.5,
            _ => 0.0,
        };
        let carrier_phase_cyc = -tracking.adr_cycles()
            + 0.5 * (self.last_reversed as u8 as f64)
            + sec_term
            + carrier_phase_alignment(self.signal);

        let frame_synced = self.nav.as_ref().map(NavDecoder::is_frame_synced).unwrap_or(false);
        let sec_synced = self.sec_sync.as_ref().map(SecondaryCodeSync::is_synced).unwrap_or(false);
        let lli_unlocked = tracking.elapsed_s <= 2.0 || tracking.phase_error_cycles().abs() > 0.2;
        let lli_half_cycle = !frame_synced && !sec_synced;
        let lli = (lli_unlocked as u8) | ((lli_half_cycle as u8) << 1);

        Some(Observation {
            signal: self.signal,
            prn: self.prn,
            rinex_code: rinex_code_for(self.signal),
            pseudorange_m,
            carrier_phase_cyc: Some(carrier_phase_cyc),
            doppler_hz: Some(tracking.doppler_hz),
            cn0_db_hz: tracking.cn0_db_hz,
            lli,
        })
    }
}

fn upsample_code(code: &[i8], samples_per_code: usize) -> Vec<Complex64> {
    let n = code.len();
    (0..samples_per_code)
        .map(|i| {
            let chip = i * n / samples_per_code;
            Complex64::new(code[chip.min(n - 1)] as f64, 0.0)
        })
        .collect()
}

fn rotate_code(code: &[Complex64], shift: usize) -> Vec<Complex64> {
    let n = code.len();
    (0..n).map(|i| code[(i + shift) % n]).collect()
}

fn rinex_code_for(signal: Signal) -> String {
    match signal {
        Signal::L1CA => "1C",
        Signal::L2CM => "2L",
        Signal::L5I => "5I",
        Signal::L5Q => "5Q",
        Signal::E1B => "1B",
        Signal::E5AI => "5I",
        Signal::B1I => "2I",
        _ => "XX",
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_channel_starts_idle() {
        let ch = Channel::new(Signal::L1CA, 1, 4_000_000.0, 0.0);
        assert_eq!(ch.phase(), ChannelPhase::Idle);
    }

    #[test]
    fn start_search_transitions_to_search_phase() {
        let mut ch = Channel::new(Signal::L1CA, 1, 4_000_000.0, 0.0);
        let opts = ReceiverOptions::default();
        ch.start_search(&opts, None);
        assert_eq!(ch.phase(), ChannelPhase::Search);
    }

    #[test]
    fn idle_process_returns_no_observation() {
        let mut ch = Channel::new(Signal::L1CA, 1, 4_000_000.0, 0.0);
        let opts = ReceiverOptions::default();
        let samples = vec![Complex64::default(); ch.samples_per_code];
        assert!(ch.process(&samples, &opts).is_none());
    }

    #[test]
    fn force_idle_resets_a_searching_channel() {
        let mut ch = Channel::new(Signal::L1CA, 1, 4_000_000.0, 0.0);
        let opts = ReceiverOptions::default();
        ch.start_search(&opts, None);
        assert_eq!(ch.phase(), ChannelPhase::Search);
        ch.force_idle();
        assert_eq!(ch.phase(), ChannelPhase::Idle);
        // Back to idle means the next process() call does nothing but tick
        // the idle counter, same as a freshly constructed channel.
        let samples = vec![Complex64::default(); ch.samples_per_code];
        assert!(ch.process(&samples, &opts).is_none());
    }

    #[test]
    fn carrier_phase_alignment_has_defined_constants_for_pilot_signals() {
        assert_eq!(carrier_phase_alignment(Signal::L1CD), 0.25);
        assert_eq!(carrier_phase_alignment(Signal::L5Q), -0.25);
        assert_eq!(carrier_phase_alignment(Signal::E1C), 0.5);
        assert_eq!(carrier_phase_alignment(Signal::L1CA), 0.0);
    }
}
