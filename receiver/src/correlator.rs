//! Correlator kernel: carrier wipe-off and PRN code correlation (spec §4.1).
//!
//! `mix_carrier` removes the residual IF+Doppler carrier; `corr_std` computes
//! prompt/early/late/neutral correlations by direct dot product for the
//! tracking loop (small window, every code period); `corr_fft` computes the
//! full circular correlation via FFT for acquisition search (spec §4.2),
//! where every code-phase hypothesis is wanted at once.

use rustfft::num_complex::Complex64;
use rustfft::FftPlanner;

const TWO_PI: f64 = std::f64::consts::TAU;

/// Strips the residual carrier (IF + Doppler estimate) from `samples` in
/// place, advancing from carrier phase `phi0` (cycles) at sample rate `fs`.
pub fn mix_carrier(samples: &mut [Complex64], freq_hz: f64, phi0: f64, fs: f64) {
    for (n, s) in samples.iter_mut().enumerate() {
        let phase = TWO_PI * (freq_hz * n as f64 / fs + phi0);
        let rot = Complex64::new(phase.cos(), -phase.sin());
        *s *= rot;
    }
}

/// Prompt/early/late/neutral correlation against a locally-replicated code
/// sequence at a known code-phase offset, direct-dot-product form used once
/// per code period inside the tracking loop (spec §4.3).
pub struct CorrOutputs {
    pub prompt: Complex64,
    pub early: Complex64,
    pub late: Complex64,
    pub neutral: Complex64,
}

/// `signal`: carrier-wiped baseband samples, one code period long.
/// `code`: the locally-replicated ±1 chip sequence, sample-upsampled to the
/// same length as `signal`. `sp_corr_samples`: early/late correlator spacing
/// in samples.
pub fn corr_std(signal: &[Complex64], code: &[Complex64], sp_corr_samples: usize) -> CorrOutputs {
    assert_eq!(signal.len(), code.len());
    let n = signal.len();
    let pos = sp_corr_samples.max(1);

    let mut prompt = Complex64::default();
    for j in 0..n {
        prompt += signal[j] * code[j];
    }
    prompt /= n as f64;

    let mut early = Complex64::default();
    for j in 0..n.saturating_sub(pos) {
        early += signal[j] * code[pos + j];
    }
    early /= (n - pos).max(1) as f64;

    let mut late = Complex64::default();
    for j in 0..n.saturating_sub(pos) {
        late += signal[pos + j] * code[j];
    }
    late /= (n - pos).max(1) as f64;

    let neutral_pos = (n / 16).max(1);
    let mut neutral = Complex64::default();
    for j in 0..n.saturating_sub(neutral_pos) {
        neutral += signal[j] * code[neutral_pos + j];
    }
    neutral /= (n - neutral_pos).max(1) as f64;

    CorrOutputs {
        prompt,
        early,
        late,
        neutral,
    }
}

/// Full circular correlation of `signal` against `code_fft` (the code's
/// precomputed FFT, conjugated) via FFT-based fast correlation — every
/// code-phase hypothesis in one transform pair, the form the acquisition
/// search sweeps across Doppler bins (spec §4.2).
pub fn corr_fft(planner: &mut FftPlanner<f64>, signal: &[Complex64], code_fft: &[Complex64]) -> Vec<Complex64> {
    let n = signal.len();
    assert_eq!(code_fft.len(), n);

    let fwd = planner.plan_fft_forward(n);
    let inv = planner.plan_fft_inverse(n);

    let mut buf = signal.to_vec();
    fwd.process(&mut buf);

    for (s, c) in buf.iter_mut().zip(code_fft.iter()) {
        *s *= c.conj();
    }

    inv.process(&mut buf);
    let scale = 1.0 / n as f64;
    for v in buf.iter_mut() {
        *v *= scale;
    }
    buf
}

/// Precomputes the forward FFT of a ±1 code sequence (zero-padded/truncated
/// to `n` samples), for reuse across every Doppler-bin hypothesis in one
/// acquisition dwell (spec §9 REDESIGN: cached per-code FFT in the `Runtime`
/// context rather than recomputed per bin).
pub fn code_fft(planner: &mut FftPlanner<f64>, code: &[Complex64], n: usize) -> Vec<Complex64> {
    let mut buf = vec![Complex64::default(); n];
    for (i, v) in code.iter().take(n).enumerate() {
        buf[i] = *v;
    }
    let fwd = planner.plan_fft_forward(n);
    fwd.process(&mut buf);
    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mix_carrier_zero_freq_is_identity() {
        let mut s = vec![Complex64::new(1.0, 0.0); 4];
        let orig = s.clone();
        mix_carrier(&mut s, 0.0, 0.0, 1000.0);
        for (a, b) in s.iter().zip(orig.iter()) {
            assert!((a - b).norm() < 1e-9);
        }
    }

    #[test]
    fn corr_std_perfect_alignment_peaks_prompt() {
        let code: Vec<Complex64> = (0..16)
            .map(|i| Complex64::new(if i % 2 == 0 { 1.0 } else { -1.0 }, 0.0))
            .collect();
        let out = corr_std(&code, &code, 2);
        assert!(out.prompt.norm() > out.early.norm());
        assert!(out.prompt.norm() > out.late.norm());
    }

    #[test]
    fn fft_correlation_peak_at_zero_shift() {
        let n = 64;
        let mut planner = FftPlanner::new();
        let code: Vec<Complex64> = (0..n)
            .map(|i| Complex64::new(if (i * 7) % 11 < 5 { 1.0 } else { -1.0 }, 0.0))
            .collect();
        let cfft = code_fft(&mut planner, &code, n);
        let corr = corr_fft(&mut planner, &code, &cfft);
        let peak = corr
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.norm_sqr().partial_cmp(&b.1.norm_sqr()).unwrap())
            .unwrap();
        assert_eq!(peak.0, 0);
    }
}
