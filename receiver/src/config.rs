//! Receiver configuration: CLI entry point (clap, spec §6 `-RFCH`/file args)
//! plus the `key=value` option parser the spec calls out ("tracking/acquisition
//! parameters settable at runtime via a `setopt(key, value)` interface").

use std::path::PathBuf;

use clap::Parser;
use gnss_types::Signal;

use crate::error::{ReceiverError, Result};

/// `pocket_rcv` — software receiver core: IF samples in, observables and a
/// PVT fix out.
#[derive(Debug, Parser)]
#[command(name = "pocket_rcv", version, about)]
pub struct Cli {
    /// Path to the IF sample file (raw binary, paired with a `.tag` sidecar).
    pub if_file: PathBuf,

    /// Path to a TOML config file overriding [`ReceiverOptions`] defaults.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output directory for observation/NMEA/log streams.
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Signal IDs to search, e.g. `-RFCH L1CA,L2CM`. Defaults to L1CA only.
    #[arg(long, value_delimiter = ',')]
    pub rfch: Vec<String>,
}

/// spec §6 "Config options": tracking-loop bandwidths, acquisition dwell
/// time, elevation mask, and the epoch/lag-epoch PVT scheduling pair. Built
/// once at startup (part of the `Runtime` context, spec §9 REDESIGN FLAG 2)
/// and handed out by reference; never a global.
#[derive(Debug, Clone)]
pub struct ReceiverOptions {
    /// PVT output epoch interval (s).
    pub epoch_s: f64,
    /// How long after epoch boundary to wait for late channels before
    /// closing the epoch (s).
    pub lag_epoch_s: f64,
    /// Elevation mask (deg) below which an observation is dropped from PVT.
    pub el_mask_deg: f64,
    /// Early/late correlator spacing, in chips.
    pub sp_corr: f64,
    /// Acquisition non-coherent dwell time (s).
    pub t_acq_s: f64,
    /// DLL non-coherent integration time (s).
    pub t_dll_s: f64,
    /// DLL loop bandwidth (Hz).
    pub b_dll_hz: f64,
    /// PLL loop bandwidth (Hz).
    pub b_pll_hz: f64,
    /// FLL wide-pullin loop bandwidth (Hz).
    pub b_fll_w_hz: f64,
    /// FLL narrow (steady-state) loop bandwidth (Hz).
    pub b_fll_n_hz: f64,
    /// Maximum Doppler search half-width (Hz).
    pub max_dop_hz: f64,
    /// C/N0 threshold above which acquisition is declared locked (dB-Hz),
    /// spec §4.2 `thres_cn0_L`.
    pub thres_cn0_l: f64,
    /// C/N0 threshold below which tracking is declared lost (dB-Hz), spec
    /// §4.3 `thres_cn0_U`.
    pub thres_cn0_u: f64,
    /// Enable bump-jump half-chip DLL discriminator.
    pub bump_jump: bool,
    /// Signals to search, spec §6 `-RFCH`.
    pub signals: Vec<Signal>,
}

impl Default for ReceiverOptions {
    fn default() -> Self {
        Self {
            epoch_s: 1.0,
            lag_epoch_s: 0.1,
            el_mask_deg: 5.0,
            sp_corr: 0.5,
            t_acq_s: 0.01,
            t_dll_s: 0.01,
            b_dll_hz: 0.5,
            b_pll_hz: 10.0,
            b_fll_w_hz: 10.0,
            b_fll_n_hz: 2.0,
            max_dop_hz: 8_000.0,
            thres_cn0_l: 35.0,
            thres_cn0_u: 32.0,
            bump_jump: false,
            signals: vec![Signal::L1CA],
        }
    }
}

impl ReceiverOptions {
    /// Apply one `key=value` override, spec §6's runtime `setopt` interface.
    pub fn setopt(&mut self, key: &str, value: &str) -> Result<()> {
        let f = |v: &str| -> Result<f64> {
            v.parse::<f64>().map_err(|_| ReceiverError::BadOptionValue {
                key: key.to_string(),
                value: v.to_string(),
            })
        };
        match key {
            "epoch" => self.epoch_s = f(value)?,
            "lag_epoch" => self.lag_epoch_s = f(value)?,
            "el_mask" => self.el_mask_deg = f(value)?,
            "sp_corr" => self.sp_corr = f(value)?,
            "t_acq" => self.t_acq_s = f(value)?,
            "t_dll" => self.t_dll_s = f(value)?,
            "b_dll" => self.b_dll_hz = f(value)?,
            "b_pll" => self.b_pll_hz = f(value)?,
            "b_fll_w" => self.b_fll_w_hz = f(value)?,
            "b_fll_n" => self.b_fll_n_hz = f(value)?,
            "max_dop" => self.max_dop_hz = f(value)?,
            "thres_cn0_l" => self.thres_cn0_l = f(value)?,
            "thres_cn0_u" => self.thres_cn0_u = f(value)?,
            "bump_jump" => self.bump_jump = value == "1" || value.eq_ignore_ascii_case("true"),
            "rfch" => {
                self.signals = value
                    .split(',')
                    .map(|s| {
                        Signal::parse(s.trim())
                            .ok_or_else(|| ReceiverError::UnknownSignal(s.to_string()))
                    })
                    .collect::<Result<Vec<_>>>()?;
            }
            other => return Err(ReceiverError::UnknownOption(other.to_string())),
        }
        Ok(())
    }

    /// Load overrides from a TOML table of `key = value` pairs (the `-config`
    /// file spec §6 allows alongside the CLI `-RFCH` flag).
    pub fn load_toml(&mut self, text: &str) -> Result<()> {
        let table: toml::Table = text
            .parse()
            .map_err(|e| ReceiverError::BadOptionValue {
                key: "config".into(),
                value: e.to_string(),
            })?;
        for (key, value) in table {
            let s = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            self.setopt(&key, &s)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setopt_overrides_known_keys() {
        let mut opts = ReceiverOptions::default();
        opts.setopt("b_pll", "15.0").unwrap();
        assert_eq!(opts.b_pll_hz, 15.0);
    }

    #[test]
    fn setopt_rejects_unknown_key() {
        let mut opts = ReceiverOptions::default();
        assert!(opts.setopt("bogus", "1").is_err());
    }

    #[test]
    fn setopt_parses_rfch_list() {
        let mut opts = ReceiverOptions::default();
        opts.setopt("rfch", "L1CA,L2CM").unwrap();
        assert_eq!(opts.signals, vec![Signal::L1CA, Signal::L2CM]);
    }
}
