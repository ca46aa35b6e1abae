//! Structured log stream (spec §6: "a structured log stream tagged
//! `$CH`/`$OBS`/`$POS`/`$SAT`/`$EPH`/`$LOG` recording channel state changes,
//! per-epoch observations, fixes, satellite visibility, decoded ephemeris,
//! and free-form diagnostics, one line per event").
//!
//! Grounded on the teacher's append-only audit logger shape, minus its
//! SHA-256 hash chaining — spec.md has no tamper-evidence requirement for
//! this stream, just a stable line format downstream tools can grep/tail.

use std::sync::Arc;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    Channel,
    Observation,
    Position,
    Satellite,
    Ephemeris,
    Log,
}

impl LogTag {
    fn as_str(self) -> &'static str {
        match self {
            LogTag::Channel => "$CH",
            LogTag::Observation => "$OBS",
            LogTag::Position => "$POS",
            LogTag::Satellite => "$SAT",
            LogTag::Ephemeris => "$EPH",
            LogTag::Log => "$LOG",
        }
    }
}

/// Append-only, one-line-per-event sink. Cheap to clone (shares the
/// underlying file handle via a mutex), so every worker task gets its own
/// handle without opening the file repeatedly.
#[derive(Clone)]
pub struct LogStream {
    file: Arc<Mutex<tokio::fs::File>>,
}

impl LogStream {
    pub async fn open(path: &std::path::Path) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path).await?;
        Ok(Self {
            file: Arc::new(Mutex::new(file)),
        })
    }

    pub async fn emit(&self, tag: LogTag, fields: &[(&str, &str)]) {
        let mut line = String::from(tag.as_str());
        for (k, v) in fields {
            line.push(',');
            line.push_str(k);
            line.push('=');
            line.push_str(v);
        }
        line.push('\n');

        let mut file = self.file.lock().await;
        if let Err(e) = file.write_all(line.as_bytes()).await {
            warn!("log stream write failed: {e}");
        }
    }

    pub async fn channel_state(&self, signal: &str, prn: u16, phase: &str) {
        self.emit(
            LogTag::Channel,
            &[("sig", signal), ("prn", &prn.to_string()), ("phase", phase)],
        )
        .await;
    }

    pub async fn observation(&self, prn: u16, cn0_db_hz: f64) {
        self.emit(
            LogTag::Observation,
            &[("prn", &prn.to_string()), ("cn0", &format!("{cn0_db_hz:.1}"))],
        )
        .await;
    }

    pub async fn position(&self, lat_deg: f64, lon_deg: f64, height_m: f64) {
        self.emit(
            LogTag::Position,
            &[
                ("lat", &format!("{lat_deg:.7}")),
                ("lon", &format!("{lon_deg:.7}")),
                ("h", &format!("{height_m:.2}")),
            ],
        )
        .await;
    }
}
