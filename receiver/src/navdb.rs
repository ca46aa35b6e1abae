//! Persistent navigation database (spec §6: "nav database: last-known
//! ephemeris set per satellite, persisted across runs so a cold start can
//! seed acquisition Doppler search from the previous almanac").

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;
use tracing::{info, warn};

use crate::ephemeris::GpsEphemeris;

const NAVDB_FILE: &str = "pocket_navdata.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct SerializableGpsEphemeris {
    prn: u16,
    week: u32,
    toc: u32,
    toe: u32,
    iode: u32,
    iodc: u32,
    sva: u32,
    svh: u32,
    tgd: f64,
    f0: f64,
    f1: f64,
    f2: f64,
    a: f64,
    ecc: f64,
    m0: f64,
    omg0: f64,
    omg: f64,
    omg_dot: f64,
    i0: f64,
    i_dot: f64,
    deln: f64,
    cuc: f64,
    cus: f64,
    crc: f64,
    crs: f64,
    cic: f64,
    cis: f64,
}

impl From<&GpsEphemeris> for SerializableGpsEphemeris {
    fn from(e: &GpsEphemeris) -> Self {
        Self {
            prn: e.prn,
            week: e.week,
            toc: e.toc,
            toe: e.toe,
            iode: e.iode,
            iodc: e.iodc,
            sva: e.sva,
            svh: e.svh,
            tgd: e.tgd,
            f0: e.f0,
            f1: e.f1,
            f2: e.f2,
            a: e.a,
            ecc: e.ecc,
            m0: e.m0,
            omg0: e.omg0,
            omg: e.omg,
            omg_dot: e.omg_dot,
            i0: e.i0,
            i_dot: e.i_dot,
            deln: e.deln,
            cuc: e.cuc,
            cus: e.cus,
            crc: e.crc,
            crs: e.crs,
            cic: e.cic,
            cis: e.cis,
        }
    }
}

impl From<SerializableGpsEphemeris> for GpsEphemeris {
    fn from(s: SerializableGpsEphemeris) -> Self {
        GpsEphemeris {
            prn: s.prn,
            week: s.week,
            toc: s.toc,
            toe: s.toe,
            iode: s.iode,
            iodc: s.iodc,
            sva: s.sva,
            svh: s.svh,
            tgd: s.tgd,
            f0: s.f0,
            f1: s.f1,
            f2: s.f2,
            a: s.a,
            ecc: s.ecc,
            m0: s.m0,
            omg0: s.omg0,
            omg: s.omg,
            omg_dot: s.omg_dot,
            i0: s.i0,
            i_dot: s.i_dot,
            deln: s.deln,
            cuc: s.cuc,
            cus: s.cus,
            crc: s.crc,
            crs: s.crs,
            cic: s.cic,
            cis: s.cis,
        }
    }
}

/// Loads the persisted GPS ephemeris table, keyed by PRN. Returns an empty
/// map if the file is missing or corrupt — a cold start just has to search
/// without an almanac-assisted Doppler estimate.
pub async fn load(dir: &Path) -> HashMap<u16, GpsEphemeris> {
    let path = dir.join(NAVDB_FILE);
    if !path.exists() {
        info!("no nav database at {}, starting empty", path.display());
        return HashMap::new();
    }
    match fs::read_to_string(&path).await {
        Ok(text) => match serde_json::from_str::<Vec<SerializableGpsEphemeris>>(&text) {
            Ok(entries) => {
                info!("loaded {} ephemeris entries from {}", entries.len(), path.display());
                entries.into_iter().map(|e| (e.prn, e.into())).collect()
            }
            Err(e) => {
                warn!("nav database {} malformed: {e}, starting empty", path.display());
                HashMap::new()
            }
        },
        Err(e) => {
            warn!("failed to read nav database {}: {e}", path.display());
            HashMap::new()
        }
    }
}

/// Persists the current ephemeris table, spec §6's "persisted across runs".
pub async fn save(dir: &Path, table: &HashMap<u16, GpsEphemeris>) -> anyhow::Result<()> {
    let entries: Vec<SerializableGpsEphemeris> = table.values().map(|e| e.into()).collect();
    let json = serde_json::to_string_pretty(&entries)?;
    fs::write(dir.join(NAVDB_FILE), json).await?;
    Ok(())
}
