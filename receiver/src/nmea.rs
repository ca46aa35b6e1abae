//! NMEA 0183 sentence encoder (spec §6: "NMEA output: RMC, GGA, GSA, GSV at
//! the epoch rate"). In scope, unlike RTCM3 ([`crate::rtcm3`]) which spec §1
//! explicitly defers to an external encoder.

use gnss_types::ObservationEpoch;

use crate::pvt::PvtSolution;

/// Appends the NMEA checksum (`*HH`) to a sentence body (without leading
/// `$` or trailing `*HH`).
fn with_checksum(body: &str) -> String {
    let checksum = body.bytes().fold(0u8, |acc, b| acc ^ b);
    format!("${body}*{checksum:02X}\r\n")
}

fn lat_to_nmea(lat_deg: f64) -> (String, char) {
    let hemi = if lat_deg >= 0.0 { 'N' } else { 'S' };
    let abs = lat_deg.abs();
    let deg = abs.floor() as u32;
    let min = (abs - deg as f64) * 60.0;
    (format!("{deg:02}{min:07.4}"), hemi)
}

fn lon_to_nmea(lon_deg: f64) -> (String, char) {
    let hemi = if lon_deg >= 0.0 { 'E' } else { 'W' };
    let abs = lon_deg.abs();
    let deg = abs.floor() as u32;
    let min = (abs - deg as f64) * 60.0;
    (format!("{deg:03}{min:07.4}"), hemi)
}

/// `$GPGGA`: fix data (time, position, fix quality, satellite count, HDOP,
/// altitude).
pub fn gga(sol: &PvtSolution, hdop: f64) -> String {
    let (lat, lat_hemi) = lat_to_nmea(sol.lat_deg);
    let (lon, lon_hemi) = lon_to_nmea(sol.lon_deg);
    let time = gpst_to_hhmmss(sol.t_gpst_s);
    let body = format!(
        "GPGGA,{time},{lat},{lat_hemi},{lon},{lon_hemi},1,{:02},{hdop:.1},{:.1},M,0.0,M,,",
        sol.n_sats_used, sol.height_m
    );
    with_checksum(&body)
}

/// `$GPRMC`: recommended minimum position/velocity/time.
pub fn rmc(sol: &PvtSolution) -> String {
    let (lat, lat_hemi) = lat_to_nmea(sol.lat_deg);
    let (lon, lon_hemi) = lon_to_nmea(sol.lon_deg);
    let time = gpst_to_hhmmss(sol.t_gpst_s);
    let speed_kn = (sol.vel_enu_mps[0].powi(2) + sol.vel_enu_mps[1].powi(2)).sqrt() * 1.9438_45;
    let heading = sol.vel_enu_mps[1].atan2(sol.vel_enu_mps[0]).to_degrees().rem_euclid(360.0);
    let body = format!(
        "GPRMC,{time},A,{lat},{lat_hemi},{lon},{lon_hemi},{speed_kn:.1},{heading:.1},010100,,,A"
    );
    with_checksum(&body)
}

/// `$GPGSA`: DOP and active satellites.
pub fn gsa(prns: &[u16], pdop: f64, hdop: f64, vdop: f64) -> String {
    let mut fields = String::new();
    for i in 0..12 {
        fields.push(',');
        if let Some(prn) = prns.get(i) {
            fields.push_str(&format!("{prn:02}"));
        }
    }
    let body = format!("GPGSA,A,3{fields},{pdop:.1},{hdop:.1},{vdop:.1}");
    with_checksum(&body)
}

/// `$GPGSV`: satellites in view, one sentence per up-to-4 satellites. Spec
/// §6 groups this per epoch across the observation list.
pub fn gsv(epoch: &ObservationEpoch) -> Vec<String> {
    let total = epoch.observations.len();
    let n_sentences = total.div_ceil(4).max(1);
    (0..n_sentences)
        .map(|i| {
            let chunk = &epoch.observations[i * 4..(i * 4 + 4).min(total)];
            let mut body = format!("GPGSV,{n_sentences},{},{total:02}", i + 1);
            for obs in chunk {
                body.push_str(&format!(",{:02},,,{:02}", obs.prn, obs.cn0_db_hz.round().max(0.0) as u32));
            }
            with_checksum(&body)
        })
        .collect()
}

fn gpst_to_hhmmss(t_gpst_s: f64) -> String {
    let sec_of_day = t_gpst_s.rem_euclid(86_400.0);
    let h = (sec_of_day / 3600.0) as u32;
    let m = ((sec_of_day % 3600.0) / 60.0) as u32;
    let s = sec_of_day % 60.0;
    format!("{h:02}{m:02}{s:06.3}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_solution() -> PvtSolution {
        PvtSolution {
            t_gpst_s: 3661.5,
            lat_deg: 35.681236,
            lon_deg: 139.767125,
            height_m: 40.0,
            vel_enu_mps: [1.0, 0.0, 0.0],
            clock_bias_s: 0.0,
            n_sats_used: 8,
        }
    }

    #[test]
    fn gga_has_valid_checksum_delimiters() {
        let s = gga(&sample_solution(), 1.2);
        assert!(s.starts_with("$GPGGA"));
        assert!(s.trim_end().contains('*'));
    }

    #[test]
    fn rmc_includes_speed_and_heading() {
        let s = rmc(&sample_solution());
        assert!(s.starts_with("$GPRMC"));
    }

    #[test]
    fn gsv_splits_into_groups_of_four() {
        let epoch = ObservationEpoch {
            t_ep_gpst_s: 0.0,
            observations: (0..6)
                .map(|i| gnss_types::Observation {
                    signal: gnss_types::Signal::L1CA,
                    prn: i,
                    rinex_code: "1C".into(),
                    pseudorange_m: None,
                    carrier_phase_cyc: None,
                    doppler_hz: None,
                    cn0_db_hz: 40.0,
                    lli: 0,
                })
                .collect(),
        };
        let sentences = gsv(&epoch);
        assert_eq!(sentences.len(), 2);
    }
}
