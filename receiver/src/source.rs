//! IF sample file source: reads the raw binary stream plus its `.tag`
//! sidecar (spec §6), and paces delivery against wall-clock or as fast as
//! possible depending on `tscale`.

use std::path::{Path, PathBuf};

use gnss_types::{IfTag, RfFormat};
use tokio::fs;
use tokio::io::{AsyncReadExt, BufReader};
use tracing::info;

use crate::error::{ReceiverError, Result};

/// One IF file plus its parsed tag sidecar, spec §6: "IF sample file (raw
/// binary) + optional `.tag` sidecar (JSON) recording {program, start-time
/// (UTC), fmt, fs, fo[8], IQ[8], bits[8]}".
pub struct IfSource {
    reader: BufReader<fs::File>,
    pub tag: IfTag,
    bytes_per_frame: usize,
}

impl IfSource {
    pub async fn open(path: &Path) -> Result<Self> {
        let tag_path = tag_path_for(path);
        let tag = load_tag(&tag_path).await?;
        let file = fs::File::open(path)
            .await
            .map_err(|e| ReceiverError::Source {
                path: path.display().to_string(),
                source: e,
            })?;
        let bytes_per_frame = tag.fmt.bytes_per_sample();
        info!(
            "opened IF source {} (fmt={:?} fs={:.0}Hz)",
            path.display(),
            tag.fmt,
            tag.fs_hz
        );
        Ok(Self {
            reader: BufReader::new(file),
            tag,
            bytes_per_frame,
        })
    }

    /// Read the next raw sample frame (all RF channels interleaved in one
    /// frame per the format's packing convention). `Ok(None)` at EOF.
    pub async fn next_frame(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = vec![0u8; self.bytes_per_frame];
        let mut read = 0;
        while read < buf.len() {
            let n = self.reader.read(&mut buf[read..]).await?;
            if n == 0 {
                return Ok(if read == 0 { None } else { None });
            }
            read += n;
        }
        Ok(Some(buf))
    }

    pub fn sample_rate_hz(&self) -> f64 {
        self.tag.fs_hz
    }
}

fn tag_path_for(path: &Path) -> PathBuf {
    let mut p = path.to_path_buf();
    let ext = p.extension().and_then(|e| e.to_str()).unwrap_or("");
    p.set_extension(format!("{ext}.tag"));
    p
}

async fn load_tag(tag_path: &Path) -> Result<IfTag> {
    if !tag_path.exists() {
        return Err(ReceiverError::BadTag {
            path: tag_path.display().to_string(),
            reason: "missing .tag sidecar".into(),
        });
    }
    let text = fs::read_to_string(tag_path).await?;
    parse_tag(&text).map_err(|reason| ReceiverError::BadTag {
        path: tag_path.display().to_string(),
        reason,
    })
}

/// Parses the tag sidecar. Accepts either JSON (as spec §6 names) or the
/// plain `key=value` line format PocketSDR-family tools also emit, since the
/// spec leaves the wire encoding of the sidecar unspecified.
fn parse_tag(text: &str) -> std::result::Result<IfTag, String> {
    let trimmed = text.trim_start();
    if trimmed.starts_with('{') {
        return serde_json::from_str(text).map_err(|e| e.to_string());
    }

    let mut program = String::new();
    let mut start_time_utc = String::new();
    let mut fmt = None;
    let mut fs_hz = None;
    let mut fo_hz = Vec::new();
    let mut iq = Vec::new();
    let mut bits = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let (key, value) = (key.trim(), value.trim());
        match key {
            "PROG" => program = value.to_string(),
            "TIME" => start_time_utc = value.to_string(),
            "FMT" => fmt = RfFormat::parse(value),
            "FS" => fs_hz = value.parse::<f64>().ok(),
            "FO" => fo_hz = value.split(',').filter_map(|v| v.trim().parse().ok()).collect(),
            "IQ" => iq = value.split(',').map(|v| v.trim() == "2" || v.trim() == "1").collect(),
            "BITS" => bits = value.split(',').filter_map(|v| v.trim().parse().ok()).collect(),
            _ => {}
        }
    }

    Ok(IfTag {
        program,
        start_time_utc,
        fmt: fmt.ok_or_else(|| "missing or unrecognized FMT field".to_string())?,
        fs_hz: fs_hz.ok_or_else(|| "missing FS field".to_string())?,
        fo_hz,
        iq,
        bits,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_kv_tag_format() {
        let text = "PROG=pocket_dump\nTIME=2024-01-01T00:00:00Z\nFMT=INT8\nFS=12000000\nFO=0\nIQ=1\nBITS=8\n";
        let tag = parse_tag(text).unwrap();
        assert_eq!(tag.fmt, RfFormat::Int8);
        assert_eq!(tag.fs_hz, 12_000_000.0);
        assert_eq!(tag.fo_hz, vec![0.0]);
    }

    #[test]
    fn parses_json_tag_format() {
        let text = r#"{"program":"pocket_dump","start_time_utc":"2024-01-01T00:00:00Z","fmt":"Int8","fs_hz":12000000.0,"fo_hz":[0.0],"iq":[true],"bits":[8]}"#;
        let tag = parse_tag(text).unwrap();
        assert_eq!(tag.fmt, RfFormat::Int8);
    }

    #[test]
    fn rejects_tag_without_fmt() {
        let text = "PROG=x\nFS=1.0\n";
        assert!(parse_tag(text).is_err());
    }
}
