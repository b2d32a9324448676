// Station feed decoding - JSON documents served by the station backend
use crate::domain::telemetry::{parse_timestamp, Sample};
use crate::error::AnalysisResult;
use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct RawSample {
    timestamp: Value,
    #[serde(default)]
    value: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct RawWindFeed {
    #[serde(default)]
    winds: Vec<RawSample>,
    #[serde(default)]
    dirs: Vec<RawSample>,
}

/// Decoded `data/wind.json`: average speed and direction series.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WindFeed {
    pub winds: Vec<Sample>,
    pub dirs: Vec<Sample>,
    /// Samples dropped because their timestamp could not be parsed.
    pub dropped: usize,
}

impl WindFeed {
    pub fn from_reader<R: Read>(reader: R) -> AnalysisResult<Self> {
        let raw: RawWindFeed = serde_json::from_reader(reader)?;
        Ok(Self::from_raw(raw))
    }

    pub fn from_json_str(json: &str) -> AnalysisResult<Self> {
        let raw: RawWindFeed = serde_json::from_str(json)?;
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawWindFeed) -> Self {
        let (winds, dropped_winds) = decode_samples(raw.winds);
        let (dirs, dropped_dirs) = decode_samples(raw.dirs);
        tracing::debug!(
            "Decoded wind feed: {} speed samples, {} direction samples",
            winds.len(),
            dirs.len()
        );
        Self {
            winds,
            dirs,
            dropped: dropped_winds + dropped_dirs,
        }
    }
}

/// Decode a plain JSON array of `{timestamp, value}` objects (status and
/// temperature feeds).
pub fn samples_from_json_str(json: &str) -> AnalysisResult<(Vec<Sample>, usize)> {
    let raw: Vec<RawSample> = serde_json::from_str(json)?;
    Ok(decode_samples(raw))
}

fn decode_samples(raw: Vec<RawSample>) -> (Vec<Sample>, usize) {
    let mut dropped = 0;
    let samples = raw
        .into_iter()
        .filter_map(|r| match timestamp_millis(&r.timestamp) {
            Some(timestamp) => Some(Sample::new(timestamp, r.value.as_ref().and_then(Value::as_f64))),
            None => {
                tracing::warn!("Dropping sample with unparseable timestamp: {}", r.timestamp);
                dropped += 1;
                None
            }
        })
        .collect();
    (samples, dropped)
}

/// Epoch milliseconds of a JSON timestamp, limited to the range chrono can
/// represent as a calendar date.
fn timestamp_millis(value: &Value) -> Option<i64> {
    let millis = match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
        Value::String(s) => parse_timestamp(s).ok(),
        _ => None,
    }?;
    DateTime::from_timestamp_millis(millis).map(|_| millis)
}
