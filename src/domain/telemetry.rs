// Telemetry data domain models
use crate::error::AnalysisError;
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

const MS_PER_MINUTE: f64 = 60_000.0;

/// A single scalar observation as delivered by the station backend.
///
/// Decoding from JSON goes through the feed reader, which drops samples with
/// unparseable timestamps instead of rejecting the whole series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub timestamp: i64,
    pub value: Option<f64>,
}

impl Sample {
    pub fn new(timestamp: i64, value: Option<f64>) -> Self {
        Self { timestamp, value }
    }

    /// The value, if present and finite.
    pub fn finite_value(&self) -> Option<f64> {
        self.value.filter(|v| v.is_finite())
    }
}

/// Normalized chart point: `x` is epoch milliseconds, `y` the value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: i64,
    pub y: f64,
}

impl Point {
    pub fn new(x: i64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One reference row with the source series interpolated onto its timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CombinedSample {
    pub timestamp: i64,
    pub value_a: Option<f64>,
    pub value_b: Option<f64>,
}

/// Drop samples without a usable value, keeping the original order.
pub fn points_from_samples(samples: &[Sample]) -> Vec<Point> {
    samples
        .iter()
        .filter_map(|s| s.finite_value().map(|v| Point::new(s.timestamp, v)))
        .collect()
}

/// Borrow the points as-is when already ascending by `x`, otherwise return a
/// stably sorted copy.
pub(crate) fn sorted_by_x(points: &[Point]) -> Cow<'_, [Point]> {
    if points.is_sorted_by_key(|p| p.x) {
        Cow::Borrowed(points)
    } else {
        let mut owned = points.to_vec();
        owned.sort_by_key(|p| p.x);
        Cow::Owned(owned)
    }
}

/// Convert a duration in (possibly fractional) minutes to milliseconds.
pub(crate) fn minutes_to_ms(minutes: f64) -> f64 {
    minutes * MS_PER_MINUTE
}

/// Parse an RFC 3339 timestamp, a naive ISO-8601 timestamp (taken as UTC) or
/// a decimal epoch-millisecond string.
pub fn parse_timestamp(raw: &str) -> Result<i64, AnalysisError> {
    let raw = raw.trim();
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return Ok(time.timestamp_millis());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc().timestamp_millis());
        }
    }
    raw.parse::<i64>()
        .map_err(|_| AnalysisError::InvalidTimestamp(raw.to_string()))
}
