// Time bucket aggregation - Groups irregular samples into fixed windows
use crate::application::interpolation::interpolate;
use crate::domain::telemetry::{minutes_to_ms, sorted_by_x, Point};
use crate::error::{AnalysisError, AnalysisResult};
use chrono::{DateTime, FixedOffset, TimeZone};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

/// Statistic used to reduce a bucket to one value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BucketMode {
    First,
    Last,
    Min,
    Max,
    Median,
    Mode,
    #[default]
    Mean,
}

impl FromStr for BucketMode {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(BucketMode::First),
            "last" => Ok(BucketMode::Last),
            "min" => Ok(BucketMode::Min),
            "max" => Ok(BucketMode::Max),
            "median" => Ok(BucketMode::Median),
            "mode" => Ok(BucketMode::Mode),
            "mean" => Ok(BucketMode::Mean),
            _ => Err(AnalysisError::UnknownMode(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketOptions {
    pub minutes: f64,
    pub mode: BucketMode,
    /// Offset from UTC of the calendar day buckets align to.
    pub utc_offset_minutes: i32,
}

impl Default for BucketOptions {
    fn default() -> Self {
        Self {
            minutes: 5.0,
            mode: BucketMode::Mean,
            utc_offset_minutes: 0,
        }
    }
}

impl BucketOptions {
    pub fn new(minutes: f64, mode: BucketMode) -> Self {
        Self {
            minutes,
            mode,
            ..Self::default()
        }
    }
}

struct Bucket {
    ys: Vec<f64>,
    first: Point,
    last: Point,
    min: Point,
    max: Point,
}

impl Bucket {
    fn new(p: Point) -> Self {
        Self {
            ys: vec![p.y],
            first: p,
            last: p,
            min: p,
            max: p,
        }
    }

    fn push(&mut self, p: Point) {
        self.ys.push(p.y);
        if p.x < self.first.x {
            self.first = p;
        }
        if p.x > self.last.x {
            self.last = p;
        }
        if p.y < self.min.y {
            self.min = p;
        }
        if p.y > self.max.y {
            self.max = p;
        }
    }

    fn reduce(&self, mode: BucketMode) -> f64 {
        match mode {
            BucketMode::First => self.first.y,
            BucketMode::Last => self.last.y,
            BucketMode::Min => self.min.y,
            BucketMode::Max => self.max.y,
            BucketMode::Median => median(&self.ys),
            BucketMode::Mode => mode_value(&self.ys),
            BucketMode::Mean => self.ys.iter().sum::<f64>() / self.ys.len() as f64,
        }
    }
}

/// Bucket points into fixed windows aligned to the start of the first
/// point's calendar day and reduce each window with `options.mode`.
///
/// Output points sit at the centre of their window, ascending by `x`.
/// Empty windows produce no point. Non-finite values are ignored.
pub fn bucket_aggregate(points: &[Point], options: &BucketOptions) -> AnalysisResult<Vec<Point>> {
    let buckets = collect_buckets(points, options)?;

    let mut centres: Vec<i64> = buckets.keys().copied().collect();
    centres.sort_unstable();

    Ok(centres
        .into_iter()
        .map(|centre| Point::new(centre, buckets[&centre].reduce(options.mode)))
        .collect())
}

/// Number of contributing samples per bucket centre, ascending by centre.
pub fn bucket_counts(points: &[Point], options: &BucketOptions) -> AnalysisResult<Vec<(i64, usize)>> {
    let buckets = collect_buckets(points, options)?;
    let mut counts: Vec<(i64, usize)> = buckets
        .into_iter()
        .map(|(centre, bucket)| (centre, bucket.ys.len()))
        .collect();
    counts.sort_unstable_by_key(|(centre, _)| *centre);
    Ok(counts)
}

/// Resample onto a regular grid of `minutes` spacing by linear interpolation.
///
/// The grid runs from `floor(first / W) * W` to `ceil(last / W) * W`. Grid
/// points outside the data hold the nearest end value.
pub fn resample_linear(points: &[Point], minutes: f64) -> AnalysisResult<Vec<Point>> {
    let width = window_ms(minutes)?;
    let finite: Vec<Point> = points.iter().copied().filter(|p| p.y.is_finite()).collect();
    let points = sorted_by_x(&finite);
    let (Some(head), Some(tail)) = (points.first(), points.last()) else {
        return Ok(Vec::new());
    };

    let x0 = head
        .x
        .div_euclid(width)
        .checked_mul(width)
        .ok_or_else(|| AnalysisError::InvalidTimestamp(head.x.to_string()))?;
    let x1 = div_ceil(tail.x, width)
        .checked_mul(width)
        .ok_or_else(|| AnalysisError::InvalidTimestamp(tail.x.to_string()))?;
    let steps = x1
        .checked_sub(x0)
        .map(|span| span / width)
        .ok_or_else(|| AnalysisError::InvalidTimestamp(tail.x.to_string()))?;

    let mut out = Vec::with_capacity(usize::try_from(steps).map_or(0, |n| n.min(MAX_PREALLOCATED_POINTS)));
    let mut i = 0;
    let mut x = x0;
    for _ in 0..=steps {
        while i + 1 < points.len() && points[i + 1].x < x {
            i += 1;
        }
        let y = if x <= points[i].x {
            points[i].y
        } else if i + 1 >= points.len() {
            tail.y
        } else {
            let (p0, p1) = (points[i], points[i + 1]);
            interpolate(p0.x as f64, p0.y, p1.x as f64, p1.y, x as f64)
        };
        out.push(Point::new(x, y));
        x = x.saturating_add(width);
    }
    Ok(out)
}

const MAX_PREALLOCATED_POINTS: usize = 1 << 16;

fn collect_buckets(points: &[Point], options: &BucketOptions) -> AnalysisResult<HashMap<i64, Bucket>> {
    let width = window_ms(options.minutes)?;
    let mut buckets: HashMap<i64, Bucket> = HashMap::new();

    let mut finite = points.iter().copied().filter(|p| p.y.is_finite()).peekable();
    let Some(first) = finite.peek() else {
        return Ok(buckets);
    };
    let day_start = day_start_ms(first.x, options.utc_offset_minutes)?;

    for p in finite {
        let centre = bucket_centre(p.x, day_start, width)?;
        buckets
            .entry(centre)
            .and_modify(|bucket| bucket.push(p))
            .or_insert_with(|| Bucket::new(p));
    }

    tracing::trace!("Collected {} buckets of {} ms", buckets.len(), width);
    Ok(buckets)
}

/// Centre of the bucket holding `x`. Overflow is reported as an unusable
/// timestamp.
fn bucket_centre(x: i64, day_start: i64, width: i64) -> AnalysisResult<i64> {
    x.checked_sub(day_start)
        .map(|offset| offset.div_euclid(width))
        .and_then(|index| index.checked_mul(width))
        .and_then(|start| start.checked_add(day_start))
        .and_then(|start| start.checked_add(width / 2))
        .ok_or_else(|| AnalysisError::InvalidTimestamp(x.to_string()))
}

fn window_ms(minutes: f64) -> AnalysisResult<i64> {
    if !minutes.is_finite() || minutes <= 0.0 {
        return Err(AnalysisError::InvalidWindow { minutes });
    }
    Ok((minutes_to_ms(minutes).round() as i64).max(1))
}

/// Epoch milliseconds of local midnight for the day containing `x`.
fn day_start_ms(x: i64, utc_offset_minutes: i32) -> AnalysisResult<i64> {
    let offset = utc_offset_minutes
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .ok_or_else(|| {
            AnalysisError::InvalidConfig(format!("UTC offset out of range: {} minutes", utc_offset_minutes))
        })?;

    DateTime::from_timestamp_millis(x)
        .map(|time| time.with_timezone(&offset).date_naive())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .and_then(|midnight| offset.from_local_datetime(&midnight).single())
        .map(|midnight| midnight.timestamp_millis())
        .ok_or_else(|| AnalysisError::InvalidTimestamp(x.to_string()))
}

fn div_ceil(value: i64, divisor: i64) -> i64 {
    let quotient = value.div_euclid(divisor);
    if value.rem_euclid(divisor) == 0 {
        quotient
    } else {
        quotient + 1
    }
}

fn median(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 1 {
        sorted[mid]
    } else {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    }
}

/// Most frequent value. Distinct values are scanned in order of first
/// appearance and only a strictly higher count replaces the leader, so ties
/// go to the value seen first.
fn mode_value(values: &[f64]) -> f64 {
    let Some(&first) = values.first() else {
        return f64::NAN;
    };

    let mut order: Vec<f64> = Vec::new();
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for &v in values {
        // -0.0 and 0.0 count as the same value
        let key = if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() };
        let count = counts.entry(key).or_insert(0);
        if *count == 0 {
            order.push(v);
        }
        *count += 1;
    }

    let mut best = first;
    let mut best_count = 0;
    for v in order {
        let key = if v == 0.0 { 0.0f64.to_bits() } else { v.to_bits() };
        let count = counts[&key];
        if count > best_count {
            best_count = count;
            best = v;
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const MINUTE: i64 = 60_000;

    fn reduce_single_bucket(mode: BucketMode) -> f64 {
        let points = vec![Point::new(0, 1.0), Point::new(0, 1.0), Point::new(0, 3.0)];
        let out = bucket_aggregate(&points, &BucketOptions::new(15.0, mode)).unwrap();
        assert_eq!(out.len(), 1);
        out[0].y
    }

    #[test]
    fn test_mode_correctness() {
        assert_eq!(reduce_single_bucket(BucketMode::Median), 1.0);
        assert!((reduce_single_bucket(BucketMode::Mean) - 5.0 / 3.0).abs() < 1e-12);
        assert_eq!(reduce_single_bucket(BucketMode::Mode), 1.0);
        assert_eq!(reduce_single_bucket(BucketMode::Min), 1.0);
        assert_eq!(reduce_single_bucket(BucketMode::Max), 3.0);
    }

    #[test]
    fn test_first_last_pick_by_time() {
        let points = vec![
            Point::new(3 * MINUTE, 30.0),
            Point::new(MINUTE, 10.0),
            Point::new(2 * MINUTE, 20.0),
        ];
        let first = bucket_aggregate(&points, &BucketOptions::new(10.0, BucketMode::First)).unwrap();
        let last = bucket_aggregate(&points, &BucketOptions::new(10.0, BucketMode::Last)).unwrap();
        assert_eq!(first[0].y, 10.0);
        assert_eq!(last[0].y, 30.0);
    }

    #[test]
    fn test_mode_tie_goes_to_first_seen_value() {
        assert_eq!(mode_value(&[3.0, 1.0, 1.0, 3.0]), 3.0);
        assert_eq!(mode_value(&[2.0, 5.0, 5.0]), 5.0);
        assert_eq!(mode_value(&[4.0, 7.0]), 4.0);
        assert_eq!(mode_value(&[0.0, -0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[5.0, 1.0, 3.0]), 3.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
        assert!(median(&[]).is_nan());
    }

    #[test]
    fn test_single_sample_bucket_returns_value_for_every_mode() {
        let points = vec![Point::new(7 * MINUTE, 4.25)];
        for mode in [
            BucketMode::First,
            BucketMode::Last,
            BucketMode::Min,
            BucketMode::Max,
            BucketMode::Median,
            BucketMode::Mode,
            BucketMode::Mean,
        ] {
            let out = bucket_aggregate(&points, &BucketOptions::new(15.0, mode)).unwrap();
            assert_eq!(out, vec![Point::new(7 * MINUTE + 30 * 1000, 4.25)]);
        }
    }

    #[test]
    fn test_hour_of_samples_into_quarter_hours() {
        let points: Vec<Point> = (0..60).map(|m| Point::new(m * MINUTE, m as f64)).collect();
        let out = bucket_aggregate(&points, &BucketOptions::new(15.0, BucketMode::Mean)).unwrap();

        let xs: Vec<i64> = out.iter().map(|p| p.x).collect();
        assert_eq!(
            xs,
            vec![
                7 * MINUTE + MINUTE / 2,
                22 * MINUTE + MINUTE / 2,
                37 * MINUTE + MINUTE / 2,
                52 * MINUTE + MINUTE / 2
            ]
        );
        let ys: Vec<f64> = out.iter().map(|p| p.y).collect();
        assert_eq!(ys, vec![7.0, 22.0, 37.0, 52.0]);
    }

    #[test]
    fn test_buckets_align_to_day_start_not_first_sample() {
        // 1970-01-02 00:07 UTC; the 15 minute window is 00:00-00:15
        let day = 24 * 60 * MINUTE;
        let points = vec![Point::new(day + 7 * MINUTE, 1.0), Point::new(day + 14 * MINUTE, 3.0)];
        let out = bucket_aggregate(&points, &BucketOptions::new(15.0, BucketMode::Mean)).unwrap();
        assert_eq!(out, vec![Point::new(day + 7 * MINUTE + MINUTE / 2, 2.0)]);
    }

    #[test]
    fn test_buckets_follow_utc_offset() {
        // 23:50 UTC is 00:50 at UTC+1, so hourly buckets centre on xx:30 local.
        let x = 23 * 60 * MINUTE + 50 * MINUTE;
        let options = BucketOptions {
            minutes: 60.0,
            mode: BucketMode::Mean,
            utc_offset_minutes: 60,
        };
        let out = bucket_aggregate(&[Point::new(x, 1.0)], &options).unwrap();
        assert_eq!(out[0].x, 23 * 60 * MINUTE + 30 * MINUTE);
    }

    #[test]
    fn test_points_before_day_start_use_floor() {
        let day = 24 * 60 * MINUTE;
        // first point sets the day; a later point from the previous day gets a negative index
        let points = vec![Point::new(day + MINUTE, 1.0), Point::new(day - MINUTE, 5.0)];
        let out = bucket_aggregate(&points, &BucketOptions::new(10.0, BucketMode::Mean)).unwrap();
        assert_eq!(
            out,
            vec![Point::new(day - 5 * MINUTE, 5.0), Point::new(day + 5 * MINUTE, 1.0)]
        );
    }

    #[test]
    fn test_empty_input_and_invalid_window() {
        assert!(bucket_aggregate(&[], &BucketOptions::default()).unwrap().is_empty());
        assert!(matches!(
            bucket_aggregate(&[Point::new(0, 1.0)], &BucketOptions::new(0.0, BucketMode::Mean)),
            Err(AnalysisError::InvalidWindow { .. })
        ));
        assert!(resample_linear(&[Point::new(0, 1.0)], f64::NAN).is_err());
    }

    #[test]
    fn test_non_finite_values_are_ignored() {
        let points = vec![
            Point::new(0, 2.0),
            Point::new(MINUTE, f64::NAN),
            Point::new(2 * MINUTE, f64::INFINITY),
            Point::new(3 * MINUTE, 4.0),
        ];
        let out = bucket_aggregate(&points, &BucketOptions::new(15.0, BucketMode::Mean)).unwrap();
        assert_eq!(out[0].y, 3.0);
    }

    #[test]
    fn test_extreme_timestamps_are_rejected() {
        let points = vec![Point::new(1_700_000_000_000, 1.0), Point::new(i64::MIN, 2.0)];
        assert!(matches!(
            bucket_aggregate(&points, &BucketOptions::default()),
            Err(AnalysisError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            bucket_counts(&[Point::new(0, 1.0), Point::new(i64::MIN, 1.0)], &BucketOptions::default()),
            Err(AnalysisError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            resample_linear(&[Point::new(0, 1.0), Point::new(i64::MAX, 2.0)], 7.0),
            Err(AnalysisError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_bucket_mode_from_str() {
        assert_eq!("Median".parse::<BucketMode>().unwrap(), BucketMode::Median);
        assert_eq!(" max ".parse::<BucketMode>().unwrap(), BucketMode::Max);
        assert!(matches!(
            "average".parse::<BucketMode>(),
            Err(AnalysisError::UnknownMode(_))
        ));
    }

    #[test]
    fn test_resample_linear_grid() {
        let points = vec![Point::new(2 * MINUTE, 0.0), Point::new(12 * MINUTE, 10.0)];
        let out = resample_linear(&points, 5.0).unwrap();
        assert_eq!(
            out,
            vec![
                Point::new(0, 0.0),
                Point::new(5 * MINUTE, 3.0),
                Point::new(10 * MINUTE, 8.0),
                Point::new(15 * MINUTE, 10.0),
            ]
        );
        assert!(resample_linear(&[], 5.0).unwrap().is_empty());
    }

    proptest! {
        #[test]
        fn prop_bucketing_conserves_samples(
            xs in proptest::collection::vec(0i64..3 * 24 * 60 * MINUTE, 0..200),
            minutes in 1u32..180,
        ) {
            let points: Vec<Point> = xs.iter().map(|&x| Point::new(x, (x % 97) as f64)).collect();
            let options = BucketOptions::new(minutes as f64, BucketMode::Mean);
            let counts = bucket_counts(&points, &options).unwrap();
            let total: usize = counts.iter().map(|(_, count)| count).sum();
            prop_assert_eq!(total, points.len());

            let out = bucket_aggregate(&points, &options).unwrap();
            prop_assert_eq!(out.len(), counts.len());
            prop_assert!(out.windows(2).all(|w| w[0].x < w[1].x));
        }
    }
}
