// Series interpolation - Aligns one series onto another's timestamps
use crate::domain::telemetry::{CombinedSample, Sample};
use crate::domain::wind::WindSample;

/// Linear interpolation between `(x0, y0)` and `(x2, y2)` at `x`.
/// Returns `y0` when both points share the same `x`.
pub fn interpolate(x0: f64, y0: f64, x2: f64, y2: f64, x: f64) -> f64 {
    if x2 == x0 {
        return y0;
    }
    y0 + (y2 - y0) * (x - x0) / (x2 - x0)
}

/// For every reference sample, interpolate the source series at its
/// timestamp.
///
/// The result has one row per reference sample in the reference's order.
/// Source values are clamped at both ends rather than extrapolated; source
/// samples without a finite value are ignored.
pub fn combine_and_interpolate(reference: &[Sample], source: &[Sample]) -> Vec<CombinedSample> {
    let mut sorted: Vec<(i64, f64)> = source
        .iter()
        .filter_map(|s| s.finite_value().map(|v| (s.timestamp, v)))
        .collect();
    sorted.sort_by_key(|(t, _)| *t);

    // `next` is the index of the first source sample strictly after the
    // current reference timestamp.
    let mut next = 0;
    let mut last_t = i64::MIN;

    reference
        .iter()
        .map(|a| {
            let t_a = a.timestamp;
            if t_a >= last_t {
                while next < sorted.len() && sorted[next].0 <= t_a {
                    next += 1;
                }
            } else {
                next = sorted.partition_point(|(t, _)| *t <= t_a);
            }
            last_t = t_a;

            CombinedSample {
                timestamp: t_a,
                value_a: a.value,
                value_b: value_at(&sorted, next, t_a),
            }
        })
        .collect()
}

fn value_at(sorted: &[(i64, f64)], next: usize, t: i64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    if next == 0 {
        return Some(sorted[0].1);
    }
    let (t0, v0) = sorted[next - 1];
    let Some(&(t2, v2)) = sorted.get(next) else {
        return Some(v0);
    };
    Some(interpolate(t0 as f64, v0, t2 as f64, v2, t as f64))
}

/// Turn combined (direction, speed) rows into wind samples, scaling speed by
/// `speed_factor`. Rows missing either value are skipped.
pub fn wind_samples(rows: &[CombinedSample], speed_factor: f64) -> Vec<WindSample> {
    rows.iter()
        .filter_map(|row| match (row.value_a, row.value_b) {
            (Some(dir), Some(speed)) if dir.is_finite() && speed.is_finite() => {
                Some(WindSample::new(row.timestamp, dir, speed * speed_factor))
            }
            _ => None,
        })
        .collect()
}
