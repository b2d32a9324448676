// Wind rose histogram - Direction × speed distribution for polar plots
use crate::domain::telemetry::minutes_to_ms;
use crate::domain::wind::{Histogram, SpeedBins, WindSample};
use crate::error::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};

const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];
const MAX_DELAY_MINUTES: f64 = 24.0 * 60.0;
const WINDOW_END_ROUNDING_MINUTES: f64 = 10.0;

/// Map any degree value into `[0, 360)`.
pub fn normalize_degrees(dir: f64) -> f64 {
    ((dir % 360.0) + 360.0) % 360.0
}

/// Sector index of a heading for `sector_count` equal sectors starting at north.
pub fn sector_for(dir: f64, sector_count: usize) -> usize {
    let width = 360.0 / sector_count as f64;
    let sector = (normalize_degrees(dir) / width).floor() as usize;
    // 359.999... can round up to the full circle
    sector.min(sector_count - 1)
}

/// Heading at the middle of a sector.
pub fn sector_center_degrees(sector: usize, sector_count: usize) -> f64 {
    (sector as f64 + 0.5) * (360.0 / sector_count as f64)
}

/// Eight-wind compass name of a heading.
pub fn compass_point(dir: f64) -> &'static str {
    let index = ((normalize_degrees(dir) + 22.5) / 45.0).floor() as usize % 8;
    COMPASS_POINTS[index]
}

/// Build the sector × speed-bin histogram.
///
/// Calm samples (`speed <= 0`) only count toward the total, so the sector
/// totals plus the calm share add up to 100%. Samples with a non-finite
/// direction or speed are skipped.
pub fn build_histogram(
    samples: &[WindSample],
    sector_count: usize,
    bins: &SpeedBins,
) -> AnalysisResult<Histogram> {
    if sector_count == 0 {
        return Err(AnalysisError::InvalidSectorCount);
    }

    let mut per_sector_counts = vec![vec![0u32; bins.bin_count()]; sector_count];
    let mut calm_count = 0u32;
    let mut total = 0usize;

    for sample in samples {
        if !sample.dir.is_finite() || !sample.speed.is_finite() {
            continue;
        }
        total += 1;
        if sample.is_calm() {
            calm_count += 1;
            continue;
        }
        let sector = sector_for(sample.dir, sector_count);
        per_sector_counts[sector][bins.bin_index(sample.speed)] += 1;
    }

    let to_pct = |count: u32| count as f64 * 100.0 / total as f64;
    let pct: Vec<Vec<f64>> = per_sector_counts
        .iter()
        .map(|row| row.iter().map(|&count| to_pct(count)).collect())
        .collect();
    let pct_totals = per_sector_counts
        .iter()
        .map(|row| to_pct(row.iter().sum()))
        .collect();

    if total < samples.len() {
        tracing::debug!("Skipped {} wind samples with non-finite values", samples.len() - total);
    }

    Ok(Histogram {
        per_sector_counts,
        pct,
        pct_totals,
        calm_count,
        calm_pct: to_pct(calm_count),
        total,
    })
}

/// Which slice of the wind history feeds the rose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoseWindow {
    /// Length of the slice.
    pub window_minutes: f64,
    /// How far the slice ends before the latest sample.
    pub delay_minutes: f64,
}

impl Default for RoseWindow {
    fn default() -> Self {
        Self {
            window_minutes: 20.0,
            delay_minutes: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoseSelection {
    pub start: i64,
    pub end: i64,
    pub samples: Vec<WindSample>,
}

/// Select the samples inside the rose window.
///
/// The window ends `delay` before the latest timestamp rounded up to a whole
/// ten minutes; both ends are inclusive. Returns `None` for empty input.
pub fn select_window(samples: &[WindSample], window: &RoseWindow) -> AnalysisResult<Option<RoseSelection>> {
    if !window.window_minutes.is_finite() || window.window_minutes <= 0.0 {
        return Err(AnalysisError::InvalidWindow {
            minutes: window.window_minutes,
        });
    }
    let Some(latest) = samples.iter().map(|s| s.timestamp).max() else {
        return Ok(None);
    };

    let round = minutes_to_ms(WINDOW_END_ROUNDING_MINUTES) as i64;
    let delay = if window.delay_minutes.is_finite() {
        window.delay_minutes.clamp(0.0, MAX_DELAY_MINUTES)
    } else {
        0.0
    };

    let bounds = latest
        .div_euclid(round)
        .checked_add(if latest.rem_euclid(round) == 0 { 0 } else { 1 })
        .and_then(|ticks| ticks.checked_mul(round))
        .and_then(|rounded| rounded.checked_sub(minutes_to_ms(delay).round() as i64))
        .and_then(|end| {
            end.checked_sub(minutes_to_ms(window.window_minutes).round() as i64)
                .map(|start| (start, end))
        });
    let Some((start, end)) = bounds else {
        return Err(AnalysisError::InvalidTimestamp(latest.to_string()));
    };
    let selected = samples
        .iter()
        .copied()
        .filter(|s| start <= s.timestamp && s.timestamp <= end)
        .collect();

    Ok(Some(RoseSelection {
        start,
        end,
        samples: selected,
    }))
}
