// Wind rose domain models
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};

/// Upper speed bounds (m/s) used by the station's rose.
pub const DEFAULT_SPEED_BINS: [f64; 9] = [1.0, 2.0, 3.0, 5.0, 8.0, 10.0, 15.0, 20.0, 25.0];

/// A merged direction/speed observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    /// Epoch milliseconds of the reference (direction) sample.
    #[serde(default)]
    pub timestamp: i64,
    /// Degrees clockwise from north. Any real value; normalized on use.
    pub dir: f64,
    pub speed: f64,
}

impl WindSample {
    pub fn new(timestamp: i64, dir: f64, speed: f64) -> Self {
        Self {
            timestamp,
            dir,
            speed,
        }
    }

    pub fn is_calm(&self) -> bool {
        self.speed <= 0.0
    }
}

/// Ascending speed upper bounds. The last bin is open-ended ("> last bound").
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeedBins(Vec<f64>);

impl SpeedBins {
    pub fn new(bounds: Vec<f64>) -> Result<Self, AnalysisError> {
        if bounds.is_empty() {
            return Err(AnalysisError::InvalidSpeedBins(
                "at least one bound is required".to_string(),
            ));
        }
        if let Some(bad) = bounds.iter().find(|b| !b.is_finite()) {
            return Err(AnalysisError::InvalidSpeedBins(format!(
                "bound {} is not finite",
                bad
            )));
        }
        if bounds.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AnalysisError::InvalidSpeedBins(format!(
                "bounds must be strictly ascending: {:?}",
                bounds
            )));
        }
        Ok(Self(bounds))
    }

    pub fn bounds(&self) -> &[f64] {
        &self.0
    }

    /// Number of histogram columns: one per bound plus the open-ended bin.
    pub fn bin_count(&self) -> usize {
        self.0.len() + 1
    }

    /// First bin whose bound is `>= speed`, or the open-ended bin.
    pub fn bin_index(&self, speed: f64) -> usize {
        self.0
            .iter()
            .position(|&bound| speed <= bound)
            .unwrap_or(self.0.len())
    }

    /// Legend labels, one per bin: `0–b0`, `b0–b1`, ..., `> bn`.
    pub fn labels(&self) -> Vec<String> {
        let mut labels = Vec::with_capacity(self.bin_count());
        labels.push(format!("0–{:.2}", self.0[0]));
        for pair in self.0.windows(2) {
            labels.push(format!("{:.2}–{:.2}", pair[0], pair[1]));
        }
        if let Some(last) = self.0.last() {
            labels.push(format!("> {:.2}", last));
        }
        labels
    }
}

impl Default for SpeedBins {
    fn default() -> Self {
        Self(DEFAULT_SPEED_BINS.to_vec())
    }
}

/// Radial extent of one stacked bin inside a sector, in percent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BinStack {
    pub start_pct: f64,
    pub end_pct: f64,
}

impl BinStack {
    pub fn height(&self) -> f64 {
        self.end_pct - self.start_pct
    }
}

/// Sector × speed-bin distribution of wind samples.
///
/// Percentages are relative to `total` (calm samples included), so the
/// sector totals plus `calm_pct` add up to 100. With `total == 0` every
/// percentage is `NaN`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Histogram {
    pub per_sector_counts: Vec<Vec<u32>>,
    pub pct: Vec<Vec<f64>>,
    pub pct_totals: Vec<f64>,
    pub calm_count: u32,
    pub calm_pct: f64,
    pub total: usize,
}

impl Histogram {
    pub fn sector_count(&self) -> usize {
        self.per_sector_counts.len()
    }

    pub fn is_degenerate(&self) -> bool {
        self.total == 0
    }

    /// Cumulative radial extents per sector, bins stacked outward in
    /// ascending speed order.
    pub fn stacks(&self) -> Vec<Vec<BinStack>> {
        self.pct
            .iter()
            .map(|row| {
                let mut acc = 0.0;
                row.iter()
                    .map(|&pct| {
                        let stack = BinStack {
                            start_pct: acc,
                            end_pct: acc + pct,
                        };
                        acc += pct;
                        stack
                    })
                    .collect()
            })
            .collect()
    }

    /// Percentage per speed bin summed over all sectors.
    pub fn bin_totals_pct(&self) -> Vec<f64> {
        let bins = self.pct.first().map_or(0, Vec::len);
        let mut totals = vec![0.0; bins];
        for row in &self.pct {
            for (total, pct) in totals.iter_mut().zip(row) {
                *total += pct;
            }
        }
        totals
    }

    /// Largest sector total, or `None` for an empty or degenerate histogram.
    pub fn max_sector_pct(&self) -> Option<f64> {
        if self.is_degenerate() {
            return None;
        }
        self.pct_totals.iter().copied().reduce(f64::max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_bins_validation() {
        assert!(SpeedBins::new(vec![]).is_err());
        assert!(SpeedBins::new(vec![1.0, 1.0]).is_err());
        assert!(SpeedBins::new(vec![2.0, 1.0]).is_err());
        assert!(SpeedBins::new(vec![1.0, f64::NAN]).is_err());
        assert!(SpeedBins::new(vec![1.0, 2.0, 4.0, 6.0, 8.0, 10.0]).is_ok());
    }

    #[test]
    fn test_bin_index_for_speed() {
        let bins = SpeedBins::new(vec![1.0, 2.0, 4.0, 6.0, 8.0, 10.0]).unwrap();
        assert_eq!(bins.bin_index(0.5), 0);
        assert_eq!(bins.bin_index(1.0), 0);
        assert_eq!(bins.bin_index(1.01), 1);
        assert_eq!(bins.bin_index(5.0), 3);
        assert_eq!(bins.bin_index(10.0), 5);
        assert_eq!(bins.bin_index(10.5), 6);
        assert_eq!(bins.bin_count(), 7);
    }

    #[test]
    fn test_labels() {
        let bins = SpeedBins::new(vec![1.0, 2.5, 4.0]).unwrap();
        assert_eq!(
            bins.labels(),
            vec!["0–1.00", "1.00–2.50", "2.50–4.00", "> 4.00"]
        );
    }

    #[test]
    fn test_stacks_and_bin_totals() {
        let histogram = Histogram {
            per_sector_counts: vec![vec![1, 2, 0], vec![0, 1, 1]],
            pct: vec![vec![10.0, 20.0, 0.0], vec![0.0, 10.0, 10.0]],
            pct_totals: vec![30.0, 20.0],
            calm_count: 5,
            calm_pct: 50.0,
            total: 10,
        };

        let stacks = histogram.stacks();
        assert_eq!(stacks[0][0], BinStack { start_pct: 0.0, end_pct: 10.0 });
        assert_eq!(stacks[0][1], BinStack { start_pct: 10.0, end_pct: 30.0 });
        assert_eq!(stacks[0][2].height(), 0.0);
        assert_eq!(stacks[1][2], BinStack { start_pct: 10.0, end_pct: 20.0 });

        assert_eq!(histogram.bin_totals_pct(), vec![10.0, 30.0, 10.0]);
        assert_eq!(histogram.max_sector_pct(), Some(30.0));
    }
}
