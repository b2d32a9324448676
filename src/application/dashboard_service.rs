// Dashboard service - Use case for building the wind dashboard
use crate::application::aggregation::{bucket_aggregate, BucketMode, BucketOptions};
use crate::application::interpolation::{combine_and_interpolate, wind_samples};
use crate::application::smoothing::smooth_points;
use crate::application::wind_rose::{
    build_histogram, compass_point, sector_center_degrees, select_window,
};
use crate::domain::dashboard::{
    ChartData, DominantSector, SeriesData, TileData, WindDashboard, WindRose,
};
use crate::domain::telemetry::{points_from_samples, Point};
use crate::domain::wind::{Histogram, SpeedBins};
use crate::error::AnalysisResult;
use crate::infrastructure::config::AnalysisConfig;
use crate::infrastructure::feed::WindFeed;

const SPEED_UNIT: &str = "m/s";

#[derive(Clone)]
pub struct WindDashboardService {
    config: AnalysisConfig,
    bins: SpeedBins,
}

impl WindDashboardService {
    pub fn new(config: AnalysisConfig) -> AnalysisResult<Self> {
        config.validate()?;
        let bins = config.speed_bins()?;
        Ok(Self { config, bins })
    }

    pub fn build_dashboard(&self, station: &str, feed: &WindFeed) -> AnalysisResult<WindDashboard> {
        let title = format!("{} Wind", station);

        let speeds: Vec<Point> = points_from_samples(&feed.winds)
            .into_iter()
            .map(|p| Point::new(p.x, p.y * self.config.speed_factor))
            .collect();
        tracing::debug!(
            "Building dashboard for {}: {} of {} speed samples usable",
            station,
            speeds.len(),
            feed.winds.len()
        );

        let mean = self.bucketed(&speeds, BucketMode::Mean)?;
        let max = self.bucketed(&speeds, BucketMode::Max)?;
        let rose = self.build_rose(feed)?;
        let tiles = self.build_tiles(&mean, &max, rose.as_ref());

        let charts = self.build_charts(&speeds, mean, max);

        Ok(WindDashboard::new(title, tiles, charts, rose))
    }

    fn bucketed(&self, speeds: &[Point], mode: BucketMode) -> AnalysisResult<Vec<Point>> {
        let options = BucketOptions {
            minutes: self.config.bucket_minutes,
            mode,
            utc_offset_minutes: self.config.utc_offset_minutes,
        };
        bucket_aggregate(speeds, &options)
    }

    fn build_tiles(&self, mean: &[Point], max: &[Point], rose: Option<&WindRose>) -> Vec<TileData> {
        let mut tiles = Vec::new();

        if let Some(latest) = mean.last() {
            tiles.push(TileData::new("avg", "Average wind", SPEED_UNIT, latest.y, 1));
        }
        if let Some(peak) = max.iter().map(|p| p.y).reduce(f64::max) {
            tiles.push(TileData::new("max", "Max wind", SPEED_UNIT, peak, 1));
        }
        match rose.map(|r| &r.histogram) {
            Some(histogram) if !histogram.is_degenerate() => {
                tiles.push(TileData::new("calm", "Calm", "%", histogram.calm_pct, 0));
            }
            _ => {
                // No rose data, skip this tile
            }
        }

        tiles
    }

    fn build_charts(&self, speeds: &[Point], mean: Vec<Point>, max: Vec<Point>) -> Vec<ChartData> {
        let minutes = self.config.bucket_minutes;
        let series_list: Vec<SeriesData> = [
            SeriesData::new("smoothed", "Smoothed", smooth_points(speeds, &self.config.smoothing)),
            SeriesData::new("mean", &format!("Mean ({} min)", minutes), mean),
            SeriesData::new("max", &format!("Max ({} min)", minutes), max),
        ]
        .into_iter()
        .filter(|s| !s.points.is_empty())
        .collect();

        // Only add chart if it has at least one series with data
        if series_list.is_empty() {
            return Vec::new();
        }
        vec![ChartData::new("wind", "Wind speed", Some(SPEED_UNIT), series_list)]
    }

    fn build_rose(&self, feed: &WindFeed) -> AnalysisResult<Option<WindRose>> {
        let rows = combine_and_interpolate(&feed.dirs, &feed.winds);
        let samples = wind_samples(&rows, self.config.speed_factor);
        if samples.len() < rows.len() {
            tracing::debug!(
                "Dropped {} direction rows without a usable direction or speed",
                rows.len() - samples.len()
            );
        }

        let Some(selection) = select_window(&samples, &self.config.rose)? else {
            return Ok(None);
        };
        let histogram = build_histogram(&selection.samples, self.config.sector_count, &self.bins)?;
        tracing::debug!(
            "Rose window {}..{}: {} samples, calm {:.1}%",
            selection.start,
            selection.end,
            histogram.total,
            histogram.calm_pct
        );

        Ok(Some(WindRose {
            start: selection.start,
            end: selection.end,
            labels: self.bins.labels(),
            stacks: histogram.stacks(),
            bin_totals_pct: histogram.bin_totals_pct(),
            dominant: dominant_sector(&histogram),
            histogram,
        }))
    }
}

fn dominant_sector(histogram: &Histogram) -> Option<DominantSector> {
    if histogram.is_degenerate() {
        return None;
    }
    let (sector, &pct) = histogram
        .pct_totals
        .iter()
        .enumerate()
        .filter(|(_, pct)| **pct > 0.0)
        .reduce(|best, candidate| if candidate.1 > best.1 { candidate } else { best })?;
    let center_degrees = sector_center_degrees(sector, histogram.sector_count());
    Some(DominantSector {
        sector,
        center_degrees,
        compass: compass_point(center_degrees),
        pct,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::smoothing::Smoothing;
    use crate::domain::telemetry::Sample;

    const MINUTE: i64 = 60_000;

    fn feed(minutes: i64, speed: f64, dir: f64) -> WindFeed {
        // newest first, like the backend serves it
        let winds = (0..minutes)
            .rev()
            .map(|m| Sample::new(m * MINUTE, Some(speed)))
            .collect();
        let dirs = (0..minutes)
            .rev()
            .map(|m| Sample::new(m * MINUTE + MINUTE / 2, Some(dir)))
            .collect();
        WindFeed {
            winds,
            dirs,
            dropped: 0,
        }
    }

    fn service() -> WindDashboardService {
        let config = AnalysisConfig {
            speed_factor: 1.0,
            smoothing: Smoothing::MovingAverage { window_minutes: 5.0 },
            ..AnalysisConfig::default()
        };
        WindDashboardService::new(config).unwrap()
    }

    #[test]
    fn test_build_dashboard() {
        let dashboard = service().build_dashboard("Pier", &feed(60, 2.0, 90.0)).unwrap();
        assert_eq!(dashboard.title, "Pier Wind");

        let chart = &dashboard.charts[0];
        assert_eq!(chart.series.len(), 3);
        assert_eq!(chart.series[0].points.len(), 60);
        assert!(chart.series[0].points.windows(2).all(|w| w[0].x < w[1].x));
        assert_eq!(chart.series[1].points.len(), 4);
        assert!(chart.series[1].points.iter().all(|p| p.y == 2.0));

        let tile_ids: Vec<&str> = dashboard.tiles.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(tile_ids, vec!["avg", "max", "calm"]);
        assert_eq!(dashboard.tiles[2].value, 0.0);

        let rose = dashboard.rose.unwrap();
        assert_eq!(rose.end, 60 * MINUTE);
        assert_eq!(rose.start, 40 * MINUTE);
        assert_eq!(rose.histogram.total, 20);
        assert_eq!(rose.histogram.per_sector_counts[6][1], 20);
        assert_eq!(rose.labels.len(), rose.bin_totals_pct.len());
        let dominant = rose.dominant.unwrap();
        assert_eq!(dominant.sector, 6);
        assert_eq!(dominant.compass, "E");
        assert_eq!(dominant.pct, 100.0);
    }

    #[test]
    fn test_calm_feed() {
        let dashboard = service().build_dashboard("Pier", &feed(30, 0.0, 180.0)).unwrap();
        let rose = dashboard.rose.unwrap();
        assert_eq!(rose.histogram.calm_pct, 100.0);
        assert!(rose.dominant.is_none());
    }

    #[test]
    fn test_empty_feed() {
        let dashboard = service().build_dashboard("Pier", &WindFeed::default()).unwrap();
        assert!(dashboard.charts.is_empty());
        assert!(dashboard.tiles.is_empty());
        assert!(dashboard.rose.is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = AnalysisConfig {
            sector_count: 0,
            ..AnalysisConfig::default()
        };
        assert!(WindDashboardService::new(config).is_err());
    }
}
