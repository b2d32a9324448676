// Dashboard domain model
use super::telemetry::Point;
use super::wind::{BinStack, Histogram};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct WindDashboard {
    pub title: String,
    pub tiles: Vec<TileData>,
    pub charts: Vec<ChartData>,
    pub rose: Option<WindRose>,
}

impl WindDashboard {
    pub fn new(title: String, tiles: Vec<TileData>, charts: Vec<ChartData>, rose: Option<WindRose>) -> Self {
        Self {
            title,
            tiles,
            charts,
            rose,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TileData {
    pub id: String,
    pub title: String,
    pub unit: String,
    pub value: f64,
    pub precision: i32,
}

impl TileData {
    pub fn new(id: &str, title: &str, unit: &str, value: f64, precision: i32) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            unit: unit.to_string(),
            value,
            precision,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SeriesData {
    pub id: String,
    pub name: String,
    pub points: Vec<Point>,
}

impl SeriesData {
    pub fn new(id: &str, name: &str, points: Vec<Point>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            points,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub id: String,
    pub title: String,
    pub unit: Option<String>,
    pub series: Vec<SeriesData>,
}

impl ChartData {
    pub fn new(id: &str, title: &str, unit: Option<&str>, series: Vec<SeriesData>) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            unit: unit.map(str::to_string),
            series,
        }
    }
}

/// The sector with the largest share of non-calm wind.
#[derive(Debug, Clone, Serialize)]
pub struct DominantSector {
    pub sector: usize,
    pub center_degrees: f64,
    pub compass: &'static str,
    pub pct: f64,
}

/// Everything a polar renderer needs for one rose.
#[derive(Debug, Clone, Serialize)]
pub struct WindRose {
    pub start: i64,
    pub end: i64,
    pub labels: Vec<String>,
    pub histogram: Histogram,
    pub stacks: Vec<Vec<BinStack>>,
    pub bin_totals_pct: Vec<f64>,
    pub dominant: Option<DominantSector>,
}
