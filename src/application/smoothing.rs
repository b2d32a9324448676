// Smoothing kernels - Time-aware smoothers over irregularly sampled points
use crate::domain::telemetry::{minutes_to_ms, sorted_by_x, Point};
use crate::error::AnalysisError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

const DEFAULT_HALF_LIFE_MINUTES: f64 = 8.0;
const DEFAULT_WINDOW_MINUTES: f64 = 10.0;
const DEFAULT_BANDWIDTH_MINUTES: f64 = 5.0;

/// Smoother selection together with its time parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "lowercase")]
pub enum Smoothing {
    Ema {
        #[serde(default = "default_half_life")]
        half_life_minutes: f64,
    },
    #[serde(rename = "moving", alias = "ma")]
    MovingAverage {
        #[serde(default = "default_window")]
        window_minutes: f64,
    },
    Gaussian {
        #[serde(default = "default_bandwidth")]
        bandwidth_minutes: f64,
    },
}

fn default_half_life() -> f64 {
    DEFAULT_HALF_LIFE_MINUTES
}

fn default_window() -> f64 {
    DEFAULT_WINDOW_MINUTES
}

fn default_bandwidth() -> f64 {
    DEFAULT_BANDWIDTH_MINUTES
}

impl Default for Smoothing {
    fn default() -> Self {
        Smoothing::Ema {
            half_life_minutes: DEFAULT_HALF_LIFE_MINUTES,
        }
    }
}

impl FromStr for Smoothing {
    type Err = AnalysisError;

    /// Parse a method tag; the parameter takes its default value.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ema" => Ok(Smoothing::default()),
            "moving" | "ma" => Ok(Smoothing::MovingAverage {
                window_minutes: DEFAULT_WINDOW_MINUTES,
            }),
            "gaussian" => Ok(Smoothing::Gaussian {
                bandwidth_minutes: DEFAULT_BANDWIDTH_MINUTES,
            }),
            _ => Err(AnalysisError::UnknownMethod(s.to_string())),
        }
    }
}

/// Apply the selected smoother.
pub fn smooth_points(points: &[Point], smoothing: &Smoothing) -> Vec<Point> {
    match *smoothing {
        Smoothing::Ema { half_life_minutes } => smooth_ema(points, half_life_minutes),
        Smoothing::MovingAverage { window_minutes } => smooth_moving_average(points, window_minutes),
        Smoothing::Gaussian { bandwidth_minutes } => smooth_gaussian(points, bandwidth_minutes),
    }
}

/// Zero-lag exponential moving average.
///
/// A forward and a backward pass each decay with the given half-life,
/// weighted by the actual time step between samples; the result is their
/// per-point average.
pub fn smooth_ema(points: &[Point], half_life_minutes: f64) -> Vec<Point> {
    let points = sorted_by_x(points);
    let half_life = minutes_to_ms(half_life_minutes);
    if !half_life.is_finite() || half_life <= 0.0 {
        return points.into_owned();
    }

    let forward = ema_pass(points.iter().copied(), half_life);
    let mut backward = ema_pass(points.iter().rev().copied(), half_life);
    backward.reverse();

    points
        .iter()
        .zip(forward.into_iter().zip(backward))
        .map(|(p, (f, b))| {
            let y = match (f, b) {
                (Some(f), Some(b)) => (f + b) / 2.0,
                (Some(v), None) | (None, Some(v)) => v,
                (None, None) => p.y,
            };
            Point::new(p.x, y)
        })
        .collect()
}

/// One EMA pass in iteration order, seeded with the first finite value.
fn ema_pass(points: impl Iterator<Item = Point>, half_life: f64) -> Vec<Option<f64>> {
    let mut state: Option<(i64, f64)> = None;
    points
        .map(|p| {
            if p.y.is_finite() {
                let y = match state {
                    None => p.y,
                    Some((prev_x, prev_y)) => {
                        let dt = (p.x as f64 - prev_x as f64).abs();
                        let alpha = 1.0 - (-dt / half_life).exp2();
                        prev_y + alpha * (p.y - prev_y)
                    }
                };
                state = Some((p.x, y));
            }
            state.map(|(_, y)| y)
        })
        .collect()
}

/// Trailing time-window mean over the last `window_minutes`.
pub fn smooth_moving_average(points: &[Point], window_minutes: f64) -> Vec<Point> {
    let points = sorted_by_x(points);
    let window = minutes_to_ms(window_minutes);
    if !window.is_finite() || window < 0.0 {
        return points.into_owned();
    }

    let mut out = Vec::with_capacity(points.len());
    let mut sum = 0.0;
    let mut count = 0usize;
    let mut left = 0;

    for (i, p) in points.iter().enumerate() {
        while left < i && p.x as f64 - points[left].x as f64 > window {
            if points[left].y.is_finite() {
                sum -= points[left].y;
                count -= 1;
            }
            left += 1;
        }
        // empty window: drop any rounding residue from evicted values
        if count == 0 {
            sum = 0.0;
        }
        if p.y.is_finite() {
            sum += p.y;
            count += 1;
        }
        let y = if count > 0 { sum / count as f64 } else { p.y };
        out.push(Point::new(p.x, y));
    }
    out
}

/// Gaussian kernel smoother with a time bandwidth.
///
/// Neighbours within ±3σ contribute with weight `exp(-0.5 (Δt/σ)²)`.
pub fn smooth_gaussian(points: &[Point], bandwidth_minutes: f64) -> Vec<Point> {
    let points = sorted_by_x(points);
    let sigma = minutes_to_ms(bandwidth_minutes);
    if !sigma.is_finite() || sigma <= 0.0 {
        return points.into_owned();
    }

    let n = points.len();
    let mut out = Vec::with_capacity(n);
    let (mut l, mut r) = (0, 0);

    for p in points.iter() {
        let xi = p.x as f64;
        let left_bound = xi - 3.0 * sigma;
        let right_bound = xi + 3.0 * sigma;

        while l < n && (points[l].x as f64) < left_bound {
            l += 1;
        }
        r = r.max(l);
        while r < n && (points[r].x as f64) <= right_bound {
            r += 1;
        }

        let (mut wsum, mut ysum) = (0.0, 0.0);
        for neighbour in points[l..r].iter().filter(|q| q.y.is_finite()) {
            let dt = neighbour.x as f64 - xi;
            let w = (-0.5 * (dt * dt) / (sigma * sigma)).exp();
            wsum += w;
            ysum += w * neighbour.y;
        }
        let y = if wsum > 0.0 { ysum / wsum } else { p.y };
        out.push(Point::new(p.x, y));
    }
    out
}
