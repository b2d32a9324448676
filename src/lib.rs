//! Time-series aggregation and wind-rose engine for weather station
//! telemetry.
//!
//! The engines in [`application`] are pure functions over in-memory
//! samples; [`infrastructure`] and [`presentation`] wire them to JSON feeds
//! and reports for batch use.
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod presentation;

pub use application::aggregation::{bucket_aggregate, resample_linear, BucketMode, BucketOptions};
pub use application::interpolation::{combine_and_interpolate, interpolate, wind_samples};
pub use application::smoothing::{smooth_points, Smoothing};
pub use application::wind_rose::{build_histogram, select_window, RoseWindow};
pub use domain::telemetry::{points_from_samples, CombinedSample, Point, Sample};
pub use domain::wind::{Histogram, SpeedBins, WindSample};
pub use error::{AnalysisError, AnalysisResult};
