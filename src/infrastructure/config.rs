use crate::application::smoothing::Smoothing;
use crate::application::wind_rose::RoseWindow;
use crate::domain::wind::{SpeedBins, DEFAULT_SPEED_BINS};
use crate::error::{AnalysisError, AnalysisResult};
use serde::{Deserialize, Serialize};

const CONFIG_FILE: &str = "config/analysis";
const ENV_PREFIX: &str = "WIND_ANALYSIS";

/// Anemometer pulse count to m/s as reported by the station.
pub const STATION_SPEED_FACTOR: f64 = 0.33 / 3.6;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub bucket_minutes: f64,
    pub utc_offset_minutes: i32,
    pub smoothing: Smoothing,
    pub sector_count: usize,
    pub speed_bins: Vec<f64>,
    pub speed_factor: f64,
    pub rose: RoseWindow,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            bucket_minutes: 15.0,
            utc_offset_minutes: 0,
            smoothing: Smoothing::default(),
            sector_count: 24,
            speed_bins: DEFAULT_SPEED_BINS.to_vec(),
            speed_factor: STATION_SPEED_FACTOR,
            rose: RoseWindow::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse an inline TOML document.
    pub fn from_toml_str(source: &str) -> AnalysisResult<Self> {
        let config: AnalysisConfig = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AnalysisResult<()> {
        if !self.bucket_minutes.is_finite() || self.bucket_minutes <= 0.0 {
            return Err(AnalysisError::InvalidWindow {
                minutes: self.bucket_minutes,
            });
        }
        if !self.rose.window_minutes.is_finite() || self.rose.window_minutes <= 0.0 {
            return Err(AnalysisError::InvalidWindow {
                minutes: self.rose.window_minutes,
            });
        }
        if self.sector_count == 0 {
            return Err(AnalysisError::InvalidSectorCount);
        }
        if !self.speed_factor.is_finite() || self.speed_factor <= 0.0 {
            return Err(AnalysisError::InvalidConfig(format!(
                "speed_factor must be positive, got {}",
                self.speed_factor
            )));
        }
        if self.utc_offset_minutes.abs() >= 24 * 60 {
            return Err(AnalysisError::InvalidConfig(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            )));
        }
        self.speed_bins()?;
        Ok(())
    }

    pub fn speed_bins(&self) -> AnalysisResult<SpeedBins> {
        SpeedBins::new(self.speed_bins.clone())
    }
}

/// Load `config/analysis.{toml,json,...}` (optional) overlaid with
/// `WIND_ANALYSIS__*` environment variables.
pub fn load_analysis_config() -> AnalysisResult<AnalysisConfig> {
    load_analysis_config_from(CONFIG_FILE)
}

pub fn load_analysis_config_from(path: &str) -> AnalysisResult<AnalysisConfig> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name(path).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let config: AnalysisConfig = settings.try_deserialize()?;
    config.validate()?;
    tracing::debug!("Loaded analysis config: {:?}", config);
    Ok(config)
}
