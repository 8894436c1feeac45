//! Analysis defaults
//!
//! Values come from [`AnalysisConfig::default`], optionally a JSON file, and
//! finally `FLOW_ATLAS_*` environment variables, later sources winning.

use crate::error::{AnalysisError, Result};
use crate::tensor::FillPolicy;
use flow_math::{ForecastMethod, Forecaster, MovingAverage, Naive, NoisyReplay};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "FLOW_ATLAS_";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Province corridors returned when a request does not say
    pub topk: i64,
    /// Intra-province city corridors returned when a request does not say
    pub topk_intra: i64,
    /// Inter-province city corridors returned when a request does not say
    pub topk_inter: i64,
    /// Fill policy for dense tensors
    pub fill: FillPolicy,
    pub forecast_method: ForecastMethod,
    pub forecast_window: usize,
    pub noise_ratio: f64,
    pub noise_seed: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            topk: 10,
            topk_intra: 10,
            topk_inter: 30,
            fill: FillPolicy::Zero,
            forecast_method: ForecastMethod::MovingAverage,
            forecast_window: MovingAverage::DEFAULT_WINDOW,
            noise_ratio: NoisyReplay::DEFAULT_NOISE_RATIO,
            noise_seed: None,
        }
    }
}

fn parse_var<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e: T::Err| {
        AnalysisError::InvalidParameter(format!("{}{}={}: {}", ENV_PREFIX, key, raw, e))
    })
}

impl AnalysisConfig {
    /// Read a JSON config file; missing fields keep their defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults, then the optional file, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = match path {
            Some(p) => Self::from_json_file(p)?,
            None => Self::default(),
        };
        base.with_overrides(|key| std::env::var(format!("{}{}", ENV_PREFIX, key)).ok())
    }

    /// Apply overrides looked up by key (`TOPK`, `TOPK_INTRA`, `TOPK_INTER`,
    /// `FILL`, `FORECAST_METHOD`, `FORECAST_WINDOW`, `NOISE_RATIO`,
    /// `NOISE_SEED`)
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("TOPK") {
            self.topk = parse_var("TOPK", &v)?;
        }
        if let Some(v) = lookup("TOPK_INTRA") {
            self.topk_intra = parse_var("TOPK_INTRA", &v)?;
        }
        if let Some(v) = lookup("TOPK_INTER") {
            self.topk_inter = parse_var("TOPK_INTER", &v)?;
        }
        if let Some(v) = lookup("FILL") {
            self.fill = v.parse()?;
        }
        if let Some(v) = lookup("FORECAST_METHOD") {
            self.forecast_method = v.parse()?;
        }
        if let Some(v) = lookup("FORECAST_WINDOW") {
            self.forecast_window = parse_var("FORECAST_WINDOW", &v)?;
        }
        if let Some(v) = lookup("NOISE_RATIO") {
            self.noise_ratio = parse_var("NOISE_RATIO", &v)?;
        }
        if let Some(v) = lookup("NOISE_SEED") {
            self.noise_seed = Some(parse_var("NOISE_SEED", &v)?);
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        for (class, value) in [
            ("province", self.topk),
            ("intra_province", self.topk_intra),
            ("inter_province", self.topk_inter),
        ] {
            if value < 0 {
                return Err(AnalysisError::InvalidTopK { class, value });
            }
        }
        if self.forecast_window == 0 {
            return Err(AnalysisError::InvalidParameter(
                "forecast_window must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// The configured forecasting strategy
    pub fn forecaster(&self) -> Result<Box<dyn Forecaster>> {
        self.forecaster_for(self.forecast_method)
    }

    /// A forecaster for `method`, using this config's window and noise settings
    pub fn forecaster_for(&self, method: ForecastMethod) -> Result<Box<dyn Forecaster>> {
        Ok(match method {
            ForecastMethod::Naive => Box::new(Naive),
            ForecastMethod::MovingAverage => Box::new(MovingAverage::new(self.forecast_window)?),
            ForecastMethod::NoisyReplay => {
                Box::new(NoisyReplay::new(self.noise_ratio, self.noise_seed)?)
            }
        })
    }
}
