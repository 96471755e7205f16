use std::env;
use std::str::FromStr;

use frame_review_types::DEFAULT_FRAME_RATE;
use thiserror::Error;

use crate::scrub::MAX_MARKERS;
use crate::time_sync::MIN_SAMPLE_RATE_HZ;

const MIN_SAMPLE_RATE_ENV: &str = "FRAME_REVIEW_MIN_SAMPLE_RATE";
const FALLBACK_FPS_ENV: &str = "FRAME_REVIEW_FALLBACK_FPS";
const MAX_MARKERS_ENV: &str = "FRAME_REVIEW_MAX_MARKERS";

#[derive(Debug, Error, PartialEq)]
pub enum ConfigurationError {
    #[error("failed to parse {key}='{value}'")]
    Unparsable { key: &'static str, value: String },
    #[error("{key} must be greater than zero (got '{value}')")]
    NotPositive { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    /// Lower bound for the periodic sampling rate, in Hz.
    pub min_sample_rate_hz: u32,
    /// Frame rate used when the asset does not report one.
    pub fallback_fps: f64,
    pub max_markers: usize,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            min_sample_rate_hz: MIN_SAMPLE_RATE_HZ,
            fallback_fps: DEFAULT_FRAME_RATE,
            max_markers: MAX_MARKERS,
        }
    }
}

impl Configuration {
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let mut config = Configuration::default();
        if let Ok(value) = env::var(MIN_SAMPLE_RATE_ENV) {
            config.min_sample_rate_hz = parse_positive(MIN_SAMPLE_RATE_ENV, &value)?;
        }
        if let Ok(value) = env::var(FALLBACK_FPS_ENV) {
            config.fallback_fps = parse_positive_fps(&value)?;
        }
        if let Ok(value) = env::var(MAX_MARKERS_ENV) {
            config.max_markers = parse_positive(MAX_MARKERS_ENV, &value)?;
        }
        Ok(config)
    }
}

fn parse_positive<T>(key: &'static str, value: &str) -> Result<T, ConfigurationError>
where
    T: FromStr + PartialEq + Default,
{
    let parsed: T = value
        .trim()
        .parse()
        .map_err(|_| ConfigurationError::Unparsable {
            key,
            value: value.to_string(),
        })?;
    if parsed == T::default() {
        return Err(ConfigurationError::NotPositive {
            key,
            value: value.to_string(),
        });
    }
    Ok(parsed)
}

fn parse_positive_fps(value: &str) -> Result<f64, ConfigurationError> {
    let parsed: f64 = value
        .trim()
        .parse()
        .map_err(|_| ConfigurationError::Unparsable {
            key: FALLBACK_FPS_ENV,
            value: value.to_string(),
        })?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err(ConfigurationError::NotPositive {
            key: FALLBACK_FPS_ENV,
            value: value.to_string(),
        });
    }
    Ok(parsed)
}
