use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackerError};

/// Constants of the constant-velocity box filter.
///
/// The scalar noise terms scale identity matrices: `P0 = initial_covariance * I`,
/// `Q = process_noise * I`, `R = observation_noise * I`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterParams {
    /// Fixed step per predict call, independent of wall-clock time.
    pub time_step: f64,
    /// Velocity a new filter is seeded with. Not observed, so this is a guess.
    pub initial_velocity: [f64; 2],
    pub initial_covariance: f64,
    pub process_noise: f64,
    pub observation_noise: f64,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self {
            time_step: 0.005,
            initial_velocity: [1.0, 1.0],
            initial_covariance: 1.0,
            process_noise: 1.0,
            observation_noise: 1.0,
        }
    }
}

impl FilterParams {
    pub fn validate(&self) -> Result<()> {
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(TrackerError::config(format!(
                "time_step must be positive, got {}",
                self.time_step
            )));
        }
        if self.initial_velocity.iter().any(|v| !v.is_finite()) {
            return Err(TrackerError::config("initial_velocity must be finite"));
        }
        for (name, value) in [
            ("initial_covariance", self.initial_covariance),
            ("process_noise", self.process_noise),
            ("observation_noise", self.observation_noise),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(TrackerError::config(format!(
                    "{} must be finite and >= 0, got {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Matches costing more than this are dropped after assignment.
    pub distance_threshold: f64,
    /// A track is deleted once its skipped-frame counter exceeds this.
    pub max_skipped_frames: u32,
    pub filter: FilterParams,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            distance_threshold: 150.0,
            max_skipped_frames: 30,
            filter: FilterParams::default(),
        }
    }
}

impl TrackerConfig {
    pub fn new(distance_threshold: f64, max_skipped_frames: u32) -> Self {
        Self {
            distance_threshold,
            max_skipped_frames,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.distance_threshold.is_finite() || self.distance_threshold < 0.0 {
            return Err(TrackerError::config(format!(
                "distance_threshold must be finite and >= 0, got {}",
                self.distance_threshold
            )));
        }
        self.filter.validate()
    }
}

/// Settings for a [`crate::stabilizer::Stabilizer`] session.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StabilizerConfig {
    pub pedestrians: TrackerConfig,
    pub plates: TrackerConfig,
}

impl StabilizerConfig {
    /// Reads and validates a JSON config file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let load_error = |reason: String| TrackerError::ConfigLoad {
            path: path.display().to_string(),
            reason,
        };
        let contents = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let config: StabilizerConfig =
            serde_json::from_str(&contents).map_err(|e| load_error(e.to_string()))?;
        config.pedestrians.validate()?;
        config.plates.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_filter_constants() {
        let config = TrackerConfig::default();
        assert_eq!(config.distance_threshold, 150.0);
        assert_eq!(config.max_skipped_frames, 30);
        assert_eq!(config.filter.time_step, 0.005);
        assert_eq!(config.filter.initial_velocity, [1.0, 1.0]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_negative_threshold() {
        let config = TrackerConfig::new(-1.0, 3);
        assert!(matches!(config.validate(), Err(TrackerError::Config(_))));
    }

    #[test]
    fn rejects_nan_noise() {
        let mut config = TrackerConfig::default();
        config.filter.process_noise = f64::NAN;
        assert!(config.validate().is_err());

        let mut config = TrackerConfig::default();
        config.filter.time_step = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: StabilizerConfig =
            serde_json::from_str(r#"{ "plates": { "max_skipped_frames": 3 } }"#).unwrap();
        assert_eq!(config.plates.max_skipped_frames, 3);
        assert_eq!(config.plates.distance_threshold, 150.0);
        assert_eq!(config.pedestrians, TrackerConfig::default());
    }

    #[test]
    fn load_reports_path_and_validates() {
        let dir = std::env::temp_dir().join(format!("boxsort-config-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let missing = dir.join("missing.json");
        assert!(matches!(
            StabilizerConfig::load(&missing),
            Err(TrackerError::ConfigLoad { .. })
        ));

        let broken = dir.join("broken.json");
        fs::write(&broken, "{ pedestrians: ").unwrap();
        assert!(matches!(
            StabilizerConfig::load(&broken),
            Err(TrackerError::ConfigLoad { .. })
        ));

        let invalid = dir.join("invalid.json");
        fs::write(&invalid, r#"{ "plates": { "distance_threshold": -5 } }"#).unwrap();
        assert!(matches!(
            StabilizerConfig::load(&invalid),
            Err(TrackerError::Config(_))
        ));

        let good = dir.join("good.json");
        fs::write(&good, r#"{ "pedestrians": { "max_skipped_frames": 7 } }"#).unwrap();
        let config = StabilizerConfig::load(&good).unwrap();
        assert_eq!(config.pedestrians.max_skipped_frames, 7);

        fs::remove_dir_all(&dir).unwrap();
    }
}
