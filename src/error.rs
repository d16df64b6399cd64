//! Error types for the tracking core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TrackerError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    #[error("detection {index} has {actual} components, expected 4")]
    DetectionArity { index: usize, actual: usize },

    #[error("detection {index} has non-finite component {value}")]
    NonFiniteDetection { index: usize, value: f64 },

    #[error("innovation covariance is singular")]
    SingularInnovation,

    #[error("correct called without a pending prediction")]
    MissingPrediction,

    #[error("assignment failed: {0}")]
    Assignment(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("cannot load config {path}: {reason}")]
    ConfigLoad { path: String, reason: String },
}

impl TrackerError {
    pub fn assignment<S: Into<String>>(msg: S) -> Self {
        Self::Assignment(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }
}
