//! Frame-to-frame bounding box tracking.
//!
//! Each frame's detected boxes (corner form) are matched to persistent tracks with
//! an exact minimum-cost assignment over predicted boxes, then smoothed by one
//! constant-velocity Kalman filter per track. Tracks survive a configurable number
//! of missed frames before they are dropped.
//!
//! ```rust,ignore
//! use boxsort::Tracker;
//!
//! let mut tracker = Tracker::with_thresholds(150.0, 30)?;
//! tracker.update(&[[0.0, 0.0, 10.0, 10.0]])?;
//! for output in tracker.outputs() {
//!     println!("{} {:?}", output.id, output.bbox);
//! }
//! ```

pub mod config;
pub mod error;
pub mod sort;
pub mod stabilizer;

#[cfg(test)]
mod test;

pub use config::{FilterParams, StabilizerConfig, TrackerConfig};
pub use error::{Result, TrackerError};
pub use sort::detection::Detection;
pub use sort::kalman_filter::KalmanFilter;
pub use sort::track::{Track, TrackId, TrackOutput};
pub use sort::tracker::{FrameReport, TrackFailure, Tracker};
pub use stabilizer::Stabilizer;
