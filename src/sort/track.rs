use serde::Serialize;

use super::{detection::Detection, kalman_filter::KalmanFilter};
use crate::config::FilterParams;
use crate::error::Result;

pub type TrackId = u64;

/// One followed object: its filter, its id and how long it has gone unseen.
#[derive(Debug, Clone)]
pub struct Track {
    pub track_id: TrackId,
    pub skipped_frames: u32,
    kf: KalmanFilter,
    prediction: [f64; 4],
    correction: [f64; 4],
}

/// What callers poll after every frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackOutput {
    pub id: TrackId,
    pub bbox: [f64; 4],
    pub skipped_frames: u32,
}

impl Track {
    /// Seeds a filter with `detection` and filters it once with that same detection.
    ///
    /// The stored prediction starts out as the detection itself, so a fresh track
    /// costs nothing against the box that created it.
    pub fn new(detection: &Detection, track_id: TrackId, params: &FilterParams) -> Result<Self> {
        let mut kf = KalmanFilter::new(detection, params);
        kf.predict();
        let correction = kf.correct(&detection.tlbr)?;
        Ok(Track {
            track_id,
            skipped_frames: 0,
            kf,
            prediction: detection.tlbr,
            correction,
        })
    }

    pub fn predict(&mut self) {
        self.prediction = self.kf.predict();
    }

    /// Corrects with a matched detection. The unseen counter is only reset on success.
    pub fn update(&mut self, detection: &Detection) -> Result<()> {
        self.correction = self.kf.correct(&detection.tlbr)?;
        self.skipped_frames = 0;
        Ok(())
    }

    pub fn mark_missed(&mut self) {
        self.skipped_frames = self.skipped_frames.saturating_add(1);
    }

    pub fn is_deleted(&self, max_skipped_frames: u32) -> bool {
        self.skipped_frames > max_skipped_frames
    }

    pub fn set_observation_noise(&mut self, scale: f64) {
        self.kf.set_observation_noise(scale);
    }

    pub fn prediction(&self) -> [f64; 4] {
        self.prediction
    }

    pub fn correction(&self) -> [f64; 4] {
        self.correction
    }

    pub fn kalman_filter(&self) -> &KalmanFilter {
        &self.kf
    }

    pub fn to_output(&self) -> TrackOutput {
        TrackOutput {
            id: self.track_id,
            bbox: self.correction,
            skipped_frames: self.skipped_frames,
        }
    }
}
