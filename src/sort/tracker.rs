use std::collections::{BTreeMap, HashSet};

use super::{
    detection::Detection,
    distance_matching::distance_cost,
    linear_assignment::min_cost_matching,
    track::{Track, TrackId, TrackOutput},
};
use crate::config::TrackerConfig;
use crate::error::{Result, TrackerError};

/// A per-track problem that did not stop the frame.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackFailure {
    /// A new track could not be filtered with its seeding detection; the detection was dropped.
    Spawn { detection: usize, error: TrackerError },
    /// A matched track could not be corrected and counted as unassigned.
    Correct {
        track_id: TrackId,
        detection: usize,
        error: TrackerError,
    },
}

/// Lifecycle transitions of one `update`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FrameReport {
    pub matched: Vec<(TrackId, usize)>,
    pub rejected: Vec<(TrackId, usize)>,
    pub spawned: Vec<TrackId>,
    pub evicted: Vec<TrackId>,
    pub failures: Vec<TrackFailure>,
}

/// Multi-object tracker: assigns each frame's boxes to persistent tracks.
///
/// Tracks are keyed by id. Ids only grow, so map order is creation order and it
/// is the row order of the cost matrix.
#[derive(Debug, Clone)]
pub struct Tracker {
    config: TrackerConfig,
    tracks: BTreeMap<TrackId, Track>,
    next_id: TrackId,
}

impl Tracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Tracker {
            config,
            tracks: BTreeMap::new(),
            next_id: 0,
        })
    }

    pub fn with_thresholds(distance_threshold: f64, max_skipped_frames: u32) -> Result<Self> {
        Tracker::new(TrackerConfig::new(distance_threshold, max_skipped_frames))
    }

    /// Consumes one frame of corner-form boxes.
    ///
    /// Every box is validated before anything changes; a bad frame returns an
    /// error and leaves the tracker as it was.
    pub fn update<D: AsRef<[f64]>>(&mut self, detections: &[D]) -> Result<FrameReport> {
        let detections = Detection::parse_frame(detections)?;
        let mut report = FrameReport::default();
        let mut dropped: HashSet<usize> = HashSet::new();
        // detections that already seeded a track this frame
        let mut seeded: HashSet<usize> = HashSet::new();

        if self.tracks.is_empty() {
            for (i, detection) in detections.iter().enumerate() {
                match self._initiate_track(i, detection, &mut report) {
                    Some(_) => seeded.insert(i),
                    None => dropped.insert(i),
                };
            }
        }

        let mut assignment = self._match(&detections, &mut report)?;

        for (&track_id, &detection_idx) in assignment.clone().iter() {
            let Some(track) = self.tracks.get_mut(&track_id) else {
                continue;
            };
            track.predict();
            match track.update(&detections[detection_idx]) {
                Ok(()) => report.matched.push((track_id, detection_idx)),
                Err(error) => {
                    log::warn!(
                        "track {} could not be corrected with detection {}: {}",
                        track_id,
                        detection_idx,
                        error
                    );
                    assignment.remove(&track_id);
                    if seeded.contains(&detection_idx) {
                        dropped.insert(detection_idx);
                    }
                    report.failures.push(TrackFailure::Correct {
                        track_id,
                        detection: detection_idx,
                        error,
                    });
                }
            }
        }

        for (track_id, track) in self.tracks.iter_mut() {
            if !assignment.contains_key(track_id) {
                track.mark_missed();
                track.predict();
            }
        }

        // collect first, then drop from both collections together
        let max_skipped_frames = self.config.max_skipped_frames;
        let evicted: Vec<TrackId> = self
            .tracks
            .values()
            .filter(|t| t.is_deleted(max_skipped_frames))
            .map(|t| t.track_id)
            .collect();
        self.tracks.retain(|_, t| !t.is_deleted(max_skipped_frames));
        assignment.retain(|track_id, _| !evicted.contains(track_id));
        for track_id in &evicted {
            log::info!("track {} evicted", track_id);
        }
        report.evicted = evicted;

        let claimed: HashSet<usize> = assignment.values().copied().collect();
        for (i, detection) in detections.iter().enumerate() {
            if claimed.contains(&i) || dropped.contains(&i) {
                continue;
            }
            if let Some(track_id) = self._initiate_track(i, detection, &mut report) {
                if let Some(track) = self.tracks.get_mut(&track_id) {
                    track.predict();
                }
            }
        }

        log::debug!(
            "frame: {} detections, {} matched, {} rejected, {} spawned, {} evicted, {} live",
            detections.len(),
            report.matched.len(),
            report.rejected.len(),
            report.spawned.len(),
            report.evicted.len(),
            self.tracks.len()
        );
        Ok(report)
    }

    /// Keeps every track where it is for one frame.
    ///
    /// Each track is corrected with its own last box under zero observation
    /// noise, which pins the box and resets its unseen counter.
    pub fn hold(&mut self) -> Result<FrameReport> {
        let measurements: Vec<[f64; 4]> = self.tracks.values().map(|t| t.correction()).collect();
        for track in self.tracks.values_mut() {
            track.set_observation_noise(0.0);
        }
        let report = self.update(&measurements);
        let noise = self.config.filter.observation_noise;
        for track in self.tracks.values_mut() {
            track.set_observation_noise(noise);
        }
        report
    }

    /// Optimal gated assignment keyed by track id.
    fn _match(
        &self,
        detections: &[Detection],
        report: &mut FrameReport,
    ) -> Result<BTreeMap<TrackId, usize>> {
        let track_ids: Vec<TrackId> = self.tracks.keys().copied().collect();
        let predictions: Vec<[f64; 4]> = self.tracks.values().map(|t| t.prediction()).collect();
        let cost_matrix = distance_cost(&predictions, detections);
        log::trace!("cost matrix: {:?}", cost_matrix);

        let matching = min_cost_matching(cost_matrix.view(), self.config.distance_threshold)?;
        report.rejected = matching
            .rejected
            .iter()
            .map(|&(row, col)| (track_ids[row], col))
            .collect();

        Ok(matching
            .rows
            .iter()
            .enumerate()
            .filter_map(|(row, col)| col.map(|col| (track_ids[row], col)))
            .collect())
    }

    fn _initiate_track(
        &mut self,
        index: usize,
        detection: &Detection,
        report: &mut FrameReport,
    ) -> Option<TrackId> {
        match Track::new(detection, self.next_id, &self.config.filter) {
            Ok(track) => {
                let track_id = track.track_id;
                log::info!("track {} started at {:?}", track_id, detection.tlbr);
                self.tracks.insert(track_id, track);
                self.next_id += 1;
                report.spawned.push(track_id);
                Some(track_id)
            }
            Err(error) => {
                log::warn!("detection {} could not start a track: {}", index, error);
                report.failures.push(TrackFailure::Spawn {
                    detection: index,
                    error,
                });
                None
            }
        }
    }

    /// Drops every track and restarts ids from zero.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.next_id = 0;
    }

    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn track(&self, track_id: TrackId) -> Option<&Track> {
        self.tracks.get(&track_id)
    }

    pub fn outputs(&self) -> Vec<TrackOutput> {
        self.tracks.values().map(Track::to_output).collect()
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }
}
