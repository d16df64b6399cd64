use crate::config::StabilizerConfig;
use crate::error::Result;
use crate::sort::{
    detection::Detection,
    track::TrackOutput,
    tracker::Tracker,
};

/// One video stream's tracking session: pedestrians and license plates.
///
/// All state lives here, so independent streams each get their own session.
#[derive(Debug, Clone)]
pub struct Stabilizer {
    pedestrians: Tracker,
    plates: Tracker,
}

impl Stabilizer {
    pub fn new(config: StabilizerConfig) -> Result<Self> {
        Ok(Stabilizer {
            pedestrians: Tracker::new(config.pedestrians)?,
            plates: Tracker::new(config.plates)?,
        })
    }

    /// Pedestrian boxes in corner form. Frames without detections leave the tracks alone.
    pub fn pedestrians(&mut self, boxes: &[[f64; 4]]) -> Result<Vec<TrackOutput>> {
        if !boxes.is_empty() {
            self.pedestrians.update(boxes)?;
        }
        Ok(self.pedestrians.outputs())
    }

    /// Plate boxes as `[x, y, width, height]`.
    ///
    /// A frame without plates holds every plate box where it was, so a plate
    /// stays covered while the detector briefly loses it.
    pub fn plates(&mut self, boxes: &[[f64; 4]]) -> Result<Vec<TrackOutput>> {
        if boxes.is_empty() {
            self.plates.hold()?;
        } else {
            let corners: Vec<[f64; 4]> = boxes
                .iter()
                .map(|b| Detection::from_tlwh(*b).tlbr)
                .collect();
            self.plates.update(&corners)?;
        }
        Ok(self.plates.outputs())
    }

    pub fn pedestrian_tracker(&self) -> &Tracker {
        &self.pedestrians
    }

    pub fn plate_tracker(&self) -> &Tracker {
        &self.plates
    }

    pub fn reset(&mut self) {
        self.pedestrians.reset();
        self.plates.reset();
    }
}
