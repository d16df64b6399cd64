use crate::error::{Result, TrackerError};

/// One frame's raw box in corner form `[x_top_left, y_top_left, x_bottom_right, y_bottom_right]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Detection {
    pub tlbr: [f64; 4],
}

impl Detection {
    pub fn new(tlbr: [f64; 4]) -> Self {
        Detection { tlbr }
    }

    /// Plate detectors report `[x, y, width, height]`.
    pub fn from_tlwh(tlwh: [f64; 4]) -> Self {
        let mut ret = tlwh;
        ret[2] += ret[0];
        ret[3] += ret[1];
        Detection { tlbr: ret }
    }

    /// Checks arity and finiteness. `index` is the detection's position in its frame.
    pub fn parse(index: usize, raw: &[f64]) -> Result<Self> {
        if raw.len() != 4 {
            return Err(TrackerError::DetectionArity {
                index,
                actual: raw.len(),
            });
        }
        let mut tlbr = [0.0; 4];
        for (i, value) in raw.iter().enumerate() {
            if !value.is_finite() {
                return Err(TrackerError::NonFiniteDetection {
                    index,
                    value: *value,
                });
            }
            tlbr[i] = *value;
        }
        Ok(Detection { tlbr })
    }

    /// Parses a whole frame, stopping at the first bad detection.
    pub fn parse_frame<D: AsRef<[f64]>>(raw: &[D]) -> Result<Vec<Self>> {
        raw.iter()
            .enumerate()
            .map(|(i, d)| Detection::parse(i, d.as_ref()))
            .collect()
    }
}
