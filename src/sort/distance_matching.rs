use ndarray::Array2;

use super::detection::Detection;

/// Half the Euclidean distance between two boxes taken as flat 4-vectors.
///
/// Translation and size change are mixed into one number; kept that way so
/// thresholds tuned against it keep their meaning. Accumulated with `hypot`, so
/// far-apart boxes do not overflow; a difference that itself overflows gives `inf`.
pub fn box_distance(a: &[f64; 4], b: &[f64; 4]) -> f64 {
    0.5 * a.iter().zip(b).fold(0.0_f64, |acc, (x, y)| acc.hypot(x - y))
}

/// Rows follow `predictions`, columns follow `detections`.
pub fn distance_cost(predictions: &[[f64; 4]], detections: &[Detection]) -> Array2<f64> {
    Array2::from_shape_fn((predictions.len(), detections.len()), |(row, col)| {
        box_distance(&predictions[row], &detections[col].tlbr)
    })
}
