use ndarray as np;
use np::{s, Array1, Array2};
use rulinalg::matrix::Matrix;

use super::detection::Detection;
use crate::config::FilterParams;
use crate::error::{Result, TrackerError};

/// Observed box corners.
const NDIM: usize = 4;
/// Corners plus x/y velocity.
const STATE_DIM: usize = 6;
/// Smallest accepted diagonal entry of the Cholesky factor.
const MIN_PIVOT: f64 = 1e-6;

/// Constant-velocity filter over `[x1, y1, x2, y2, vx, vy]`.
///
/// Both x corners move with `vx`, both y corners with `vy`. Only the corners are
/// measured. `predict` always starts from the last corrected state, so calling it
/// twice without a `correct` in between gives the same prediction.
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    state: Array1<f64>,
    covariance: Array2<f64>,
    motion_mat: Array2<f64>,
    update_mat: Array2<f64>,
    process_noise: Array2<f64>,
    observation_noise: Array2<f64>,
    predicted: Option<(Array1<f64>, Array2<f64>)>,
}

impl KalmanFilter {
    pub fn new(detection: &Detection, params: &FilterParams) -> Self {
        let mut state = Array1::<f64>::zeros(STATE_DIM);
        state
            .slice_mut(s![0..NDIM])
            .assign(&Array1::from(detection.tlbr.to_vec()));
        state[NDIM] = params.initial_velocity[0];
        state[NDIM + 1] = params.initial_velocity[1];

        let mut motion_mat = Array2::<f64>::eye(STATE_DIM);
        for i in 0..NDIM {
            // even rows are x coordinates, odd rows y coordinates
            motion_mat[[i, NDIM + i % 2]] = params.time_step;
        }
        let update_mat = Array2::<f64>::eye(STATE_DIM)
            .slice(s![0..NDIM, 0..STATE_DIM])
            .to_owned();

        KalmanFilter {
            state,
            covariance: Array2::<f64>::eye(STATE_DIM) * params.initial_covariance,
            motion_mat,
            update_mat,
            process_noise: Array2::<f64>::eye(STATE_DIM) * params.process_noise,
            observation_noise: Array2::<f64>::eye(NDIM) * params.observation_noise,
            predicted: None,
        }
    }

    /// Projects the corrected state one step ahead and keeps it for the next `correct`.
    pub fn predict(&mut self) -> [f64; 4] {
        let mean = self.motion_mat.dot(&self.state);
        let covariance = self.motion_mat.dot(&self.covariance).dot(&self.motion_mat.t())
            + &self.process_noise;
        let ret = corners(&mean);
        self.predicted = Some((mean, covariance));
        ret
    }

    /// Fuses `measurement` into the pending prediction.
    ///
    /// The corrected state is rounded to whole pixels (ties to even). On error the
    /// filter is left exactly as it was, pending prediction included.
    pub fn correct(&mut self, measurement: &[f64; 4]) -> Result<[f64; 4]> {
        let (mean, covariance) = self
            .predicted
            .as_ref()
            .ok_or(TrackerError::MissingPrediction)?;

        let innovation_cov = self.update_mat.dot(covariance).dot(&self.update_mat.t())
            + &self.observation_noise;
        let innovation_inv = invert_innovation(&innovation_cov)?;
        let kalman_gain = covariance.dot(&self.update_mat.t()).dot(&innovation_inv);

        let innovation = Array1::from(measurement.to_vec()) - self.update_mat.dot(mean);
        // + 0.0 turns -0.0 into 0.0
        let new_mean = (mean + &kalman_gain.dot(&innovation)).mapv(|v| v.round_ties_even() + 0.0);
        let new_covariance = covariance - &kalman_gain.dot(&self.update_mat).dot(covariance);

        self.state = new_mean;
        self.covariance = symmetrize(new_covariance);
        self.predicted = None;
        Ok(corners(&self.state))
    }

    pub fn set_observation_noise(&mut self, scale: f64) {
        self.observation_noise = Array2::<f64>::eye(NDIM) * scale;
    }

    pub fn state(&self) -> &Array1<f64> {
        &self.state
    }

    pub fn covariance(&self) -> &Array2<f64> {
        &self.covariance
    }

    pub fn has_prediction(&self) -> bool {
        self.predicted.is_some()
    }
}

fn corners(mean: &Array1<f64>) -> [f64; 4] {
    [mean[0], mean[1], mean[2], mean[3]]
}

fn symmetrize(mat: Array2<f64>) -> Array2<f64> {
    (&mat + &mat.t()) * 0.5
}

/// Inverts the innovation covariance, refusing anything that is not positive definite.
fn invert_innovation(mat: &Array2<f64>) -> Result<Array2<f64>> {
    let n = mat.nrows();
    let mat = Matrix::new(n, n, mat.iter().cloned().collect::<Vec<f64>>());
    if !is_positive_definite(&mat, n) {
        return Err(TrackerError::SingularInnovation);
    }
    let inverse = mat.inverse().map_err(|_| TrackerError::SingularInnovation)?;
    let inverse = Array2::from_shape_vec((n, n), inverse.into_vec())
        .map_err(|_| TrackerError::SingularInnovation)?;
    if inverse.iter().any(|v| !v.is_finite()) {
        return Err(TrackerError::SingularInnovation);
    }
    Ok(inverse)
}

/// rulinalg only fails on a non-finite off-diagonal entry of the factor, so the
/// diagonal is checked against a pivot floor as well.
fn is_positive_definite(mat: &Matrix<f64>, n: usize) -> bool {
    match mat.cholesky() {
        // also catches NaN
        Ok(factor) => (0..n).all(|i| factor[[i, i]] > MIN_PIVOT),
        Err(_) => false,
    }
}
