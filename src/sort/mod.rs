pub mod tracker;
pub mod kalman_filter;
pub mod detection;
pub mod track;
pub mod linear_assignment;
pub mod distance_matching;
