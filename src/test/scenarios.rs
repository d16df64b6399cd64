//! Multi-frame behaviour of the tracker.

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::sort::track::TrackOutput;
use crate::sort::tracker::Tracker;

const EMPTY: [[f64; 4]; 0] = [];

fn shifted(base: [f64; 4], offset: f64) -> [f64; 4] {
    [base[0] + offset, base[1] + offset, base[2] + offset, base[3] + offset]
}

#[test]
fn bootstrap_single_detection() {
    let mut tracker = Tracker::with_thresholds(150.0, 30).unwrap();
    tracker.update(&[[0.0, 0.0, 10.0, 10.0]]).unwrap();
    assert_eq!(
        tracker.outputs(),
        vec![TrackOutput {
            id: 0,
            bbox: [0.0, 0.0, 10.0, 10.0],
            skipped_frames: 0
        }]
    );
}

#[test]
fn track_survives_exactly_max_skipped_frames() {
    let max_skipped_frames = 3;
    let mut tracker = Tracker::with_thresholds(150.0, max_skipped_frames).unwrap();
    tracker.update(&[[0.0, 0.0, 10.0, 10.0]]).unwrap();

    for skipped in 1..=max_skipped_frames {
        let report = tracker.update(&EMPTY).unwrap();
        assert!(report.evicted.is_empty());
        let track = tracker.track(0).unwrap();
        assert_eq!(track.skipped_frames, skipped);
        assert_eq!(track.correction(), [0.0, 0.0, 10.0, 10.0]);
    }

    let report = tracker.update(&EMPTY).unwrap();
    assert_eq!(report.evicted, vec![0]);
    assert!(tracker.is_empty());
}

#[test]
fn zero_max_skipped_frames_drops_on_first_miss() {
    let mut tracker = Tracker::with_thresholds(150.0, 0).unwrap();
    tracker.update(&[[0.0, 0.0, 10.0, 10.0]]).unwrap();
    let report = tracker.update(&EMPTY).unwrap();
    assert_eq!(report.evicted, vec![0]);
}

#[test]
fn far_detection_spawns_instead_of_stealing() {
    let mut tracker = Tracker::with_thresholds(10.0, 5).unwrap();
    tracker.update(&[[0.0, 0.0, 10.0, 10.0]]).unwrap();
    let report = tracker.update(&[[500.0, 500.0, 510.0, 510.0]]).unwrap();

    assert_eq!(report.rejected, vec![(0, 0)]);
    assert!(report.matched.is_empty());
    assert_eq!(report.spawned, vec![1]);
    assert_eq!(
        tracker.outputs(),
        vec![
            TrackOutput {
                id: 0,
                bbox: [0.0, 0.0, 10.0, 10.0],
                skipped_frames: 1
            },
            TrackOutput {
                id: 1,
                bbox: [500.0, 500.0, 510.0, 510.0],
                skipped_frames: 0
            },
        ]
    );
}

#[test]
fn stationary_detection_reaches_fixed_point() {
    let mut tracker = Tracker::with_thresholds(150.0, 30).unwrap();
    tracker.update(&[[100.0, 100.0, 140.0, 180.0]]).unwrap();

    let target = [110.0, 104.0, 150.0, 184.0];
    let mut converged_at = None;
    for frame in 0..20 {
        tracker.update(&[target]).unwrap();
        let bbox = tracker.outputs()[0].bbox;
        if bbox == target && converged_at.is_none() {
            converged_at = Some(frame);
        }
        if converged_at.is_some() {
            assert_eq!(bbox, target);
        }
    }
    assert!(converged_at.unwrap() < 10);
    assert_eq!(tracker.len(), 1);
}

#[test]
fn optimal_assignment_not_nearest_neighbour() {
    // costs are |offset| differences: [[1, 2], [2, 5]]; greedy row-wise would take 1 + 5
    let base = [100.0, 100.0, 120.0, 140.0];
    let mut tracker = Tracker::with_thresholds(150.0, 30).unwrap();
    tracker
        .update(&[shifted(base, 0.0), shifted(base, 3.0)])
        .unwrap();

    let report = tracker
        .update(&[shifted(base, 1.0), shifted(base, -2.0)])
        .unwrap();
    assert_eq!(report.matched, vec![(0, 1), (1, 0)]);
    assert!(report.spawned.is_empty());
    assert_eq!(tracker.outputs()[0].bbox, [99.0, 99.0, 119.0, 139.0]);
    assert_eq!(tracker.outputs()[1].bbox, [102.0, 102.0, 122.0, 142.0]);
}

#[test]
fn more_detections_than_tracks() {
    let mut tracker = Tracker::with_thresholds(150.0, 30).unwrap();
    tracker.update(&[[0.0, 0.0, 10.0, 10.0]]).unwrap();
    let report = tracker
        .update(&[[300.0, 0.0, 310.0, 10.0], [1.0, 0.0, 11.0, 10.0]])
        .unwrap();
    assert_eq!(report.matched, vec![(0, 1)]);
    assert_eq!(report.spawned, vec![1]);
    assert_eq!(tracker.len(), 2);
}

#[test]
fn ids_are_never_reused() {
    let mut tracker = Tracker::with_thresholds(10.0, 0).unwrap();
    let mut seen = vec![];
    for frame in 0..10 {
        // jump far every frame: old track dies, new one is born
        let x = frame as f64 * 1000.0;
        let report = tracker.update(&[[x, 0.0, x + 10.0, 10.0]]).unwrap();
        seen.extend(report.spawned);
    }
    assert_eq!(seen, (0..10).collect::<Vec<u64>>());
    assert_eq!(tracker.len(), 1);
}

#[test]
fn identical_runs_are_deterministic() {
    let mut rng = StdRng::seed_from_u64(42);
    let frames: Vec<Vec<[f64; 4]>> = (0..60)
        .map(|_| {
            let n = rng.gen_range(0..6);
            (0..n)
                .map(|_| {
                    let x = rng.gen_range(0.0..600.0);
                    let y = rng.gen_range(0.0..400.0);
                    let w = rng.gen_range(5.0..80.0);
                    let h = rng.gen_range(5.0..120.0);
                    [x, y, x + w, y + h]
                })
                .collect()
        })
        .collect();

    let mut a = Tracker::with_thresholds(80.0, 4).unwrap();
    let mut b = Tracker::with_thresholds(80.0, 4).unwrap();
    for frame in &frames {
        let report_a = a.update(frame).unwrap();
        let report_b = b.update(frame).unwrap();
        assert_eq!(report_a, report_b);
        assert_eq!(a.outputs(), b.outputs());
    }
}

#[test]
fn dropped_frame_is_an_empty_frame() {
    let mut tracker = Tracker::with_thresholds(150.0, 2).unwrap();
    let det = [[40.0, 40.0, 80.0, 120.0]];
    tracker.update(&det).unwrap();
    tracker.update(&EMPTY).unwrap();
    tracker.update(&EMPTY).unwrap();
    let report = tracker.update(&det).unwrap();
    assert_eq!(report.matched, vec![(0, 0)]);
    assert_eq!(tracker.outputs()[0].skipped_frames, 0);
}
