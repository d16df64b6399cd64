use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use boxsort::{StabilizerConfig, Tracker, TrackerConfig, TrackOutput};
use chrono::prelude::*;
use clap::Parser;
use serde::Serialize;

/// Replays recorded detections through the tracker and prints the tracks of every frame.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON array of frames, each an array of [x1, y1, x2, y2] boxes
    frames: PathBuf,

    /// JSON config file; its `pedestrians` section configures the tracker
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the distance threshold
    #[arg(short, long)]
    distance_threshold: Option<f64>,

    /// Override the number of frames a track may go unmatched
    #[arg(short, long)]
    max_skipped_frames: Option<u32>,
}

#[derive(Serialize)]
struct FrameOutput<'a> {
    frame: usize,
    tracks: &'a [TrackOutput],
}

fn tracker_config(args: &Args) -> Result<TrackerConfig> {
    let mut config = match &args.config {
        Some(path) => {
            StabilizerConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?
                .pedestrians
        }
        None => TrackerConfig::default(),
    };
    if let Some(distance_threshold) = args.distance_threshold {
        config.distance_threshold = distance_threshold;
    }
    if let Some(max_skipped_frames) = args.max_skipped_frames {
        config.max_skipped_frames = max_skipped_frames;
    }
    Ok(config)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = tracker_config(&args)?;
    log::info!(
        "distance_threshold={} max_skipped_frames={}",
        config.distance_threshold,
        config.max_skipped_frames
    );
    let mut tracker = Tracker::new(config)?;

    let contents = fs::read_to_string(&args.frames)
        .with_context(|| format!("reading {}", args.frames.display()))?;
    let frames: Vec<Vec<Vec<f64>>> =
        serde_json::from_str(&contents).context("frames must be an array of arrays of boxes")?;

    let mut sum = 0;
    for (i, detections) in frames.iter().enumerate() {
        let start: DateTime<Local> = Local::now();
        let report = tracker
            .update(detections)
            .with_context(|| format!("frame {}", i))?;
        let elapsed = Local::now().timestamp_millis() - start.timestamp_millis();
        sum += elapsed;

        for failure in &report.failures {
            log::warn!("frame {}: {:?}", i, failure);
        }
        let outputs = tracker.outputs();
        println!(
            "{}",
            serde_json::to_string(&FrameOutput {
                frame: i,
                tracks: &outputs
            })?
        );
        log::debug!("frame {} took {} ms", i, elapsed);
    }
    log::info!("{} frames in {} ms", frames.len(), sum);

    Ok(())
}
