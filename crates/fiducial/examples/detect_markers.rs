//! Detect markers in one image and print them (with poses) as JSON.
//!
//! ```text
//! cargo run -p fiducial --example detect_markers -- config.json
//! ```
//!
//! `config.json`:
//! ```json
//! { "image_path": "frame.png", "detector": { "dictionary": "ARUCO" },
//!   "pose": { "marker_size": 0.05, "focal_length": 800.0 } }
//! ```

use std::{env, fs, time::Instant};

use fiducial::aruco::{Detector, DetectorParams};
use fiducial::detect::{detect_dynamic, detect_with_pose, MarkerPose};
use fiducial::pose::{Posit, PositParams};
use image::ImageReader;
use serde::{Deserialize, Serialize};
#[cfg(feature = "tracing")]
use tracing_log::LogTracer;
#[cfg(feature = "tracing")]
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct ExampleConfig {
    image_path: String,
    #[serde(default)]
    output_path: Option<String>,
    #[serde(default)]
    detector: DetectorParams,
    #[serde(default)]
    pose: Option<PoseConfig>,
}

#[derive(Debug, Deserialize)]
struct PoseConfig {
    marker_size: f64,
    focal_length: f64,
    #[serde(default)]
    params: PositParams,
}

#[derive(Debug, Serialize)]
struct OutputMarker {
    id: u32,
    hamming: u32,
    corners: [[f32; 2]; 4],
    pose: Option<OutputPose>,
}

#[derive(Debug, Serialize)]
struct OutputPose {
    error_deg: f64,
    rotation: [[f64; 3]; 3],
    translation: [f64; 3],
}

#[cfg(feature = "tracing")]
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    LogTracer::init()?;
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[cfg(not(feature = "tracing"))]
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    fiducial::core::init_from_env(log::LevelFilter::Info)?;
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging()?;

    let config_path = env::args()
        .nth(1)
        .ok_or("usage: detect_markers <config.json>")?;
    let config: ExampleConfig = serde_json::from_str(&fs::read_to_string(&config_path)?)?;

    let img = ImageReader::open(&config.image_path)?.decode()?;
    let mut detector = Detector::new(config.detector)?;
    let started = Instant::now();
    let found = match &config.pose {
        Some(p) => {
            let posit = Posit::with_params(p.marker_size, p.focal_length, p.params.clone())?;
            detect_with_pose(&mut detector, &img, &posit)?
        }
        None => detect_dynamic(&mut detector, &img)?
            .into_iter()
            .map(|marker| MarkerPose { marker, pose: None })
            .collect(),
    };
    log::info!(
        "{} markers in {:.2} ms",
        found.len(),
        started.elapsed().as_secs_f64() * 1e3
    );

    let out: Vec<OutputMarker> = found
        .into_iter()
        .map(|m| OutputMarker {
            id: m.marker.id,
            hamming: m.marker.hamming,
            corners: m.marker.corners.map(|c| [c.x, c.y]),
            pose: m.pose.map(|p| OutputPose {
                error_deg: p.best.error,
                rotation: std::array::from_fn(|r| std::array::from_fn(|c| p.best.rotation[(r, c)])),
                translation: [p.best.translation.x, p.best.translation.y, p.best.translation.z],
            }),
        })
        .collect();

    let json = serde_json::to_string_pretty(&out)?;
    match &config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }
    Ok(())
}
