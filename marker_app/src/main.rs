//! Intersection marker demo
//!
//! Slides one cube through another along +X and prints which faces of each
//! cube the marker reports on every frame. One frame is repeated unchanged to
//! show the memoized result being reused, and one frame hides cube B.
//!
//! Usage: `marker_demo [config.toml|config.ron]`

use marker_engine::prelude::*;
use thiserror::Error;

/// Demo application errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration could not be loaded
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Marker evaluation failed
    #[error("Intersection error: {0}")]
    Intersect(#[from] IntersectError),
}

/// One scripted frame of the demo
struct Frame {
    offset_x: f64,
    b_visible: bool,
}

const FRAMES: &[Frame] = &[
    Frame { offset_x: 2.0, b_visible: true },
    Frame { offset_x: 1.0, b_visible: true },
    Frame { offset_x: 0.5, b_visible: true },
    Frame { offset_x: 0.5, b_visible: true },
    Frame { offset_x: 0.5, b_visible: false },
    Frame { offset_x: 0.25, b_visible: true },
    Frame { offset_x: -1.5, b_visible: true },
];

fn load_config() -> Result<MarkerConfig, AppError> {
    match std::env::args().nth(1) {
        Some(path) => {
            log::info!("Loading marker config from {path}");
            Ok(MarkerConfig::load_from_file(path)?)
        }
        None => Ok(MarkerConfig::default()),
    }
}

fn format_faces(faces: &std::collections::BTreeSet<usize>) -> String {
    if faces.is_empty() {
        return "-".to_string();
    }
    faces.iter().map(ToString::to_string).collect::<Vec<_>>().join(",")
}

fn run() -> Result<(), AppError> {
    let config = load_config()?;
    log::info!(
        "Using {} index (max {} triangles per node, depth {})",
        config.index.kind,
        config.index.max_triangles_per_node,
        config.index.max_depth
    );

    let cube_a = Mesh::cube(Vec3::zeros(), 1.0);
    let cube_b = Mesh::cube(Vec3::zeros(), 1.0);
    let mut marker = IntersectionMarker::new(config)?;

    println!("{:>5} {:>7} {:>10} {:>14} {:>14} {:>10}", "frame", "x", "recomputed", "faces A", "faces B", "highlights");
    for (index, frame) in FRAMES.iter().enumerate() {
        let transform_b = Transform::from_translation(Vec3::new(frame.offset_x, 0.0, 0.0)).to_matrix();
        let output = marker.evaluate(
            MarkerInput::new(&cube_a, Mat4::identity()),
            MarkerInput::new(&cube_b, transform_b).with_visibility(frame.b_visible),
        )?;

        for diagnostic in &output.diagnostics {
            log::warn!("Frame {index}: {diagnostic}");
        }

        let faces_a = output.face_ids_a();
        let faces_b = output.face_ids_b();
        let (highlights_a, _) = marker.highlights(&cube_a, &Mat4::identity(), faces_a.iter().copied());
        let (highlights_b, _) = marker.highlights(&cube_b, &transform_b, faces_b.iter().copied());

        println!(
            "{:>5} {:>7.2} {:>10} {:>14} {:>14} {:>10}",
            index,
            frame.offset_x,
            output.recomputed,
            format_faces(&faces_a),
            format_faces(&faces_b),
            highlights_a.len() + highlights_b.len()
        );
    }

    log::info!("Indices rebuilt {} times over {} frames", marker.rebuild_count(), FRAMES.len());
    Ok(())
}

fn main() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    println!("=== Intersection Marker Demo ===");
    println!("Cube B slides along +X through cube A");
    println!();

    if let Err(e) = run() {
        log::error!("{e}");
        std::process::exit(1);
    }
}
