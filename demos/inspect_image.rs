//! Frame Inspection Example
//!
//! Runs one inspection engine over a set of frame images and prints each
//! verdict as JSON. The rule-based engine needs no model; pass
//! `--engine model-based --model-path <file>` to use the ONNX backend
//! (requires building with the `onnx` feature).

use clap::Parser;
use mold_inspect::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Command-line arguments for the frame inspection example
#[derive(Parser)]
#[command(name = "inspect_image")]
#[command(about = "Frame Inspection Example - runs defect detection on part images")]
struct Args {
    /// Inspection engine to run (rule-based or model-based)
    #[arg(short, long, default_value = "rule-based")]
    engine: String,

    /// Path to the ONNX model file (model-based engine only)
    #[arg(short, long)]
    model_path: Option<PathBuf>,

    /// Paths to input frame images
    #[arg(required = true)]
    frames: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_tracing();

    // Parse command-line arguments
    let args = Args::parse();

    info!("Frame Inspection Example");

    // Build the inspector selected on the command line
    let config = EngineConfig {
        kind: args.engine.parse()?,
        model_path: args.model_path.clone(),
        ..Default::default()
    };
    let inspector = build_inspector(&config)?;
    info!("Using the {} engine", inspector.kind());

    // Filter out non-existent frame files and log errors for missing ones
    let existing_frames: Vec<String> = args
        .frames
        .iter()
        .filter(|path| {
            let exists = Path::new(path).exists();
            if !exists {
                error!("Frame file not found: {}", path);
            }
            exists
        })
        .cloned()
        .collect();

    if existing_frames.is_empty() {
        error!("No valid frame files found");
        return Err("No valid frame files found".into());
    }

    info!("Processing {} frames...", existing_frames.len());
    let mut failed = 0usize;
    for frame_path in &existing_frames {
        let frame = match load_image(Path::new(frame_path)) {
            Ok(frame) => frame,
            Err(e) => {
                error!("Failed to load frame {}: {}", frame_path, e);
                continue;
            }
        };

        match inspector.inspect(&frame) {
            Ok(result) => {
                if !result.passed {
                    failed += 1;
                }
                info!(
                    "{}: {} ({} defect(s), confidence {:.3})",
                    frame_path,
                    result.verdict(),
                    result.defects.len(),
                    result.confidence
                );
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            Err(e) => {
                error!("Inspection failed for {}: {}", frame_path, e);
                return Err("Inspection failed".into());
            }
        }
    }

    info!(
        "Done: {}/{} frames failed inspection",
        failed,
        existing_frames.len()
    );
    Ok(())
}
