//! Standalone ghost replay exporter
//!
//! Reads two lap files and prints the ghost replay JSON to stdout, with a
//! short summary on stderr.
//!
//! Usage:
//!   ghost_export <baseline.csv> <comparison.csv> [--key-pairing]
//!
//! Example:
//!   ghost_export hotlap.csv rival.csv > ghost.json

use simsplit_core::{export_ghost, AnalysisConfig, Lap, Pairing};
use std::env;
use std::path::PathBuf;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <baseline.csv> <comparison.csv> [--key-pairing]", args[0]);
        std::process::exit(1);
    }

    let pairing = if args.iter().any(|a| a == "--key-pairing") {
        Pairing::Key
    } else {
        Pairing::Position
    };
    let config = AnalysisConfig::new().with_pairing(pairing);

    let mut laps = Vec::new();
    for path in [PathBuf::from(&args[1]), PathBuf::from(&args[2])] {
        match Lap::from_path(&path) {
            Ok(lap) => laps.push(lap),
            Err(e) => {
                eprintln!("Failed to read {:?}: {}", path, e);
                std::process::exit(1);
            }
        }
    }
    let (a, b) = (&laps[0], &laps[1]);

    let replay = match export_ghost(a.table(), a.label(), b.table(), b.label(), &config) {
        Ok(replay) => replay,
        Err(e) => {
            eprintln!("Ghost export failed: {}", e);
            std::process::exit(1);
        }
    };

    eprintln!("=== GHOST REPLAY ===");
    eprintln!("{} ({} samples) vs {} ({} samples)", a.label(), a.len(), b.label(), b.len());
    eprintln!("Pairing: {:?}", pairing);
    eprintln!("Frames: {}", replay.len());

    match replay.to_json() {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Serialization failed: {}", e);
            std::process::exit(1);
        }
    }
}
