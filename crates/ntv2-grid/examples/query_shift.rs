//! Example: Shift a coordinate with an NTv2 grid file.
//!
//! Usage: cargo run --example query_shift -- <lat> <lon> <grid.gsb> [--lazy]

use ntv2_grid::{GridShift, GridShiftFile, LoadOptions};
use std::env;
use std::time::Instant;

fn main() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 4 {
        eprintln!("Usage: {} <lat> <lon> <grid.gsb> [--lazy]", args[0]);
        eprintln!("Example: {} 45.5 -73.6 ./NTv2_0.gsb", args[0]);
        std::process::exit(1);
    }

    let lat: f64 = args[1].parse().expect("Invalid latitude");
    let lon: f64 = args[2].parse().expect("Invalid longitude");
    let path = &args[3];
    let options = if args.iter().any(|a| a == "--lazy") {
        LoadOptions::file_backed()
    } else {
        LoadOptions::default()
    };

    println!("Loading {}...", path);
    let start = Instant::now();
    let file = GridShiftFile::open(path, options).expect("Failed to open grid file");
    println!(
        "Loaded {} sub-grids ({} -> {}) in {:.3}s",
        file.sub_grid_count(),
        file.from_system(),
        file.to_system(),
        start.elapsed().as_secs_f64()
    );

    let mut shift = GridShift::from_degrees(lat, lon);
    let query_start = Instant::now();
    match file.shift_forward(&mut shift) {
        Ok(true) => {
            println!(
                "Shifted: {:.9}, {:.9} via {} ({:.6}s)",
                shift.shifted_lat_degrees(),
                shift.shifted_lon_degrees(),
                shift.sub_grid_name().unwrap_or("?"),
                query_start.elapsed().as_secs_f64()
            );
        }
        Ok(false) => {
            eprintln!("Coordinate ({}, {}) is outside the grid", lat, lon);
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
