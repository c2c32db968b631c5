use poi_route_optimizer::visualization::Visualizer;
use std::fs;
use std::path::PathBuf;

/// Convert every `.svg` in a directory (default `results`) to PNG.
fn main() {
    env_logger::init();

    let dir = std::env::args().nth(1).map(PathBuf::from).unwrap_or_else(|| PathBuf::from("results"));
    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Cannot read {:?}: {}", dir, e);
            std::process::exit(1);
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().map_or(true, |ext| ext != "svg") {
            continue;
        }
        let svg = match fs::read_to_string(&path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Failed to read {:?}: {}", path, e);
                continue;
            }
        };
        let out = path.with_extension("png");
        match Visualizer::svg_to_png_file(&svg, &out) {
            Ok(()) => println!("Converted {:?} -> {:?}", path, out),
            Err(e) => eprintln!("Failed to convert {:?}: {}", path, e),
        }
    }
}
