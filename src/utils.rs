use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Every entry of `dir`, sorted by file name. Nothing is filtered out here,
/// entries that are not images get skipped when they fail to decode.
pub fn list_entries(dir: impl AsRef<Path>) -> io::Result<Vec<PathBuf>> {
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .collect();
    entries.sort();
    Ok(entries)
}

/// Plate text made safe to embed in a file name.
pub fn sanitize_plate(plate: &str) -> String {
    let cleaned: String = plate.trim().chars().map(|c| {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            c
        } else {
            '_'
        }
    }).collect();
    if cleaned.is_empty() {
        String::from("unknown")
    } else {
        cleaned
    }
}

/// `<output_dir>/vehicle_with_<plate>.jpg`
pub fn output_path(output_dir: impl AsRef<Path>, plate: &str) -> PathBuf {
    output_dir.as_ref().join(format!("vehicle_with_{}.jpg", sanitize_plate(plate)))
}
