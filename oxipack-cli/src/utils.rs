//! Utility functions for the CLI.

use glob::Pattern;
use indicatif::{ProgressBar, ProgressStyle};
use oxipack_core::Entry;
use std::path::{Component, Path, PathBuf};

/// A file queued for packing: (entry name, path on disk).
pub type PackInput = (String, PathBuf);

/// Create a progress bar with standard styling.
pub fn create_progress_bar(len: u64, enable: bool) -> ProgressBar {
    if !enable {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len);
    let style = ProgressStyle::default_bar()
        .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▓▒░ ");
    pb.set_style(style);
    pb
}

/// Check if a name matches the filter patterns.
/// - If include patterns are specified, the name must match at least one
/// - If exclude patterns are specified, the name must not match any
pub fn matches_filters(name: &str, include: &[String], exclude: &[String]) -> bool {
    let matches = |pattern: &String| Pattern::new(pattern).is_ok_and(|p| p.matches(name));

    if exclude.iter().any(matches) {
        return false;
    }
    include.is_empty() || include.iter().any(matches)
}

/// Filter entries based on include/exclude patterns.
pub fn filter_entries(entries: Vec<Entry>, include: &[String], exclude: &[String]) -> Vec<Entry> {
    if include.is_empty() && exclude.is_empty() {
        return entries;
    }

    entries
        .into_iter()
        .filter(|e| matches_filters(&e.name, include, exclude))
        .collect()
}

/// Print entries, one name per line or as a table.
pub fn print_entries(entries: &[Entry], verbose: bool) {
    if verbose {
        println!(
            "{:>10} {:>10} {:>8} {:>5}  Name",
            "Offset", "Length", "CRC32", "Chunk"
        );
        println!("{}", "-".repeat(60));

        let mut total = 0u64;
        for entry in entries {
            println!(
                "{:>10} {:>10} {:08x} {:>5}  {}",
                entry.offset, entry.length, entry.checksum, entry.chunk, entry.name
            );
            total += u64::from(entry.length);
        }

        println!("{}", "-".repeat(60));
        println!("{:>10} {:>10}                 {} files", "", total, entries.len());
    } else {
        for entry in entries {
            println!("{}", entry.name);
        }
    }
}

/// Entry name for a file found under the command-line argument `root`.
///
/// By default the name is the final path component, with both `/` and `\`
/// treated as separators. With `keep_paths` the name is the path relative to
/// the parent of `root`, joined with `/`; only normal components are kept,
/// so `./a.txt` is stored as `a.txt`.
pub fn entry_name_for_path(path: &Path, root: &Path, keep_paths: bool) -> Option<String> {
    let name = if keep_paths {
        let base = root.parent().unwrap_or(root);
        path.strip_prefix(base)
            .unwrap_or(path)
            .components()
            .filter_map(|c| match c {
                Component::Normal(part) => Some(part.to_string_lossy().replace('\\', "/")),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/")
    } else {
        path.to_string_lossy()
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .to_string()
    };

    (!name.is_empty()).then_some(name)
}

/// Expand command-line paths into files to pack, walking directories.
///
/// Directory contents are visited in name order so the same tree always
/// produces the same pack.
pub fn collect_inputs(paths: &[PathBuf], keep_paths: bool) -> std::io::Result<Vec<PackInput>> {
    let mut inputs = Vec::new();
    for root in paths {
        collect_path(root, root, keep_paths, &mut inputs)?;
    }
    Ok(inputs)
}

fn collect_path(
    path: &Path,
    root: &Path,
    keep_paths: bool,
    inputs: &mut Vec<PackInput>,
) -> std::io::Result<()> {
    if path.is_dir() {
        let mut children = std::fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        children.sort();
        for child in children {
            collect_path(&child, root, keep_paths, inputs)?;
        }
    } else if let Some(name) = entry_name_for_path(path, root, keep_paths) {
        inputs.push((name, path.to_path_buf()));
    }
    Ok(())
}

/// Human-readable byte count.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
