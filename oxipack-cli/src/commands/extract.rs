//! Extract command implementation.

use crate::utils::{create_progress_bar, matches_filters};
use dialoguer::Confirm;
use oxipack_archive::{PackConfig, PackReader};
use oxipack_core::{Entry, ErrorKind, PackError, PackSource};
use std::fs::File;
use std::io::{BufWriter, IsTerminal, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::warn;

/// Options for extracting entries.
pub struct ExtractOptions<'a> {
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub verify: bool,
    pub force: bool,
    pub verbose: bool,
    pub progress: bool,
}

/// Entries that failed their checksum during extraction.
///
/// Every other selected entry was still extracted.
#[derive(Debug, thiserror::Error)]
#[error("{} of {total} entries failed verification: {}", names.len(), names.join(", "))]
pub struct ExtractFailed {
    pub names: Vec<String>,
    pub total: usize,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct ExtractSummary {
    extracted: usize,
    skipped: usize,
    failed: Vec<String>,
}

pub fn cmd_extract(
    archive: &Path,
    output: &Path,
    names: &[String],
    options: &ExtractOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = PackConfig::new().with_verify(options.verify);
    let reader = PackReader::with_config(File::open(archive)?, config)?;
    let index = reader.index()?;

    for name in names {
        if !index.contains(name) {
            return Err(PackError::entry_not_found(name.as_str()).into());
        }
    }

    let to_extract: Vec<&Entry> = index
        .iter()
        .filter(|e| names.is_empty() || names.contains(&e.name))
        .filter(|e| matches_filters(&e.name, options.include, options.exclude))
        .collect();

    println!("Extracting {} to {}", archive.display(), output.display());

    let interactive = std::io::stdin().is_terminal();
    let summary = extract_entries(&reader, &to_extract, output, options, interactive)?;

    println!(
        "Extracted {} files, skipped {}, failed {}",
        summary.extracted,
        summary.skipped,
        summary.failed.len()
    );
    if !summary.failed.is_empty() {
        return Err(ExtractFailed {
            names: summary.failed,
            total: to_extract.len(),
        }
        .into());
    }
    Ok(())
}

fn extract_entries<S: PackSource>(
    reader: &PackReader<S>,
    entries: &[&Entry],
    output: &Path,
    options: &ExtractOptions,
    interactive: bool,
) -> Result<ExtractSummary, Box<dyn std::error::Error>> {
    let pb = create_progress_bar(entries.len() as u64, options.progress);
    pb.set_message("files");

    let mut summary = ExtractSummary::default();
    for &entry in entries {
        pb.inc(1);
        let relative = entry.sanitized_name();
        if relative.is_empty() {
            warn!("Skipping entry with unusable name '{}'", entry.name);
            summary.skipped += 1;
            continue;
        }

        let file_path = output.join(&relative);
        if file_path.exists() && !options.force && !confirm_overwrite(&file_path, interactive)? {
            pb.println(format!("  Skipped: {}", entry.name));
            summary.skipped += 1;
            continue;
        }
        let dir = file_path.parent().unwrap_or(output);
        std::fs::create_dir_all(dir)?;

        // The target is only replaced once the whole entry has been written
        // and, with --verify, matched its checksum.
        let mut tmp = NamedTempFile::new_in(dir)?;
        let result = {
            let mut writer = BufWriter::new(tmp.as_file_mut());
            reader
                .extract_to(entry, &mut writer, options.verify)
                .and_then(|n| writer.flush().map(|()| n).map_err(PackError::from))
        };
        match result {
            Ok(_) => {
                tmp.persist(&file_path).map_err(|e| e.error)?;
            }
            Err(e) if e.kind() == ErrorKind::Integrity => {
                warn!("{}", e);
                pb.println(format!("  FAILED: {} - {}", entry.name, e));
                summary.failed.push(entry.name.clone());
                continue;
            }
            Err(e) => {
                pb.abandon();
                return Err(e.into());
            }
        }

        if options.verbose {
            pb.println(format!(
                "  Extracted: {} ({} bytes)",
                entry.name, entry.length
            ));
        }
        summary.extracted += 1;
    }
    pb.finish_with_message("Done");
    Ok(summary)
}

/// Ask before replacing an existing file; without a terminal the answer is no.
fn confirm_overwrite(path: &Path, interactive: bool) -> Result<bool, Box<dyn std::error::Error>> {
    if !interactive {
        return Ok(false);
    }
    let answer = Confirm::new()
        .with_prompt(format!("Overwrite {}?", path.display()))
        .default(false)
        .interact()?;
    Ok(answer)
}
