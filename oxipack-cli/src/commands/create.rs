//! Create command implementation.

use crate::utils::{collect_inputs, create_progress_bar, format_size, matches_filters};
use oxipack_archive::{PackBuilder, PackConfig};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Options for creating a pack.
pub struct CreateOptions<'a> {
    pub keep_paths: bool,
    pub max_name_len: usize,
    pub include: &'a [String],
    pub exclude: &'a [String],
    pub verbose: bool,
    pub progress: bool,
}

pub fn cmd_create(
    archive: &Path,
    paths: &[PathBuf],
    options: &CreateOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let inputs: Vec<_> = collect_inputs(paths, options.keep_paths)?
        .into_iter()
        .filter(|(name, _)| matches_filters(name, options.include, options.exclude))
        .collect();
    debug!("Collected {} input files", inputs.len());

    println!("Creating pack: {}", archive.display());

    let config = PackConfig::new().with_max_name_len(options.max_name_len);
    let mut builder = PackBuilder::with_config(config);

    let pb = create_progress_bar(inputs.len() as u64, options.progress);
    pb.set_message("files");

    let mut seen: HashMap<&str, &Path> = HashMap::new();
    for (name, path) in &inputs {
        if let Some(first) = seen.insert(name, path) {
            pb.abandon();
            return Err(format!(
                "{} and {} would both be stored as '{}' (try --keep-paths)",
                first.display(),
                path.display(),
                name
            )
            .into());
        }
        if let Err(e) = builder.add_file(name.as_str(), path) {
            pb.abandon();
            return Err(format!("{}: {}", path.display(), e).into());
        }
        if options.verbose {
            pb.println(format!("  Added: {}", name));
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    let layout = builder.layout()?;
    let written = builder.write_to_path(archive)?;

    println!(
        "Packed {} files into {} chunks ({})",
        builder.len(),
        layout.chunks().len(),
        format_size(written)
    );
    Ok(())
}
