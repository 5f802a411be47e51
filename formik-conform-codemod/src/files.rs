//! Batch driver: convert every `.jsx`/`.tsx` file under a directory in place.

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context, Result};
use tracing::{info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::{convert_with_options, options::ConvertOptions};

const EXTENSIONS: &[&str] = &["jsx", "tsx"];
const IGNORED_DIRS: &[&str] = &["node_modules"];

/// What happened to one file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Converted,
    Unchanged,
}

#[derive(Debug, Default)]
pub struct Summary {
    pub converted: Vec<PathBuf>,
    pub unchanged: Vec<PathBuf>,
    pub failed: Vec<(PathBuf, String)>,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.converted.len() + self.unchanged.len() + self.failed.len()
    }
}

fn is_ignored_dir(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| IGNORED_DIRS.contains(&name))
}

fn has_component_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| EXTENSIONS.contains(&ext))
}

/// Component files under `root`, sorted. `node_modules` is never entered.
pub fn collect_component_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored_dir(e));
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!(%err, "skipping unreadable entry");
                continue;
            }
        };
        if entry.file_type().is_file() && has_component_extension(entry.path()) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Converts one file, writing it back unless `dry_run` is set.
pub fn convert_file(path: &Path, options: &ConvertOptions, dry_run: bool) -> Result<Outcome> {
    let source =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let converted = convert_with_options(&source, options)
        .with_context(|| format!("failed to convert {}", path.display()))?;
    if converted == source {
        return Ok(Outcome::Unchanged);
    }
    if !dry_run {
        fs::write(path, converted)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(Outcome::Converted)
}

/// Converts every component file under `root`. A failing file is logged and
/// recorded; the rest of the batch still runs.
pub fn convert_dir(root: &Path, options: &ConvertOptions, dry_run: bool) -> Result<Summary> {
    let mut summary = Summary::default();
    for path in collect_component_files(root)? {
        match convert_file(&path, options, dry_run) {
            Ok(Outcome::Converted) => {
                info!(path = %path.display(), dry_run, "converted");
                summary.converted.push(path);
            }
            Ok(Outcome::Unchanged) => {
                info!(path = %path.display(), "unchanged");
                summary.unchanged.push(path);
            }
            Err(err) => {
                warn!(path = %path.display(), "{err:#}");
                summary.failed.push((path, format!("{err:#}")));
            }
        }
    }
    Ok(summary)
}
