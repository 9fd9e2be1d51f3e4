use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{HumanCount, ProgressBar, ProgressStyle};
use log::{debug, error, info};
use rayon::prelude::*;
use walkdir::WalkDir;

use crate::config::HashMode;
use crate::hasher;

/// A hashed file as discovered on disk.
#[derive(Debug, Clone)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size: u64,
    pub hash: String,
}

/// Collect regular files under each input path in a deterministic,
/// name-sorted order. Grouping is order-sensitive, so the walk order is
/// part of the tool's observable behavior.
///
/// Paths given directly as files are taken as-is; directories are walked
/// recursively, keeping files of at least `min_size` bytes. Unreadable
/// entries are logged and skipped.
pub fn collect_files(paths: &[PathBuf], min_size: u64) -> Result<Vec<(PathBuf, u64)>> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_message("Scanning files...");
    spinner.enable_steady_tick(Duration::from_millis(100));

    let mut files = Vec::new();
    for root in paths {
        if root.is_file() {
            let size = root
                .metadata()
                .with_context(|| format!("Failed to read metadata for: '{}'", root.display()))?
                .len();
            files.push((root.clone(), size));
            continue;
        }
        for entry in WalkDir::new(root).sort_by_file_name() {
            spinner.tick();
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    error!("Failed to read directory entry: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            match entry.metadata() {
                Ok(metadata) if metadata.len() >= min_size => {
                    files.push((entry.into_path(), metadata.len()));
                }
                Ok(metadata) => {
                    debug!(
                        "Skipping '{}' ({} bytes < minimum)",
                        entry.path().display(),
                        metadata.len()
                    );
                }
                Err(err) => {
                    error!(
                        "Failed to read metadata for '{}': {}",
                        entry.path().display(),
                        err
                    );
                }
            }
        }
    }
    spinner.finish_and_clear();

    info!("Found {} files to hash", HumanCount(files.len() as u64));
    Ok(files)
}

/// Hash every file in parallel while preserving discovery order in the
/// output: parallel compute, sequential commit. `par_iter` keeps collected
/// results in input order, which the clusterer depends on. Files without a
/// fingerprint and files that fail to read are dropped here, so the
/// clusterer only ever sees hashed files.
pub fn hash_files(files: Vec<(PathBuf, u64)>, mode: &HashMode) -> Vec<FileInfo> {
    let progress = ProgressBar::new(files.len() as u64);
    progress.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    progress.set_message("Hashing files");

    let hashed: Vec<Option<FileInfo>> = files
        .par_iter()
        .map(|(path, size)| {
            let result = hasher::hash_file(path, mode);
            progress.inc(1);
            match result {
                Ok(Some(hash)) => Some(FileInfo {
                    path: path.clone(),
                    size: *size,
                    hash,
                }),
                Ok(None) => None,
                Err(err) => {
                    error!("Failed to hash '{}': {:#}", path.display(), err);
                    None
                }
            }
        })
        .collect();
    progress.finish_and_clear();

    hashed.into_iter().flatten().collect()
}
