use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use colored::Colorize;
use indicatif::{HumanBytes, HumanCount};
use log::info;
use serde::Serialize;

use crate::clusters::ClashMap;
use crate::config::HashMode;

pub struct OutputOptions {
    /// Piped output lists every clashing file instead of all but the first.
    pub all: bool,
    pub json: bool,
}

/// Render results: JSON when requested, a plain file list when stdout is
/// piped, colored groups on a terminal.
pub fn print_results(map: &ClashMap, mode: &HashMode, opts: &OutputOptions) -> Result<()> {
    if opts.json {
        let report =
            serde_json::to_string_pretty(&json_report(map)).context("Failed to serialize results")?;
        println!("{report}");
        return Ok(());
    }
    if !std::io::stdout().is_terminal() {
        print_piped(map, opts.all);
        return Ok(());
    }
    print_terminal(map, mode);
    Ok(())
}

/// One path per line, suitable for `xargs rm`. By default the first file
/// of each bucket is kept off the list.
fn print_piped(map: &ClashMap, all: bool) {
    let skip = if all { 0 } else { 1 };
    for bucket in map.buckets() {
        for file in bucket.files.iter().skip(skip) {
            println!("{}", file.path.display());
        }
    }
}

fn print_terminal(map: &ClashMap, mode: &HashMode) {
    if map.is_empty() {
        println!("{}", "No clashing files found!".green());
        return;
    }

    for bucket in map.buckets() {
        println!("{}", "Same file found:".red());
        for file in &bucket.files {
            println!("{}", file.path.display());
        }
        println!();
    }

    let clashes = (map.total_files() - map.len()) as u64;
    match mode {
        HashMode::Exact => {
            let wasted: u64 = map
                .buckets()
                .iter()
                .map(|bucket| bucket.files[0].size * (bucket.files.len() as u64 - 1))
                .sum();
            info!(
                "Found {} duplicate files in {} groups wasting {}",
                HumanCount(clashes),
                HumanCount(map.len() as u64),
                HumanBytes(wasted)
            );
        }
        HashMode::Fuzzy(_) => {
            info!(
                "Found {} similar files in {} groups",
                HumanCount(clashes),
                HumanCount(map.len() as u64)
            );
        }
    }
}

#[derive(Debug, Serialize)]
struct JsonReport<'a> {
    groups: Vec<JsonGroup<'a>>,
    summary: JsonSummary,
}

#[derive(Debug, Serialize)]
struct JsonGroup<'a> {
    hash: &'a str,
    files: Vec<String>,
}

#[derive(Debug, Serialize)]
struct JsonSummary {
    clash_groups: usize,
    clashing_files: usize,
}

fn json_report(map: &ClashMap) -> JsonReport<'_> {
    let groups = map
        .buckets()
        .iter()
        .map(|bucket| JsonGroup {
            hash: &bucket.hash,
            files: bucket
                .files
                .iter()
                .map(|file| file.path.display().to_string())
                .collect(),
        })
        .collect();
    JsonReport {
        groups,
        summary: JsonSummary {
            clash_groups: map.len(),
            clashing_files: map.total_files(),
        },
    }
}

/// Move each clashing bucket into a directory named by its representative
/// hash. Restricted to scans of exactly the current directory so the
/// renames stay inside the tree the user pointed at.
pub fn move_clashes(map: &ClashMap, paths: &[PathBuf]) -> Result<()> {
    if paths.len() != 1 || paths[0] != Path::new(".") {
        bail!("--move only works when scanning exactly the current directory");
    }
    move_into(map, Path::new("."))
}

fn move_into(map: &ClashMap, base: &Path) -> Result<()> {
    for bucket in map.buckets() {
        let target = base.join(&bucket.hash);
        std::fs::create_dir(&target)
            .with_context(|| format!("Failed to create directory: '{}'", target.display()))?;
        for file in &bucket.files {
            let file_name = file
                .path
                .file_name()
                .with_context(|| format!("No file name in '{}'", file.path.display()))?;
            let dest = target.join(file_name);
            std::fs::rename(&file.path, &dest).with_context(|| {
                format!(
                    "Failed to move '{}' to '{}'",
                    file.path.display(),
                    dest.display()
                )
            })?;
            info!("Moved '{}' into '{}'", file.path.display(), target.display());
        }
    }
    Ok(())
}
