use std::time::Instant;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

use check_fuzzy_dups::cli::Cli;
use check_fuzzy_dups::clusters::ClashMap;
use check_fuzzy_dups::config::{FileConfig, HashMode};
use check_fuzzy_dups::output::{self, OutputOptions};
use check_fuzzy_dups::scanner;

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    info!("Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    debug!("Command line arguments: {:?}", cli);

    let config = FileConfig::load()?;
    let mode = HashMode::resolve(&cli, &config)?;
    debug!("Hash mode: {:?}", mode);

    for path in &cli.paths {
        if !path.exists() {
            bail!("Path does not exist: '{}'", path.display());
        }
    }
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure the thread pool")?;
    }

    let min_size = cli.min_size.unwrap_or(config.min_size);
    let files = scanner::collect_files(&cli.paths, min_size)?;
    let hashed = scanner::hash_files(files, &mode);
    info!("Hashed {} files", hashed.len());

    let mut clashes = ClashMap::new(mode.tolerance());
    for file in hashed {
        clashes.insert(file)?;
    }
    clashes.retain_clashes();

    if cli.move_clashes {
        output::move_clashes(&clashes, &cli.paths)?;
    }
    output::print_results(
        &clashes,
        &mode,
        &OutputOptions {
            all: cli.all,
            json: cli.json,
        },
    )?;

    info!("Completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(())
}

fn init_logging(verbose: bool) -> Result<()> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut builder = ConfigBuilder::new();
    let config = match builder.set_time_offset_to_local() {
        Ok(builder) => builder.build(),
        Err(builder) => builder.build(),
    };
    TermLogger::init(level, config, TerminalMode::Stderr, ColorChoice::Auto)
        .context("Failed to initialize logging")
}
