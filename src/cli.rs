use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "check-fuzzy-dups", version)]
#[command(about = "A CLI tool to find files with clashing content or image hashes")]
pub struct Cli {
    /// Directories or files to compare (default: current directory)
    #[arg(default_value = ".")]
    pub paths: Vec<PathBuf>,

    /// Compare perceptual image hashes under this Hamming tolerance instead
    /// of exact content hashes; 0 falls back to exact matching
    #[arg(short = 'i', long = "image", value_name = "TOLERANCE", num_args = 0..=1)]
    pub fuzz: Option<Option<u32>>,

    /// Extend the image hash with a coarse color-distribution signature
    #[arg(short, long)]
    pub colored: bool,

    /// When piping stdout, list every clashing file instead of all but the first
    #[arg(short, long)]
    pub all: bool,

    /// Move clashing files into hash-named directories (current directory only)
    #[arg(short = 'd', long = "move")]
    pub move_clashes: bool,

    /// Print results as JSON
    #[arg(long)]
    pub json: bool,

    /// Number of parallel hashing threads (default: number of CPU cores)
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Skip files smaller than the specified size in bytes
    #[arg(short, long)]
    pub min_size: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
