pub mod cli;
pub mod clusters;
pub mod config;
pub mod hasher;
pub mod output;
pub mod scanner;

pub use cli::Cli;
pub use clusters::{Bucket, ClashMap, hamming};
pub use config::{FileConfig, FuzzyParams, HashMode};
pub use hasher::hash_file;
pub use output::{OutputOptions, move_clashes, print_results};
pub use scanner::{FileInfo, collect_files, hash_files};
