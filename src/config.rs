use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use log::{debug, warn};
use serde::Deserialize;

use crate::cli::Cli;

/// Hashing strategy for a run, resolved once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashMode {
    /// Full-content BLAKE3 digest; files match only on identical bytes.
    Exact,
    /// Perceptual image hash compared under a Hamming tolerance.
    Fuzzy(FuzzyParams),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FuzzyParams {
    pub tolerance: u32,
    pub bytes_per_row: u32,
    pub height: u32,
    pub bits_per_color: u32,
}

impl HashMode {
    pub fn tolerance(&self) -> u32 {
        match self {
            HashMode::Exact => 0,
            HashMode::Fuzzy(params) => params.tolerance,
        }
    }

    /// Resolve the mode from the command line and the config file defaults.
    pub fn resolve(cli: &Cli, config: &FileConfig) -> Result<Self> {
        let tolerance = match cli.fuzz {
            None => {
                if cli.colored {
                    warn!("--colored has no effect without --image, ignoring");
                }
                return Ok(HashMode::Exact);
            }
            Some(None) => config.tolerance,
            Some(Some(tolerance)) => tolerance,
        };
        if tolerance == 0 {
            return Ok(HashMode::Exact);
        }

        let params = FuzzyParams {
            tolerance,
            bytes_per_row: config.bytes_per_row,
            height: if cli.colored { config.colored_height } else { config.height },
            bits_per_color: if cli.colored { config.bits_per_color } else { 0 },
        };
        params.validate()?;
        Ok(HashMode::Fuzzy(params))
    }
}

impl FuzzyParams {
    /// Grid width in pixels: one extra column so each row yields
    /// `bytes_per_row * 8` comparison bits.
    pub fn grid_width(&self) -> u32 {
        self.bytes_per_row * 8 + 1
    }

    fn validate(&self) -> Result<()> {
        if self.bytes_per_row < 1 || self.bytes_per_row > 16 {
            bail!("bytes_per_row must be between 1 and 16, got {}", self.bytes_per_row);
        }
        if self.height < 1 || self.height > 64 {
            bail!("height must be between 1 and 64, got {}", self.height);
        }
        if self.bits_per_color > 32 {
            bail!("bits_per_color must be at most 32, got {}", self.bits_per_color);
        }
        Ok(())
    }
}

/// Defaults loadable from `check-fuzzy-dups.toml` in the working directory.
/// Command line flags override whatever is set here.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    /// Tolerance used when `--image` is passed without a value.
    pub tolerance: u32,
    pub bytes_per_row: u32,
    /// Grid height for the plain structural hash.
    pub height: u32,
    /// Grid height for the colored variant.
    pub colored_height: u32,
    /// Color bits per channel for the colored variant.
    pub bits_per_color: u32,
    /// Skip files smaller than this many bytes.
    pub min_size: u64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            tolerance: 5,
            bytes_per_row: 1,
            height: 8,
            colored_height: 5,
            bits_per_color: 8,
            min_size: 0,
        }
    }
}

impl FileConfig {
    pub fn load() -> Result<Self> {
        let path = PathBuf::from(format!("{}.toml", env!("CARGO_PKG_NAME")));
        match fs::read_to_string(&path) {
            Ok(content) => {
                debug!("Loading configuration from '{}'", path.display());
                toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: '{}'", path.display()))
            }
            Err(_) => {
                debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}
