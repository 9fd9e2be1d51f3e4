use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use image::DynamicImage;
use image::imageops::FilterType;
use log::debug;

use crate::config::{FuzzyParams, HashMode};

/// Hash a single file according to `mode`.
///
/// Returns `Ok(None)` when the file has no fingerprint under this mode,
/// which in fuzzy mode means anything the image codec cannot decode; such
/// files are excluded from clustering and the run continues. Read failures
/// are per-file errors for the caller to log and skip.
pub fn hash_file(path: &Path, mode: &HashMode) -> Result<Option<String>> {
    match mode {
        HashMode::Exact => content_hash(path).map(Some),
        HashMode::Fuzzy(params) => match image::open(path) {
            Ok(img) => Ok(Some(image_hash(&img, params))),
            Err(err) => {
                debug!("Ignoring non-image '{}': {}", path.display(), err);
                Ok(None)
            }
        },
    }
}

/// Full-content BLAKE3 digest, streamed in 8 KiB chunks.
fn content_hash(path: &Path) -> Result<String> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open file: '{}'", path.display()))?;
    let mut reader = BufReader::new(file);
    let mut hasher = blake3::Hasher::new();
    let mut buffer = [0; 8192];

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .with_context(|| format!("Failed to read file: '{}'", path.display()))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Perceptual fingerprint: per-row gradient bits over a small luminance
/// grid, optionally followed by a color signature of the undecimated image.
fn image_hash(img: &DynamicImage, params: &FuzzyParams) -> String {
    let width = params.grid_width();
    let shape = img
        .resize_exact(width, params.height, FilterType::Triangle)
        .to_luma8();

    let field = (params.bytes_per_row * 2) as usize;
    let mut digest = String::with_capacity(field * params.height as usize);
    for row in shape.as_raw().chunks_exact(width as usize) {
        digest.push_str(&format!("{:0field$x}", gradient_row(row)));
    }

    if params.bits_per_color > 0 {
        let signature = color_signature(img, params.bits_per_color);
        let field = ((params.bits_per_color * 3) / 8) as usize;
        digest.push_str(&format!("{:0field$x}", signature));
    }
    digest
}

/// MSB-first gradient bits for one row: 1 where a pixel is strictly
/// brighter than its right neighbor. Invariant under any strictly
/// monotonic remap of the luminance values.
fn gradient_row(lums: &[u8]) -> u128 {
    let mut row = 0u128;
    for pair in lums.windows(2) {
        row <<= 1;
        row += (pair[0] > pair[1]) as u128;
    }
    row
}

/// Coarse per-channel brightness-distribution signature.
///
/// The histogram is one flat 768-entry array (R, G, B) and the boundary
/// walk runs on absolute indices with slice-style clamping, so the top
/// half-step bin of the red and green walks reaches into the next
/// channel's range, and each channel emits more comparison bits than the
/// nominal `bits_per_color`. Every emitted digest depends on this exact
/// bit order; do not tidy the walk.
fn color_signature(img: &DynamicImage, bits_per_color: u32) -> u128 {
    let rgb = img.to_rgb8();
    let mut histogram = vec![0u64; 768];
    for pixel in rgb.pixels() {
        for (channel, &value) in pixel.0.iter().enumerate() {
            histogram[channel * 256 + value as usize] += 1;
        }
    }

    let step = 256 / (bits_per_color as i64 + 1);
    let mut signature = 0u128;
    for offset in [0i64, 256, 512] {
        signature <<= 1;
        let mut start = offset + 256 - step / 2;
        let mut total = mass(&histogram, start, offset + 256);
        while start > offset {
            let next_total = mass(&histogram, start, start + step);
            signature += (total > next_total) as u128;
            signature <<= 1;
            total = next_total;
            start -= step;
        }
        signature += (total > mass(&histogram, offset, start + step)) as u128;
    }
    signature
}

/// Sum of `histogram[lo..hi)` with out-of-range ends clamped.
fn mass(histogram: &[u64], lo: i64, hi: i64) -> u64 {
    let lo = lo.clamp(0, histogram.len() as i64) as usize;
    let hi = hi.clamp(0, histogram.len() as i64) as usize;
    if lo >= hi {
        0
    } else {
        histogram[lo..hi].iter().sum()
    }
}
