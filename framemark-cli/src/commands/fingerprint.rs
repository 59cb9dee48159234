//! Fingerprint command implementation.

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use framemark_core::{HashAlgorithm, PerceptualHasher};
use tracing::debug;

/// Execute the fingerprint command.
///
/// Prints one `<hex>  <path>` line per image. With two or more images the
/// Hamming distance of each image to the first one is shown as well.
pub fn execute(images: Vec<PathBuf>, algorithm: HashAlgorithm, quiet: bool) -> Result<()> {
    let hasher = PerceptualHasher::new(algorithm);

    let mut fingerprints = Vec::with_capacity(images.len());
    for path in &images {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let fingerprint = hasher
            .fingerprint_bytes(&bytes)
            .with_context(|| format!("Failed to read image: {}", path.display()))?;
        debug!(path = %path.display(), fingerprint = %fingerprint, "Fingerprinted image");
        fingerprints.push(fingerprint);
    }

    let Some(reference) = fingerprints.first() else {
        return Ok(());
    };

    for (path, fingerprint) in images.iter().zip(&fingerprints) {
        if quiet || fingerprints.len() == 1 {
            println!("{}  {}", fingerprint, path.display());
            continue;
        }
        let distance = reference.hamming_distance(fingerprint).unwrap_or(u32::MAX);
        let distance = if distance == 0 {
            "identical".green()
        } else {
            format!("distance {distance}").yellow()
        };
        println!("{}  {}  {}", fingerprint, path.display(), distance);
    }

    Ok(())
}
