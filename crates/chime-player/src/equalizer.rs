//! Flat-response equalizer profile generation.

use std::fs;
use std::path::Path;

use chime_core::{Error, Result};
use tracing::info;

/// Frequency bands in the decoder's equalizer table.
const BANDS: usize = 32;

/// Write a flat (unit gain) equalizer profile to `path`.
///
/// The decoder expects four `#` comment header lines, one `left right`
/// gain line per band, and a single blank trailing line.
pub fn write_flat_profile(path: &Path) -> Result<()> {
    let mut text = String::new();
    text.push_str("# Equalizer profile\n");
    text.push_str("# Written by chime\n");
    text.push_str("# 32 bands, two gain columns (left, right)\n");
    text.push_str("# Flat response\n");
    for _ in 0..BANDS {
        text.push_str("1 1\n");
    }
    text.push('\n');

    fs::write(path, text).map_err(|e| Error::Equalizer(e.to_string()))?;
    info!("Wrote flat equalizer profile to {}", path.display());
    Ok(())
}
