//! Tag reading with a modern reader and a legacy fallback.
//!
//! Old appliances accumulate files tagged by decades of software, so the
//! lenient legacy ID3 reader stays around for everything the modern
//! reader rejects.

use std::path::Path;

use chime_core::{Error, Result, TrackTags};
use id3::TagLike;
use lofty::prelude::{Accessor, TaggedFileExt};
use lofty::probe::Probe;
use tracing::debug;

/// Read title/artist from `path`.
///
/// Missing fields come back as empty strings; only a total failure of
/// both readers is an error. The caller is expected to log and continue,
/// tag problems must never interfere with playback.
pub fn read_tags(path: &Path) -> Result<TrackTags> {
    match read_modern(path) {
        Ok(tags) => Ok(tags),
        Err(e) => {
            debug!("Modern tag reader failed for {}: {e}", path.display());
            read_legacy(path)
        }
    }
}

fn read_modern(path: &Path) -> Result<TrackTags> {
    let tagged = Probe::open(path)
        .map_err(|e| Error::Metadata(e.to_string()))?
        .guess_file_type()
        .map_err(|e| Error::Metadata(e.to_string()))?
        .read()
        .map_err(|e| Error::Metadata(e.to_string()))?;

    let tag = tagged.primary_tag().or_else(|| tagged.first_tag());
    Ok(TrackTags::new(
        tag.and_then(|t| t.title().map(|s| s.to_string()))
            .unwrap_or_default(),
        tag.and_then(|t| t.artist().map(|s| s.to_string()))
            .unwrap_or_default(),
    ))
}

fn read_legacy(path: &Path) -> Result<TrackTags> {
    let tag = id3::Tag::read_from_path(path).map_err(|e| Error::Metadata(e.to_string()))?;
    Ok(TrackTags::new(
        tag.title().unwrap_or_default(),
        tag.artist().unwrap_or_default(),
    ))
}
