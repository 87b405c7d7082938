use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::info;

use crate::types::{DigestError, FeedSnapshot, Result};

/// Write the snapshot as pretty-printed JSON, atomically: serialize the whole
/// run first, write to a temp file in the target directory, then rename over
/// the previous artifact. A failed run never leaves a partial file behind.
pub fn write_snapshot(snapshot: &FeedSnapshot, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(snapshot)?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(json.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(path).map_err(|e| DigestError::Io(e.error))?;

    info!(
        "Wrote snapshot with {} articles to {}",
        snapshot.articles.len(),
        path.display()
    );
    Ok(())
}

pub fn load_snapshot(path: &Path) -> Result<FeedSnapshot> {
    let json = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}
