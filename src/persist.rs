//! Writing the generated Dockerfile to disk.

use crate::error::Error;
use std::path::Path;
use tracing::debug;

/// Overwrite `path` with `content` verbatim.
pub fn save(content: &str, path: &Path) -> Result<(), Error> {
    std::fs::write(path, content).map_err(|source| Error::Write {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}
