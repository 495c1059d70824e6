//! Document-scoped scratch directories.

use std::fs;
use std::path::Path;

use tempfile::TempDir;

use crate::error::Result;

/// Scratch directory owned by one document while it is processed.
///
/// Lives under `<root>` with a name that starts with the encoded document id
/// and ends in a random suffix, so two documents never share a directory
/// even when their ids encode alike. Removed when dropped, whether the
/// document succeeded or not.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
}

impl Workspace {
    /// Create a fresh scratch directory for `document` under `root`.
    pub fn create(root: impl AsRef<Path>, document: &str) -> Result<Self> {
        let root = root.as_ref();
        fs::create_dir_all(root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", encode_name(document)))
            .tempdir_in(root)?;
        log::debug!("Workspace for {} at {}", document, dir.path().display());
        Ok(Self { dir: Some(dir) })
    }

    pub fn path(&self) -> &Path {
        match &self.dir {
            Some(dir) => dir.path(),
            None => Path::new(""),
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if let Some(dir) = self.dir.take() {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                log::warn!("Failed to clean up {}: {}", path.display(), e);
            }
        }
    }
}

/// Encode an id as a single path component.
///
/// Injective: bytes outside `[A-Za-z0-9._~-]` are percent-encoded, and a
/// leading dot is encoded too, so `.`, `..` and hidden names cannot appear.
/// The empty id becomes `%`, which no other id encodes to.
pub(crate) fn encode_name(id: &str) -> String {
    if id.is_empty() {
        return "%".to_string();
    }
    let encoded = urlencoding::encode(id);
    match encoded.strip_prefix('.') {
        Some(rest) => format!("%2E{}", rest),
        None => encoded.into_owned(),
    }
}
