//! SQL source collaborator seam.
//!
//! The core treats any returned text as a raw SQL body to be normalized.
//! Only filesystem loading ships with the crate; remote retrieval stays with
//! the caller, aided by [`raw_github_url`] for GitHub-hosted scripts.

use std::fs;
use std::path::Path;

use crate::error::SourceError;

/// Loads raw SQL text from a location
pub trait SourceLoader {
    fn load(&self, location: &str) -> Result<String, SourceError>;
}

/// Reads SQL from the local filesystem
#[derive(Debug, Default)]
pub struct FileLoader;

impl SourceLoader for FileLoader {
    fn load(&self, location: &str) -> Result<String, SourceError> {
        let path = Path::new(location);
        if !path.exists() {
            return Err(SourceError::NotFound(path.to_path_buf()));
        }
        fs::read_to_string(path).map_err(|source| SourceError::Unreadable {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Normalize a GitHub file URL to its raw-content form:
/// - raw URLs keep their path but lose any `?token=...` query parameter
/// - web URLs gain the `raw` subdomain and lose the `/blob/` path segment
/// - anything else is returned unchanged
pub fn raw_github_url(url: &str) -> String {
    if url.contains("//raw.github.") {
        url.split('?').next().unwrap_or(url).to_string()
    } else if url.contains("//github.") {
        url.replace("//github.", "//raw.github.").replace("/blob/", "/")
    } else {
        url.to_string()
    }
}
