//! Mapping of request targets onto the bundled asset directory.

use std::fs;
use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

use crate::config::ROOT_DOCUMENT;
use crate::error::AssetError;

/// A regular file that lives inside the asset root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetPath(PathBuf);

impl AssetPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// MIME type guessed from the file extension.
    pub fn content_type(&self) -> mime_guess::Mime {
        mime_guess::from_path(&self.0).first_or_octet_stream()
    }
}

/// The directory assets are served from, canonicalized once.
#[derive(Debug, Clone)]
pub struct AssetRoot {
    root: PathBuf,
}

impl AssetRoot {
    /// # Errors
    ///
    /// Fails if `dir` does not exist or is not a directory.
    pub fn new(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = fs::canonicalize(dir)?;

        if !root.is_dir() {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Not a directory: {}", root.display()),
            ));
        }

        Ok(Self { root })
    }

    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Resolves a request target to a file under the root.
    ///
    /// Targets carrying a query string always get the root document, whatever
    /// path precedes the query. Anything that does not land on a regular file
    /// inside the root, including `..` escapes and symlinks pointing out of it,
    /// is [`AssetError::NotFound`].
    pub fn resolve(&self, target: &str) -> Result<AssetPath, AssetError> {
        let not_found = || AssetError::NotFound {
            target: target.to_owned(),
        };

        let candidate = self.root.join(relative_path(target));
        let canonical = fs::canonicalize(&candidate).map_err(|_| not_found())?;

        if !canonical.starts_with(&self.root) {
            tracing::warn!(request_target = target, "Request escapes the asset root");
            return Err(not_found());
        }

        if !canonical.is_file() {
            return Err(not_found());
        }

        Ok(AssetPath(canonical))
    }
}

/// `?` followed by at least one character.
fn carries_query(target: &str) -> bool {
    target
        .split_once('?')
        .is_some_and(|(_, query)| !query.is_empty())
}

fn relative_path(target: &str) -> PathBuf {
    if carries_query(target) {
        return PathBuf::from(ROOT_DOCUMENT);
    }

    let trimmed = target.trim_start_matches('/');
    if trimmed.is_empty() {
        return PathBuf::from(ROOT_DOCUMENT);
    }

    PathBuf::from(trimmed.replace('/', MAIN_SEPARATOR_STR))
}
