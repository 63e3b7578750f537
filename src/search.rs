//! Seam for the external search provider.
//!
//! Searching happens elsewhere; this module only fixes the shape of the
//! results and how a picked result turns into something playable.

use crate::error::{MediaError, SearchError};
use crate::media::{self, MediaId};

/// One suggestion returned by a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub media_url: String,
}

/// A remote index queried by free-text term.
pub trait SearchProvider {
    /// # Errors
    ///
    /// [`SearchError::Unavailable`] when the provider cannot answer.
    fn search_by_term(&self, term: &str) -> Result<Vec<SearchResult>, SearchError>;
}

/// Resolves a chosen suggestion exactly like typed input.
///
/// # Errors
///
/// See [`media::resolve`].
pub fn resolve_result(result: &SearchResult) -> Result<MediaId, MediaError> {
    media::resolve(&result.media_url)
}

/// The play button plays the first suggestion on offer.
///
/// # Errors
///
/// [`MediaError::NothingSelected`] for an empty list, otherwise the errors of
/// [`resolve_result`].
pub fn play_first(results: &[SearchResult]) -> Result<MediaId, MediaError> {
    let first = results.first().ok_or(MediaError::NothingSelected)?;
    tracing::debug!(title = %first.title, "Playing first suggestion");
    resolve_result(first)
}
