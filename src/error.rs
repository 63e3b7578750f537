//! Error types for the video UI server and the media resolver.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while reading a request off a connection.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The peer closed the connection before sending anything.
    #[error("Connection closed before a request was received")]
    ConnectionClosed,

    /// The request line could not be split into method and target.
    #[error("Malformed request line: {line:?}")]
    MalformedRequest {
        /// The offending request line, lossily decoded
        line: String,
    },

    /// Only GET is served.
    #[error("Request method not supported: {method}")]
    UnsupportedMethod {
        /// The rejected method
        method: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Outcome of asset resolution that is answered with a 404.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("No asset for request target {target}")]
    NotFound {
        /// The request target that failed to resolve
        target: String,
    },
}

/// Errors surfaced to the owning application when input cannot be played.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    /// The reference failed validation outright.
    #[error("Invalid media reference: {reference}")]
    InvalidMediaReference {
        /// The rejected input
        reference: String,
    },

    /// None of the extraction patterns yielded an identifier.
    #[error("No media identifier found in: {reference}")]
    NoIdentifierFound {
        /// The input that was searched
        reference: String,
    },

    /// The play action ran with no suggestion to pick from.
    #[error("No media selected")]
    NothingSelected,

    /// The playback URL could not be assembled from the identifier.
    #[error("Cannot build playback URL: {reason}")]
    PlaybackUrl {
        /// Parser message from the url crate
        reason: String,
    },
}

impl MediaError {
    /// Text shown to the user for this failure.
    ///
    /// Invalid references and references without an identifier read the same
    /// from the user's side: the input cannot be played.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidMediaReference { .. } | Self::NoIdentifierFound { .. } => {
                "Invalid URL! This input cannot be played."
            }
            Self::NothingSelected => "Select a video before pressing play.",
            Self::PlaybackUrl { .. } => "This video cannot be opened.",
        }
    }
}

/// Failure reported by the external search collaborator.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Search not available for term '{term}': {reason}")]
    Unavailable {
        /// The search term that was sent
        term: String,
        /// Provider supplied reason
        reason: String,
    },
}

/// Errors that stop the server from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The server only listens on the local host.
    #[error("Refusing to listen on non-loopback address {addr}")]
    NotLoopback {
        /// The configured address
        addr: SocketAddr,
    },

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        /// The configured address
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("Asset root {path} is not usable: {source}")]
    AssetRoot {
        /// The configured asset directory
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
