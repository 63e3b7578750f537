//! Server configuration.
//!
//! Every tunable of the loopback server lives here so the listener, the
//! connection handler and the CLI agree on the same defaults.

use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::PathBuf;
use std::time::Duration;

/// Port the embedded browser surface expects the video UI on.
pub const DEFAULT_PORT: u16 = 54523;

/// Directory holding the bundled page and its resources.
pub const DEFAULT_ASSET_DIR: &str = "VideoUI";

/// Document served for any request carrying a query string.
pub const ROOT_DOCUMENT: &str = "index.html";

/// Size of each read while accumulating a request.
pub const READ_CHUNK_SIZE: usize = 8192;

/// Configuration for [`crate::server::VideoUiServer`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Listen address, must be a loopback address
    pub addr: SocketAddr,
    /// Directory the assets are served from
    pub asset_root: PathBuf,
    /// Socket read timeout while waiting for request bytes (None = wait forever)
    pub read_timeout: Option<Duration>,
    /// Emit a `Content-Type` header guessed from the file extension
    pub content_type: bool,
}

impl ServerConfig {
    /// Default configuration listening on `port` instead of [`DEFAULT_PORT`].
    #[must_use]
    pub fn with_port(port: u16) -> Self {
        Self {
            addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)),
            ..Self::default()
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, DEFAULT_PORT)),
            asset_root: PathBuf::from(DEFAULT_ASSET_DIR),
            read_timeout: Some(Duration::from_secs(5)),
            content_type: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_listens_on_loopback() {
        let config = ServerConfig::default();

        assert!(config.addr.ip().is_loopback());
        assert_eq!(config.addr.port(), 54523);
        assert!(!config.content_type);
    }

    #[test]
    fn with_port_keeps_other_defaults() {
        let config = ServerConfig::with_port(0);

        assert_eq!(config.addr.port(), 0);
        assert_eq!(config.asset_root, PathBuf::from("VideoUI"));
        assert_eq!(config.read_timeout, Some(Duration::from_secs(5)));
    }
}
