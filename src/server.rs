//! Loopback listener serving the video UI.
//!
//! One accept loop, one thread per connection. A connection carries exactly
//! one request and is closed after its response.

use std::io::{self, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, error, info, trace, warn};
use url::Url;

use crate::assets::AssetRoot;
use crate::config::ServerConfig;
use crate::error::{AssetError, HttpError, MediaError, ServerError};
use crate::media::{self, MediaId};
use crate::{empty_response, ok_response, read_request, require_get, write_response};
use crate::{Request, StatusCode};

/// Per-connection settings copied into every handler thread.
#[derive(Debug, Clone, Copy)]
struct ConnectionOptions {
    read_timeout: Option<Duration>,
    content_type: bool,
}

/// A bound, not yet running, video UI server.
pub struct VideoUiServer {
    listener: TcpListener,
    assets: Arc<AssetRoot>,
    options: ConnectionOptions,
}

impl VideoUiServer {
    /// Binds the configured loopback address.
    ///
    /// # Errors
    ///
    /// [`ServerError::NotLoopback`] for any non-loopback address,
    /// [`ServerError::AssetRoot`] if the asset directory is unusable and
    /// [`ServerError::Bind`] if the port cannot be bound.
    pub fn bind(config: ServerConfig) -> Result<Self, ServerError> {
        if !config.addr.ip().is_loopback() {
            return Err(ServerError::NotLoopback { addr: config.addr });
        }

        let assets =
            AssetRoot::new(&config.asset_root).map_err(|source| ServerError::AssetRoot {
                path: config.asset_root.clone(),
                source,
            })?;

        let listener = TcpListener::bind(config.addr).map_err(|source| ServerError::Bind {
            addr: config.addr,
            source,
        })?;

        let local_addr = listener.local_addr()?;
        info!(
            addr = %local_addr,
            root = %assets.path().display(),
            "Video UI server listening"
        );

        Ok(Self {
            listener,
            assets: Arc::new(assets),
            options: ConnectionOptions {
                read_timeout: config.read_timeout,
                content_type: config.content_type,
            },
        })
    }

    /// # Errors
    ///
    /// Fails if the socket address cannot be queried.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections on the calling thread until the process exits.
    pub fn run(self) {
        self.accept_loop(&AtomicBool::new(false));
    }

    /// Runs the accept loop on a background thread.
    ///
    /// The returned handle owns the server: dropping it or calling
    /// [`ServerHandle::shutdown`] stops accepting and closes the socket.
    ///
    /// # Errors
    ///
    /// Fails if the address cannot be queried or the thread cannot start.
    pub fn spawn(self) -> Result<ServerHandle, ServerError> {
        let addr = self.listener.local_addr()?;
        let stop = Arc::new(AtomicBool::new(false));
        let loop_stop = Arc::clone(&stop);

        let thread = thread::Builder::new()
            .name("videoui-accept".to_owned())
            .spawn(move || self.accept_loop(&loop_stop))?;

        Ok(ServerHandle {
            addr,
            stop,
            thread: Some(thread),
        })
    }

    fn accept_loop(self, stop: &AtomicBool) {
        for stream in self.listener.incoming() {
            if stop.load(Ordering::Acquire) {
                break;
            }

            match stream {
                Ok(stream) => self.dispatch(stream),
                Err(e) => warn!(error = %e, "Failed to accept connection"),
            }
        }

        debug!("Accept loop stopped");
    }

    fn dispatch(&self, stream: TcpStream) {
        let assets = Arc::clone(&self.assets);
        let options = self.options;

        let spawned = thread::Builder::new()
            .name("videoui-conn".to_owned())
            .spawn(move || handle_connection(stream, &assets, options));

        if let Err(e) = spawned {
            error!(error = %e, "Failed to start connection thread");
        }
    }
}

/// Owner of a running server.
#[derive(Debug)]
pub struct ServerHandle {
    addr: SocketAddr,
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl ServerHandle {
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Playback URL for `id` on this server.
    ///
    /// # Errors
    ///
    /// See [`media::playback_url`].
    pub fn playback_url(&self, id: &MediaId) -> Result<Url, MediaError> {
        media::playback_url(self.addr, id)
    }

    /// Stops accepting and closes the listening socket.
    ///
    /// Connections already being served run to completion on their own.
    pub fn shutdown(mut self) {
        self.stop_accepting();
    }

    fn stop_accepting(&mut self) {
        let Some(thread) = self.thread.take() else {
            return;
        };

        self.stop.store(true, Ordering::Release);

        // The accept call only returns on a new connection.
        if let Err(e) = TcpStream::connect(self.addr) {
            warn!(error = %e, "Could not wake accept loop, leaving it detached");
            return;
        }

        if thread.join().is_err() {
            error!("Accept loop panicked");
        }

        info!(addr = %self.addr, "Video UI server stopped");
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        self.stop_accepting();
    }
}

fn handle_connection(mut stream: TcpStream, assets: &AssetRoot, options: ConnectionOptions) {
    let peer = stream.peer_addr().ok();

    match serve_connection(&mut stream, assets, options) {
        Ok(()) => {}
        Err(HttpError::ConnectionClosed) => trace!(?peer, "Connection closed without a request"),
        Err(e) => debug!(?peer, error = %e, "Connection failed"),
    }
}

fn serve_connection(
    stream: &mut TcpStream,
    assets: &AssetRoot,
    options: ConnectionOptions,
) -> Result<(), HttpError> {
    stream.set_read_timeout(options.read_timeout)?;

    let request = match read_request(stream) {
        Ok(request) => request,
        Err(HttpError::MalformedRequest { line }) => {
            warn!(line = %line, "Malformed request");
            write_response(stream, empty_response(StatusCode::BAD_REQUEST))?;
            return Ok(());
        }
        Err(e) => return Err(e),
    };

    trace!(bytes = request.raw.len(), "Request received");

    let status = respond(stream, &request, assets, options.content_type)?;
    info!(method = %request.method, path = %request.target, status = status.as_u16());

    Ok(())
}

/// Writes the response for a parsed request and returns its status.
fn respond(
    output: &mut impl Write,
    request: &Request,
    assets: &AssetRoot,
    content_type: bool,
) -> Result<StatusCode, HttpError> {
    if let Err(e) = require_get(request) {
        debug!(error = %e, "Rejecting request");
        write_response(output, empty_response(StatusCode::METHOD_NOT_ALLOWED))?;
        return Ok(StatusCode::METHOD_NOT_ALLOWED);
    }

    let asset = match assets.resolve(&request.target) {
        Ok(asset) => asset,
        Err(AssetError::NotFound { .. }) => {
            write_response(output, empty_response(StatusCode::NOT_FOUND))?;
            return Ok(StatusCode::NOT_FOUND);
        }
    };

    match ok_response(&asset, content_type) {
        Ok(response) => {
            write_response(output, response)?;
            Ok(StatusCode::OK)
        }
        Err(e) => {
            warn!(path = %asset.as_path().display(), error = %e, "Failed to open asset");
            write_response(output, empty_response(StatusCode::NOT_FOUND))?;
            Ok(StatusCode::NOT_FOUND)
        }
    }
}
