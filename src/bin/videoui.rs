//! videoui - serve the bundled video UI on the loopback interface, or check
//! what a media link resolves to.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use videoui::config::{ServerConfig, DEFAULT_ASSET_DIR, DEFAULT_PORT};
use videoui::logging::{init_tracing, CliLogLevel};
use videoui::media::{self, InputKind};
use videoui::server::VideoUiServer;

#[derive(Parser)]
#[command(name = "videoui")]
#[command(about = "Loopback server for the embedded video UI")]
struct Cli {
    /// Console log level (RUST_LOG takes precedence)
    #[arg(long, value_enum, default_value = "info", global = true)]
    log_level: CliLogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the asset directory on 127.0.0.1
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Directory holding index.html and its resources
        #[arg(short, long, default_value = DEFAULT_ASSET_DIR)]
        root: PathBuf,
        /// Seconds to wait for request bytes, 0 waits forever
        #[arg(long, default_value_t = 5)]
        read_timeout: u64,
        /// Send a Content-Type header guessed from the file extension
        #[arg(long)]
        content_type: bool,
    },
    /// Validate a media link and print the playback URL
    Resolve {
        /// Link as typed by the user
        reference: String,
        /// Port the server listens on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
}

fn serve(
    port: u16,
    root: PathBuf,
    read_timeout: u64,
    content_type: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = ServerConfig {
        asset_root: root,
        read_timeout: (read_timeout > 0).then(|| Duration::from_secs(read_timeout)),
        content_type,
        ..ServerConfig::with_port(port)
    };

    let server = VideoUiServer::bind(config)?;
    println!("Listening @ {}\n", server.local_addr()?);
    server.run();

    Ok(())
}

fn resolve(reference: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    if media::classify_input(reference) != InputKind::MediaUrl {
        return Err(format!("'{reference}' is a search term, not a link").into());
    }

    match media::resolve(reference) {
        Ok(id) => {
            let url = media::playback_url(ServerConfig::with_port(port).addr, &id)?;
            println!("{url}");
            Ok(())
        }
        Err(e) => {
            tracing::debug!(error = %e, "Resolution failed");
            Err(e.user_message().into())
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.log_level.as_tracing_level()) {
        eprintln!("Failed to initialize logging: {e}");
    }

    match cli.command {
        Commands::Serve {
            port,
            root,
            read_timeout,
            content_type,
        } => serve(port, root, read_timeout, content_type),
        Commands::Resolve { reference, port } => resolve(&reference, port),
    }
}
