use aula_server::{build_state, Server, ServerConfig};
use clap::Parser;
use std::net::TcpListener;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "aula-server", about = "Reservation engine for shared teaching spaces")]
struct Cli {
    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides the config file).
    #[arg(long)]
    port: Option<u16>,

    /// Data directory for the flat-file store (overrides the config file).
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match ServerConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        },
        None => ServerConfig::default(),
    };
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }

    aula_core::install_signal_handler();

    let (state, _lock) = match build_state(&config) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    let addr = format!("0.0.0.0:{}", config.port);
    info!("starting aula-server on {addr}");
    info!("data directory: {}", config.data_dir.display());

    let listener = match TcpListener::bind(&addr) {
        Ok(l) => l,
        Err(e) => {
            eprintln!("error: failed to bind {addr}: {e}");
            std::process::exit(1);
        }
    };

    let server = Server::new(state, config.max_clients);
    if let Err(e) = server.run(&listener) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
