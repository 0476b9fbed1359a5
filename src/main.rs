// src/main.rs
use clap::Parser;
use upload_handler::{ServerConfig, server::run_server};

#[derive(Parser)]
#[command(name = "upload-handler")]
#[command(about = "Demo server accepting multipart file uploads")]
struct Cli {
    /// Port to listen on (overrides PORT)
    #[arg(long)]
    port: Option<u16>,

    /// Directory receiving uploaded files (overrides UPLOAD_DIR)
    #[arg(long)]
    dest: Option<String>,

    /// Maximum upload size in bytes, 0 for the default (overrides UPLOAD_MAX_SIZE)
    #[arg(long)]
    max_size: Option<i64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(dest) = cli.dest {
        config.upload_dir = dest;
    }
    if let Some(max_size) = cli.max_size {
        config.max_upload_size = max_size;
    }

    run_server(config).await
}
