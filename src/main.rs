use anyhow::Result;
use clap::Parser;
use log::info;
use sandftp::constants::DEFAULT_CONFIG_PATH;
use sandftp::core_cli::Cli;
use sandftp::core_log::logger::init_logger;
use sandftp::helpers::load_config;
use sandftp::server;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args = Cli::parse();

    init_logger(args.verbose);

    // Load configuration from the TOML file
    let config_path = if args.config.is_empty() {
        DEFAULT_CONFIG_PATH
    } else {
        args.config.as_str()
    };
    let mut config = load_config(config_path)?;
    info!("Loaded configuration from {}", config_path);

    // CLI overrides
    if let Some(port) = args.port {
        config.server.listen_port = port;
    }
    if let Some(root) = args.root {
        config.server.chroot_dir = root;
    }

    // Run the FTP server
    server::run(config).await?;

    Ok(())
}
