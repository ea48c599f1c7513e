use crate::config::Config;
use crate::core_ftpcommand::utils::CommandContext;
use crate::core_network::network;
use crate::core_path::PathResolver;
use crate::core_storage::{LocalStorage, StorageBackend};
use crate::helpers::log_config;
use anyhow::{Context, Result};
use log::{error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Semaphore;

/// A bound server, ready to accept control connections.
pub struct FtpServer {
    listener: TcpListener,
    ctx: CommandContext,
    resolver: PathResolver,
    limit: Arc<Semaphore>,
}

impl FtpServer {
    /// Validates `config`, opens the sandbox root and binds the control port.
    pub async fn bind(config: Config, storage: Arc<dyn StorageBackend>) -> Result<Self> {
        config.validate().context("Invalid server configuration")?;

        let resolver = PathResolver::new(&config.server.chroot_dir).with_context(|| {
            format!(
                "Failed to open chroot directory: {}",
                config.server.chroot_dir.display()
            )
        })?;

        let addr = SocketAddr::new(config.server.listen_address, config.server.listen_port);
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Failed to bind control port {}", addr))?;

        let limit = Arc::new(Semaphore::new(config.server.max_connections));
        let ctx = CommandContext::new(Arc::new(config), storage);
        Ok(Self {
            listener,
            ctx,
            resolver,
            limit,
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .context("Failed to read the listening address")
    }

    /// Accepts connections until the listener fails.
    pub async fn serve(self) -> Result<()> {
        info!(
            "Server listening on {} (root {:?})",
            self.local_addr()?,
            self.resolver.root()
        );
        network::accept_connections(self.listener, self.ctx, self.resolver, self.limit).await
    }
}

/// Runs the FTP server with the provided configuration on the local
/// filesystem.
///
/// # Arguments
///
/// * `config` - The server configuration.
///
/// # Returns
///
/// Result<(), anyhow::Error> indicating the success or failure of the operation.
pub async fn run(config: Config) -> Result<()> {
    info!("Starting server with config:");
    log_config(&config);

    let server = match FtpServer::bind(config, Arc::new(LocalStorage::new())).await {
        Ok(server) => server,
        Err(e) => {
            error!("Failed to start server: {:#}", e);
            return Err(e);
        }
    };
    server.serve().await
}
