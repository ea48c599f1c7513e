use crate::config::Config;
use crate::core_protocol::Response;
use anyhow::{Context, Result};
use log::{debug, info};
use tokio::io::{AsyncWrite, AsyncWriteExt};

/// Sends a response to the client.
pub async fn send_response<W>(writer: &mut W, response: &Response) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(response.to_wire().as_bytes()).await?;
    writer.flush().await?;
    debug!("-> {}", response);
    Ok(())
}

pub fn load_config(path: &str) -> Result<Config> {
    let config = Config::load_from_file(path)
        .with_context(|| format!("Failed to load configuration file: {}", path))?;
    Ok(config)
}

// Helper function to log configuration options
pub fn log_config(config: &Config) {
    let server = &config.server;
    info!("  Listen Address: {}:{}", server.listen_address, server.listen_port);
    match server.pasv_address {
        Some(addr) => info!("  PASV Address: {}", addr),
        None => info!("  PASV Address: (control connection address)"),
    }
    match server.pasv_port_range() {
        Some(range) => info!("  PASV Ports: {}-{}", range.start(), range.end()),
        None => info!("  PASV Ports: (any)"),
    }
    info!("  PASV Peer Check: {}", server.pasv_peer_check);
    info!("  Chroot Directory: {}", server.chroot_dir.display());
    info!("  Max Connections: {}", server.max_connections);
    info!(
        "  Timeouts: data {}s, data idle {}s, control idle {}s",
        server.data_timeout_secs, server.data_idle_timeout_secs, server.idle_timeout_secs
    );
    info!("  Transfer Buffer Size: {} KB", server.transfer_buffer_size / 1024);
    info!("  Max Upload Size: {} MB", server.max_upload_size / (1024 * 1024));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_response_writes_wire_format() {
        let mut out = Vec::new();
        send_response(&mut out, &Response::multi(211, ["Features:", "EPSV", "End"]))
            .await
            .unwrap();
        assert_eq!(out, b"211-Features:\r\n211-EPSV\r\n211 End\r\n");
    }
}
