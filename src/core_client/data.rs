use crate::core_client::error::ClientError;
use log::{debug, trace};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// The client end of a passive data connection.
///
/// Connected as soon as [`ClientDataChannel::connect`] returns; the server
/// sends no greeting on the data connection.
#[derive(Debug)]
pub struct ClientDataChannel {
    stream: Option<TcpStream>,
    idle_timeout: Duration,
}

impl ClientDataChannel {
    pub async fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self, ClientError> {
        let stream = tokio::time::timeout(timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ClientError::Timeout(timeout))??;
        debug!("Data connection to {}", addr);
        Ok(Self {
            stream: Some(stream),
            idle_timeout: timeout,
        })
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Writes `data` and closes the write side, which tells the server the
    /// upload is complete.
    pub async fn send_all(&mut self, data: &[u8]) -> Result<(), ClientError> {
        let idle = self.idle_timeout;
        let stream = self.stream.as_mut().ok_or(ClientError::ConnectionClosed)?;
        tokio::time::timeout(idle, async {
            stream.write_all(data).await?;
            stream.shutdown().await
        })
        .await
        .map_err(|_| ClientError::Timeout(idle))??;
        trace!("Sent {} bytes", data.len());
        Ok(())
    }

    /// Reads until the server closes the connection.
    pub async fn receive_all(&mut self) -> Result<Vec<u8>, ClientError> {
        let idle = self.idle_timeout;
        let stream = self.stream.as_mut().ok_or(ClientError::ConnectionClosed)?;
        let mut data = Vec::new();
        let mut chunk = vec![0u8; 64 * 1024];
        loop {
            let n = tokio::time::timeout(idle, stream.read(&mut chunk))
                .await
                .map_err(|_| ClientError::Timeout(idle))??;
            if n == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..n]);
        }
        trace!("Received {} bytes", data.len());
        Ok(data)
    }

    pub fn close(&mut self) {
        self.stream = None;
    }
}
