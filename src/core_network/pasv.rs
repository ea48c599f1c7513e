use crate::core_protocol::codes::{CANT_OPEN_DATA_CONNECTION, EXCEEDED_STORAGE, TRANSFER_ABORTED};
use crate::core_protocol::Response;
use log::{debug, trace, warn};
use rand::Rng;
use std::io::{self, ErrorKind};
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

#[derive(Error, Debug)]
pub enum DataConnectionError {
    #[error("failed to open passive listener: {0}")]
    Bind(io::Error),

    #[error("no data connection within {0:?}")]
    Timeout(Duration),

    #[error("failed to accept data connection: {0}")]
    Accept(io::Error),

    #[error("data channel is not listening")]
    NotListening,

    #[error("data channel is not connected")]
    NotConnected,

    #[error("data transfer failed: {0}")]
    Transfer(io::Error),

    #[error("data transfer stalled for {0:?}")]
    Stalled(Duration),

    #[error("upload exceeds the limit of {0} bytes")]
    TooLarge(u64),
}

impl DataConnectionError {
    pub fn to_ftp_response(&self) -> Response {
        match self {
            DataConnectionError::Bind(_)
            | DataConnectionError::Timeout(_)
            | DataConnectionError::Accept(_)
            | DataConnectionError::NotListening => {
                Response::new(CANT_OPEN_DATA_CONNECTION, "Can't open data connection.")
            }
            DataConnectionError::NotConnected
            | DataConnectionError::Transfer(_)
            | DataConnectionError::Stalled(_) => {
                Response::new(TRANSFER_ABORTED, "Connection closed; transfer aborted.")
            }
            DataConnectionError::TooLarge(_) => {
                Response::new(EXCEEDED_STORAGE, "Exceeded storage allocation.")
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataChannelState {
    Listening,
    Connected,
    Closed,
}

/// A passive-mode data channel: one listener, at most one accepted peer,
/// one transfer. Dropping the channel releases both sockets.
#[derive(Debug)]
pub struct PassiveDataChannel {
    listener: Option<TcpListener>,
    stream: Option<TcpStream>,
    local_addr: SocketAddr,
    state: DataChannelState,
    idle_timeout: Duration,
    buffer_size: usize,
    max_receive_size: u64,
}

impl PassiveDataChannel {
    /// Binds a listener on `bind_ip`.
    ///
    /// Without a range the port is assigned by the OS. With a range the ports
    /// are tried in order starting from a random offset, wrapping around once.
    pub async fn open(
        bind_ip: IpAddr,
        port_range: Option<RangeInclusive<u16>>,
    ) -> Result<Self, DataConnectionError> {
        let listener = match port_range {
            None => TcpListener::bind((bind_ip, 0))
                .await
                .map_err(DataConnectionError::Bind)?,
            Some(range) => bind_in_range(bind_ip, range).await?,
        };
        let local_addr = listener.local_addr().map_err(DataConnectionError::Bind)?;
        debug!("Passive listener opened on {}", local_addr);

        Ok(Self {
            listener: Some(listener),
            stream: None,
            local_addr,
            state: DataChannelState::Listening,
            idle_timeout: Duration::from_secs(60),
            buffer_size: 64 * 1024,
            max_receive_size: u64::MAX,
        })
    }

    /// Bounds every individual read and write once connected.
    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size.max(1);
        self
    }

    /// Caps the number of bytes `receive_all` accepts.
    pub fn with_max_receive_size(mut self, max_receive_size: u64) -> Self {
        self.max_receive_size = max_receive_size;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> DataChannelState {
        self.state
    }

    pub fn is_listening(&self) -> bool {
        self.state == DataChannelState::Listening
    }

    /// Waits for the client to connect.
    ///
    /// The listener is gone once this returns, whatever the outcome. Peers
    /// whose address differs from `expected_peer` are dropped and waiting
    /// goes on until `timeout` expires.
    pub async fn await_peer(
        &mut self,
        timeout: Duration,
        expected_peer: Option<IpAddr>,
    ) -> Result<SocketAddr, DataConnectionError> {
        let listener = match self.listener.take() {
            Some(listener) if self.state == DataChannelState::Listening => listener,
            _ => return Err(DataConnectionError::NotListening),
        };

        let accepted = tokio::time::timeout(timeout, async {
            loop {
                let (stream, peer) = listener.accept().await?;
                match expected_peer {
                    Some(ip) if ip.to_canonical() != peer.ip().to_canonical() => {
                        warn!(
                            "Dropping data connection from {}: expected {}",
                            peer, ip
                        );
                    }
                    _ => return Ok::<_, io::Error>((stream, peer)),
                }
            }
        })
        .await;
        drop(listener);

        match accepted {
            Ok(Ok((stream, peer))) => {
                debug!("Data connection from {} on {}", peer, self.local_addr);
                self.stream = Some(stream);
                self.state = DataChannelState::Connected;
                Ok(peer)
            }
            Ok(Err(e)) => {
                self.close();
                Err(DataConnectionError::Accept(e))
            }
            Err(_) => {
                self.close();
                warn!("No data connection on {} within {:?}", self.local_addr, timeout);
                Err(DataConnectionError::Timeout(timeout))
            }
        }
    }

    /// Writes `data` and shuts the write side down to mark the end of data.
    pub async fn send_all(&mut self, data: &[u8]) -> Result<u64, DataConnectionError> {
        let idle = self.idle_timeout;
        let chunk_size = self.buffer_size;
        let stream = self
            .stream
            .as_mut()
            .ok_or(DataConnectionError::NotConnected)?;

        for chunk in data.chunks(chunk_size) {
            tokio::time::timeout(idle, stream.write_all(chunk))
                .await
                .map_err(|_| DataConnectionError::Stalled(idle))?
                .map_err(DataConnectionError::Transfer)?;
        }
        stream.flush().await.map_err(DataConnectionError::Transfer)?;
        stream
            .shutdown()
            .await
            .map_err(DataConnectionError::Transfer)?;

        trace!("Sent {} bytes on {}", data.len(), self.local_addr);
        Ok(data.len() as u64)
    }

    /// Reads until the peer closes its side. More than the receive limit
    /// fails with `TooLarge`; the channel should be closed afterwards.
    pub async fn receive_all(&mut self) -> Result<Vec<u8>, DataConnectionError> {
        let idle = self.idle_timeout;
        let limit = self.max_receive_size;
        let mut buffer = vec![0u8; self.buffer_size];
        let stream = self
            .stream
            .as_mut()
            .ok_or(DataConnectionError::NotConnected)?;

        let mut data = Vec::new();
        loop {
            let n = tokio::time::timeout(idle, stream.read(&mut buffer))
                .await
                .map_err(|_| DataConnectionError::Stalled(idle))?
                .map_err(DataConnectionError::Transfer)?;
            if n == 0 {
                break;
            }
            if data.len() as u64 + n as u64 > limit {
                warn!("Upload on {} exceeds {} bytes", self.local_addr, limit);
                return Err(DataConnectionError::TooLarge(limit));
            }
            data.extend_from_slice(&buffer[..n]);
        }

        trace!("Received {} bytes on {}", data.len(), self.local_addr);
        Ok(data)
    }

    /// Releases the listener and the stream. Safe to call more than once.
    pub fn close(&mut self) {
        if self.state != DataChannelState::Closed {
            trace!("Closing data channel on {}", self.local_addr);
        }
        self.listener = None;
        self.stream = None;
        self.state = DataChannelState::Closed;
    }
}

async fn bind_in_range(
    bind_ip: IpAddr,
    range: RangeInclusive<u16>,
) -> Result<TcpListener, DataConnectionError> {
    let (start, end) = (*range.start(), *range.end());
    if start > end {
        return Err(DataConnectionError::Bind(io::Error::new(
            ErrorKind::InvalidInput,
            "empty passive port range",
        )));
    }

    let count = u32::from(end - start) + 1;
    let offset = rand::thread_rng().gen_range(0..count);
    for i in 0..count {
        let port = start + ((offset + i) % count) as u16;
        match TcpListener::bind((bind_ip, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == ErrorKind::AddrInUse => continue,
            Err(e) => return Err(DataConnectionError::Bind(e)),
        }
    }

    Err(DataConnectionError::Bind(io::Error::new(
        ErrorKind::AddrInUse,
        format!("no free port in {}..={}", start, end),
    )))
}
