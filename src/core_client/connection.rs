use crate::core_client::error::ClientError;
use crate::core_protocol::{parse_complete, ParseOutcome, Response};
use log::{debug, trace};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

/// The client end of a control connection.
///
/// Bytes read past the end of a reply are kept for the next one, so a `150`
/// and a `226` arriving in a single segment are both seen.
#[derive(Debug)]
pub struct ControlConnection {
    reader: OwnedReadHalf,
    writer: OwnedWriteHalf,
    buffer: Vec<u8>,
    read_timeout: Duration,
    peer_addr: SocketAddr,
}

impl ControlConnection {
    pub async fn connect<A: ToSocketAddrs>(
        addr: A,
        connect_timeout: Duration,
        read_timeout: Duration,
    ) -> Result<Self, ClientError> {
        let stream = tokio::time::timeout(connect_timeout, TcpStream::connect(addr))
            .await
            .map_err(|_| ClientError::Timeout(connect_timeout))??;
        let peer_addr = stream.peer_addr()?;
        debug!("Control connection to {}", peer_addr);

        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader,
            writer,
            buffer: Vec::new(),
            read_timeout,
            peer_addr,
        })
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    /// Sends one command line. Lines containing CR or LF are refused so an
    /// argument cannot smuggle in a second command.
    pub async fn send_command(&mut self, line: &str) -> Result<(), ClientError> {
        if line.contains(['\r', '\n']) {
            return Err(ClientError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "command contains a line break",
            )));
        }
        if line.get(..5).map_or(false, |verb| verb.eq_ignore_ascii_case("PASS ")) {
            debug!("-> PASS ****");
        } else {
            debug!("-> {}", line);
        }

        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Reads the next complete reply.
    pub async fn read_response(&mut self) -> Result<Response, ClientError> {
        let mut chunk = [0u8; 4096];
        loop {
            if let ParseOutcome::Complete { response, consumed } = parse_complete(&self.buffer)? {
                self.buffer.drain(..consumed);
                debug!("<- {}", response);
                return Ok(response);
            }

            let n = tokio::time::timeout(self.read_timeout, self.reader.read(&mut chunk))
                .await
                .map_err(|_| ClientError::Timeout(self.read_timeout))??;
            if n == 0 {
                return Err(ClientError::ConnectionClosed);
            }
            trace!("Read {} bytes on the control connection", n);
            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    pub async fn command(&mut self, line: &str) -> Result<Response, ClientError> {
        self.send_command(line).await?;
        self.read_response().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_replies_sharing_a_segment() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            socket
                .write_all(b"220-Welcome\r\n220 Ready\r\n150 Opening\r\n226 Done\r\n")
                .await
                .unwrap();
            let mut line = [0u8; 6];
            socket.read_exact(&mut line).await.unwrap();
            assert_eq!(&line, b"NOOP\r\n");
        });

        let timeout = Duration::from_secs(5);
        let mut control = ControlConnection::connect(addr, timeout, timeout).await.unwrap();
        let greeting = control.read_response().await.unwrap();
        assert_eq!(greeting.lines, vec!["Welcome", "Ready"]);
        assert_eq!(control.read_response().await.unwrap().code, 150);
        assert_eq!(control.read_response().await.unwrap().code, 226);
        control.send_command("NOOP").await.unwrap();
        server.await.unwrap();

        assert!(matches!(
            control.read_response().await,
            Err(ClientError::ConnectionClosed)
        ));
    }

    #[tokio::test]
    async fn test_read_timeout() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
            drop(socket);
        });

        let mut control =
            ControlConnection::connect(addr, Duration::from_secs(5), Duration::from_millis(100))
                .await
                .unwrap();
        assert!(matches!(
            control.read_response().await,
            Err(ClientError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_line_breaks_are_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let timeout = Duration::from_secs(5);
        let mut control = ControlConnection::connect(addr, timeout, timeout).await.unwrap();
        assert!(control.send_command("RETR a\r\nDELE b").await.is_err());
    }
}
