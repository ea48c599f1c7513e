use crate::core_client::connection::ControlConnection;
use crate::core_client::data::ClientDataChannel;
use crate::core_client::error::ClientError;
use crate::core_protocol::codes::{
    CLOSING_CONTROL, COMMAND_OK, ENTERING_EXTENDED_PASSIVE, ENTERING_PASSIVE, FILE_ACTION_OK,
    FILE_STATUS, LOGGED_IN, NEED_PASSWORD, PATH_CREATED, PENDING_FURTHER_INFO, SERVICE_READY,
    SYSTEM_STATUS, SYSTEM_TYPE,
};
use crate::core_protocol::passive::{decode_epsv, decode_pasv};
use crate::core_protocol::{ProtocolError, Response};
use crate::session::TransferType;
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, info};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::ToSocketAddrs;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub connect_timeout: Duration,
    /// Bound on waiting for a reply on the control connection.
    pub read_timeout: Duration,
    /// Bound on connecting the data channel and on each read or write on it.
    pub data_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(30),
            data_timeout: Duration::from_secs(30),
        }
    }
}

/// A logged-in (or about to be) client session.
///
/// Operations are sequential: each one finishes its command exchange, and
/// closes its data channel, before the next starts.
#[derive(Debug)]
pub struct FtpClient {
    control: ControlConnection,
    config: ClientConfig,
    greeting: Response,
}

fn verb_of(line: &str) -> String {
    line.split(' ').next().unwrap_or(line).to_ascii_uppercase()
}

fn rejected(line: &str, response: &Response) -> ClientError {
    ClientError::Rejected {
        command: verb_of(line),
        code: response.code,
        message: response.message().to_string(),
    }
}

/// Extracts the path from a `257 "<path>" ...` reply.
fn quoted_path(text: &str) -> Option<String> {
    let rest = text.strip_prefix('"')?;
    let mut path = String::new();
    let mut chars = rest.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '"' {
            if chars.peek() == Some(&'"') {
                chars.next();
                path.push('"');
            } else {
                return Some(path);
            }
        } else {
            path.push(c);
        }
    }
    None
}

impl FtpClient {
    /// Connects and reads the greeting.
    pub async fn connect<A: ToSocketAddrs>(addr: A, config: ClientConfig) -> Result<Self, ClientError> {
        let mut control =
            ControlConnection::connect(addr, config.connect_timeout, config.read_timeout).await?;

        let mut greeting = control.read_response().await?;
        // 120: service ready in a moment.
        while greeting.is_preliminary() {
            greeting = control.read_response().await?;
        }
        if greeting.code != SERVICE_READY {
            return Err(rejected("CONNECT", &greeting));
        }
        info!("Connected to {}: {}", control.peer_addr(), greeting.message());

        Ok(Self {
            control,
            config,
            greeting,
        })
    }

    pub fn greeting(&self) -> &Response {
        &self.greeting
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.control.peer_addr()
    }

    /// Sends `line` and requires one of `expected` in reply.
    async fn expect(&mut self, line: &str, expected: &[u16]) -> Result<Response, ClientError> {
        let response = self.control.command(line).await?;
        if expected.contains(&response.code) {
            Ok(response)
        } else {
            Err(rejected(line, &response))
        }
    }

    pub async fn login(&mut self, user: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .expect(&format!("USER {}", user), &[LOGGED_IN, NEED_PASSWORD])
            .await?;
        if response.code == NEED_PASSWORD {
            self.expect(&format!("PASS {}", password), &[LOGGED_IN, 202])
                .await?;
        }
        info!("Logged in as {}", user);
        Ok(())
    }

    /// Says goodbye and drops the connection.
    pub async fn quit(mut self) -> Result<(), ClientError> {
        match self.expect("QUIT", &[CLOSING_CONTROL]).await {
            Ok(_) | Err(ClientError::ConnectionClosed) => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub async fn noop(&mut self) -> Result<(), ClientError> {
        self.expect("NOOP", &[COMMAND_OK]).await.map(|_| ())
    }

    pub async fn system_type(&mut self) -> Result<String, ClientError> {
        let response = self.expect("SYST", &[SYSTEM_TYPE]).await?;
        Ok(response.message().to_string())
    }

    /// Extensions advertised by the server; empty if FEAT is not supported.
    pub async fn features(&mut self) -> Result<Vec<String>, ClientError> {
        let response = self.control.command("FEAT").await?;
        if response.code != SYSTEM_STATUS {
            return Ok(Vec::new());
        }
        let count = response.lines.len();
        Ok(response
            .lines
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != 0 && *i + 1 != count)
            .map(|(_, line)| line.trim().to_string())
            .filter(|line| !line.is_empty())
            .collect())
    }

    pub async fn pwd(&mut self) -> Result<String, ClientError> {
        let response = self.expect("PWD", &[PATH_CREATED]).await?;
        quoted_path(response.message()).ok_or_else(|| {
            ClientError::Protocol(ProtocolError::MalformedLine(response.message().to_string()))
        })
    }

    pub async fn cwd(&mut self, path: &str) -> Result<(), ClientError> {
        self.expect(&format!("CWD {}", path), &[FILE_ACTION_OK])
            .await
            .map(|_| ())
    }

    pub async fn cdup(&mut self) -> Result<(), ClientError> {
        self.expect("CDUP", &[FILE_ACTION_OK, COMMAND_OK])
            .await
            .map(|_| ())
    }

    pub async fn set_transfer_type(&mut self, transfer_type: TransferType) -> Result<(), ClientError> {
        let line = match transfer_type {
            TransferType::Ascii => "TYPE A",
            TransferType::Binary => "TYPE I",
        };
        self.expect(line, &[COMMAND_OK]).await.map(|_| ())
    }

    /// Negotiates a passive data address: EPSV first, PASV if EPSV is
    /// refused with a 5xx. Either reply is understood whichever was sent.
    async fn passive_address(&mut self) -> Result<SocketAddr, ClientError> {
        let mut line = "EPSV";
        let mut response = self.control.command(line).await?;
        if response.is_permanent_failure() {
            debug!("EPSV refused ({}), falling back to PASV", response.code);
            line = "PASV";
            response = self.control.command(line).await?;
        }

        let control_ip = self.control.peer_addr().ip();
        match response.code {
            ENTERING_EXTENDED_PASSIVE => {
                let port = decode_epsv(&response.text())?;
                Ok(SocketAddr::new(control_ip, port))
            }
            ENTERING_PASSIVE => {
                let addr = decode_pasv(&response.text())?;
                // Servers behind NAT sometimes advertise an unusable address.
                let ip = if addr.ip().is_unspecified() {
                    control_ip
                } else {
                    IpAddr::V4(*addr.ip())
                };
                Ok(SocketAddr::new(ip, addr.port()))
            }
            _ => Err(rejected(line, &response)),
        }
    }

    async fn open_data_channel(&mut self) -> Result<ClientDataChannel, ClientError> {
        let addr = self.passive_address().await?;
        ClientDataChannel::connect(addr, self.config.data_timeout).await
    }

    /// Sends a transfer command on an already connected channel and
    /// requires the `1xx` that announces the transfer.
    async fn start_transfer(&mut self, line: &str) -> Result<(), ClientError> {
        let response = self.control.command(line).await?;
        if response.is_preliminary() {
            Ok(())
        } else {
            Err(rejected(line, &response))
        }
    }

    async fn finish_transfer(&mut self, line: &str) -> Result<(), ClientError> {
        let response = self.control.read_response().await?;
        if response.is_completion() {
            Ok(())
        } else {
            Err(rejected(line, &response))
        }
    }

    async fn fetch(&mut self, line: &str) -> Result<Vec<u8>, ClientError> {
        let mut channel = self.open_data_channel().await?;
        self.start_transfer(line).await?;

        let received = channel.receive_all().await;
        channel.close();
        let finished = self.finish_transfer(line).await;
        let data = received?;
        finished?;
        Ok(data)
    }

    /// `ls -l` style listing of `path`, or of the working directory.
    pub async fn list(&mut self, path: Option<&str>) -> Result<String, ClientError> {
        let line = match path {
            Some(path) => format!("LIST {}", path),
            None => "LIST".to_string(),
        };
        let data = self.fetch(&line).await?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    pub async fn name_list(&mut self, path: Option<&str>) -> Result<Vec<String>, ClientError> {
        let line = match path {
            Some(path) => format!("NLST {}", path),
            None => "NLST".to_string(),
        };
        let data = self.fetch(&line).await?;
        Ok(String::from_utf8_lossy(&data)
            .lines()
            .map(str::to_string)
            .collect())
    }

    pub async fn download(&mut self, remote: &str) -> Result<Vec<u8>, ClientError> {
        self.set_transfer_type(TransferType::Binary).await?;
        let data = self.fetch(&format!("RETR {}", remote)).await?;
        info!("Downloaded {} ({} bytes)", remote, data.len());
        Ok(data)
    }

    pub async fn upload(&mut self, data: &[u8], remote: &str) -> Result<(), ClientError> {
        self.set_transfer_type(TransferType::Binary).await?;
        let line = format!("STOR {}", remote);
        let mut channel = self.open_data_channel().await?;
        self.start_transfer(&line).await?;

        let sent = channel.send_all(data).await;
        channel.close();
        sent?;
        self.finish_transfer(&line).await?;
        info!("Uploaded {} ({} bytes)", remote, data.len());
        Ok(())
    }

    /// RNFR then RNTO. RNTO is only sent once RNFR was accepted.
    pub async fn rename(&mut self, from: &str, to: &str) -> Result<(), ClientError> {
        self.expect(&format!("RNFR {}", from), &[PENDING_FURTHER_INFO])
            .await?;
        self.expect(&format!("RNTO {}", to), &[FILE_ACTION_OK])
            .await
            .map(|_| ())
    }

    pub async fn delete(&mut self, path: &str) -> Result<(), ClientError> {
        self.expect(&format!("DELE {}", path), &[FILE_ACTION_OK])
            .await
            .map(|_| ())
    }

    /// Returns the path of the new directory as reported by the server.
    pub async fn make_directory(&mut self, path: &str) -> Result<String, ClientError> {
        let response = self.expect(&format!("MKD {}", path), &[PATH_CREATED]).await?;
        Ok(quoted_path(response.message()).unwrap_or_else(|| path.to_string()))
    }

    pub async fn remove_directory(&mut self, path: &str) -> Result<(), ClientError> {
        self.expect(&format!("RMD {}", path), &[FILE_ACTION_OK])
            .await
            .map(|_| ())
    }

    pub async fn size(&mut self, path: &str) -> Result<u64, ClientError> {
        let response = self.expect(&format!("SIZE {}", path), &[FILE_STATUS]).await?;
        response.message().trim().parse().map_err(|_| {
            ClientError::Protocol(ProtocolError::MalformedLine(response.message().to_string()))
        })
    }

    pub async fn modified_time(&mut self, path: &str) -> Result<DateTime<Utc>, ClientError> {
        let response = self.expect(&format!("MDTM {}", path), &[FILE_STATUS]).await?;
        let text = response.message().trim();
        // Some servers append milliseconds: YYYYMMDDHHMMSS.sss
        let stamp = text.split('.').next().unwrap_or(text);
        NaiveDateTime::parse_from_str(stamp, "%Y%m%d%H%M%S")
            .map(|naive| naive.and_utc())
            .map_err(|_| ClientError::Protocol(ProtocolError::MalformedLine(text.to_string())))
    }
}
