use crate::core_network::pasv::PassiveDataChannel;
use crate::core_path::{normalize, PathResolver, PathSecurityError};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    AwaitingPassword,
    Authenticated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferType {
    Ascii,
    Binary,
}

/// State of one control connection.
///
/// Owned by the task serving the connection, so every mutation goes through
/// `&mut self`. Dropping the session closes any data channel it still holds.
#[derive(Debug)]
pub struct Session {
    auth: AuthState,
    username: Option<String>,
    working_dir: String,
    transfer_type: TransferType,
    rename_pending: Option<String>,
    data_channel: Option<PassiveDataChannel>,
    resolver: PathResolver,
    peer_addr: SocketAddr,
    local_addr: SocketAddr,
}

impl Session {
    pub fn new(resolver: PathResolver, peer_addr: SocketAddr, local_addr: SocketAddr) -> Self {
        Self {
            auth: AuthState::Unauthenticated,
            username: None,
            working_dir: String::from("/"),
            transfer_type: TransferType::Ascii,
            rename_pending: None,
            data_channel: None,
            resolver,
            peer_addr,
            local_addr,
        }
    }

    pub fn auth_state(&self) -> AuthState {
        self.auth
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth == AuthState::Authenticated
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// USER: a new name always restarts the login sequence.
    pub fn begin_login(&mut self, username: &str) {
        self.username = Some(username.to_string());
        self.auth = AuthState::AwaitingPassword;
    }

    pub fn complete_login(&mut self) {
        self.auth = AuthState::Authenticated;
    }

    pub fn working_dir(&self) -> &str {
        &self.working_dir
    }

    pub fn set_working_dir(&mut self, virtual_path: String) {
        self.working_dir = virtual_path;
    }

    pub fn transfer_type(&self) -> TransferType {
        self.transfer_type
    }

    pub fn set_transfer_type(&mut self, transfer_type: TransferType) {
        self.transfer_type = transfer_type;
    }

    pub fn set_rename_pending(&mut self, virtual_path: String) {
        self.rename_pending = Some(virtual_path);
    }

    pub fn take_rename_pending(&mut self) -> Option<String> {
        self.rename_pending.take()
    }

    pub fn rename_pending(&self) -> Option<&str> {
        self.rename_pending.as_deref()
    }

    /// Installs a freshly opened channel, closing the one it replaces.
    pub fn set_data_channel(&mut self, channel: PassiveDataChannel) {
        if let Some(mut previous) = self.data_channel.replace(channel) {
            previous.close();
        }
    }

    /// Hands the channel over to a transfer. A channel is used once.
    pub fn take_data_channel(&mut self) -> Option<PassiveDataChannel> {
        self.data_channel.take()
    }

    pub fn has_listening_channel(&self) -> bool {
        self.data_channel
            .as_ref()
            .map_or(false, PassiveDataChannel::is_listening)
    }

    pub fn close_data_channel(&mut self) {
        if let Some(mut channel) = self.data_channel.take() {
            channel.close();
        }
    }

    /// Virtual path of `arg` relative to the working directory.
    pub fn virtual_path(&self, arg: &str) -> String {
        normalize(arg, &self.working_dir)
    }

    /// Real path of `arg`, guaranteed to lie inside the root.
    pub fn resolve(&self, arg: &str) -> Result<PathBuf, PathSecurityError> {
        self.resolver.resolve(arg, &self.working_dir)
    }

    /// Real path of the directory entry `arg` names, without following a
    /// symbolic link in its last component.
    pub fn resolve_entry(&self, arg: &str) -> Result<PathBuf, PathSecurityError> {
        self.resolver.resolve_entry(arg, &self.working_dir)
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn peer_addr(&self) -> SocketAddr {
        self.peer_addr
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_network::pasv::DataChannelState;
    use std::net::{IpAddr, Ipv4Addr};

    fn session(root: &std::path::Path) -> Session {
        let addr: SocketAddr = "127.0.0.1:21".parse().unwrap();
        Session::new(PathResolver::new(root).unwrap(), addr, addr)
    }

    #[test]
    fn test_login_sequence() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session(tmp.path());
        assert_eq!(session.auth_state(), AuthState::Unauthenticated);

        session.begin_login("anonymous");
        assert_eq!(session.auth_state(), AuthState::AwaitingPassword);
        assert_eq!(session.username(), Some("anonymous"));

        session.complete_login();
        assert!(session.is_authenticated());
        assert_eq!(session.transfer_type(), TransferType::Ascii);
        assert_eq!(session.working_dir(), "/");
    }

    #[test]
    fn test_rename_marker_is_single_use() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session(tmp.path());
        session.set_rename_pending("/a.txt".into());
        assert_eq!(session.rename_pending(), Some("/a.txt"));
        assert_eq!(session.take_rename_pending().as_deref(), Some("/a.txt"));
        assert_eq!(session.take_rename_pending(), None);
    }

    #[tokio::test]
    async fn test_new_channel_replaces_previous() {
        let tmp = tempfile::tempdir().unwrap();
        let mut session = session(tmp.path());
        let localhost = IpAddr::V4(Ipv4Addr::LOCALHOST);

        let first = PassiveDataChannel::open(localhost, None).await.unwrap();
        let first_addr = first.local_addr();
        session.set_data_channel(first);
        assert!(session.has_listening_channel());

        let second = PassiveDataChannel::open(localhost, None).await.unwrap();
        session.set_data_channel(second);
        assert!(tokio::net::TcpStream::connect(first_addr).await.is_err());

        let channel = session.take_data_channel().unwrap();
        assert_eq!(channel.state(), DataChannelState::Listening);
        assert!(!session.has_listening_channel());
    }
}
