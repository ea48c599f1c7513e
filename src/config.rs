use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read configuration file {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse configuration file {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_address: IpAddr,
    pub listen_port: u16,
    /// Address advertised in 227 replies, for servers behind NAT.
    pub pasv_address: Option<Ipv4Addr>,
    pub pasv_port_min: Option<u16>,
    pub pasv_port_max: Option<u16>,
    /// Only accept data connections from the control connection's peer.
    pub pasv_peer_check: bool,
    pub chroot_dir: PathBuf,
    /// Extra greeting lines sent before the final `220`.
    pub banner: Option<String>,
    pub max_connections: usize,
    pub data_timeout_secs: u64,
    pub data_idle_timeout_secs: u64,
    pub idle_timeout_secs: u64,
    pub transfer_buffer_size: usize,
    /// Largest accepted upload in bytes; uploads are held in memory.
    pub max_upload_size: u64,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            listen_port: 21,
            pasv_address: None,
            pasv_port_min: None,
            pasv_port_max: None,
            pasv_peer_check: true,
            chroot_dir: PathBuf::from("/var/ftp"),
            banner: None,
            max_connections: 64,
            data_timeout_secs: 30,
            data_idle_timeout_secs: 60,
            idle_timeout_secs: 300,
            transfer_buffer_size: 64 * 1024, // 64 KB
            max_upload_size: 256 * 1024 * 1024, // 256 MB
        }
    }
}

impl ServerConfig {
    /// The configured passive port range, if both ends are set.
    pub fn pasv_port_range(&self) -> Option<RangeInclusive<u16>> {
        match (self.pasv_port_min, self.pasv_port_max) {
            (Some(min), Some(max)) => Some(min..=max),
            _ => None,
        }
    }

    pub fn data_timeout(&self) -> Duration {
        Duration::from_secs(self.data_timeout_secs)
    }

    pub fn data_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.data_idle_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Config {
    pub fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let config_str = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&config_str).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let server = &self.server;
        match (server.pasv_port_min, server.pasv_port_max) {
            (Some(min), Some(max)) if min > max => {
                return Err(ConfigError::Invalid(format!(
                    "pasv_port_min ({}) is greater than pasv_port_max ({})",
                    min, max
                )));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(ConfigError::Invalid(
                    "pasv_port_min and pasv_port_max must be set together".to_string(),
                ));
            }
            _ => {}
        }
        if server.data_timeout_secs == 0
            || server.data_idle_timeout_secs == 0
            || server.idle_timeout_secs == 0
        {
            return Err(ConfigError::Invalid("timeouts must be at least one second".to_string()));
        }
        if server.max_connections == 0 {
            return Err(ConfigError::Invalid("max_connections must be at least 1".to_string()));
        }
        if server.transfer_buffer_size == 0 {
            return Err(ConfigError::Invalid("transfer_buffer_size must not be 0".to_string()));
        }
        if server.max_upload_size == 0 {
            return Err(ConfigError::Invalid("max_upload_size must not be 0".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            listen_port = 2121
            chroot_dir = "/srv/ftp"
            pasv_address = "203.0.113.7"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.listen_port, 2121);
        assert_eq!(config.server.chroot_dir, PathBuf::from("/srv/ftp"));
        assert_eq!(config.server.pasv_address, Some(Ipv4Addr::new(203, 0, 113, 7)));
        assert_eq!(config.server.data_timeout(), Duration::from_secs(30));
        assert_eq!(config.server.max_upload_size, 256 * 1024 * 1024);
        assert!(config.server.pasv_peer_check);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.server.pasv_port_min = Some(50010);
        config.server.pasv_port_max = Some(50000);
        assert!(config.validate().is_err());

        config.server.pasv_port_max = None;
        assert!(config.validate().is_err());

        config.server.pasv_port_max = Some(50020);
        assert_eq!(config.server.pasv_port_range(), Some(50010..=50020));
        assert!(config.validate().is_ok());

        config.server.data_timeout_secs = 0;
        assert!(config.validate().is_err());

        config.server.data_timeout_secs = 30;
        config.server.max_upload_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sample_configuration_is_valid() {
        let config: Config = toml::from_str(include_str!("../etc/sandftpd.conf")).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.pasv_port_range(), Some(50000..=50100));
        assert_eq!(config.server.banner.as_deref().map(|b| b.lines().count()), Some(2));
    }

    #[test]
    fn test_load_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("sandftpd.conf");
        std::fs::write(&path, "[server]\nlisten_port = 0\nmax_connections = 2\n").unwrap();
        let config = Config::load_from_file(path.to_str().unwrap()).unwrap();
        assert_eq!(config.server.max_connections, 2);

        std::fs::write(&path, "[server\n").unwrap();
        assert!(matches!(
            Config::load_from_file(path.to_str().unwrap()),
            Err(ConfigError::Parse { .. })
        ));
        assert!(matches!(
            Config::load_from_file("/nonexistent/sandftpd.conf"),
            Err(ConfigError::Read { .. })
        ));
    }
}
