// src/constants.rs

/// Longest command line accepted on the control connection, terminator excluded.
pub const MAX_COMMAND_LENGTH: usize = 512;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/sandftpd.conf";

pub const SYSTEM_TYPE: &str = "UNIX Type: L8";

/// Extensions advertised by FEAT.
pub const FEATURES: [&str; 5] = ["EPSV", "PASV", "SIZE", "MDTM", "UTF8"];

pub const GREETING: &str = "sandftp ready.";
