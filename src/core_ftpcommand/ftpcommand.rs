use crate::core_protocol::codes::{NOT_IMPLEMENTED, SYNTAX_ERROR, SYNTAX_ERROR_ARGS};
use crate::core_protocol::Response;
use thiserror::Error;

/// Every verb the server understands, with its argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FtpCommand {
    USER(String),
    PASS(String),
    QUIT,
    NOOP,
    SYST,
    FEAT,
    PWD,
    CWD(String),
    CDUP,
    TYPE(String),
    RNFR(String),
    RNTO(String),
    DELE(String),
    MKD(String),
    RMD(String),
    SIZE(String),
    MDTM(String),
    PASV,
    EPSV(Option<String>),
    LIST(Option<String>),
    NLST(Option<String>),
    RETR(String),
    STOR(String),
}

/// What a command needs from the session before it may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    /// Allowed before login.
    SessionManagement,
    Authenticated,
    /// Opens a data channel.
    TransferSetup,
    /// Consumes a data channel.
    Transfer,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty command line")]
    Empty,

    #[error("unknown command {0:?}")]
    Unknown(String),

    #[error("{0} requires an argument")]
    MissingArgument(&'static str),
}

impl ParseError {
    pub fn to_ftp_response(&self) -> Response {
        match self {
            ParseError::Empty => Response::new(SYNTAX_ERROR, "Syntax error, command unrecognized."),
            ParseError::Unknown(_) => Response::new(NOT_IMPLEMENTED, "Command not implemented."),
            ParseError::MissingArgument(_) => {
                Response::new(SYNTAX_ERROR_ARGS, "Syntax error in parameters or arguments.")
            }
        }
    }
}

impl FtpCommand {
    /// Parses one command line, without its terminator.
    ///
    /// The verb is case-insensitive; the argument is everything after the
    /// first space, so file names may contain spaces.
    pub fn parse(line: &str) -> Result<FtpCommand, ParseError> {
        let line = line.trim_matches(|c| c == '\r' || c == '\n');
        let (verb, arg) = match line.split_once(' ') {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        };
        if verb.is_empty() {
            return Err(ParseError::Empty);
        }

        let optional = || (!arg.is_empty()).then(|| arg.to_string());
        let verb_upper = verb.to_ascii_uppercase();
        let required = |name: &'static str| {
            if arg.is_empty() {
                Err(ParseError::MissingArgument(name))
            } else {
                Ok(arg.to_string())
            }
        };

        let command = match verb_upper.as_str() {
            "USER" => FtpCommand::USER(required("USER")?),
            "PASS" => FtpCommand::PASS(arg.to_string()),
            "QUIT" => FtpCommand::QUIT,
            "NOOP" => FtpCommand::NOOP,
            "SYST" => FtpCommand::SYST,
            "FEAT" => FtpCommand::FEAT,
            "PWD" | "XPWD" => FtpCommand::PWD,
            "CWD" | "XCWD" => FtpCommand::CWD(required("CWD")?),
            "CDUP" | "XCUP" => FtpCommand::CDUP,
            "TYPE" => FtpCommand::TYPE(required("TYPE")?),
            "RNFR" => FtpCommand::RNFR(required("RNFR")?),
            "RNTO" => FtpCommand::RNTO(required("RNTO")?),
            "DELE" => FtpCommand::DELE(required("DELE")?),
            "MKD" | "XMKD" => FtpCommand::MKD(required("MKD")?),
            "RMD" | "XRMD" => FtpCommand::RMD(required("RMD")?),
            "SIZE" => FtpCommand::SIZE(required("SIZE")?),
            "MDTM" => FtpCommand::MDTM(required("MDTM")?),
            "PASV" => FtpCommand::PASV,
            "EPSV" => FtpCommand::EPSV(optional()),
            "LIST" => FtpCommand::LIST(optional()),
            "NLST" => FtpCommand::NLST(optional()),
            "RETR" => FtpCommand::RETR(required("RETR")?),
            "STOR" => FtpCommand::STOR(required("STOR")?),
            _ => return Err(ParseError::Unknown(verb.to_string())),
        };
        Ok(command)
    }

    pub fn class(&self) -> CommandClass {
        match self {
            FtpCommand::USER(_)
            | FtpCommand::PASS(_)
            | FtpCommand::QUIT
            | FtpCommand::NOOP
            | FtpCommand::SYST
            | FtpCommand::FEAT => CommandClass::SessionManagement,
            FtpCommand::PWD
            | FtpCommand::CWD(_)
            | FtpCommand::CDUP
            | FtpCommand::TYPE(_)
            | FtpCommand::RNFR(_)
            | FtpCommand::RNTO(_)
            | FtpCommand::DELE(_)
            | FtpCommand::MKD(_)
            | FtpCommand::RMD(_)
            | FtpCommand::SIZE(_)
            | FtpCommand::MDTM(_) => CommandClass::Authenticated,
            FtpCommand::PASV | FtpCommand::EPSV(_) => CommandClass::TransferSetup,
            FtpCommand::LIST(_) | FtpCommand::NLST(_) | FtpCommand::RETR(_) | FtpCommand::STOR(_) => {
                CommandClass::Transfer
            }
        }
    }

    /// The verb, for logging. Passwords never reach the log.
    pub fn name(&self) -> &'static str {
        match self {
            FtpCommand::USER(_) => "USER",
            FtpCommand::PASS(_) => "PASS",
            FtpCommand::QUIT => "QUIT",
            FtpCommand::NOOP => "NOOP",
            FtpCommand::SYST => "SYST",
            FtpCommand::FEAT => "FEAT",
            FtpCommand::PWD => "PWD",
            FtpCommand::CWD(_) => "CWD",
            FtpCommand::CDUP => "CDUP",
            FtpCommand::TYPE(_) => "TYPE",
            FtpCommand::RNFR(_) => "RNFR",
            FtpCommand::RNTO(_) => "RNTO",
            FtpCommand::DELE(_) => "DELE",
            FtpCommand::MKD(_) => "MKD",
            FtpCommand::RMD(_) => "RMD",
            FtpCommand::SIZE(_) => "SIZE",
            FtpCommand::MDTM(_) => "MDTM",
            FtpCommand::PASV => "PASV",
            FtpCommand::EPSV(_) => "EPSV",
            FtpCommand::LIST(_) => "LIST",
            FtpCommand::NLST(_) => "NLST",
            FtpCommand::RETR(_) => "RETR",
            FtpCommand::STOR(_) => "STOR",
        }
    }
}
