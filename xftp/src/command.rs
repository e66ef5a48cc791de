//! # Command
//!
//! The set of FTP commands

mod feat;

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};

pub use feat::parse_features;

use crate::types::{FileStructure, FileType, TransferMode};

#[derive(Debug, Clone, PartialEq, Eq)]
/// Ftp commands with their arguments
pub enum Command {
    /// Abort an active file transfer
    Abor,
    /// Provide account information
    Acct(String),
    /// Authentication/security data (base64 encoded)
    #[cfg(feature = "secure")]
    Adat(String),
    /// Allocate storage: bytes and optional record size
    Allo(u64, Option<u64>),
    /// Append to file
    Appe(String),
    /// Negotiate a security mechanism (`TLS`, `SSL`, ...)
    #[cfg(feature = "secure")]
    Auth(String),
    /// Ask server not to encrypt command channel
    #[cfg(feature = "secure")]
    ClearCommandChannel,
    /// Change directory to parent directory
    Cdup,
    /// Confidentiality protected command (base64 encoded)
    #[cfg(feature = "secure")]
    Conf(String),
    /// Change working directory
    Cwd(String),
    /// Custom command line; the verb is the first word
    Custom(String),
    /// Remove file at specified path
    Dele(String),
    /// Privacy protected command (base64 encoded)
    #[cfg(feature = "secure")]
    Enc(String),
    /// Extended active mode <https://www.rfc-editor.org/rfc/rfc2428#section-2>
    Eprt(SocketAddr),
    /// Extended passive mode <https://www.rfc-editor.org/rfc/rfc2428#section-3>
    Epsv,
    /// List supported features
    Feat,
    /// Get help, optionally about a command
    Help(Option<String>),
    /// List entries at specified path. If path is not provided list entries at current working directory
    List(Option<String>),
    /// Get modification time for file at specified path
    Mdtm(String),
    /// Set modification time (`YYYYMMDDHHMMSS`) for file at specified path
    Mfmt(String, String),
    /// Integrity protected command (base64 encoded)
    #[cfg(feature = "secure")]
    Mic(String),
    /// Make directory
    Mkd(String),
    /// Machine-parsable list of directory entries
    Mlsd(Option<String>),
    /// Machine-parsable facts about a single entry
    Mlst(Option<String>),
    /// Set transfer mode
    Mode(TransferMode),
    /// Get the list of file names at specified path. If path is not provided list entries at current working directory
    Nlst(Option<String>),
    /// Ping server
    Noop,
    /// Set options for a command
    Opts(String, Option<String>),
    /// Provide login password
    Pass(String),
    /// Passive mode
    Pasv,
    /// Protection buffer size
    #[cfg(feature = "secure")]
    Pbsz(u64),
    /// Specifies an address and port to which the server should connect (active mode)
    Port(Ipv4Addr, u16),
    /// Set protection level for protocol
    #[cfg(feature = "secure")]
    Prot(ProtectionLevel),
    /// Print working directory
    Pwd,
    /// Quit
    Quit,
    /// Reinitialize the session
    Rein,
    /// Select file to rename
    RenameFrom(String),
    /// Rename selected file to
    RenameTo(String),
    /// Resume transfer from offset
    Rest(usize),
    /// Retrieve file
    Retr(String),
    /// Remove directory
    Rmd(String),
    /// Site specific command
    Site(String),
    /// Get file size of specified path
    Size(String),
    /// Mount a file system structure
    Smnt(String),
    /// Get server status, or status of the specified path
    Stat(Option<String>),
    /// Put file at specified path
    Store(String),
    /// Put file with a name chosen by the server
    Stou,
    /// Set file structure
    Stru(FileStructure),
    /// Get system type
    Syst,
    /// Set transfer type
    Type(FileType),
    /// Provide user to login as
    User(String),
}

#[cfg(feature = "secure")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Protection level; argument for `Prot` command
pub enum ProtectionLevel {
    Clear,
    Safe,
    Confidential,
    Private,
}

impl Command {
    /// Command verb
    pub fn verb(&self) -> &str {
        match self {
            Self::Abor => "ABOR",
            Self::Acct(_) => "ACCT",
            #[cfg(feature = "secure")]
            Self::Adat(_) => "ADAT",
            Self::Allo(_, _) => "ALLO",
            Self::Appe(_) => "APPE",
            #[cfg(feature = "secure")]
            Self::Auth(_) => "AUTH",
            #[cfg(feature = "secure")]
            Self::ClearCommandChannel => "CCC",
            Self::Cdup => "CDUP",
            #[cfg(feature = "secure")]
            Self::Conf(_) => "CONF",
            Self::Cwd(_) => "CWD",
            Self::Custom(line) => line.split(' ').next().unwrap_or_default(),
            Self::Dele(_) => "DELE",
            #[cfg(feature = "secure")]
            Self::Enc(_) => "ENC",
            Self::Eprt(_) => "EPRT",
            Self::Epsv => "EPSV",
            Self::Feat => "FEAT",
            Self::Help(_) => "HELP",
            Self::List(_) => "LIST",
            Self::Mdtm(_) => "MDTM",
            Self::Mfmt(_, _) => "MFMT",
            #[cfg(feature = "secure")]
            Self::Mic(_) => "MIC",
            Self::Mkd(_) => "MKD",
            Self::Mlsd(_) => "MLSD",
            Self::Mlst(_) => "MLST",
            Self::Mode(_) => "MODE",
            Self::Nlst(_) => "NLST",
            Self::Noop => "NOOP",
            Self::Opts(_, _) => "OPTS",
            Self::Pass(_) => "PASS",
            Self::Pasv => "PASV",
            #[cfg(feature = "secure")]
            Self::Pbsz(_) => "PBSZ",
            Self::Port(_, _) => "PORT",
            #[cfg(feature = "secure")]
            Self::Prot(_) => "PROT",
            Self::Pwd => "PWD",
            Self::Quit => "QUIT",
            Self::Rein => "REIN",
            Self::RenameFrom(_) => "RNFR",
            Self::RenameTo(_) => "RNTO",
            Self::Rest(_) => "REST",
            Self::Retr(_) => "RETR",
            Self::Rmd(_) => "RMD",
            Self::Site(_) => "SITE",
            Self::Size(_) => "SIZE",
            Self::Smnt(_) => "SMNT",
            Self::Stat(_) => "STAT",
            Self::Store(_) => "STOR",
            Self::Stou => "STOU",
            Self::Stru(_) => "STRU",
            Self::Syst => "SYST",
            Self::Type(_) => "TYPE",
            Self::User(_) => "USER",
        }
    }

    /// Command arguments, if any
    pub fn args(&self) -> Option<String> {
        match self {
            Self::Abor
            | Self::Cdup
            | Self::Epsv
            | Self::Feat
            | Self::Noop
            | Self::Pasv
            | Self::Pwd
            | Self::Quit
            | Self::Rein
            | Self::Stou
            | Self::Syst => None,
            #[cfg(feature = "secure")]
            Self::ClearCommandChannel => None,
            Self::Acct(s)
            | Self::Appe(s)
            | Self::Cwd(s)
            | Self::Dele(s)
            | Self::Mdtm(s)
            | Self::Mkd(s)
            | Self::Pass(s)
            | Self::RenameFrom(s)
            | Self::RenameTo(s)
            | Self::Retr(s)
            | Self::Rmd(s)
            | Self::Site(s)
            | Self::Size(s)
            | Self::Smnt(s)
            | Self::Store(s)
            | Self::User(s) => Some(s.clone()),
            #[cfg(feature = "secure")]
            Self::Adat(s) | Self::Auth(s) | Self::Conf(s) | Self::Enc(s) | Self::Mic(s) => {
                Some(s.clone()).filter(|s| !s.is_empty())
            }
            Self::Help(p)
            | Self::List(p)
            | Self::Mlsd(p)
            | Self::Mlst(p)
            | Self::Nlst(p)
            | Self::Stat(p) => p.clone(),
            Self::Custom(line) => line
                .split_once(' ')
                .map(|(_, args)| args.to_string())
                .filter(|args| !args.is_empty()),
            Self::Allo(bytes, None) => Some(bytes.to_string()),
            Self::Allo(bytes, Some(record)) => Some(format!("{bytes} R {record}")),
            Self::Eprt(addr) => Some(eprt_argument(addr)),
            Self::Mfmt(timeval, path) => Some(format!("{timeval} {path}")),
            Self::Mode(mode) => Some(mode.to_string()),
            Self::Opts(command, None) => Some(command.clone()),
            Self::Opts(command, Some(options)) => Some(format!("{command} {options}")),
            #[cfg(feature = "secure")]
            Self::Pbsz(size) => Some(size.to_string()),
            Self::Port(ip, port) => Some(port_argument(*ip, *port)),
            #[cfg(feature = "secure")]
            Self::Prot(level) => Some(level.to_string()),
            Self::Rest(offset) => Some(offset.to_string()),
            Self::Stru(structure) => Some(structure.to_string()),
            Self::Type(t) => Some(t.to_string()),
        }
    }
}

/// Build the `PORT` argument: `h1,h2,h3,h4,p1,p2`
pub fn port_argument(ip: Ipv4Addr, port: u16) -> String {
    let [a, b, c, d] = ip.octets();
    format!("{a},{b},{c},{d},{},{}", port >> 8, port & 0xff)
}

/// Build the `EPRT` argument: `|proto|address|port|`
pub fn eprt_argument(addr: &SocketAddr) -> String {
    let proto = match addr {
        SocketAddr::V4(_) => 1,
        SocketAddr::V6(_) => 2,
    };
    let ip = addr.ip().to_string();
    let ip = ip.split('%').next().unwrap_or_default();
    format!("|{proto}|{ip}|{}|", addr.port())
}

// -- stringify

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.args() {
            Some(args) => write!(f, "{} {args}\r\n", self.verb()),
            None => write!(f, "{}\r\n", self.verb()),
        }
    }
}

#[cfg(feature = "secure")]
impl fmt::Display for ProtectionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self {
            Self::Clear => "C",
            Self::Safe => "S",
            Self::Confidential => "E",
            Self::Private => "P",
        };
        f.write_str(level)
    }
}
