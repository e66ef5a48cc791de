//! # Types
//!
//! The set of valid values for FTP commands

use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

use crate::reply::Reply;

/// A shorthand for a Result whose error type is always an FtpError.
pub type FtpResult<T> = std::result::Result<T, FtpError>;

/// `FtpError` is a library-global error type to describe the different kinds of
/// errors that might occur while using FTP.
#[derive(Debug, Error)]
pub enum FtpError {
    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(std::io::Error),
    /// The server closed the control connection, either by reaching end of stream or by replying 421.
    /// The session can't be used anymore.
    #[error("Connection closed without indication")]
    ConnectionClosed,
    /// The server sent a reply which doesn't respect the RFC 959 framing
    #[error("Malformed reply: {0}")]
    MalformedReply(String),
    /// There was an error with the secure stream
    #[cfg(feature = "secure")]
    #[cfg_attr(docsrs, doc(cfg(feature = "secure")))]
    #[error("Secure error: {0}")]
    SecureError(String),
    /// Unexpected response from remote. The command expected a certain response, but got another one.
    /// This means the ftp server refused to perform your request or there was an error while processing it.
    /// Contains the response data.
    #[error("Invalid response: {0}")]
    UnexpectedResponse(Reply),
    /// The response syntax is invalid
    #[error("Response contains an invalid syntax")]
    BadResponse,
    /// The address provided was invalid
    #[error("Invalid address: {0}")]
    InvalidAddress(std::net::AddrParseError),
    /// No listing parser is known for the provided system key
    #[error("Unknown parser type: {0}")]
    UnknownParser(String),
}

impl FtpError {
    /// Returns the reply code carried by this error, if any
    pub fn reply_code(&self) -> Option<u32> {
        match self {
            Self::UnexpectedResponse(reply) => Some(reply.code),
            _ => None,
        }
    }
}

/// Letters used as arguments of `TYPE`, `STRU` and `MODE`, indexed by [`TransferCode`]
const TRANSFER_CODE_LETTERS: &[u8; 13] = b"AEILNTCFRPSBC";

/// Numeric constants for file types, format controls, structures and transfer modes
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[repr(usize)]
pub enum TransferCode {
    Ascii = 0,
    Ebcdic = 1,
    Binary = 2,
    Local = 3,
    NonPrint = 4,
    Telnet = 5,
    CarriageControl = 6,
    File = 7,
    Record = 8,
    Page = 9,
    Stream = 10,
    Block = 11,
    Compressed = 12,
}

impl TransferCode {
    /// Letter sent on the wire for this code
    pub fn letter(self) -> char {
        TRANSFER_CODE_LETTERS[self as usize] as char
    }
}

/// Text Format Control used in `TYPE` command
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FormatControl {
    /// Default text format control (is NonPrint)
    Default,
    /// Non-print (not destined for printing)
    NonPrint,
    /// Telnet format control (\<CR\>, \<FF\>, etc.)
    Telnet,
    /// ASA (Fortran) Carriage Control
    Asa,
}

/// File Type used in `TYPE` command
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum FileType {
    /// ASCII text (the argument is the text format control)
    Ascii(FormatControl),
    /// EBCDIC text (the argument is the text format control)
    Ebcdic(FormatControl),
    /// Image,
    Image,
    /// Binary (the synonym to Image)
    Binary,
    /// Local format (the argument is the number of bits in one byte on local machine)
    Local(u8),
}

/// File structure used in `STRU` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStructure {
    File,
    Record,
    Page,
}

/// Transfer mode used in `MODE` command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferMode {
    Stream,
    Block,
    Compressed,
}

/// Connection mode for data channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Client listens; announced with `PORT`
    Active,
    /// Client listens; announced with `EPRT` (rfc 2428), required for ipv6
    ExtendedActive,
    /// Required by some servers (ipv6); defined in rfc 2428 <https://www.rfc-editor.org/rfc/rfc2428#section-3>
    ExtendedPassive,
    Passive,
}

/// Features returned by FEAT command (key, maybe value)
pub type Features = HashMap<String, Option<String>>;

impl fmt::Display for FormatControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            FormatControl::Default | FormatControl::NonPrint => TransferCode::NonPrint,
            FormatControl::Telnet => TransferCode::Telnet,
            FormatControl::Asa => TransferCode::CarriageControl,
        };
        write!(f, "{}", code.letter())
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileType::Ascii(fc) => write!(f, "{} {fc}", TransferCode::Ascii.letter()),
            FileType::Ebcdic(fc) => write!(f, "{} {fc}", TransferCode::Ebcdic.letter()),
            FileType::Image | FileType::Binary => write!(f, "{}", TransferCode::Binary.letter()),
            FileType::Local(bits) => write!(f, "{} {bits}", TransferCode::Local.letter()),
        }
    }
}

impl fmt::Display for FileStructure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::File => TransferCode::File,
            Self::Record => TransferCode::Record,
            Self::Page => TransferCode::Page,
        };
        write!(f, "{}", code.letter())
    }
}

impl fmt::Display for TransferMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = match self {
            Self::Stream => TransferCode::Stream,
            Self::Block => TransferCode::Block,
            Self::Compressed => TransferCode::Compressed,
        };
        write!(f, "{}", code.letter())
    }
}
