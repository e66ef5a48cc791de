#![crate_name = "xftp"]
#![crate_type = "lib"]

//! # xftp
//!
//! xftp is a blocking FTP/FTPS client library.
//!
//! - The whole RFC 959 command set, plus EPRT/EPSV, MLSD/MLST, MDTM, MFMT, FEAT and OPTS
//! - Active and passive data connections, with a workaround for servers behind NAT
//! - Explicit and implicit FTPS through `native-tls` or `rustls`, including `CCC`
//! - Parsers for the `LIST` output of unix, Windows NT, VMS, OS/2, OS/400, NetWare, MVS and more
//! - Protocol listeners to trace every command and reply
//!
//! ## Get started
//!
//! ```toml
//! xftp = "^6.3"
//! ```
//!
//! ### Features
//!
//! #### SSL/TLS Support
//!
//! To enable **FTPS**, enable the `native-tls` or `rustls` feature, based on the TLS provider you prefer.
//!
//! ```toml
//! xftp = { version = "^6.3", features = ["native-tls"] }
//! # or
//! xftp = { version = "^6.3", features = ["rustls"] }
//! ```
//!
//! > 💡 If you don't know what to choose, `native-tls` should be preferred for compatibility reasons.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use xftp::FtpStream;
//!
//! let mut ftp_stream = FtpStream::connect("127.0.0.1:10021").unwrap_or_else(|err|
//!     panic!("{}", err)
//! );
//! assert!(ftp_stream.login("test", "test").is_ok());
//! for entry in ftp_stream.list_files(None).unwrap() {
//!     println!("{} {}", entry.name(), entry.size());
//! }
//!
//! // Disconnect from server
//! assert!(ftp_stream.quit().is_ok());
//! ```
//!
//! ## FTPS
//!
//! The client uses explicit mode for connecting FTPS what means you should
//! connect the server as usually and then switch to the secure mode (TLS is used).
//! For better security it's the good practice to switch to the secure mode
//! before authentication.
//!
//! ```rust,ignore
//! use xftp::{NativeTlsConnector, NativeTlsFtpStream};
//! use xftp::native_tls::TlsConnector;
//!
//! let ftp_stream = NativeTlsFtpStream::connect("test.rebex.net:21").unwrap();
//! // Switch to the secure mode
//! let mut ftp_stream = ftp_stream
//!     .into_secure(NativeTlsConnector::from(TlsConnector::new().unwrap()), "test.rebex.net")
//!     .unwrap();
//! ftp_stream.login("demo", "password").unwrap();
//! // Do other secret stuff
//! // Switch back to a plain control connection (if required)
//! ftp_stream.clear_command_channel().unwrap();
//! assert!(ftp_stream.quit().is_ok());
//! ```
//!

#![doc(html_playground_url = "https://play.rust-lang.org")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -- common deps
#[macro_use]
extern crate lazy_regex;
#[macro_use]
extern crate log;

// -- private
mod regex;
mod status;
mod sync_ftp;
#[cfg(test)]
mod test_container;

// -- public
pub mod command;
pub mod list;
pub mod listener;
pub mod reply;
pub mod types;

// -- secure deps
#[cfg(feature = "native-tls")]
pub extern crate native_tls_crate as native_tls;
#[cfg(feature = "rustls")]
pub extern crate rustls_crate as rustls;

// -- export sync
pub use sync_ftp::{
    DataStream, ImplFtpStream, ListingStyle, NatResolver, NatWorkaround, NoTlsStream,
    PassiveStreamBuilder, TlsStream,
};
// -- export secure
#[cfg(feature = "secure")]
pub use sync_ftp::{HostnameVerifier, SecurityState, TlsConnector, DEFAULT_FTPS_PORT};
#[cfg(feature = "native-tls")]
pub use sync_ftp::{NativeTlsConnector, NativeTlsStream};
#[cfg(feature = "rustls")]
pub use sync_ftp::{RustlsConnector, RustlsStream, ValidityOnlyVerifier};
// -- export (common)
pub use listener::{LogCommandListener, ProtocolListener};
pub use reply::{Encoding, Reply};
pub use status::Status;
pub use types::{FtpError, FtpResult, Mode};

/// A FTP stream without TLS support
pub type FtpStream = ImplFtpStream<NoTlsStream>;
/// A FTP stream with TLS support provided by native-tls
#[cfg(feature = "native-tls")]
pub type NativeTlsFtpStream = ImplFtpStream<NativeTlsStream>;
/// A FTP stream with TLS support provided by rustls
#[cfg(feature = "rustls")]
pub type RustlsFtpStream = ImplFtpStream<RustlsStream>;

// -- test logging
#[cfg(test)]
pub fn log_init() {
    let _ = env_logger::builder().is_test(true).try_init();
}
