//! # List
//!
//! This module exposes the parsers for the output of the LIST, MLSD and MLST commands.
//!
//! There's no specification regarding the LIST command output, so it depends on the implementation of the
//! remote FTP server. A parser exists for each known dialect (unix, Windows NT, VMS, OS/2, OS/400, NetWare,
//! MVS, ...); the right one is usually chosen from the reply to `SYST` by [`parser_for_key`].
//!
//! ## Get started
//!
//! The easiest way is to let the stream pick the parser:
//!
//! ```rust,no_run
//! use xftp::FtpStream;
//!
//! let mut ftp_stream = FtpStream::connect("127.0.0.1:10021").unwrap();
//! ftp_stream.login("test", "test").unwrap();
//! for entry in ftp_stream.list_files(None).unwrap() {
//!     println!("{} {}", entry.name(), entry.size());
//! }
//! ftp_stream.quit().unwrap();
//! ```
//!
//! Lines can also be parsed by hand:
//!
//! ```rust
//! use xftp::list::{parser_for_key, ParserConfig};
//!
//! let mut parser = parser_for_key("UNIX Type: L8", &ParserConfig::default()).unwrap();
//! let entry = parser
//!     .parse("-rw-r--r-- 1 root root 2048 Nov 5 2018 omar.txt")
//!     .unwrap();
//! assert_eq!(entry.name(), "omar.txt");
//! assert_eq!(entry.size(), 2048);
//! ```

mod config;
mod engine;
mod entry_type;
mod factory;
mod file;
mod filter;
pub mod parser;
mod pex;
mod timestamp;

pub use config::*;
pub use engine::ListEngine;
pub use entry_type::EntryType;
pub use factory::{parser_for_config, parser_for_key};
pub use file::FileEntry;
pub use filter::{accept_all, directories_only, valid_only, FileFilter};
pub use parser::ListParser;
pub use pex::{Access, PosixPex, PosixPexQuery};
pub use timestamp::TimestampParser;
