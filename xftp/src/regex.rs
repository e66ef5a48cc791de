//! # FTP Regex
//!
//! Regular expressions to parse FTP replies

use lazy_regex::{Lazy, Regex};

/// Extracts host and port from a PASV reply: `h1,h2,h3,h4,p1,p2`, parenthesis are optional
pub static PASV_PORT_RE: Lazy<Regex> =
    lazy_regex!(r"(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3}),(\d{1,3})");

/// Extracts the port from an EPSV reply: `(<d><d><d>port<d>)` where `<d>` is any printable delimiter
pub static EPSV_PORT_RE: Lazy<Regex> = lazy_regex!(r"\(([!-~])([!-~])([!-~])(\d+)([!-~])\)");

/// Extracts modification time from MDTM reply; fractional seconds are ignored
pub static MDTM_RE: Lazy<Regex> =
    lazy_regex!(r"\b(\d{4})(\d{2})(\d{2})(\d{2})(\d{2})(\d{2})(?:\.\d+)?\b");

/// Extracts file size from SIZE reply
pub static SIZE_RE: Lazy<Regex> = lazy_regex!(r"\s+(\d+)\s*$");

/// Extracts the quoted path from a PWD/MKD reply; `""` is an escaped quote
pub static QUOTED_PATH_RE: Lazy<Regex> = lazy_regex!(r#""((?:[^"]|"")*)""#);

/// Extracts the buffer size accepted by the server from a PBSZ reply
pub static PBSZ_RE: Lazy<Regex> = lazy_regex!(r"PBSZ=(\d+)");
