//! # Parser
//!
//! Listing parsers, one per server dialect.
//!
//! Each parser turns one logical listing entry into a [`FileEntry`]; a line which doesn't match the
//! dialect yields `None`, which is not an error.

mod composite;
mod enterprise_unix;
mod macos_peter;
mod mlsx;
mod mvs;
mod netware;
mod nt;
mod os2;
mod os400;
mod unix;
mod vms;

use std::io::BufRead;

pub use composite::CompositeParser;
pub use enterprise_unix::EnterpriseUnixParser;
pub use macos_peter::MacOsPeterParser;
pub use mlsx::MlsxParser;
pub use mvs::MvsParser;
pub use netware::NetwareParser;
pub use nt::NtParser;
pub use os2::Os2Parser;
pub use os400::Os400Parser;
pub use unix::UnixParser;
pub use vms::VmsParser;

use super::FileEntry;
use crate::Encoding;

/// A listing parser for a server dialect
#[derive(Debug, Clone)]
pub enum ListParser {
    Unix(UnixParser),
    Nt(NtParser),
    Vms(VmsParser),
    Os2(Os2Parser),
    Os400(Os400Parser),
    EnterpriseUnix(EnterpriseUnixParser),
    Netware(NetwareParser),
    Mvs(MvsParser),
    MacOsPeter(MacOsPeterParser),
    Mlsx(MlsxParser),
    Composite(CompositeParser),
}

impl ListParser {
    /// Parse a logical entry; `None` if it doesn't belong to this dialect.
    ///
    /// Takes `&mut self` since a composite parser remembers which dialect matched last.
    pub fn parse(&mut self, line: &str) -> Option<FileEntry> {
        match self {
            Self::Unix(p) => p.parse(line),
            Self::Nt(p) => p.parse(line),
            Self::Vms(p) => p.parse(line),
            Self::Os2(p) => p.parse(line),
            Self::Os400(p) => p.parse(line),
            Self::EnterpriseUnix(p) => p.parse(line),
            Self::Netware(p) => p.parse(line),
            Self::Mvs(p) => p.parse(line),
            Self::MacOsPeter(p) => p.parse(line),
            Self::Mlsx(p) => p.parse(line),
            Self::Composite(p) => p.parse(line),
        }
    }

    /// Read the next logical entry from `reader`; `None` at end of stream.
    ///
    /// An entry is a line, except for VMS where it may span several lines.
    pub fn read_next_entry<R: BufRead>(
        &self,
        reader: &mut R,
        encoding: Encoding,
    ) -> std::io::Result<Option<String>> {
        match self {
            Self::Vms(p) => p.read_next_entry(reader, encoding),
            _ => crate::reply::read_line(reader, encoding),
        }
    }

    /// Filter the whole list of logical entries before parsing
    pub fn pre_parse(&self, lines: Vec<String>) -> Vec<String> {
        match self {
            Self::Unix(p) => p.pre_parse(lines),
            _ => lines,
        }
    }
}

#[cfg(test)]
mod test {

    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::list::ParserConfig;

    #[test]
    fn should_be_idempotent() {
        crate::log_init();
        let line = "-rwxr-xr-x   2 root     root         4096 Aug 24  2001 zxbox";
        let first = ListParser::Unix(UnixParser::new(&ParserConfig::default())).parse(line);
        let second = ListParser::Unix(UnixParser::new(&ParserConfig::default())).parse(line);
        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[test]
    fn should_read_lines_by_default() {
        let parser = ListParser::Nt(NtParser::new(&ParserConfig::default()));
        let mut reader = Cursor::new("a\r\nb\n".as_bytes());
        assert_eq!(
            parser.read_next_entry(&mut reader, Encoding::Utf8).unwrap().as_deref(),
            Some("a")
        );
        assert_eq!(
            parser.read_next_entry(&mut reader, Encoding::Utf8).unwrap().as_deref(),
            Some("b")
        );
        assert_eq!(parser.read_next_entry(&mut reader, Encoding::Utf8).unwrap(), None);
    }

    #[test]
    fn should_pre_parse_only_when_dialect_needs_it() {
        let lines = vec!["total 2".to_string(), "x".to_string()];
        let unix = ListParser::Unix(UnixParser::new(&ParserConfig::default()));
        assert_eq!(unix.pre_parse(lines.clone()), vec!["x".to_string()]);
        let nt = ListParser::Nt(NtParser::new(&ParserConfig::default()));
        assert_eq!(nt.pre_parse(lines.clone()), lines);
    }
}
