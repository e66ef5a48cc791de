//! # NetWare
//!
//! Parser for Novell NetWare listings

use lazy_regex::{Lazy, Regex};

use crate::list::{Access, EntryType, FileEntry, ParserConfig, PosixPexQuery, TimestampParser};

/// `d` or `-`, [attributes], owner, size, date (with time or year), name
static NETWARE_LS_RE: Lazy<Regex> = lazy_regex!(
    r"^(d|-){1}\s+\[([-A-Z]+)\]\s+(\S+)\s+(\d+)\s+(\S+\s+\S+\s+((\d+:\d+)|(\d{4})))\s+(.*)$"
);

/// NetWare listing parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetwareParser {
    timestamp: TimestampParser,
}

impl NetwareParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            timestamp: TimestampParser::new(config.get_date_format()),
        }
    }

    pub fn parse(&self, line: &str) -> Option<FileEntry> {
        let caps = NETWARE_LS_RE.captures(line)?;
        let mut entry = FileEntry::new(line);
        entry.timestamp = self.timestamp.parse(&caps[5]);
        entry.entry_type = match &caps[1] {
            "d" => EntryType::Directory,
            _ => EntryType::File,
        };
        entry.user = caps[3].to_string();
        entry.name = caps[9].trim().to_string();
        entry.size = caps[4].parse().unwrap_or(-1);
        // only the effective rights of the listing user are known
        let attributes = &caps[2];
        entry.set_permission(PosixPexQuery::Owner, Access::Read, attributes.contains('R'));
        entry.set_permission(PosixPexQuery::Owner, Access::Write, attributes.contains('W'));
        Some(entry)
    }
}
