//! # OS/2
//!
//! Parser for OS/2 listings

use lazy_regex::{Lazy, Regex};

use crate::list::{EntryType, FileEntry, ParserConfig, TimestampParser};

/// size, attributes, `DIR` marker, date, time, name
static OS2_LS_RE: Lazy<Regex> =
    lazy_regex!(r"^\s*([0-9]+)\s*(\s+|[A-Z]+)\s*(DIR|\s+)\s*(\S+)\s+(\S+)\s+(\S.*)$");

/// OS/2 listing parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Os2Parser {
    timestamp: TimestampParser,
}

impl Os2Parser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            timestamp: TimestampParser::new(config.get_date_format()),
        }
    }

    pub fn parse(&self, line: &str) -> Option<FileEntry> {
        let caps = OS2_LS_RE.captures(line)?;
        let mut entry = FileEntry::new(line);
        entry.timestamp = self.timestamp.parse(&format!("{} {}", &caps[4], &caps[5]));
        entry.entry_type = if caps[3].trim() == "DIR" || caps[2].trim() == "DIR" {
            EntryType::Directory
        } else {
            EntryType::File
        };
        entry.name = caps[6].trim().to_string();
        entry.size = caps[1].parse().ok()?;
        Some(entry)
    }
}
