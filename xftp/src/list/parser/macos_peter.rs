//! # Mac OS Peter
//!
//! Parser for the listings of Peter's FTP server on classic Mac OS:
//! unix-like, but resource and data fork sizes replace links, owner and group.

use lazy_regex::{Lazy, Regex};

use super::unix::{apply_type_and_permissions, set_name_and_link};
use crate::list::{FileEntry, ParserConfig, TimestampParser};

/// type, permissions, `folder` or resource and data sizes, size, date, time or year, name
static MACOS_PETER_LS_RE: Lazy<Regex> = lazy_regex!(
    r"^([bcdelfmpSs-])(((r|-)(w|-)([xsStTL-]))((r|-)(w|-)([xsStTL-]))((r|-)(w|-)([xsStTL-])))\+?\s+((folder\s+)|((\d+)\s+(\d+)\s+))(\d+)\s+((?:\d+[-/]\d+[-/]\d+)|(?:\S{3}\s+\d{1,2})|(?:\d{1,2}\s+\S{3}))\s+(\d+(?::\d+)?)\s+(\S*)(\s*.*)$"
);

/// Mac OS Peter listing parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacOsPeterParser {
    timestamp: TimestampParser,
}

impl MacOsPeterParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            timestamp: TimestampParser::new(config.get_date_format()),
        }
    }

    pub fn parse(&self, line: &str) -> Option<FileEntry> {
        let caps = MACOS_PETER_LS_RE.captures(line)?;
        let mut entry = FileEntry::new(line);
        let is_device = apply_type_and_permissions(&mut entry, &caps);
        entry.timestamp = self.timestamp.parse(&format!("{} {}", &caps[21], &caps[22]));
        if !is_device {
            entry.size = caps[20].parse().unwrap_or(-1);
        }
        let name = format!("{}{}", &caps[23], &caps[24]);
        set_name_and_link(&mut entry, &name);
        Some(entry)
    }
}
