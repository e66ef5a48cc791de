//! # NT
//!
//! Parser for the DOS-like listings of Windows NT servers (IIS)

use lazy_regex::{Lazy, Regex};

use crate::list::{EntryType, FileEntry, ParserConfig, TimestampParser};

/// date, time, `<DIR>` or size, name
static NT_LS_RE: Lazy<Regex> =
    lazy_regex!(r"(?s)^(\S+)\s+(\S+)\s+(?:(<DIR>)|([0-9]+))\s+(\S.*)$");

/// Windows NT listing parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NtParser {
    timestamp: TimestampParser,
}

impl NtParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            timestamp: TimestampParser::new(config.get_date_format()),
        }
    }

    pub fn parse(&self, line: &str) -> Option<FileEntry> {
        let caps = NT_LS_RE.captures(line)?;
        let name = &caps[5];
        if name == "." || name == ".." {
            return None;
        }
        let mut entry = FileEntry::new(line);
        entry.timestamp = self.timestamp.parse(&format!("{} {}", &caps[1], &caps[2]));
        entry.name = name.to_string();
        if caps.get(3).is_some() {
            entry.entry_type = EntryType::Directory;
            entry.size = 0;
        } else {
            entry.entry_type = EntryType::File;
            entry.size = caps.get(4).and_then(|s| s.as_str().parse().ok()).unwrap_or(-1);
        }
        Some(entry)
    }
}
