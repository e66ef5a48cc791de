//! # MVS
//!
//! Parser for z/OS (MVS) listings of datasets and of the members of a partitioned dataset.
//! Both layouts are tried on each line, so a mixed listing is fine.

use chrono::Utc;
use lazy_regex::{Lazy, Regex};

use crate::list::timestamp::parse_with_format;
use crate::list::{EntryType, FileEntry};

/// Volume Unit Referred Ext Used Recfm Lrecl BlkSz Dsorg Dsname
static DATASET_RE: Lazy<Regex> = lazy_regex!(
    r"^\S+\s+\S+\s+(\S+)\s+\S+\s+\S+\s+[FV]\S*\s+\S+\s+\S+\s+(PS|PO|PO-E)\s+(\S+)\s*$"
);

/// Name VV.MM Created Changed(date time) Size Init Mod Id
static MEMBER_RE: Lazy<Regex> =
    lazy_regex!(r"^(\S+)\s+\S+\s+\S+\s+(\S+)\s+(\S+)\s+\S+\s+\S+\s+\S+\s+\S+\s*$");

const DATASET_DATE_FORMAT: &str = "%Y/%m/%d";
const MEMBER_DATE_FORMAT: &str = "%Y/%m/%d %H:%M";

/// MVS listing parser
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MvsParser;

impl MvsParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, line: &str) -> Option<FileEntry> {
        self.parse_dataset(line).or_else(|| self.parse_member(line))
    }

    /// Sequential datasets are files, partitioned datasets are directories
    fn parse_dataset(&self, line: &str) -> Option<FileEntry> {
        let caps = DATASET_RE.captures(line)?;
        let mut entry = FileEntry::new(line);
        entry.entry_type = match &caps[2] {
            "PS" => EntryType::File,
            _ => EntryType::Directory,
        };
        entry.name = caps[3].to_string();
        entry.timestamp = parse_with_format(&caps[1], DATASET_DATE_FORMAT, Utc::now());
        Some(entry)
    }

    fn parse_member(&self, line: &str) -> Option<FileEntry> {
        let caps = MEMBER_RE.captures(line)?;
        let timestamp = parse_with_format(
            &format!("{} {}", &caps[2], &caps[3]),
            MEMBER_DATE_FORMAT,
            Utc::now(),
        )?;
        let mut entry = FileEntry::new(line);
        entry.entry_type = EntryType::File;
        entry.name = caps[1].to_string();
        entry.timestamp = Some(timestamp);
        Some(entry)
    }
}
