//! # VMS
//!
//! Parser for OpenVMS listings.
//!
//! An entry may span several physical lines; it ends with the closing parenthesis of the protection mask.
//! Sizes are given in 512 bytes blocks.

use std::io::BufRead;

use lazy_regex::{Lazy, Regex};

use crate::list::{Access, EntryType, FileEntry, ParserConfig, PosixPexQuery, TimestampParser};
use crate::Encoding;

/// name;version, used/allocated blocks, date, time, [owner] or [group,owner], (system,owner,group,world)
static VMS_LS_RE: Lazy<Regex> = lazy_regex!(
    r"^(.*?;[0-9]+)\s*(\d+)/\d+\s*(\S+)\s+(\S+)\s+\[(([0-9$A-Za-z_]+)|([0-9$A-Za-z_]+),([0-9$a-zA-Z_]+))\]?\s*\([a-zA-Z]*,([a-zA-Z]*),([a-zA-Z]*),([a-zA-Z]*)\)$"
);

const BLOCK_SIZE: i64 = 512;

/// VMS listing parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VmsParser {
    timestamp: TimestampParser,
    versioning: bool,
}

impl VmsParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            timestamp: TimestampParser::new(config.get_date_format()),
            versioning: config.is_versioning(),
        }
    }

    pub fn parse(&self, line: &str) -> Option<FileEntry> {
        let caps = VMS_LS_RE.captures(line)?;
        let mut entry = FileEntry::new(line);
        entry.timestamp = self.timestamp.parse(&format!("{} {}", &caps[3], &caps[4]));

        let owner: Vec<&str> = caps[5].split(',').filter(|s| !s.is_empty()).collect();
        match owner.as_slice() {
            [user] => entry.user = user.to_string(),
            [group, user] => {
                entry.group = group.to_string();
                entry.user = user.to_string();
            }
            _ => {}
        }

        let name = &caps[1];
        entry.entry_type = if name.contains(".DIR") {
            EntryType::Directory
        } else {
            EntryType::File
        };
        entry.name = if self.versioning {
            name.to_string()
        } else {
            strip_version(name).to_string()
        };
        entry.size = caps[2].parse::<i64>().ok()? * BLOCK_SIZE;

        // R(ead) W(rite) E(xecute) D(elete)
        for (who, group) in [
            (PosixPexQuery::Owner, 9),
            (PosixPexQuery::Group, 10),
            (PosixPexQuery::Others, 11),
        ] {
            let mask = &caps[group];
            entry.set_permission(who, Access::Read, mask.contains('R'));
            entry.set_permission(who, Access::Write, mask.contains('W'));
            entry.set_permission(who, Access::Execute, mask.contains('E'));
        }
        Some(entry)
    }

    /// Joins physical lines until the protection mask is closed.
    /// `Directory` headers and `Total` trailers are skipped.
    pub fn read_next_entry<R: BufRead>(
        &self,
        reader: &mut R,
        encoding: Encoding,
    ) -> std::io::Result<Option<String>> {
        let mut entry = String::new();
        while let Some(line) = crate::reply::read_line(reader, encoding)? {
            if line.starts_with("Directory") || line.starts_with("Total") {
                continue;
            }
            entry.push_str(&line);
            if line.trim().ends_with(')') {
                break;
            }
        }
        Ok((!entry.is_empty()).then_some(entry))
    }
}

fn strip_version(name: &str) -> &str {
    name.rfind(';').map(|pos| &name[..pos]).unwrap_or(name)
}

#[cfg(test)]
mod test {

    use std::io::Cursor;

    use chrono::{Datelike, Timelike};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::list::{ListEngine, ListParser};

    fn parser() -> VmsParser {
        crate::log_init();
        VmsParser::new(&ParserConfig::default())
    }

    #[test]
    fn should_parse_file() {
        let entry = parser()
            .parse("1-JUN.LIS;1  9/9  2-JUN-1998 07:32:04  [GROUP,OWNER]  (RWED,RWED,RWED,RE)")
            .unwrap();
        assert_eq!(entry.is_file(), true);
        assert_eq!(entry.name(), "1-JUN.LIS");
        assert_eq!(entry.size(), 4608);
        assert_eq!(entry.group(), "GROUP");
        assert_eq!(entry.user(), "OWNER");
        assert_eq!(entry.can_read(PosixPexQuery::Owner), true);
        assert_eq!(entry.can_write(PosixPexQuery::Group), true);
        assert_eq!(entry.can_read(PosixPexQuery::Others), true);
        assert_eq!(entry.can_write(PosixPexQuery::Others), false);
        assert_eq!(entry.can_execute(PosixPexQuery::Others), true);
        let timestamp = entry.timestamp().unwrap();
        assert_eq!(timestamp.year(), 1998);
        assert_eq!(timestamp.month(), 6);
        assert_eq!(timestamp.day(), 2);
        assert_eq!(timestamp.hour(), 7);
        assert_eq!(timestamp.second(), 4);
    }

    #[test]
    fn should_parse_directory_with_single_owner() {
        let entry = parser()
            .parse("DATA.DIR;1  1/3  18-JUL-2000 16:42:56  [TRANSLATED]  (RWE,RWE,RE,)")
            .unwrap();
        assert_eq!(entry.is_directory(), true);
        assert_eq!(entry.name(), "DATA.DIR");
        assert_eq!(entry.user(), "TRANSLATED");
        assert_eq!(entry.group(), "");
        assert_eq!(entry.size(), 512);
        assert_eq!(entry.can_read(PosixPexQuery::Others), false);
    }

    #[test]
    fn should_keep_version_when_versioning() {
        let parser = VmsParser::new(&ParserConfig::new("VMS").versioning(true));
        let entry = parser
            .parse("1-JUN.LIS;2  9/9  2-JUN-1998 07:32:04  [GROUP,OWNER]  (RWED,RWED,RWED,RE)")
            .unwrap();
        assert_eq!(entry.name(), "1-JUN.LIS;2");
    }

    #[test]
    fn should_join_multiline_entries() {
        let listing = "Directory USER1:[TEMP]\r\n\r\n1-JUN.LIS;1\r\n  9/9  2-JUN-1998 07:32:04  [GROUP,OWNER]  (RWED,RWED,RWED,RE)\r\n2-JUN.LIS;1  9/9  2-JUN-1998 07:32:04  [GROUP,OWNER]  (RWED,RWED,RWED,RE)\r\nTotal 2 files\r\n";
        let mut reader = Cursor::new(listing.as_bytes());
        let parser = parser();
        let first = parser
            .read_next_entry(&mut reader, Encoding::Utf8)
            .unwrap()
            .unwrap();
        assert_eq!(
            first,
            "1-JUN.LIS;1  9/9  2-JUN-1998 07:32:04  [GROUP,OWNER]  (RWED,RWED,RWED,RE)"
        );
        assert!(parser.parse(&first).is_some());
        let second = parser
            .read_next_entry(&mut reader, Encoding::Utf8)
            .unwrap()
            .unwrap();
        assert!(second.starts_with("2-JUN.LIS;1"));
        assert_eq!(parser.read_next_entry(&mut reader, Encoding::Utf8).unwrap(), None);
    }

    #[test]
    fn should_list_every_version_without_versioning() {
        let listing = "A.LIS;1  1/1  2-JUN-1998 07:32:04  [G,O]  (RWED,RWED,RWED,RE)\r\nA.LIS;2  2/2  2-JUN-1998 07:32:04  [G,O]  (RWED,RWED,RWED,RE)\r\nA.LIS;3  3/3  2-JUN-1998 07:32:04  [G,O]  (RWED,RWED,RWED,RE)\r\n";
        let mut engine = ListEngine::new(ListParser::Vms(parser()), false);
        engine
            .read_server_list(Cursor::new(listing.as_bytes()), Encoding::Utf8)
            .unwrap();
        let files = engine.get_files();
        assert_eq!(files.len(), 3);
        assert!(files.iter().all(|f| f.name() == "A.LIS"));
        assert_eq!(
            files.iter().map(|f| f.size()).collect::<Vec<i64>>(),
            vec![512, 1024, 1536]
        );
        // versions in names otherwise
        let versioning = VmsParser::new(&ParserConfig::new("VMS").versioning(true));
        let mut engine = ListEngine::new(ListParser::Vms(versioning), false);
        engine
            .read_server_list(Cursor::new(listing.as_bytes()), Encoding::Utf8)
            .unwrap();
        assert_eq!(
            engine
                .get_files()
                .iter()
                .map(|f| f.name().to_string())
                .collect::<Vec<String>>(),
            vec!["A.LIS;1", "A.LIS;2", "A.LIS;3"]
        );
    }

    #[test]
    fn should_not_parse_bad_lines() {
        let parser = parser();
        assert!(parser.parse("1-JUN.LIS  9/9  2-JUN-1998 07:32:04  [GROUP,OWNER]  (RWED,RWED,RWED,RE)").is_none());
        assert!(parser.parse("-rwxr-xr-x   2 root     root         4096 Mar  2 15:13 zxbox").is_none());
    }
}
