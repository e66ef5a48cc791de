//! # OS/400
//!
//! Parser for IBM i (OS/400, AS/400) listings of the integrated file system and the library file system

use chrono::Utc;
use lazy_regex::{Lazy, Regex};

use crate::list::timestamp::parse_with_format;
use crate::list::{EntryType, FileEntry, ParserConfig};

/// owner, size (empty for members), date and time (empty for members), object type, name
static OS400_LS_RE: Lazy<Regex> = lazy_regex!(
    r"^(\S+)\s+(?:(\d+)\s+)?(?:(\S+)\s+(\S+)\s+)?(\*STMF|\*DIR|\*FILE|\*MEM)\s+(?:(\S+)\s*)?$"
);

const DEFAULT_DATE_FORMAT: &str = "%y/%m/%d %H:%M:%S";

/// OS/400 listing parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Os400Parser {
    date_format: String,
}

impl Os400Parser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            date_format: config
                .get_date_format()
                .unwrap_or(DEFAULT_DATE_FORMAT)
                .to_string(),
        }
    }

    pub fn parse(&self, line: &str) -> Option<FileEntry> {
        let caps = OS400_LS_RE.captures(line)?;
        let size = caps.get(2).map(|m| m.as_str());
        let date = match (caps.get(3), caps.get(4)) {
            (Some(date), Some(time)) => Some(format!("{} {}", date.as_str(), time.as_str())),
            _ => None,
        };
        let name = caps.get(6).map(|m| m.as_str()).filter(|n| !n.is_empty());

        let mut must_scan_for_separator = true;
        let entry_type = match &caps[5] {
            "*STMF" | "*DIR" => {
                // stream files and directories always tell size and name
                if size.is_none() || name.is_none() {
                    return None;
                }
                if &caps[5] == "*DIR" {
                    EntryType::Directory
                } else {
                    EntryType::File
                }
            }
            // a physical file holds members; only save files are listed as entries
            "*FILE" => match name {
                Some(name) if name.to_ascii_uppercase().ends_with(".SAVF") => {
                    must_scan_for_separator = false;
                    EntryType::File
                }
                _ => return None,
            },
            "*MEM" => {
                // members have neither size nor date
                if name.is_none() || size.is_some() || date.is_some() {
                    return None;
                }
                must_scan_for_separator = false;
                EntryType::File
            }
            _ => EntryType::Unknown,
        };

        let mut entry = FileEntry::new(line);
        entry.entry_type = entry_type;
        entry.user = caps[1].to_string();
        entry.size = size.and_then(|s| s.parse().ok()).unwrap_or(-1);
        entry.timestamp = date.and_then(|d| parse_with_format(&d, &self.date_format, Utc::now()));

        let mut name = name.unwrap_or_default();
        name = name.strip_suffix('/').unwrap_or(name);
        if must_scan_for_separator {
            name = name.rsplit('/').next().unwrap_or(name);
        }
        entry.name = name.to_string();
        Some(entry)
    }
}

#[cfg(test)]
mod test {

    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;

    fn parser() -> Os400Parser {
        crate::log_init();
        Os400Parser::new(&ParserConfig::default())
    }

    #[test]
    fn should_parse_good_listing() {
        let parser = parser();
        for line in [
            "PEP              4019 04/03/18 18:58:16 *STMF      einladung.zip",
            "PEP               422 04/03/24 14:06:26 *STMF      readme",
            "PEP              6409 04/03/24 14:06:29 *STMF      build.xml",
            "PEP             36864 04/03/24 14:06:34 *DIR       dir1/",
            "PEP             36864 04/03/24 14:06:47 *DIR       zdir2/",
        ] {
            let entry = parser.parse(line);
            assert!(entry.is_some(), "{line}");
            assert!(entry.unwrap().timestamp().is_some(), "{line}");
        }
        assert!(parser
            .parse("QPGMR                                   *MEM       RPGUNITC1.FILE/RUCALLTST.MBR")
            .is_some());
        assert!(parser
            .parse("QPGMR        16347136 29.06.13 15:45:09 *FILE      RPGUNIT.SAVF")
            .is_some());
    }

    #[test]
    fn should_parse_directory() {
        let entry = parser()
            .parse("PEP             36864 04/03/24 14:06:34 *DIR       dir1/")
            .unwrap();
        assert_eq!(entry.is_directory(), true);
        assert_eq!(entry.user(), "PEP");
        assert_eq!(entry.name(), "dir1");
        assert_eq!(entry.size(), 36864);
        assert_eq!(
            entry.timestamp(),
            Some(Utc.with_ymd_and_hms(2004, 3, 24, 14, 6, 34).unwrap())
        );
    }

    #[test]
    fn should_parse_file() {
        let entry = parser()
            .parse("PEP              5000000000 04/03/24 14:06:29 *STMF      build.xml")
            .unwrap();
        assert_eq!(entry.is_file(), true);
        assert_eq!(entry.user(), "PEP");
        assert_eq!(entry.name(), "build.xml");
        assert_eq!(entry.size(), 5000000000);
        assert_eq!(
            entry.timestamp(),
            Some(Utc.with_ymd_and_hms(2004, 3, 24, 14, 6, 29).unwrap())
        );
    }

    #[test]
    fn should_keep_member_path() {
        let entry = parser()
            .parse("QPGMR                                   *MEM       RPGUNITC1.FILE/RUCALLTST.MBR")
            .unwrap();
        assert_eq!(entry.name(), "RPGUNITC1.FILE/RUCALLTST.MBR");
        assert_eq!(entry.size(), -1);
        assert_eq!(entry.timestamp(), None);
    }

    #[test]
    fn should_parse_with_custom_date_format() {
        let config = ParserConfig::new("AS/400").date_format("%m/%d/%y %H:%M:%S");
        let entry = Os400Parser::new(&config)
            .parse("ZFTPDEV 9069 05/20/15 15:36:52 *STMF /DRV/AUDWRKSHET/AUDWRK0204232015114625.PDF")
            .unwrap();
        assert_eq!(entry.is_directory(), false);
        assert_eq!(entry.user(), "ZFTPDEV");
        assert_eq!(entry.name(), "AUDWRK0204232015114625.PDF");
        assert_eq!(entry.size(), 9069);
        assert_eq!(
            entry.timestamp(),
            Some(Utc.with_ymd_and_hms(2015, 5, 20, 15, 36, 52).unwrap())
        );
    }

    #[test]
    fn should_reject_bad_listing() {
        let parser = parser();
        for line in [
            "PEP              4019 04/03/18 18:58:16 STMF       einladung.zip",
            "PEP               422 03/24 14:06:26 *STMF      readme",
            "PEP              6409 04/03/24 30:06:29 *STMF      build.xml",
            "PEP USR         36864 04/03/24 14:06:34 *DIR       dir1/",
            "PEP             3686404/03/24 14:06:47 *DIR       zdir2/",
            "QPGMR          135168 04/03/18 13:18:19 *FILE",
            "QPGMR          135168    03/24 13:18:19 *FILE",
            "QPGMR          135168 04/03/18 13:18:19 *FILE      RPGUNITC1.FILE",
            "QPGMR                                   *MEM       ",
            "QPGMR          135168 04/03/18 13:18:19 *MEM       RPGUNITC1.FILE/RUCALLTST.MBR",
            "QPGMR          135168                   *MEM       RPGUNITC1.FILE/RUCALLTST.MBR",
            "QPGMR                 04/03/18 13:18:19 *MEM       RPGUNITC1.FILE/RUCALLTST.MBR",
            "QPGMR USR                               *MEM       RPGUNITC1.FILE/RUCALLTST.MBR",
        ] {
            assert!(
                parser.parse(line).and_then(|e| e.timestamp()).is_none(),
                "{line}"
            );
        }
    }
}
