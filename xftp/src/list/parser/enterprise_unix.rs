//! # Enterprise Unix
//!
//! Parser for the listings of the Unisys ClearPath / Enterprise Unix servers.
//! Every entry is reported as a file and permissions are never exposed.

use chrono::prelude::Utc;
use chrono::{DateTime, Datelike, NaiveDate};
use lazy_regex::{Lazy, Regex};

use crate::list::{EntryType, FileEntry};

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// ten flag chars, unused fields, user, group, size, month, day, year or hh:mm, name
static ENTERPRISE_UNIX_LS_RE: Lazy<Regex> = lazy_regex!(
    r"^(([\-]|[A-Z])([\-]|[A-Z])([\-]|[A-Z])([\-]|[A-Z])([\-]|[A-Z])([\-]|[A-Z])([\-]|[A-Z])([\-]|[A-Z])([\-]|[A-Z])([\-]|[A-Z]))(\S*)\s*(\S+)\s*(\S*)\s*(\d*)\s*(\d*)\s*(Jan|Feb|Mar|Apr|May|Jun|Jul|Aug|Sep|Oct|Nov|Dec)\s*((?:[012]\d*)|(?:3[01]))\s*((\d\d\d\d)|((?:[01]\d)|(?:2[0123])):([012345]\d))\s(\S*)(\s*.*)$"
);

/// Enterprise Unix listing parser
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EnterpriseUnixParser;

impl EnterpriseUnixParser {
    pub fn new() -> Self {
        Self
    }

    pub fn parse(&self, line: &str) -> Option<FileEntry> {
        self.parse_at(line, Utc::now())
    }

    pub(crate) fn parse_at(&self, line: &str, now: DateTime<Utc>) -> Option<FileEntry> {
        let caps = ENTERPRISE_UNIX_LS_RE.captures(line)?;
        let mut entry = FileEntry::new(line);
        entry.entry_type = EntryType::File;
        entry.user = caps[14].to_string();
        entry.group = caps[15].to_string();
        entry.size = caps[16].parse().unwrap_or(-1);

        let month = MONTHS.iter().position(|m| *m == &caps[17]).map(|m| m as u32 + 1);
        let day: Option<u32> = caps[18].parse().ok();
        let year: Option<i32> = caps.get(20).and_then(|y| y.as_str().parse().ok());
        let hour: Option<u32> = caps.get(21).and_then(|h| h.as_str().parse().ok());
        let minute: Option<u32> = caps.get(22).and_then(|m| m.as_str().parse().ok());
        entry.timestamp = match (month, day, year, hour, minute) {
            (Some(month), Some(day), year, Some(hour), Some(minute)) => {
                // recent entries: the year is implied
                let year = year.unwrap_or_else(|| {
                    if month > now.month() {
                        now.year() - 1
                    } else {
                        now.year()
                    }
                });
                NaiveDate::from_ymd_opt(year, month, day)
                    .and_then(|d| d.and_hms_opt(hour, minute, 0))
                    .map(|dt| dt.and_utc())
            }
            (Some(month), Some(day), Some(year), _, _) => NaiveDate::from_ymd_opt(year, month, day)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc()),
            _ => None,
        };

        entry.name = caps[23].to_string();
        Some(entry)
    }
}

#[cfg(test)]
mod test {

    use chrono::{TimeZone, Timelike};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::list::PosixPexQuery;

    fn parser() -> EnterpriseUnixParser {
        crate::log_init();
        EnterpriseUnixParser::new()
    }

    #[test]
    fn should_parse_good_listing() {
        let parser = parser();
        for line in [
            "-C--E-----FTP B QUA1I1      18128       41 Aug 12 13:56 QUADTEST",
            "-C--E-----FTP A QUA1I1      18128       41 Aug 12 13:56 QUADTEST2",
            "-C--E-----FTP A QUA1I1      18128       41 Apr 1 2014 QUADTEST3",
        ] {
            let entry = parser.parse(line);
            assert!(entry.is_some(), "{line}");
            assert!(entry.unwrap().timestamp().is_some(), "{line}");
        }
    }

    #[test]
    fn should_parse_file() {
        let now = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let entry = parser()
            .parse_at(
                "-C--E-----FTP B QUA1I1      18128       5000000000 Aug 12 13:56 QUADTEST",
                now,
            )
            .unwrap();
        assert_eq!(entry.is_file(), true);
        assert_eq!(entry.name(), "QUADTEST");
        assert_eq!(entry.size(), 5000000000);
        assert_eq!(entry.user(), "QUA1I1");
        assert_eq!(entry.group(), "18128");
        // August is after June: last year
        let timestamp = entry.timestamp().unwrap();
        assert_eq!(timestamp, Utc.with_ymd_and_hms(2023, 8, 12, 13, 56, 0).unwrap());
        assert_eq!(timestamp.second(), 0);
        for who in [PosixPexQuery::Owner, PosixPexQuery::Group, PosixPexQuery::Others] {
            assert_eq!(entry.can_read(who), false);
            assert_eq!(entry.can_write(who), false);
            assert_eq!(entry.can_execute(who), false);
        }
    }

    #[test]
    fn should_use_current_year_for_past_months() {
        let now = Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap();
        let entry = parser()
            .parse_at("-C--E-----FTP B QUA1I1      18128       41 Aug 12 13:56 QUADTEST", now)
            .unwrap();
        assert_eq!(
            entry.timestamp(),
            Some(Utc.with_ymd_and_hms(2024, 8, 12, 13, 56, 0).unwrap())
        );
    }

    #[test]
    fn should_parse_date_with_year() {
        let entry = parser()
            .parse("-C--E-----FTP B QUA1I1      18128       5000000000 Aug 12 2014 QUADTEST")
            .unwrap();
        assert_eq!(
            entry.timestamp(),
            Some(Utc.with_ymd_and_hms(2014, 8, 12, 0, 0, 0).unwrap())
        );
    }

    #[test]
    fn should_reject_bad_listing() {
        let parser = parser();
        for line in [
            "zrwxr-xr-x   2 root     root         4096 Mar  2 15:13 zxbox",
            "dxrwr-xr-x   2 root     root         4096 Aug 24  2001 zxjdbc",
            "drwxr-xr-x   2 root     root         4096 Jam  4 00:03 zziplib",
            "drwxr-xr-x   2 root     99           4096 Feb 23 30:01 zzplayer",
            "-rw-r--r--   1 14       staff       80284 Aug 22  zxJDBC-1.2.3.tar.gz",
            "-rw-r--r--   1 ftp      no group    83853 Jan 22  2001 zxJDBC-1.2.4.tar.gz",
            "drwxr-xr-x   2 root     root         4096 Aug 26  201O zztpp",
        ] {
            assert!(parser.parse(line).is_none(), "{line}");
        }
    }
}
