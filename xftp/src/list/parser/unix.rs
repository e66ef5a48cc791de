//! # Unix
//!
//! Parser for `ls -l` style listings, the most common format found on FTP servers.

use lazy_regex::{Captures, Lazy, Regex};

use crate::list::{Access, EntryType, FileEntry, ParserConfig, PosixPexQuery, TimestampParser};

/// Type, permissions, links, optional owner and group, size (or `major, minor` for devices),
/// date (several flavours, including CJK markers), time or year and name.
static UNIX_LS_RE: Lazy<Regex> = lazy_regex!(
    r"^([bcdelfmpSs-])(((r|-)(w|-)([xsStTL-]))((r|-)(w|-)([xsStTL-]))((r|-)(w|-)([xsStTL-])))\+?\s*(\d+)\s+(?:(\S+(?:\s\S+)*?)\s+)?(?:(\S+(?:\s\S+)*)\s+)?(\d+(?:,\s*\d+)?)\s+((?:\d+[-/]\d+[-/]\d+)|(?:\S{3}\s+\d{1,2})|(?:\d{1,2}\s+\S{3})|(?:\d{1,2}月\s+\d{1,2}日))\s+((?:\d+(?::\d+)?)|(?:\d{4}年))\s(.*)$"
);

/// The `total NNN` line printed before the entries
static TOTAL_RE: Lazy<Regex> = lazy_regex!(r"^total \d+$");

/// Unix listing parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnixParser {
    timestamp: TimestampParser,
    trim_leading_spaces: bool,
}

impl UnixParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            timestamp: TimestampParser::new(config.get_date_format()),
            trim_leading_spaces: false,
        }
    }

    /// Some servers pad names with spaces; with this option they're removed
    pub fn trim_leading_spaces(mut self, trim: bool) -> Self {
        self.trim_leading_spaces = trim;
        self
    }

    pub fn is_trimming_leading_spaces(&self) -> bool {
        self.trim_leading_spaces
    }

    pub fn parse(&self, line: &str) -> Option<FileEntry> {
        let caps = UNIX_LS_RE.captures(line)?;
        let mut entry = FileEntry::new(line);
        let is_device = apply_type_and_permissions(&mut entry, &caps);

        if !is_device {
            entry.hard_link_count = caps[15].parse().unwrap_or(0);
        }
        entry.user = caps.get(16).map(|m| m.as_str().to_string()).unwrap_or_default();
        entry.group = caps.get(17).map(|m| m.as_str().to_string()).unwrap_or_default();
        if !is_device {
            entry.size = caps[18].parse().unwrap_or(-1);
        }
        entry.timestamp = self.timestamp.parse(&format!("{} {}", &caps[19], &caps[20]));

        let mut name = &caps[21];
        if self.trim_leading_spaces {
            name = name.trim_start();
        }
        set_name_and_link(&mut entry, name);
        Some(entry)
    }

    /// Drop the `total` line
    pub fn pre_parse(&self, lines: Vec<String>) -> Vec<String> {
        lines
            .into_iter()
            .filter(|line| !TOTAL_RE.is_match(line))
            .collect()
    }
}

/// Sets entry type and permissions from the type char (group 1) and the three
/// permission triples (groups 4, 8 and 12). Returns whether the entry is a device.
pub(super) fn apply_type_and_permissions(entry: &mut FileEntry, caps: &Captures) -> bool {
    let mut is_device = false;
    entry.entry_type = match &caps[1] {
        "d" => EntryType::Directory,
        "e" | "l" => EntryType::SymbolicLink,
        "b" | "c" => {
            is_device = true;
            EntryType::File
        }
        "f" | "-" => EntryType::File,
        _ => EntryType::Unknown,
    };
    for (who, group) in [
        (PosixPexQuery::Owner, 4),
        (PosixPexQuery::Group, 8),
        (PosixPexQuery::Others, 12),
    ] {
        entry.set_permission(who, Access::Read, &caps[group] != "-");
        entry.set_permission(who, Access::Write, &caps[group + 1] != "-");
        // `S`, `T` and `L` mean the execute bit is not set
        let exec = &caps[group + 2];
        let executable = exec != "-" && !exec.chars().all(|c| c.is_ascii_uppercase());
        entry.set_permission(who, Access::Execute, executable);
    }
    is_device
}

/// Symbolic links are listed as `name -> target`
pub(super) fn set_name_and_link(entry: &mut FileEntry, name: &str) {
    match name.split_once(" -> ") {
        Some((name, target)) if entry.entry_type == EntryType::SymbolicLink => {
            entry.name = name.to_string();
            entry.link = Some(target.to_string());
        }
        _ => entry.name = name.to_string(),
    }
}

#[cfg(test)]
mod test {

    use chrono::{Datelike, Timelike, Utc};
    use pretty_assertions::assert_eq;

    use super::*;

    fn parser() -> UnixParser {
        crate::log_init();
        UnixParser::new(&ParserConfig::default())
    }

    #[test]
    fn should_parse_file() {
        let entry = parser()
            .parse("-rwxr-xr-x   2 root     root         4096 Mar  2 15:13 zxbox")
            .unwrap();
        assert_eq!(entry.is_file(), true);
        assert_eq!(entry.name(), "zxbox");
        assert_eq!(entry.size(), 4096);
        assert_eq!(entry.hard_link_count(), 2);
        assert_eq!(entry.user(), "root");
        assert_eq!(entry.group(), "root");
        assert_eq!(entry.can_read(PosixPexQuery::Owner), true);
        assert_eq!(entry.can_write(PosixPexQuery::Owner), true);
        assert_eq!(entry.can_execute(PosixPexQuery::Owner), true);
        assert_eq!(entry.can_write(PosixPexQuery::Group), false);
        assert_eq!(entry.can_execute(PosixPexQuery::Others), true);
        let timestamp = entry.timestamp().unwrap();
        assert_eq!(timestamp.month(), 3);
        assert_eq!(timestamp.day(), 2);
        assert_eq!(timestamp.hour(), 15);
        assert_eq!(timestamp.minute(), 13);
        assert_eq!(entry.is_valid(), true);
    }

    #[test]
    fn should_parse_directory_with_year() {
        let entry = parser()
            .parse("drwxr-xr-x   2 root     root         4096 Aug 24  2001 zxjdbc")
            .unwrap();
        assert_eq!(entry.is_directory(), true);
        assert_eq!(entry.name(), "zxjdbc");
        assert_eq!(entry.timestamp().unwrap().year(), 2001);
    }

    #[test]
    fn should_parse_symlink() {
        let entry = parser()
            .parse("lrwxrwxrwx   1 neeme neeme    23 2005-03-02 18:06 macros -> /usr/lib/macros")
            .unwrap();
        assert_eq!(entry.is_symlink(), true);
        assert_eq!(entry.name(), "macros");
        assert_eq!(entry.link(), Some("/usr/lib/macros"));
        assert_eq!(entry.size(), 23);
        let timestamp = entry.timestamp().unwrap();
        assert_eq!(timestamp.year(), 2005);
        assert_eq!(timestamp.hour(), 18);
        assert_eq!(entry.can_execute(PosixPexQuery::Others), true);
    }

    #[test]
    fn should_not_split_arrow_for_regular_files() {
        let entry = parser()
            .parse("-rw-r--r--   1 root root    23 Nov  5  2018 a -> b")
            .unwrap();
        assert_eq!(entry.name(), "a -> b");
        assert_eq!(entry.link(), None);
    }

    #[test]
    fn should_parse_device() {
        let entry = parser()
            .parse("crw-rw-rw-   1 root     root       1,   3 Aug 24  2001 null")
            .unwrap();
        assert_eq!(entry.is_file(), true);
        assert_eq!(entry.name(), "null");
        assert_eq!(entry.size(), -1);
        assert_eq!(entry.hard_link_count(), 0);
    }

    #[test]
    fn should_handle_uppercase_exec_flags() {
        let entry = parser()
            .parse("-rwSr-sr-T   1 root     root         4096 Aug 24  2001 setuid")
            .unwrap();
        assert_eq!(entry.can_execute(PosixPexQuery::Owner), false);
        assert_eq!(entry.can_execute(PosixPexQuery::Group), true);
        assert_eq!(entry.can_execute(PosixPexQuery::Others), false);
    }

    #[test]
    fn should_parse_without_group() {
        let entry = parser()
            .parse("drwxr-xr-x 1 usernameftp 512 Jan 29 23:32 prog")
            .unwrap();
        assert_eq!(entry.is_directory(), true);
        assert_eq!(entry.user(), "usernameftp");
        assert_eq!(entry.group(), "");
        assert_eq!(entry.size(), 512);
    }

    #[test]
    fn should_parse_user_with_spaces() {
        let entry = parser()
            .parse("-rw-r--r--   1 ftp      no group    83853 Jan 22  2001 zxJDBC-1.2.4.tar.gz")
            .unwrap();
        assert_eq!(entry.name(), "zxJDBC-1.2.4.tar.gz");
        assert_eq!(entry.size(), 83853);
    }

    #[test]
    fn should_parse_cjk_dates() {
        let entry = parser()
            .parse("-rw-r--r--   1 user group  1024 3月 2日 15:13 日本語.txt")
            .unwrap();
        assert_eq!(entry.name(), "日本語.txt");
        let timestamp = entry.timestamp().unwrap();
        assert_eq!(timestamp.month(), 3);
        assert_eq!(timestamp.day(), 2);
    }

    #[test]
    fn should_parse_with_configured_date_format() {
        let config = ParserConfig::new("UNIX").date_format("%d %b %H:%M");
        let entry = UnixParser::new(&config)
            .parse("-rw-r-----   1 ravensm  sca          814 02 Mar 16:27 ZMIR2.m")
            .unwrap();
        assert_eq!(entry.is_directory(), false);
        assert_eq!(entry.can_read(PosixPexQuery::Owner), true);
        assert_eq!(entry.can_write(PosixPexQuery::Owner), true);
        assert_eq!(entry.can_execute(PosixPexQuery::Owner), false);
        assert_eq!(entry.can_read(PosixPexQuery::Group), true);
        assert_eq!(entry.can_write(PosixPexQuery::Group), false);
        assert_eq!(entry.can_read(PosixPexQuery::Others), false);
        assert_eq!(entry.hard_link_count(), 1);
        assert_eq!(entry.user(), "ravensm");
        assert_eq!(entry.group(), "sca");
        assert_eq!(entry.name(), "ZMIR2.m");
        assert_eq!(entry.size(), 814);
        let timestamp = entry.timestamp().unwrap();
        assert!(timestamp.year() == Utc::now().year() || timestamp.year() == Utc::now().year() - 1);
        assert_eq!(timestamp.month(), 3);
        assert_eq!(timestamp.day(), 2);
        assert_eq!(timestamp.hour(), 16);
        assert_eq!(timestamp.minute(), 27);
    }

    #[test]
    fn should_trim_leading_spaces() {
        let line = "-rw-r--r--   1 root root    23 Nov  5  2018    padded";
        assert_eq!(parser().parse(line).unwrap().name(), "   padded");
        let trimming = parser().trim_leading_spaces(true);
        assert!(trimming.is_trimming_leading_spaces());
        assert_eq!(trimming.parse(line).unwrap().name(), "padded");
    }

    #[test]
    fn should_not_parse_bad_lines() {
        let parser = parser();
        for line in [
            "----rwxr-x   1PEP       0           4019 Mar 18 18:58 einladung.zip",
            "----rwxr-x   1 PEP      0  xx        422 Mar 24 14:06 readme",
            "d---rwxr-x   2 PEP      0          45056Mar 24 14:06 zdir2",
            "zrwxr-xr-x   2 root     root         4096 Mar  2 15:13 zxbox",
            "total 42",
        ] {
            assert!(parser.parse(line).is_none(), "{line}");
        }
        // matches the grammar, but the time is invalid
        let entry = parser
            .parse("----rwxr-x   1 PEP      0           8492 Apr 07 30:13 build.xml")
            .unwrap();
        assert_eq!(entry.timestamp(), None);
    }

    #[test]
    fn should_drop_total_line() {
        let lines = vec![
            "total 8".to_string(),
            "-rw-r--r--   1 root root    23 Nov  5  2018 a".to_string(),
        ];
        assert_eq!(parser().pre_parse(lines).len(), 1);
    }
}
