//! # MLSx
//!
//! Parser for the machine readable listings returned by `MLSD` and `MLST`
//! ([RFC 3659](https://datatracker.ietf.org/doc/html/rfc3659#section-7)):
//!
//! ```text
//! fact=value;fact=value; pathname
//! ```
//!
//! Fact names are case-insensitive. Unknown facts are ignored.

use chrono::prelude::Utc;
use chrono::{DateTime, NaiveDateTime};

use crate::list::{Access, EntryType, FileEntry, MlsxMode, ParserConfig, PosixPex, PosixPexQuery};

/// MLSx entry parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MlsxParser {
    mode: MlsxMode,
}

impl MlsxParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            mode: config.get_mlsx_mode(),
        }
    }

    pub fn parse(&self, line: &str) -> Option<FileEntry> {
        if let Some(path) = line.strip_prefix(' ') {
            // a leading space means there are no facts at all
            return match self.mode {
                MlsxMode::Tolerant if !path.is_empty() => {
                    let mut entry = FileEntry::new(line);
                    entry.name = path.to_string();
                    Some(entry)
                }
                _ => None,
            };
        }
        // the path may contain spaces
        let (facts, path) = line.split_once(' ')?;
        if path.is_empty() {
            return None;
        }
        let facts = facts.strip_suffix(';')?;

        let mut entry = FileEntry::new(line);
        entry.name = path.to_string();
        let has_unix_mode = facts.to_ascii_lowercase().contains("unix.mode");
        for fact in facts.split(';') {
            let (name, value) = fact.split_once('=')?;
            if value.contains('=') {
                return None;
            }
            if value.is_empty() {
                continue;
            }
            match name.to_ascii_lowercase().as_str() {
                "size" | "sizd" => entry.size = value.parse().ok()?,
                "modify" => entry.timestamp = Some(parse_timeval(value)?),
                "type" => entry.entry_type = parse_type(value),
                "unix.owner" => entry.user = value.to_string(),
                "unix.group" => entry.group = value.to_string(),
                "unix.mode" => apply_unix_mode(&mut entry, value),
                "perm" if !has_unix_mode => apply_perm(&mut entry, value),
                _ => {}
            }
        }
        Some(entry)
    }
}

/// `YYYYMMDDHHMMSS[.sss]`, always UTC
fn parse_timeval(value: &str) -> Option<DateTime<Utc>> {
    let format = if value.contains('.') {
        "%Y%m%d%H%M%S%.f"
    } else {
        "%Y%m%d%H%M%S"
    };
    NaiveDateTime::parse_from_str(value, format)
        .ok()
        .map(|dt| dt.and_utc())
}

fn parse_type(value: &str) -> EntryType {
    match value.to_ascii_lowercase().as_str() {
        "file" => EntryType::File,
        "cdir" | "pdir" | "dir" => EntryType::Directory,
        _ => EntryType::Unknown,
    }
}

/// e.g. `0755`; only the last three octal digits matter
fn apply_unix_mode(entry: &mut FileEntry, value: &str) {
    let digits: Vec<char> = value.chars().collect();
    if digits.len() < 3 {
        return;
    }
    for (who, digit) in [PosixPexQuery::Owner, PosixPexQuery::Group, PosixPexQuery::Others]
        .into_iter()
        .zip(&digits[digits.len() - 3..])
    {
        if let Some(bits) = digit.to_digit(8) {
            entry.permissions[who.index()] = PosixPex::from(bits as u8);
        }
    }
}

/// RFC 3659 `perm` fact; only tells about the listing user
fn apply_perm(entry: &mut FileEntry, value: &str) {
    for flag in value.to_ascii_lowercase().chars() {
        let access = match flag {
            // append, create, delete, rename, mkdir, purge, store
            'a' | 'c' | 'd' | 'f' | 'm' | 'p' | 'w' => Access::Write,
            // enter
            'e' => Access::Execute,
            // list, retrieve
            'l' | 'r' => Access::Read,
            _ => continue,
        };
        entry.set_permission(PosixPexQuery::Owner, access, true);
    }
}
