use chrono::prelude::Utc;
use chrono::DateTime;

use super::{Access, EntryType, PosixPex, PosixPexQuery};

/// Describes an entry on the remote system.
/// This data type is returned in a collection after parsing a LIST, MLSD or MLST output.
///
/// Each entry comes with metadata such as name, type, size, modification time,
/// POSIX permissions and owner/group (when the listing provides them).
///
/// An entry built from a line which no parser understood is *invalid*: only
/// [`FileEntry::raw_listing`] is meaningful then.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct FileEntry {
    pub(crate) entry_type: EntryType,
    pub(crate) name: String,
    /// `-1` when unknown
    pub(crate) size: i64,
    /// `0` when unknown
    pub(crate) hard_link_count: u32,
    pub(crate) user: String,
    pub(crate) group: String,
    pub(crate) link: Option<String>,
    pub(crate) timestamp: Option<DateTime<Utc>>,
    /// owner, group, others
    pub(crate) permissions: [PosixPex; 3],
    pub(crate) raw_listing: String,
    pub(crate) valid: bool,
}

impl FileEntry {
    /// A valid, empty entry for `raw`
    pub(crate) fn new(raw: &str) -> Self {
        Self {
            entry_type: EntryType::Unknown,
            name: String::new(),
            size: -1,
            hard_link_count: 0,
            user: String::new(),
            group: String::new(),
            link: None,
            timestamp: None,
            permissions: [PosixPex::default(); 3],
            raw_listing: raw.to_string(),
            valid: true,
        }
    }

    /// An invalid entry which only keeps the raw line
    pub fn unparseable(raw: &str) -> Self {
        Self {
            valid: false,
            ..Self::new(raw)
        }
    }

    /// Get entry name
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn entry_type(&self) -> EntryType {
        self.entry_type
    }

    /// Get whether entry is a directory
    pub fn is_directory(&self) -> bool {
        self.entry_type.is_directory()
    }

    /// Get whether entry is a file
    pub fn is_file(&self) -> bool {
        self.entry_type.is_file()
    }

    /// Get whether entry is a symbolic link
    pub fn is_symlink(&self) -> bool {
        self.entry_type.is_symlink()
    }

    /// Returns, if available, the target of the symbolic link
    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    /// Size in bytes; `-1` if unknown
    pub fn size(&self) -> i64 {
        self.size
    }

    /// Hard link count; `0` if unknown
    pub fn hard_link_count(&self) -> u32 {
        self.hard_link_count
    }

    pub fn user(&self) -> &str {
        self.user.as_str()
    }

    pub fn group(&self) -> &str {
        self.group.as_str()
    }

    /// Returns the last time the entry was modified, if the listing told it and it could be parsed
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    /// The line this entry was parsed from
    pub fn raw_listing(&self) -> &str {
        self.raw_listing.as_str()
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Returns whether `who` can read file
    pub fn can_read(&self, who: PosixPexQuery) -> bool {
        self.query_pex(who).can_read()
    }

    /// Returns whether `who` can write file
    pub fn can_write(&self, who: PosixPexQuery) -> bool {
        self.query_pex(who).can_write()
    }

    /// Returns whether `who` can execute file
    pub fn can_execute(&self, who: PosixPexQuery) -> bool {
        self.query_pex(who).can_execute()
    }

    /// Returns the permissions of `who`
    pub fn query_pex(&self, who: PosixPexQuery) -> &PosixPex {
        &self.permissions[who.index()]
    }

    pub(crate) fn set_permission(&mut self, who: PosixPexQuery, access: Access, value: bool) {
        self.permissions[who.index()].set(access, value);
    }

    pub(crate) fn has_permission(&self, who: PosixPexQuery, access: Access) -> bool {
        self.permissions[who.index()].get(access)
    }
}
