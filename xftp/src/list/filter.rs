//! # Filter
//!
//! Filters for listed entries

use super::FileEntry;

/// Decides whether an entry is kept
pub trait FileFilter {
    fn accept(&self, entry: &FileEntry) -> bool;
}

impl<F> FileFilter for F
where
    F: Fn(&FileEntry) -> bool,
{
    fn accept(&self, entry: &FileEntry) -> bool {
        self(entry)
    }
}

/// Accept everything, unparseable entries included
pub fn accept_all(_: &FileEntry) -> bool {
    true
}

/// Accept parsed entries only
pub fn valid_only(entry: &FileEntry) -> bool {
    entry.is_valid()
}

/// Accept directories only
pub fn directories_only(entry: &FileEntry) -> bool {
    entry.is_valid() && entry.is_directory()
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::list::EntryType;

    #[test]
    fn should_filter_entries() {
        let mut dir = FileEntry::new("dir");
        dir.entry_type = EntryType::Directory;
        let file = FileEntry::new("file");
        let invalid = FileEntry::unparseable("garbage");

        assert_eq!(accept_all.accept(&invalid), true);
        assert_eq!(valid_only.accept(&invalid), false);
        assert_eq!(valid_only.accept(&file), true);
        assert_eq!(directories_only.accept(&dir), true);
        assert_eq!(directories_only.accept(&file), false);
        let named = |e: &FileEntry| e.raw_listing() == "file";
        assert_eq!(named.accept(&file), true);
        assert_eq!(named.accept(&dir), false);
    }
}
