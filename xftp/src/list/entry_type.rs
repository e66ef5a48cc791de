/// Describes the kind of entry. Can be `File`, `Directory`, `SymbolicLink` or `Unknown`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub enum EntryType {
    /// Regular file type
    File,
    /// Directory type
    Directory,
    /// Symbolic link; the target, when known, is available on the entry
    SymbolicLink,
    /// The listing didn't tell
    #[default]
    Unknown,
}

impl EntryType {
    /// Returns whether the entry is a directory
    pub fn is_directory(&self) -> bool {
        matches!(self, EntryType::Directory)
    }

    /// Returns whether the entry is a file
    pub fn is_file(&self) -> bool {
        matches!(self, EntryType::File)
    }

    /// Returns whether the entry is a symbolic link
    pub fn is_symlink(&self) -> bool {
        matches!(self, EntryType::SymbolicLink)
    }
}
