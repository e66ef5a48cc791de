/// This enum is used to query about posix permissions on a file
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum PosixPexQuery {
    Owner,
    Group,
    Others,
}

impl PosixPexQuery {
    pub(crate) fn index(self) -> usize {
        match self {
            Self::Owner => 0,
            Self::Group => 1,
            Self::Others => 2,
        }
    }
}

/// Kind of access granted by a permission bit
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Access {
    Read,
    Write,
    Execute,
}

/// Describes the permissions of one class of users on POSIX system.
/// Nothing is granted by default.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct PosixPex {
    read: bool,
    write: bool,
    execute: bool,
}

impl PosixPex {
    /// Returns whether read permission is true
    pub fn can_read(&self) -> bool {
        self.read
    }

    /// Returns whether write permission is true
    pub fn can_write(&self) -> bool {
        self.write
    }

    /// Returns whether execute permission is true
    pub fn can_execute(&self) -> bool {
        self.execute
    }

    pub(crate) fn set(&mut self, access: Access, value: bool) {
        match access {
            Access::Read => self.read = value,
            Access::Write => self.write = value,
            Access::Execute => self.execute = value,
        }
    }

    pub(crate) fn get(&self, access: Access) -> bool {
        match access {
            Access::Read => self.read,
            Access::Write => self.write,
            Access::Execute => self.execute,
        }
    }
}

/// Octal digit, e.g. `5` for `r-x`
impl From<u8> for PosixPex {
    fn from(bits: u8) -> Self {
        Self {
            read: ((bits >> 2) & 0x01) != 0,
            write: ((bits >> 1) & 0x01) != 0,
            execute: (bits & 0x01) != 0,
        }
    }
}
