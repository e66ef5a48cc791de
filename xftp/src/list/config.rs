//! # Config
//!
//! Listing parser configuration

/// Unix server key
pub const SYST_UNIX: &str = "UNIX";
/// Unix server key; leading spaces of file names are trimmed
pub const SYST_UNIX_TRIM_LEADING: &str = "UNIX_LTRIM";
/// VMS server key
pub const SYST_VMS: &str = "VMS";
/// Windows NT server key
pub const SYST_NT: &str = "WINDOWS";
/// OS/2 server key
pub const SYST_OS2: &str = "OS/2";
/// OS/400 server key
pub const SYST_OS400: &str = "OS/400";
/// AS/400 server key
pub const SYST_AS400: &str = "AS/400";
/// MVS server key
pub const SYST_MVS: &str = "MVS";
/// Some servers return an "UNKNOWN Type: L8" system type; they list like unix
pub const SYST_L8: &str = "TYPE: L8";
/// Netware server key
pub const SYST_NETWARE: &str = "NETWARE";
/// Mac OS (Peter's server) key
pub const SYST_MACOS_PETER: &str = "MACOS PETER";

/// How MLSD/MLST lines without facts are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MlsxMode {
    /// A line made of a single space followed by the path is an entry without facts
    #[default]
    Tolerant,
    /// A line must start with the fact list
    Strict,
}

/// Configuration used to build a listing parser.
///
/// The date format uses `chrono` strftime syntax (e.g. `%d %b %H:%M`). When it lacks a year,
/// the current year is assumed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParserConfig {
    server_system_key: Option<String>,
    date_format: Option<String>,
    versioning: bool,
    unparseable_entries: bool,
    mlsx_mode: MlsxMode,
}

impl ParserConfig {
    /// Instantiates a new configuration for servers identified by `key` (see `SYST_*` constants)
    pub fn new(key: impl ToString) -> Self {
        Self {
            server_system_key: Some(key.to_string()),
            ..Default::default()
        }
    }

    /// Custom date format, tried after the built-in ones
    pub fn date_format(mut self, format: impl ToString) -> Self {
        self.date_format = Some(format.to_string());
        self
    }

    /// Keep the `;version` suffix of VMS file names; it is stripped otherwise
    pub fn versioning(mut self, enabled: bool) -> Self {
        self.versioning = enabled;
        self
    }

    /// Keep lines which couldn't be parsed as invalid entries
    pub fn unparseable_entries(mut self, enabled: bool) -> Self {
        self.unparseable_entries = enabled;
        self
    }

    pub fn mlsx_mode(mut self, mode: MlsxMode) -> Self {
        self.mlsx_mode = mode;
        self
    }

    pub fn server_system_key(&self) -> Option<&str> {
        self.server_system_key.as_deref()
    }

    pub fn get_date_format(&self) -> Option<&str> {
        self.date_format.as_deref()
    }

    pub fn is_versioning(&self) -> bool {
        self.versioning
    }

    pub fn keep_unparseable_entries(&self) -> bool {
        self.unparseable_entries
    }

    pub fn get_mlsx_mode(&self) -> MlsxMode {
        self.mlsx_mode
    }
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_build_config() {
        let config = ParserConfig::new(SYST_VMS)
            .date_format("%d-%b-%Y %H:%M")
            .versioning(true)
            .unparseable_entries(true)
            .mlsx_mode(MlsxMode::Strict);
        assert_eq!(config.server_system_key(), Some("VMS"));
        assert_eq!(config.get_date_format(), Some("%d-%b-%Y %H:%M"));
        assert_eq!(config.is_versioning(), true);
        assert_eq!(config.keep_unparseable_entries(), true);
        assert_eq!(config.get_mlsx_mode(), MlsxMode::Strict);
    }

    #[test]
    fn should_have_sane_defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.server_system_key(), None);
        assert_eq!(config.get_date_format(), None);
        assert_eq!(config.is_versioning(), false);
        assert_eq!(config.keep_unparseable_entries(), false);
        assert_eq!(config.get_mlsx_mode(), MlsxMode::Tolerant);
    }
}
