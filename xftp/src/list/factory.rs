//! # Factory
//!
//! Builds the listing parser matching a server system key, such as the reply to `SYST`

use super::config::*;
use super::parser::{
    CompositeParser, ListParser, MacOsPeterParser, MvsParser, NetwareParser, NtParser, Os2Parser,
    Os400Parser, UnixParser, VmsParser,
};
use crate::{FtpError, FtpResult};

/// Build the parser for `key`, usually the text of the `SYST` reply.
///
/// Matching is case-insensitive and looks for the known keys anywhere in `key`,
/// so `"215 UNIX Type: L8"` gives a unix parser.
pub fn parser_for_key(key: &str, config: &ParserConfig) -> FtpResult<ListParser> {
    let upper = key.to_ascii_uppercase();
    debug!("building listing parser for system key '{key}'");
    let parser = if upper.contains(SYST_UNIX_TRIM_LEADING) {
        ListParser::Unix(UnixParser::new(config).trim_leading_spaces(true))
    } else if upper.contains(SYST_UNIX) {
        ListParser::Unix(UnixParser::new(config))
    } else if upper.contains(SYST_VMS) {
        ListParser::Vms(VmsParser::new(config))
    } else if upper.contains(SYST_NT) {
        nt_composite(config)
    } else if upper.contains(SYST_OS2) {
        ListParser::Os2(Os2Parser::new(config))
    } else if upper.contains(SYST_OS400) || upper.contains(SYST_AS400) {
        os400_composite(config)
    } else if upper.contains(SYST_MVS) {
        ListParser::Mvs(MvsParser::new())
    } else if upper.contains(SYST_NETWARE) {
        ListParser::Netware(NetwareParser::new(config))
    } else if upper.contains(SYST_MACOS_PETER) {
        ListParser::MacOsPeter(MacOsPeterParser::new(config))
    } else if upper.contains(SYST_L8) {
        // "UNKNOWN Type: L8" servers list like unix
        ListParser::Unix(UnixParser::new(config))
    } else {
        return Err(FtpError::UnknownParser(key.to_string()));
    };
    Ok(parser)
}

/// Build the parser for the system key configured in `config`.
///
/// With no key, a unix parser is returned. Only the exact keys [`SYST_NT`] and [`SYST_OS400`]
/// give the bare NT and OS/400 parsers; any other key is resolved as in [`parser_for_key`].
pub fn parser_for_config(config: &ParserConfig) -> FtpResult<ListParser> {
    match config.server_system_key() {
        None => Ok(ListParser::Unix(UnixParser::new(config))),
        Some(SYST_NT) => Ok(ListParser::Nt(NtParser::new(config))),
        Some(SYST_OS400) => Ok(ListParser::Os400(Os400Parser::new(config))),
        Some(key) => parser_for_key(key, config),
    }
}

/// Windows servers may be configured to list like unix
fn nt_composite(config: &ParserConfig) -> ListParser {
    ListParser::Composite(CompositeParser::new(vec![
        ListParser::Nt(NtParser::new(config)),
        ListParser::Unix(UnixParser::new(config)),
    ]))
}

/// The integrated file system of IBM i may list like unix
fn os400_composite(config: &ParserConfig) -> ListParser {
    ListParser::Composite(CompositeParser::new(vec![
        ListParser::Os400(Os400Parser::new(config)),
        ListParser::Unix(UnixParser::new(config)),
    ]))
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    fn key(key: &str) -> FtpResult<ListParser> {
        crate::log_init();
        parser_for_key(key, &ParserConfig::default())
    }

    fn config(key: Option<&str>) -> ListParser {
        crate::log_init();
        let config = match key {
            Some(key) => ParserConfig::new(key),
            None => ParserConfig::default(),
        };
        parser_for_config(&config).unwrap()
    }

    #[test]
    fn should_build_parser_for_key() {
        assert!(matches!(key("unix"), Ok(ListParser::Unix(p)) if !p.is_trimming_leading_spaces()));
        assert!(matches!(key("UNIX"), Ok(ListParser::Unix(_))));
        assert!(matches!(key("UNIX_LTRIM"), Ok(ListParser::Unix(p)) if p.is_trimming_leading_spaces()));
        assert!(matches!(key("EnterpriseUnix"), Ok(ListParser::Unix(_))));
        assert!(matches!(key("215 UNIX Type: L8"), Ok(ListParser::Unix(_))));
        assert!(matches!(key("WindowsNT"), Ok(ListParser::Composite(_))));
        assert!(matches!(key("ThigaVMSaMaJig"), Ok(ListParser::Vms(_))));
        assert!(matches!(key("OS/2"), Ok(ListParser::Os2(_))));
        assert!(matches!(key("OS/400"), Ok(ListParser::Composite(_))));
        assert!(matches!(key("AS/400"), Ok(ListParser::Composite(_))));
        assert!(matches!(key("UNKNOWN Type: L8"), Ok(ListParser::Unix(_))));
        assert!(matches!(key("MVS is the operating system"), Ok(ListParser::Mvs(_))));
        assert!(matches!(key("NETWARE"), Ok(ListParser::Netware(_))));
        assert!(matches!(key("MACOS PETER"), Ok(ListParser::MacOsPeter(_))));
    }

    #[test]
    fn should_fail_on_unknown_key() {
        let err = key("NT").unwrap_err();
        assert_eq!(err.to_string(), "Unknown parser type: NT");
        assert!(matches!(key("OS2FTPFileEntryParser"), Err(FtpError::UnknownParser(_))));
    }

    #[test]
    fn should_order_composite_members() {
        let Ok(ListParser::Composite(composite)) = key("Windows_NT") else {
            panic!("not a composite parser");
        };
        assert!(matches!(composite.parsers()[0], ListParser::Nt(_)));
        assert!(matches!(composite.parsers()[1], ListParser::Unix(_)));
    }

    #[test]
    fn should_build_parser_for_config() {
        assert!(matches!(config(None), ListParser::Unix(_)));
        assert!(matches!(config(Some(SYST_OS400)), ListParser::Os400(_)));
        assert!(matches!(config(Some(SYST_AS400)), ListParser::Composite(_)));
        assert!(matches!(config(Some(SYST_L8)), ListParser::Unix(_)));
        assert!(matches!(config(Some(SYST_MVS)), ListParser::Mvs(_)));
        assert!(matches!(config(Some(SYST_NETWARE)), ListParser::Netware(_)));
        assert!(matches!(config(Some(SYST_NT)), ListParser::Nt(_)));
        assert!(matches!(config(Some(SYST_OS2)), ListParser::Os2(_)));
        assert!(matches!(config(Some(SYST_UNIX)), ListParser::Unix(_)));
        assert!(matches!(config(Some(SYST_VMS)), ListParser::Vms(_)));
        assert!(matches!(config(Some(SYST_MACOS_PETER)), ListParser::MacOsPeter(_)));
        // matching on the configured key is exact
        assert!(matches!(config(Some("Windows")), ListParser::Composite(_)));
        assert!(matches!(config(Some("OS/400 v1")), ListParser::Composite(_)));
    }

    #[test]
    fn should_propagate_config_to_parsers() {
        let config = ParserConfig::new(SYST_VMS).versioning(true);
        let mut parser = parser_for_config(&config).unwrap();
        let entry = parser
            .parse("1-JUN.LIS;1  9/9  2-JUN-1998 07:32:04  [GROUP,OWNER]  (RWED,RWED,RWED,RE)")
            .unwrap();
        assert_eq!(entry.name(), "1-JUN.LIS;1");
    }
}
