//! # Reply
//!
//! Control connection replies and the reader which assembles them from raw lines (RFC 959 §4.2)

use std::fmt;
use std::io::BufRead;

use crate::listener::ListenerList;
use crate::{FtpError, FtpResult, Status};

/// Length of a reply code
const REPLY_CODE_LEN: usize = 3;

/// Defines a reply from the ftp server
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub status: Status,
    pub code: u32,
    /// Reply lines as received, code prefix included
    pub lines: Vec<String>,
}

impl Reply {
    /// Instantiates a new `Reply`
    pub fn new(code: u32, lines: Vec<String>) -> Self {
        Self {
            status: Status::from(code),
            code,
            lines,
        }
    }

    pub fn is_multiline(&self) -> bool {
        self.lines.len() > 1
    }

    /// Get the full reply text, lines joined by CRLF
    pub fn as_string(&self) -> String {
        self.lines.join("\r\n")
    }

    /// Get reply text without the code prefix of the first line
    pub fn message(&self) -> String {
        let mut lines = self.lines.iter();
        let first = lines
            .next()
            .map(|l| l.get(REPLY_CODE_LEN + 1..).unwrap_or_default())
            .unwrap_or_default();
        std::iter::once(first)
            .chain(lines.map(String::as_str))
            .collect::<Vec<&str>>()
            .join("\n")
            .trim_end()
            .to_string()
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message())
    }
}

/// Character encoding of the control connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Encoding {
    /// ISO-8859-1
    #[default]
    Latin1,
    Utf8,
}

impl Encoding {
    pub fn decode(&self, bytes: &[u8]) -> String {
        match self {
            Self::Latin1 => bytes.iter().map(|b| *b as char).collect(),
            Self::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
        }
    }

    /// Chars outside of the charset are replaced with `?`
    pub fn encode(&self, text: &str) -> Vec<u8> {
        match self {
            Self::Latin1 => text
                .chars()
                .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
                .collect(),
            Self::Utf8 => text.as_bytes().to_vec(),
        }
    }
}

/// How replies are read from the control connection
#[derive(Debug, Clone, Copy)]
pub(crate) struct ReplySettings {
    pub encoding: Encoding,
    /// Terminate multi-line replies only on `DDD ` with the same code
    pub strict_multiline: bool,
    /// Reject single-line replies which are truncated or miss the space separator
    pub strict_parsing: bool,
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self {
            encoding: Encoding::default(),
            strict_multiline: false,
            strict_parsing: true,
        }
    }
}

/// Read a line, stripping the line terminator. Returns `None` at end of stream.
pub(crate) fn read_line<R: BufRead>(
    reader: &mut R,
    encoding: Encoding,
) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    if reader.read_until(b'\n', &mut buf)? == 0 {
        return Ok(None);
    }
    while matches!(buf.last(), Some(b'\n' | b'\r')) {
        buf.pop();
    }
    Ok(Some(encoding.decode(&buf)))
}

/// Read a whole reply from `reader`.
///
/// Listeners, if any, are notified before a `421` is turned into [`FtpError::ConnectionClosed`].
pub(crate) fn read_reply<R: BufRead>(
    reader: &mut R,
    settings: &ReplySettings,
    listeners: Option<&ListenerList>,
) -> FtpResult<Reply> {
    let first = next_line(reader, settings.encoding)?;
    let bytes = first.as_bytes();
    if bytes.len() < REPLY_CODE_LEN {
        return Err(FtpError::MalformedReply(format!(
            "Truncated server reply: '{first}'"
        )));
    }
    if !bytes[..REPLY_CODE_LEN].iter().all(u8::is_ascii_digit) {
        return Err(FtpError::MalformedReply(format!(
            "Could not parse response code. Server Reply: '{first}'"
        )));
    }
    let code_str = first[..REPLY_CODE_LEN].to_string();
    let code: u32 = code_str
        .parse()
        .map_err(|_| FtpError::MalformedReply(first.clone()))?;
    let mut lines = vec![first.clone()];
    if bytes.len() > REPLY_CODE_LEN {
        let separator = bytes[REPLY_CODE_LEN];
        if separator == b'-' {
            loop {
                let line = next_line(reader, settings.encoding)?;
                let done = if settings.strict_multiline {
                    is_strict_terminator(&line, &code_str)
                } else {
                    is_lenient_terminator(&line)
                };
                lines.push(line);
                if done {
                    break;
                }
            }
        } else if settings.strict_parsing {
            if bytes.len() == REPLY_CODE_LEN + 1 {
                return Err(FtpError::MalformedReply(format!(
                    "Truncated server reply: '{first}'"
                )));
            } else if separator != b' ' {
                return Err(FtpError::MalformedReply(format!(
                    "Invalid server reply: '{first}'"
                )));
            }
        }
    } else if settings.strict_parsing {
        return Err(FtpError::MalformedReply(format!(
            "Truncated server reply: '{first}'"
        )));
    }
    let reply = Reply::new(code, lines);
    if let Some(listeners) = listeners {
        listeners.fire_reply_received(code, &reply.as_string());
    }
    if code == Status::NotAvailable.code() {
        debug!("server replied 421; connection closed");
        return Err(FtpError::ConnectionClosed);
    }
    Ok(reply)
}

fn next_line<R: BufRead>(reader: &mut R, encoding: Encoding) -> FtpResult<String> {
    let line = read_line(reader, encoding)
        .map_err(FtpError::ConnectionError)?
        .ok_or(FtpError::ConnectionClosed)?;
    trace!("CC IN: {}", line);
    Ok(line)
}

/// `DDD ` with the code which opened the reply
fn is_strict_terminator(line: &str, code: &str) -> bool {
    line.len() > REPLY_CODE_LEN
        && line.starts_with(code)
        && line.as_bytes()[REPLY_CODE_LEN] == b' '
}

/// Any line starting with a digit whose 4th char is not `-`
fn is_lenient_terminator(line: &str) -> bool {
    let bytes = line.as_bytes();
    bytes.len() > REPLY_CODE_LEN && bytes[0].is_ascii_digit() && bytes[REPLY_CODE_LEN] != b'-'
}

/// 1xx
pub fn is_positive_preliminary(code: u32) -> bool {
    (100..200).contains(&code)
}

/// 2xx
pub fn is_positive_completion(code: u32) -> bool {
    (200..300).contains(&code)
}

/// 3xx
pub fn is_positive_intermediate(code: u32) -> bool {
    (300..400).contains(&code)
}

/// 4xx
pub fn is_negative_transient(code: u32) -> bool {
    (400..500).contains(&code)
}

/// 5xx
pub fn is_negative_permanent(code: u32) -> bool {
    (500..600).contains(&code)
}

/// 6xx replies carry a protected (RFC 2228) reply
pub fn is_protected_reply_code(code: u32) -> bool {
    (600..700).contains(&code)
}

#[cfg(test)]
mod test {

    use std::io::Cursor;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::listener::test::RecordingListener;

    fn read(input: &str, settings: ReplySettings) -> FtpResult<Reply> {
        crate::log_init();
        read_reply(&mut Cursor::new(input.as_bytes().to_vec()), &settings, None)
    }

    fn strict_multiline() -> ReplySettings {
        ReplySettings {
            strict_multiline: true,
            ..Default::default()
        }
    }

    #[test]
    fn should_read_single_line_reply() {
        let reply = read("220 Service ready\r\n", ReplySettings::default()).unwrap();
        assert_eq!(reply.code, 220);
        assert_eq!(reply.status, Status::Ready);
        assert_eq!(reply.lines, vec!["220 Service ready".to_string()]);
        assert_eq!(reply.is_multiline(), false);
        assert_eq!(reply.message().as_str(), "Service ready");
        assert_eq!(reply.to_string().as_str(), "[220] Service ready");
    }

    #[test]
    fn should_fail_on_truncated_reply_when_strict() {
        assert!(matches!(
            read("220\r\n", ReplySettings::default()),
            Err(FtpError::MalformedReply(_))
        ));
        assert!(matches!(
            read("220 \r\n", ReplySettings::default()),
            Err(FtpError::MalformedReply(_))
        ));
        assert!(matches!(
            read("220_ready\r\n", ReplySettings::default()),
            Err(FtpError::MalformedReply(_))
        ));
    }

    #[test]
    fn should_accept_truncated_reply_when_lenient() {
        let settings = ReplySettings {
            strict_parsing: false,
            ..Default::default()
        };
        assert_eq!(read("220\r\n", settings).unwrap().code, 220);
        assert_eq!(read("200_ok\r\n", settings).unwrap().code, 200);
    }

    #[test]
    fn should_fail_on_short_or_non_numeric_code() {
        assert!(matches!(
            read("22\r\n", ReplySettings::default()),
            Err(FtpError::MalformedReply(_))
        ));
        assert!(matches!(
            read("2a0 hello\r\n", ReplySettings::default()),
            Err(FtpError::MalformedReply(_))
        ));
    }

    #[test]
    fn should_fail_with_connection_closed_on_eof() {
        assert!(matches!(
            read("", ReplySettings::default()),
            Err(FtpError::ConnectionClosed)
        ));
        assert!(matches!(
            read("211-Features:\r\n MDTM\r\n", ReplySettings::default()),
            Err(FtpError::ConnectionClosed)
        ));
    }

    #[test]
    fn should_read_multiline_reply() {
        let input = "211-Features:\r\n MDTM\r\n SIZE\r\n211 End\r\n";
        let reply = read(input, ReplySettings::default()).unwrap();
        assert_eq!(reply.code, 211);
        assert_eq!(reply.lines.len(), 4);
        assert!(reply.is_multiline());
        assert_eq!(
            reply.as_string().as_str(),
            "211-Features:\r\n MDTM\r\n SIZE\r\n211 End"
        );
        assert_eq!(read(input, strict_multiline()).unwrap(), reply);
    }

    #[test]
    fn should_terminate_differently_in_strict_and_lenient_mode() {
        let input = "200-first\r\n 200 not the end\r\n201 other code\r\n200 end\r\n";
        let lenient = read(input, ReplySettings::default()).unwrap();
        assert_eq!(
            lenient.lines,
            vec![
                "200-first".to_string(),
                " 200 not the end".to_string(),
                "201 other code".to_string(),
            ]
        );
        let strict = read(input, strict_multiline()).unwrap();
        assert_eq!(strict.lines.len(), 4);
        assert_eq!(strict.lines[3].as_str(), "200 end");
    }

    #[test]
    fn should_raise_connection_closed_on_421() {
        assert!(matches!(
            read("421 Service not available\r\n", ReplySettings::default()),
            Err(FtpError::ConnectionClosed)
        ));
        assert!(matches!(
            read(
                "421-Going down\r\n now\r\n421 bye\r\n",
                ReplySettings::default()
            ),
            Err(FtpError::ConnectionClosed)
        ));
    }

    #[test]
    fn should_notify_listeners_with_crlf_joined_text() {
        let listener = RecordingListener::default();
        let mut list = ListenerList::default();
        list.add(Box::new(listener.clone()));
        let mut input = Cursor::new(b"230-Welcome\r\n230 Logged in\r\n421 bye\r\n".to_vec());
        let settings = ReplySettings::default();
        assert_eq!(
            read_reply(&mut input, &settings, Some(&list)).unwrap().code,
            230
        );
        assert!(matches!(
            read_reply(&mut input, &settings, Some(&list)),
            Err(FtpError::ConnectionClosed)
        ));
        assert_eq!(
            *listener.events.lock().unwrap(),
            vec![
                "REPLY 230 \"230-Welcome\\r\\n230 Logged in\"".to_string(),
                "REPLY 421 \"421 bye\"".to_string(),
            ]
        );
    }

    #[test]
    fn should_decode_latin1_and_utf8() {
        assert_eq!(Encoding::Latin1.decode(&[0x63, 0x61, 0x66, 0xe9]), "café");
        assert_eq!(Encoding::Utf8.decode("café".as_bytes()), "café");
        assert_eq!(Encoding::Latin1.encode("café"), vec![0x63, 0x61, 0x66, 0xe9]);
        assert_eq!(Encoding::Latin1.encode("€"), vec![b'?']);
    }

    #[test]
    fn should_classify_reply_codes() {
        assert!(is_positive_preliminary(150));
        assert!(is_positive_completion(226));
        assert!(is_positive_intermediate(350));
        assert!(is_negative_transient(425));
        assert!(is_negative_permanent(550));
        assert!(is_protected_reply_code(631));
        assert_eq!(is_positive_completion(331), false);
    }
}
