//! # Listener
//!
//! Protocol listeners are notified whenever a command is written to the control connection
//! and whenever a reply is read from it.

use std::fmt;

/// A listener which observes the control connection traffic
pub trait ProtocolListener: Send + Sync {
    /// Called after `command` has been written. `message` is the literal line sent, CRLF included.
    fn command_sent(&self, command: &str, message: &str);

    /// Called after a reply has been read. `message` contains all the reply lines joined by CRLF.
    fn reply_received(&self, code: u32, message: &str);
}

/// The set of listeners registered on a session
#[derive(Default)]
pub struct ListenerList {
    listeners: Vec<Box<dyn ProtocolListener>>,
}

impl fmt::Debug for ListenerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerList({})", self.listeners.len())
    }
}

impl ListenerList {
    pub fn add(&mut self, listener: Box<dyn ProtocolListener>) {
        self.listeners.push(listener);
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn fire_command_sent(&self, command: &str, message: &str) {
        self.listeners
            .iter()
            .for_each(|l| l.command_sent(command, message));
    }

    pub(crate) fn fire_reply_received(&self, code: u32, message: &str) {
        self.listeners
            .iter()
            .for_each(|l| l.reply_received(code, message));
    }
}

/// A [`ProtocolListener`] which writes the protocol exchange to the `log` facade.
///
/// Credentials (`USER` and `PASS` arguments) are masked unless `with_credentials(true)` is set.
#[derive(Debug, Clone)]
pub struct LogCommandListener {
    level: log::Level,
    show_credentials: bool,
}

impl Default for LogCommandListener {
    fn default() -> Self {
        Self {
            level: log::Level::Info,
            show_credentials: false,
        }
    }
}

impl LogCommandListener {
    pub fn new(level: log::Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }

    pub fn with_credentials(mut self, show: bool) -> Self {
        self.show_credentials = show;
        self
    }

    fn masked<'a>(&self, command: &str, message: &'a str) -> std::borrow::Cow<'a, str> {
        let hidden = !self.show_credentials
            && (command.eq_ignore_ascii_case("PASS") || command.eq_ignore_ascii_case("USER"));
        if hidden {
            std::borrow::Cow::Owned(format!("{command} *******"))
        } else {
            std::borrow::Cow::Borrowed(message.trim_end())
        }
    }
}

impl ProtocolListener for LogCommandListener {
    fn command_sent(&self, command: &str, message: &str) {
        log!(self.level, "> {}", self.masked(command, message));
    }

    fn reply_received(&self, _code: u32, message: &str) {
        log!(self.level, "< {}", message.trim_end());
    }
}
