//! # Sync
//!
//! This module contains the blocking FTP/FTPS session

mod data_stream;
mod nat;
#[cfg(feature = "secure")]
mod secure;
#[cfg(test)]
mod test_server;
mod tls;

use std::io::{copy, BufReader, Cursor, Read, Write};
#[cfg(not(feature = "secure"))]
use std::marker::PhantomData;
use std::net::{SocketAddr, SocketAddrV4, TcpListener, TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
// export
pub use data_stream::DataStream;
pub use nat::{NatResolver, NatWorkaround};
#[cfg(feature = "secure")]
pub use secure::{HostnameVerifier, SecurityState, DEFAULT_FTPS_PORT};
pub use tls::NoTlsStream;
#[cfg(feature = "secure")]
pub use tls::TlsConnector;
pub use tls::TlsStream;
#[cfg(feature = "native-tls")]
pub use tls::{NativeTlsConnector, NativeTlsStream};
#[cfg(feature = "rustls")]
pub use tls::{RustlsConnector, RustlsStream, ValidityOnlyVerifier};

use super::regex::{EPSV_PORT_RE, MDTM_RE, PASV_PORT_RE, QUOTED_PATH_RE, SIZE_RE};
use super::types::{FileStructure, FileType, FtpError, FtpResult, Mode, TransferMode};
use super::Status;
use crate::command::Command;
use crate::list::parser::{MlsxParser, UnixParser};
use crate::list::{self, FileEntry, FileFilter, ListEngine, ListParser, ParserConfig};
use crate::listener::{ListenerList, ProtocolListener};
use crate::reply::{self, Encoding, Reply, ReplySettings};
use crate::types::Features;

/// A function that creates a new stream for the data connection in passive mode.
///
/// It takes a [`SocketAddr`] and returns a [`TcpStream`].
pub type PassiveStreamBuilder = dyn Fn(SocketAddr) -> FtpResult<TcpStream> + Send + Sync;

/// Whether the server lists the `.` entry of a directory like unix servers do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingStyle {
    Unix,
    NonUnix,
}

/// Stream to interface with the FTP server. This interface is only for the command stream.
pub struct ImplFtpStream<T>
where
    T: TlsStream,
{
    reader: BufReader<DataStream<T>>,
    mode: Mode,
    nat_workaround: NatWorkaround,
    welcome_msg: Option<String>,
    active_timeout: Duration,
    passive_stream_builder: Box<PassiveStreamBuilder>,
    reply_settings: ReplySettings,
    listeners: ListenerList,
    last_reply: Option<Reply>,
    list_parser: Option<ListParser>,
    parser_config: ParserConfig,
    listing_style: Option<ListingStyle>,
    #[cfg(not(feature = "secure"))]
    marker: PhantomData<T>,
    #[cfg(feature = "secure")]
    secure: secure::SecureContext<T>,
}

impl<T> ImplFtpStream<T>
where
    T: TlsStream,
{
    /// Try to connect to the remote server
    pub fn connect<A: ToSocketAddrs>(addr: A) -> FtpResult<Self> {
        debug!("Connecting to server");
        TcpStream::connect(addr)
            .map_err(FtpError::ConnectionError)
            .and_then(|stream| Self::connect_with_stream(stream))
    }

    /// Try to connect to the remote server but with the specified timeout
    pub fn connect_timeout(addr: SocketAddr, timeout: Duration) -> FtpResult<Self> {
        debug!("Connecting to server {addr}");
        TcpStream::connect_timeout(&addr, timeout)
            .map_err(FtpError::ConnectionError)
            .and_then(|stream| Self::connect_with_stream(stream))
    }

    /// Connect using provided configured tcp stream
    pub fn connect_with_stream(stream: TcpStream) -> FtpResult<Self> {
        debug!("Established connection with server");
        let mut ftp_stream = Self::new(DataStream::Tcp(stream));
        ftp_stream.read_greeting()?;
        Ok(ftp_stream)
    }

    fn new(stream: DataStream<T>) -> Self {
        Self {
            reader: BufReader::new(stream),
            mode: Mode::Passive,
            nat_workaround: NatWorkaround::default(),
            welcome_msg: None,
            active_timeout: Duration::from_secs(60),
            passive_stream_builder: Self::default_passive_stream_builder(),
            reply_settings: ReplySettings::default(),
            listeners: ListenerList::default(),
            last_reply: None,
            list_parser: None,
            parser_config: ParserConfig::default(),
            listing_style: None,
            #[cfg(not(feature = "secure"))]
            marker: PhantomData {},
            #[cfg(feature = "secure")]
            secure: secure::SecureContext::default(),
        }
    }

    /// Read the greeting. A 1xx greeting announces that the 220 will follow.
    fn read_greeting(&mut self) -> FtpResult<()> {
        debug!("Reading server response...");
        let mut reply = self.read_reply()?;
        if reply::is_positive_preliminary(reply.code) {
            debug!("Server not ready yet: {reply}");
            reply = self.read_reply()?;
        }
        if reply.status != Status::Ready {
            return Err(FtpError::UnexpectedResponse(reply));
        }
        let welcome_msg = reply.as_string();
        debug!("Server READY; response: {welcome_msg:?}");
        self.welcome_msg = Some(welcome_msg);
        Ok(())
    }

    /// Enable active mode for data channel
    pub fn active_mode(mut self, accept_timeout: Duration) -> Self {
        self.mode = Mode::Active;
        self.active_timeout = accept_timeout;
        self
    }

    /// Set a custom [`PassiveStreamBuilder`] for passive mode.
    ///
    /// The stream builder is a function that takes a `SocketAddr` and returns a `TcpStream` and it's used
    /// to create the [`TcpStream`] for the data connection in passive mode.
    pub fn passive_stream_builder<F>(mut self, stream_builder: F) -> Self
    where
        F: Fn(SocketAddr) -> FtpResult<TcpStream> + Send + Sync + 'static,
    {
        self.passive_stream_builder = Box::new(stream_builder);
        self
    }

    /// Set the data channel transfer mode
    pub fn set_mode(&mut self, mode: Mode) {
        debug!("Changed mode to {:?}", mode);
        self.mode = mode;
    }

    /// Enable or disable the replacement of site local addresses in PASV replies.
    /// It is enabled by default.
    pub fn set_passive_nat_workaround(&mut self, nat_workaround: bool) {
        self.nat_workaround = match nat_workaround {
            true => NatWorkaround::ReplaceSiteLocal,
            false => NatWorkaround::Disabled,
        };
    }

    /// Resolve the host advertised in PASV replies with `resolver`
    pub fn set_passive_nat_resolver<F>(&mut self, resolver: F)
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.nat_workaround = NatWorkaround::Resolver(Box::new(resolver));
    }

    /// Set the charset of the control connection. Default is ISO-8859-1
    pub fn set_control_encoding(&mut self, encoding: Encoding) {
        self.reply_settings.encoding = encoding;
    }

    /// When set, a multi-line reply ends only on a line starting with its own code followed by a space
    pub fn set_strict_multiline_parsing(&mut self, strict: bool) {
        self.reply_settings.strict_multiline = strict;
    }

    /// When set (default), truncated single-line replies are rejected
    pub fn set_strict_reply_parsing(&mut self, strict: bool) {
        self.reply_settings.strict_parsing = strict;
    }

    /// Register a listener notified of every command and reply
    pub fn add_protocol_listener(&mut self, listener: impl ProtocolListener + 'static) {
        self.listeners.add(Box::new(listener));
    }

    /// Set the configuration used to build the listing parser; the current parser is discarded
    pub fn set_parser_config(&mut self, config: ParserConfig) {
        self.parser_config = config;
        self.list_parser = None;
    }

    /// Force the parser used by [`Self::list_files`]
    pub fn set_list_parser(&mut self, parser: ListParser) {
        self.list_parser = Some(parser);
    }

    /// Override the listing style; `None` brings back detection
    pub fn set_listing_style(&mut self, style: Option<ListingStyle>) {
        self.listing_style = style;
    }

    /// Returns welcome message retrieved from server (if available)
    pub fn get_welcome_msg(&self) -> Option<&str> {
        self.welcome_msg.as_deref()
    }

    /// Returns a reference to the underlying [`TcpStream`].
    ///
    /// Example:
    /// ```ignore
    /// use xftp::FtpStream;
    /// use std::net::TcpStream;
    /// use std::time::Duration;
    ///
    /// let stream = FtpStream::connect("127.0.0.1:21")
    ///                        .expect("Couldn't connect to the server...");
    /// stream.get_ref().set_read_timeout(Some(Duration::from_secs(10)))
    ///                 .expect("set_read_timeout call failed");
    /// ```
    pub fn get_ref(&self) -> &TcpStream {
        self.reader.get_ref().get_ref()
    }

    /// Code of the last reply read
    pub fn last_reply_code(&self) -> Option<u32> {
        self.last_reply.as_ref().map(|r| r.code)
    }

    /// Text of the last reply read, lines joined by CRLF
    pub fn last_reply_string(&self) -> Option<String> {
        self.last_reply.as_ref().map(Reply::as_string)
    }

    /// Lines of the last reply read
    pub fn last_reply_lines(&self) -> &[String] {
        self.last_reply
            .as_ref()
            .map(|r| r.lines.as_slice())
            .unwrap_or_default()
    }

    /// Send a raw command and read the reply, whatever its code. Returns the reply code.
    pub fn send_command(&mut self, verb: &str, args: Option<&str>) -> FtpResult<u32> {
        let line = match args {
            Some(args) => format!("{verb} {args}"),
            None => verb.to_string(),
        };
        self.send(Command::Custom(line))
    }

    /// Send `command` and read the reply, whatever its code. Returns the reply code.
    pub fn send(&mut self, command: Command) -> FtpResult<u32> {
        self.perform(command)?;
        self.read_reply().map(|reply| reply.code)
    }

    /// Send NOOP without notifying the protocol listeners. Returns the reply code.
    pub fn noop_probe(&mut self) -> FtpResult<u32> {
        self.write_command(&Command::Noop, false)?;
        let reply = reply::read_reply(&mut self.reader, &self.reply_settings, None)?;
        let code = reply.code;
        self.last_reply = Some(reply);
        Ok(code)
    }

    /// Log in to the FTP server.
    pub fn login<S: AsRef<str>>(&mut self, user: S, password: S) -> FtpResult<()> {
        self.login_with_account(user.as_ref(), password.as_ref(), None)
    }

    /// Log in to the FTP server, providing `account` if the server asks for it
    pub fn login_with_account(
        &mut self,
        user: &str,
        password: &str,
        account: Option<&str>,
    ) -> FtpResult<()> {
        debug!("Signin in with user '{}'", user);
        self.perform(Command::User(user.to_string()))?;
        let mut reply = self.read_response_in(&[Status::LoggedIn, Status::NeedPassword])?;
        if reply.status == Status::NeedPassword {
            debug!("Password is required");
            self.perform(Command::Pass(password.to_string()))?;
            reply = self.read_response_in(&[
                Status::LoggedIn,
                Status::CommandNotImplemented,
                Status::LoginNeedAccount,
            ])?;
        }
        if reply.status == Status::LoginNeedAccount {
            match account {
                Some(account) => {
                    debug!("Account is required");
                    self.acct(account)?;
                }
                None => return Err(FtpError::UnexpectedResponse(reply)),
            }
        }
        debug!("Login OK");
        Ok(())
    }

    /// Provide account information (`ACCT`)
    pub fn acct<S: AsRef<str>>(&mut self, account: S) -> FtpResult<()> {
        debug!("Sending account {}", account.as_ref());
        self.perform(Command::Acct(account.as_ref().to_string()))?;
        self.read_response_in(&[Status::LoggedIn, Status::CommandNotImplemented])
            .map(|_| ())
    }

    /// Change the current directory to the path specified.
    pub fn cwd<S: AsRef<str>>(&mut self, path: S) -> FtpResult<()> {
        debug!("Changing working directory to {}", path.as_ref());
        self.perform(Command::Cwd(path.as_ref().to_string()))?;
        self.read_response(Status::RequestedFileActionOk)
            .map(|_| ())
    }

    /// Move the current directory to the parent directory.
    pub fn cdup(&mut self) -> FtpResult<()> {
        debug!("Going to parent directory");
        self.perform(Command::Cdup)?;
        self.read_response_in(&[Status::CommandOk, Status::RequestedFileActionOk])
            .map(|_| ())
    }

    /// Gets the current directory
    pub fn pwd(&mut self) -> FtpResult<String> {
        debug!("Getting working directory");
        self.perform(Command::Pwd)?;
        let reply = self.read_response(Status::PathCreated)?;
        let text = reply.as_string();
        QUOTED_PATH_RE
            .captures(&text)
            .map(|caps| caps[1].replace("\"\"", "\""))
            .ok_or(FtpError::BadResponse)
    }

    /// This does nothing. This is usually just used to keep the connection open.
    pub fn noop(&mut self) -> FtpResult<()> {
        debug!("Pinging server");
        self.perform(Command::Noop)?;
        self.read_response(Status::CommandOk).map(|_| ())
    }

    /// The EPRT command allows for the specification of an extended address
    /// for the data connection. The extended address MUST consist of the
    /// network protocol as well as the network and transport addresses
    pub fn eprt(&mut self, address: SocketAddr) -> FtpResult<()> {
        debug!("EPRT with address {address}");
        self.perform(Command::Eprt(address))?;
        self.read_response(Status::CommandOk).map(|_| ())
    }

    /// Announce an ipv4 data port with `PORT`
    pub fn port(&mut self, address: SocketAddrV4) -> FtpResult<()> {
        debug!("PORT with address {address}");
        self.perform(Command::Port(*address.ip(), address.port()))?;
        self.read_response(Status::CommandOk).map(|_| ())
    }

    /// Runs `PASV` and returns the address to open the data connection to,
    /// after the NAT workaround has been applied.
    pub fn pasv(&mut self) -> FtpResult<SocketAddr> {
        debug!("PASV command");
        self.perform(Command::Pasv)?;
        // PASV response format : 227 Entering Passive Mode (h1,h2,h3,h4,p1,p2).
        let reply = self.read_response(Status::PassiveMode)?;
        let addr = Self::parse_passive_address_from_response(&reply)?;
        trace!("Passive address: {addr}");
        let remote = self.get_ref().peer_addr().map_err(FtpError::ConnectionError)?;
        let ip = self.nat_workaround.apply(addr.ip(), remote.ip())?;
        Ok(SocketAddr::new(ip, addr.port()))
    }

    /// Runs `EPSV`. The data connection goes to the control peer on the advertised port.
    pub fn epsv(&mut self) -> FtpResult<SocketAddr> {
        debug!("EPSV command");
        self.perform(Command::Epsv)?;
        // EPSV response format : 229 Entering Extended Passive Mode (|||PORT|)
        let reply = self.read_response(Status::ExtendedPassiveMode)?;
        let port = Self::parse_epsv_port(&reply)?;
        trace!("Got port number from EPSV: {}", port);
        let mut remote = self.get_ref().peer_addr().map_err(FtpError::ConnectionError)?;
        remote.set_port(port);
        trace!("Remote address for extended passive mode is {}", remote);
        Ok(remote)
    }

    /// This creates a new directory on the server.
    pub fn mkdir<S: AsRef<str>>(&mut self, pathname: S) -> FtpResult<()> {
        debug!("Creating directory at {}", pathname.as_ref());
        self.perform(Command::Mkd(pathname.as_ref().to_string()))?;
        self.read_response(Status::PathCreated).map(|_| ())
    }

    /// Sets the type of file to be transferred. That is the implementation
    /// of `TYPE` command.
    pub fn transfer_type(&mut self, file_type: FileType) -> FtpResult<()> {
        debug!("Setting transfer type {}", file_type);
        self.perform(Command::Type(file_type))?;
        self.read_response(Status::CommandOk).map(|_| ())
    }

    /// Sets the file structure (`STRU`)
    pub fn file_structure(&mut self, structure: FileStructure) -> FtpResult<()> {
        debug!("Setting file structure {}", structure);
        self.perform(Command::Stru(structure))?;
        self.read_response(Status::CommandOk).map(|_| ())
    }

    /// Sets the transfer mode (`MODE`)
    pub fn transfer_mode(&mut self, mode: TransferMode) -> FtpResult<()> {
        debug!("Setting transfer mode {}", mode);
        self.perform(Command::Mode(mode))?;
        self.read_response(Status::CommandOk).map(|_| ())
    }

    /// Reserve `bytes` of storage on the server, with an optional record size
    pub fn allo(&mut self, bytes: u64, record_size: Option<u64>) -> FtpResult<()> {
        debug!("Allocating {bytes} bytes");
        self.perform(Command::Allo(bytes, record_size))?;
        self.read_response_in(&[Status::CommandOk, Status::CommandNotImplemented])
            .map(|_| ())
    }

    /// Reinitialize the session; the user has to log in again
    pub fn rein(&mut self) -> FtpResult<()> {
        debug!("Reinitializing session");
        self.perform(Command::Rein)?;
        let reply = self.read_response_in(&[Status::Ready, Status::ReadyMinute])?;
        if reply.status == Status::ReadyMinute {
            self.read_response(Status::Ready)?;
        }
        Ok(())
    }

    /// Mount a different file system structure
    pub fn smnt<S: AsRef<str>>(&mut self, pathname: S) -> FtpResult<()> {
        debug!("Mounting {}", pathname.as_ref());
        self.perform(Command::Smnt(pathname.as_ref().to_string()))?;
        self.read_response_in(&[Status::CommandNotImplemented, Status::RequestedFileActionOk])
            .map(|_| ())
    }

    /// Quits the current FTP session.
    pub fn quit(&mut self) -> FtpResult<()> {
        debug!("Quitting stream");
        self.perform(Command::Quit)?;
        self.read_response(Status::Closing).map(|_| ())
    }

    /// Renames the file from_name to to_name
    pub fn rename<S: AsRef<str>>(&mut self, from_name: S, to_name: S) -> FtpResult<()> {
        debug!(
            "Renaming '{}' to '{}'",
            from_name.as_ref(),
            to_name.as_ref()
        );
        self.perform(Command::RenameFrom(from_name.as_ref().to_string()))?;
        self.read_response(Status::RequestFilePending)?;
        self.perform(Command::RenameTo(to_name.as_ref().to_string()))?;
        self.read_response(Status::RequestedFileActionOk)
            .map(|_| ())
    }

    /// The implementation of `RETR` command where `filename` is the name of the file
    /// to download from FTP and `reader` is the function which operates with the
    /// data stream opened.
    ///
    /// ```rust,ignore
    /// use xftp::{FtpStream, FtpError};
    /// use std::io::Cursor;
    /// let mut conn = FtpStream::connect("127.0.0.1:10021").unwrap();
    /// conn.login("test", "test").unwrap();
    /// assert!(conn.retr("retr.txt", |stream| {
    ///     let mut buf = Vec::new();
    ///     stream.read_to_end(&mut buf).map_err(FtpError::ConnectionError)
    /// }).is_ok());
    /// ```
    pub fn retr<F, D>(&mut self, file_name: &str, mut reader: F) -> FtpResult<D>
    where
        F: FnMut(&mut dyn Read) -> FtpResult<D>,
    {
        let mut stream = self.retr_as_stream(file_name)?;
        let result = reader(&mut stream)?;
        self.finalize_retr_stream(stream)?;
        Ok(result)
    }

    /// Simple way to retr a file from the server. This stores the file in a buffer in memory.
    pub fn retr_as_buffer(&mut self, file_name: &str) -> FtpResult<Cursor<Vec<u8>>> {
        self.retr(file_name, |reader| {
            let mut buffer = Vec::new();
            reader
                .read_to_end(&mut buffer)
                .map(|_| buffer)
                .map_err(FtpError::ConnectionError)
        })
        .map(Cursor::new)
    }

    /// Retrieves the file name specified from the server as a readable stream.
    /// Once file has been read, call [`ImplFtpStream::finalize_retr_stream`]
    pub fn retr_as_stream<S: AsRef<str>>(&mut self, file_name: S) -> FtpResult<DataStream<T>> {
        debug!("Retrieving '{}'", file_name.as_ref());
        let data_stream = self.data_command(Command::Retr(file_name.as_ref().to_string()))?;
        self.read_response_in(&[Status::AboutToSend, Status::AlreadyOpen])?;
        Ok(data_stream)
    }

    /// Finalize retr stream; must be called once the requested file, got previously with [`ImplFtpStream::retr_as_stream`] has been read
    pub fn finalize_retr_stream(&mut self, stream: impl Read) -> FtpResult<()> {
        debug!("Finalizing retr stream");
        // the server replies only once the data connection is closed
        drop(stream);
        trace!("dropped stream");
        self.read_response_in(&[Status::ClosingDataConnection, Status::RequestedFileActionOk])
            .map(|_| ())
    }

    /// Removes the remote pathname from the server.
    pub fn rmdir<S: AsRef<str>>(&mut self, pathname: S) -> FtpResult<()> {
        debug!("Removing directory {}", pathname.as_ref());
        self.perform(Command::Rmd(pathname.as_ref().to_string()))?;
        self.read_response(Status::RequestedFileActionOk)
            .map(|_| ())
    }

    /// Remove the remote file from the server.
    pub fn rm<S: AsRef<str>>(&mut self, filename: S) -> FtpResult<()> {
        debug!("Removing file {}", filename.as_ref());
        self.perform(Command::Dele(filename.as_ref().to_string()))?;
        self.read_response(Status::RequestedFileActionOk)
            .map(|_| ())
    }

    /// This stores a file on the server.
    /// r argument must be any struct which implemenents the [`Read`] trait.
    /// Returns amount of written bytes
    pub fn put_file<S: AsRef<str>, R: Read>(&mut self, filename: S, r: &mut R) -> FtpResult<u64> {
        let mut data_stream = self.put_with_stream(filename.as_ref())?;
        let bytes = copy(r, &mut data_stream).map_err(FtpError::ConnectionError)?;
        self.finalize_put_stream(data_stream)?;
        Ok(bytes)
    }

    /// Send STOR and return the data stream to write the file content to.
    /// Once you've finished the write, YOU MUST CALL THIS METHOD: [`ImplFtpStream::finalize_put_stream`]
    pub fn put_with_stream<S: AsRef<str>>(&mut self, filename: S) -> FtpResult<DataStream<T>> {
        debug!("Put file {}", filename.as_ref());
        let stream = self.data_command(Command::Store(filename.as_ref().to_string()))?;
        self.read_response_in(&[Status::AlreadyOpen, Status::AboutToSend])?;
        Ok(stream)
    }

    /// Finalize put when using stream
    /// This method must be called once the file has been written and
    /// [`ImplFtpStream::put_with_stream`] has been used to write the file
    pub fn finalize_put_stream(&mut self, mut stream: impl Write) -> FtpResult<()> {
        debug!("Finalizing put stream");
        stream.flush().map_err(FtpError::ConnectionError)?;
        // the server replies only once the data connection is closed
        drop(stream);
        trace!("Stream dropped");
        self.read_response_in(&[Status::ClosingDataConnection, Status::RequestedFileActionOk])
            .map(|_| ())
    }

    /// Store the content of `r` in a file named by the server (`STOU`). Returns amount of written bytes
    pub fn stou_file<R: Read>(&mut self, r: &mut R) -> FtpResult<u64> {
        debug!("Put file with unique name");
        let mut data_stream = self.data_command(Command::Stou)?;
        self.read_response_in(&[Status::AlreadyOpen, Status::AboutToSend])?;
        let bytes = copy(r, &mut data_stream).map_err(FtpError::ConnectionError)?;
        self.finalize_put_stream(data_stream)?;
        Ok(bytes)
    }

    /// Open specified file for appending data. Returns the stream to append data to specified file.
    /// Once you've finished the write, YOU MUST CALL THIS METHOD: [`ImplFtpStream::finalize_put_stream`]
    pub fn append_with_stream<S: AsRef<str>>(&mut self, filename: S) -> FtpResult<DataStream<T>> {
        debug!("Appending to file {}", filename.as_ref());
        let stream = self.data_command(Command::Appe(filename.as_ref().to_string()))?;
        self.read_response_in(&[Status::AlreadyOpen, Status::AboutToSend])?;
        Ok(stream)
    }

    /// Append data from reader to file at `filename`
    pub fn append_file<R: Read>(&mut self, filename: &str, r: &mut R) -> FtpResult<u64> {
        let mut data_stream = self.append_with_stream(filename)?;
        let bytes = copy(r, &mut data_stream).map_err(FtpError::ConnectionError)?;
        self.finalize_put_stream(data_stream)?;
        Ok(bytes)
    }

    /// abort the previous FTP service command
    pub fn abort(&mut self, data_stream: impl Read) -> FtpResult<()> {
        debug!("Aborting active file transfer");
        self.perform(Command::Abor)?;
        drop(data_stream);
        trace!("dropped stream");
        let reply =
            self.read_response_in(&[Status::ClosingDataConnection, Status::TransferAborted])?;
        // 426 for the interrupted transfer, then 226 for ABOR
        if reply.status == Status::TransferAborted {
            self.read_response(Status::ClosingDataConnection)?;
        }
        debug!("Transfer aborted");
        Ok(())
    }

    /// Tell the server to resume the transfer from a certain offset. The offset indicates the amount of bytes to skip
    /// from the beginning of the file.
    /// the REST command does not actually initiate the transfer.
    /// After issuing a REST command, the client must send the appropriate FTP command to transfer the file
    ///
    /// It is possible to cancel the REST command, sending a REST command with offset 0
    pub fn resume_transfer(&mut self, offset: usize) -> FtpResult<()> {
        debug!("Requesting to resume transfer at offset {}", offset);
        self.perform(Command::Rest(offset))?;
        self.read_response(Status::RequestFilePending)?;
        debug!("Resume transfer accepted");
        Ok(())
    }

    /// Execute `LIST` command which returns the detailed file listing in human readable format.
    /// If `pathname` is omited then the list of files in the current directory will be
    /// returned otherwise it will the list of files on `pathname`.
    ///
    /// Use [`Self::list_files`] to get the listing parsed.
    pub fn list(&mut self, pathname: Option<&str>) -> FtpResult<Vec<String>> {
        debug!(
            "Reading {} directory content",
            pathname.unwrap_or("working")
        );

        self.stream_lines(Command::List(pathname.map(|x| x.to_string())))
    }

    /// Execute `NLST` command which returns the list of file names only.
    /// If `pathname` is omited then the list of files in the current directory will be
    /// returned otherwise it will the list of files on `pathname`.
    pub fn nlst(&mut self, pathname: Option<&str>) -> FtpResult<Vec<String>> {
        debug!(
            "Getting file names for {} directory",
            pathname.unwrap_or("working")
        );

        self.stream_lines(Command::Nlst(pathname.map(|x| x.to_string())))
    }

    /// Execute `MLSD` command which returns the machine-processable listing of a directory.
    pub fn mlsd(&mut self, pathname: Option<&str>) -> FtpResult<Vec<String>> {
        debug!(
            "Reading {} directory content",
            pathname.unwrap_or("working")
        );

        self.stream_lines(Command::Mlsd(pathname.map(|x| x.to_string())))
    }

    /// Execute `MLST` command which returns the machine-processable listing of a file.
    /// The facts line is returned without its leading space.
    pub fn mlst(&mut self, pathname: Option<&str>) -> FtpResult<String> {
        debug!("Reading {} path information", pathname.unwrap_or("working"));

        self.perform(Command::Mlst(pathname.map(|x| x.to_string())))?;
        let reply = self.read_response(Status::RequestedFileActionOk)?;
        match reply.lines.get(1).map(|line| line.trim()) {
            Some("") | None => Err(FtpError::BadResponse),
            Some(line) => Ok(line.to_string()),
        }
    }

    /// Retrieves the modification time of the file at `pathname` if it exists.
    pub fn mdtm<S: AsRef<str>>(&mut self, pathname: S) -> FtpResult<DateTime<Utc>> {
        debug!("Getting modification time for {}", pathname.as_ref());
        self.perform(Command::Mdtm(pathname.as_ref().to_string()))?;
        let reply = self.read_response(Status::File)?;
        let text = reply.message();
        let caps = MDTM_RE.captures(&text).ok_or(FtpError::BadResponse)?;
        let field = |i: usize| caps[i].parse::<u32>().map_err(|_| FtpError::BadResponse);
        let year = caps[1].parse::<i32>().map_err(|_| FtpError::BadResponse)?;
        let date =
            NaiveDate::from_ymd_opt(year, field(2)?, field(3)?).ok_or(FtpError::BadResponse)?;
        let time = NaiveTime::from_hms_opt(field(4)?, field(5)?, field(6)?)
            .ok_or(FtpError::BadResponse)?;
        Ok(date.and_time(time).and_utc())
    }

    /// Set the modification time of the file at `pathname` (`MFMT`)
    pub fn mfmt<S: AsRef<str>>(&mut self, pathname: S, time: DateTime<Utc>) -> FtpResult<()> {
        let timeval = time.format("%Y%m%d%H%M%S").to_string();
        debug!("Setting modification time of {} to {timeval}", pathname.as_ref());
        self.perform(Command::Mfmt(timeval, pathname.as_ref().to_string()))?;
        self.read_response(Status::File).map(|_| ())
    }

    /// Retrieves the size of the file in bytes at `pathname` if it exists.
    pub fn size<S: AsRef<str>>(&mut self, pathname: S) -> FtpResult<usize> {
        debug!("Getting file size for {}", pathname.as_ref());
        self.perform(Command::Size(pathname.as_ref().to_string()))?;
        let reply = self.read_response(Status::File)?;
        let text = reply.as_string();
        SIZE_RE
            .captures(&text)
            .and_then(|caps| caps[1].parse().ok())
            .ok_or(FtpError::BadResponse)
    }

    /// Retrieves the features supported by the server, through the FEAT command.
    pub fn feat(&mut self) -> FtpResult<Features> {
        debug!("Getting server supported features");
        self.perform(Command::Feat)?;
        let reply = self.read_response(Status::System)?;
        crate::command::parse_features(&reply)
    }

    /// Set option `option` with an optional value
    pub fn opts(&mut self, option: impl ToString, value: Option<impl ToString>) -> FtpResult<()> {
        debug!("Setting options");
        self.perform(Command::Opts(
            option.to_string(),
            value.map(|x| x.to_string()),
        ))?;
        self.read_response(Status::CommandOk)?;

        Ok(())
    }

    /// Execute a command on the server and return the response
    pub fn site(&mut self, command: impl ToString) -> FtpResult<Reply> {
        debug!("Sending SITE command: {}", command.to_string());
        self.perform(Command::Site(command.to_string()))?;
        self.read_response(Status::CommandOk)
    }

    /// Get the system type of the server; the reply text without the code
    pub fn syst(&mut self) -> FtpResult<String> {
        debug!("Getting system type");
        self.perform(Command::Syst)?;
        self.read_response(Status::Name).map(|reply| reply.message())
    }

    /// Get the server status, or the status of `pathname`
    pub fn stat(&mut self, pathname: Option<&str>) -> FtpResult<Reply> {
        debug!("Getting status of {}", pathname.unwrap_or("server"));
        self.perform(Command::Stat(pathname.map(|x| x.to_string())))?;
        self.read_response_in(&[Status::System, Status::Directory, Status::File])
    }

    /// Get help, optionally about `command`
    pub fn help(&mut self, command: Option<&str>) -> FtpResult<Reply> {
        debug!("Getting help");
        self.perform(Command::Help(command.map(|x| x.to_string())))?;
        self.read_response_in(&[Status::System, Status::Help])
    }

    /// Perform custom command
    pub fn custom_command(
        &mut self,
        command: impl ToString,
        expected_code: &[Status],
    ) -> FtpResult<Reply> {
        let command = command.to_string();
        debug!("Sending custom command: {}", command);
        self.perform(Command::Custom(command))?;
        self.read_response_in(expected_code)
    }

    /// Perform a custom command using the data connection.
    /// It returns both the [`Reply`] and the [`DataStream`].
    ///
    /// The stream must eventually be closed using [`Self::close_data_connection`].
    pub fn custom_data_command(
        &mut self,
        command: impl ToString,
        expected_code: &[Status],
    ) -> FtpResult<(Reply, DataStream<T>)> {
        let command = command.to_string();
        debug!("Sending custom data command: {}", command);
        let data_stream = self.data_command(Command::Custom(command))?;
        let reply = self.read_response_in(expected_code)?;
        Ok((reply, data_stream))
    }

    /// Close data connection.
    ///
    /// Call this function when you're done with the stream obtained with [`Self::custom_data_command`].
    pub fn close_data_connection(&mut self, stream: impl Read) -> FtpResult<()> {
        debug!("closing data connection");
        self.finalize_retr_stream(stream)
    }

    // -- listing

    /// List `pathname` (or the working directory) and parse the entries.
    ///
    /// The parser is the one set with [`Self::set_list_parser`], or the one built from the parser
    /// configuration, or the one matching the `SYST` reply; unix when none can be selected.
    pub fn list_files(&mut self, pathname: Option<&str>) -> FtpResult<Vec<FileEntry>> {
        self.list_engine(pathname).map(|engine| engine.get_files())
    }

    /// List `pathname` and keep the entries accepted by `filter`
    pub fn list_files_filtered(
        &mut self,
        pathname: Option<&str>,
        filter: &impl FileFilter,
    ) -> FtpResult<Vec<FileEntry>> {
        self.list_engine(pathname)
            .map(|engine| engine.get_files_filtered(filter))
    }

    /// List `pathname` into a [`ListEngine`], to browse entries by pages
    pub fn list_engine(&mut self, pathname: Option<&str>) -> FtpResult<ListEngine> {
        let parser = self.listing_parser()?;
        let engine = ListEngine::new(parser, self.parser_config.keep_unparseable_entries());
        self.read_listing(Command::List(pathname.map(|x| x.to_string())), engine)
    }

    /// List `pathname` with `MLSD` and parse the entries
    pub fn mlsd_files(&mut self, pathname: Option<&str>) -> FtpResult<Vec<FileEntry>> {
        let engine = ListEngine::new(
            ListParser::Mlsx(MlsxParser::new(&self.parser_config)),
            self.parser_config.keep_unparseable_entries(),
        );
        self.read_listing(Command::Mlsd(pathname.map(|x| x.to_string())), engine)
            .map(|engine| engine.get_files())
    }

    /// Get the entry of `pathname` with `MLST`; `None` if its facts can't be parsed
    pub fn mlst_file(&mut self, pathname: &str) -> FtpResult<Option<FileEntry>> {
        self.perform(Command::Mlst(Some(pathname.to_string())))?;
        let reply = self.read_response(Status::RequestedFileActionOk)?;
        let line = reply.lines.get(1).ok_or(FtpError::BadResponse)?;
        // the entry line is indented with a single space
        let line = line.strip_prefix(' ').unwrap_or(line);
        Ok(MlsxParser::new(&self.parser_config).parse(line))
    }

    /// Look for the entry named `name` in the listing of `directory`
    pub fn find_entry(&mut self, directory: &str, name: &str) -> FtpResult<Option<FileEntry>> {
        Ok(self
            .list_files(Some(directory))?
            .into_iter()
            .find(|entry| entry.is_valid() && entry.name() == name))
    }

    /// Whether the server lists the `.` entry, checked on `/` unless set with [`Self::set_listing_style`].
    /// Detection is best effort.
    pub fn detect_listing_style(&mut self) -> FtpResult<ListingStyle> {
        if let Some(style) = self.listing_style {
            return Ok(style);
        }
        let style = match self.find_entry("/", ".")? {
            Some(_) => ListingStyle::Unix,
            None => ListingStyle::NonUnix,
        };
        debug!("Detected listing style: {style:?}");
        self.listing_style = Some(style);
        Ok(style)
    }

    fn listing_parser(&mut self) -> FtpResult<ListParser> {
        if let Some(parser) = self.list_parser.as_ref() {
            return Ok(parser.clone());
        }
        let selected = if self.parser_config.server_system_key().is_some() {
            list::parser_for_config(&self.parser_config)
        } else {
            self.syst()
                .and_then(|key| list::parser_for_key(&key, &self.parser_config))
        };
        let parser = match selected {
            Ok(parser) => parser,
            Err(err @ (FtpError::ConnectionClosed | FtpError::ConnectionError(_))) => {
                return Err(err)
            }
            Err(err) => {
                warn!("Could not select a listing parser ({err}); falling back to unix");
                ListParser::Unix(UnixParser::new(&self.parser_config))
            }
        };
        debug!("Selected listing parser {parser:?}");
        self.list_parser = Some(parser.clone());
        Ok(parser)
    }

    fn read_listing(&mut self, cmd: Command, mut engine: ListEngine) -> FtpResult<ListEngine> {
        let mut data_stream = self.data_command(cmd)?;
        self.read_response_in(&[Status::AboutToSend, Status::AlreadyOpen])?;
        let result = engine.read_server_list(&mut data_stream, self.reply_settings.encoding);
        self.finalize_retr_stream(data_stream)?;
        result.map_err(FtpError::ConnectionError)?;
        Ok(engine)
    }

    // -- control connection

    /// Read response from stream
    fn read_response(&mut self, expected_code: Status) -> FtpResult<Reply> {
        self.read_response_in(&[expected_code])
    }

    /// Read a reply and check its code
    fn read_response_in(&mut self, expected_code: &[Status]) -> FtpResult<Reply> {
        let reply = self.read_reply()?;
        if expected_code.contains(&reply.status) {
            Ok(reply)
        } else {
            Err(FtpError::UnexpectedResponse(reply))
        }
    }

    /// Read a reply, whatever its code, and keep it as the last reply
    fn read_reply(&mut self) -> FtpResult<Reply> {
        let reply = reply::read_reply(
            &mut self.reader,
            &self.reply_settings,
            Some(&self.listeners),
        )?;
        trace!("Reply code: {} ({})", reply.code, reply.status);
        self.last_reply = Some(reply.clone());
        Ok(reply)
    }

    /// Write data to stream with command to perform
    fn perform(&mut self, command: Command) -> FtpResult<()> {
        self.write_command(&command, true)
    }

    fn write_command(&mut self, command: &Command, notify: bool) -> FtpResult<()> {
        let line = command.to_string();
        if command.verb().eq_ignore_ascii_case("PASS") {
            trace!("CC OUT: PASS *******");
        } else {
            trace!("CC OUT: {}", line.trim_end_matches("\r\n"));
        }
        let bytes = self.reply_settings.encoding.encode(&line);
        let stream = self.reader.get_mut();
        stream
            .write_all(&bytes)
            .and_then(|()| stream.flush())
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::UnexpectedEof => {
                    debug!("Connection lost while writing: {err}");
                    FtpError::ConnectionClosed
                }
                _ => FtpError::ConnectionError(err),
            })?;
        if notify {
            self.listeners.fire_command_sent(command.verb(), &line);
        }
        Ok(())
    }

    // -- data connection

    /// Execute command which send data back in a separate stream
    fn data_command(&mut self, cmd: Command) -> FtpResult<DataStream<T>> {
        let stream = match self.mode {
            Mode::Active | Mode::ExtendedActive => {
                let listener = self.active()?;
                self.perform(cmd)?;
                self.accept_data_connection(&listener)?
            }
            Mode::ExtendedPassive => {
                let addr = self.epsv()?;
                self.perform(cmd)?;
                (self.passive_stream_builder)(addr)?
            }
            Mode::Passive => {
                let addr = self.pasv()?;
                self.perform(cmd)?;
                (self.passive_stream_builder)(addr)?
            }
        };
        let stream = self.wrap_data_stream(stream)?;
        debug!("Data connection open (secure: {})", stream.is_secure());
        Ok(stream)
    }

    #[cfg(not(feature = "secure"))]
    fn wrap_data_stream(&self, stream: TcpStream) -> FtpResult<DataStream<T>> {
        Ok(DataStream::Tcp(stream))
    }

    #[cfg(feature = "secure")]
    fn wrap_data_stream(&self, stream: TcpStream) -> FtpResult<DataStream<T>> {
        match self.secure.data_connector() {
            Some((connector, domain)) => {
                trace!("Securing data connection");
                connector
                    .connect(domain, stream)
                    .map(|x| DataStream::Ssl(Box::new(x)))
            }
            None => Ok(DataStream::Tcp(stream)),
        }
    }

    fn accept_data_connection(&self, listener: &TcpListener) -> FtpResult<TcpStream> {
        let start = Instant::now();
        loop {
            match listener.accept() {
                Ok((stream, addr)) => {
                    debug!("Data connection accepted from {addr}");
                    stream
                        .set_nonblocking(false)
                        .map_err(FtpError::ConnectionError)?;
                    break Ok(stream);
                }
                Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    if start.elapsed() > self.active_timeout {
                        break Err(FtpError::ConnectionError(
                            std::io::ErrorKind::TimedOut.into(),
                        ));
                    }
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(e) => break Err(FtpError::ConnectionError(e)),
            }
        }
    }

    /// Create a new tcp listener and announce it with PORT, or EPRT in extended active mode and for ipv6
    fn active(&mut self) -> FtpResult<TcpListener> {
        debug!("Starting local tcp listener...");
        let local_ip = self
            .get_ref()
            .local_addr()
            .map_err(FtpError::ConnectionError)?
            .ip();
        let conn =
            TcpListener::bind(SocketAddr::new(local_ip, 0)).map_err(FtpError::ConnectionError)?;
        conn.set_nonblocking(true)
            .map_err(FtpError::ConnectionError)?;

        let addr = conn.local_addr().map_err(FtpError::ConnectionError)?;
        debug!("Active mode, listening on {addr}");

        match (self.mode, addr) {
            (Mode::Active, SocketAddr::V4(v4)) => self.port(v4)?,
            _ => self.eprt(addr)?,
        }

        Ok(conn)
    }

    /// Parse passive address from response
    pub(crate) fn parse_passive_address_from_response(reply: &Reply) -> FtpResult<SocketAddr> {
        let text = reply.as_string();
        let caps = PASV_PORT_RE.captures(&text).ok_or(FtpError::BadResponse)?;
        let mut fields = [0u8; 6];
        for (i, field) in fields.iter_mut().enumerate() {
            *field = caps[i + 1].parse().map_err(|_| FtpError::BadResponse)?;
        }
        let [a, b, c, d, msb, lsb] = fields;
        let port = (u16::from(msb) << 8) | u16::from(lsb);
        Ok(SocketAddr::from(([a, b, c, d], port)))
    }

    /// Parse the port of an EPSV reply; the four delimiters must be the same
    pub(crate) fn parse_epsv_port(reply: &Reply) -> FtpResult<u16> {
        let text = reply.as_string();
        let caps = EPSV_PORT_RE.captures(&text).ok_or(FtpError::BadResponse)?;
        let delimiter = &caps[1];
        if [&caps[2], &caps[3], &caps[5]].iter().any(|d| *d != delimiter) {
            return Err(FtpError::BadResponse);
        }
        caps[4].parse::<u16>().map_err(|_| FtpError::BadResponse)
    }

    /// Execute a command which returns list of strings in a separate stream
    fn stream_lines(&mut self, cmd: Command) -> FtpResult<Vec<String>> {
        let mut data_stream = BufReader::new(self.data_command(cmd)?);
        self.read_response_in(&[Status::AboutToSend, Status::AlreadyOpen])?;
        let lines = Self::get_lines_from_stream(&mut data_stream, self.reply_settings.encoding);
        self.finalize_retr_stream(data_stream)?;
        lines
    }

    /// Read a [`DataStream`] line by line; empty lines are skipped
    pub fn get_lines_from_stream(
        data_stream: &mut BufReader<DataStream<T>>,
        encoding: Encoding,
    ) -> FtpResult<Vec<String>> {
        let mut lines: Vec<String> = Vec::new();
        loop {
            match reply::read_line(data_stream, encoding) {
                Ok(None) => break,
                Ok(Some(line)) if line.is_empty() => continue,
                Ok(Some(line)) => {
                    trace!("STREAM IN: {:?}", line);
                    lines.push(line);
                }
                Err(err) => {
                    error!("failed to get lines from stream: {err}");
                    return Err(FtpError::ConnectionError(err));
                }
            }
        }
        trace!("Lines from stream {:?}", lines);

        Ok(lines)
    }

    /// Default stream builder
    fn default_passive_stream_builder() -> Box<PassiveStreamBuilder> {
        Box::new(|addr| TcpStream::connect(addr).map_err(FtpError::ConnectionError))
    }
}
