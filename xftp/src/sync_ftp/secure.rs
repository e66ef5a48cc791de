//! # Secure
//!
//! FTPS: control connection upgrade and downgrade, data protection and the RFC 2228 security commands

use std::io::BufReader;
use std::net::{TcpStream, ToSocketAddrs};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;

use super::{DataStream, ImplFtpStream, TlsConnector, TlsStream};
use crate::command::{Command, ProtectionLevel};
use crate::regex::PBSZ_RE;
use crate::{FtpError, FtpResult, Status};

/// Port of implicit FTPS servers
pub const DEFAULT_FTPS_PORT: u16 = 990;

/// State of the control connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecurityState {
    #[default]
    Plain,
    /// AUTH accepted, or implicit connection; handshake in progress
    Negotiating,
    Secured,
}

/// Checks the identity of the server once the handshake is done.
///
/// When set, a failed verification aborts the connection.
pub trait HostnameVerifier: Send + Sync {
    /// `peer_certificate` is the DER encoded end-entity certificate, if the TLS stack exposes it
    fn verify(&self, hostname: &str, peer_certificate: Option<&[u8]>) -> bool;
}

impl<F> HostnameVerifier for F
where
    F: Fn(&str, Option<&[u8]>) -> bool + Send + Sync,
{
    fn verify(&self, hostname: &str, peer_certificate: Option<&[u8]>) -> bool {
        self(hostname, peer_certificate)
    }
}

/// TLS settings and state of a session
pub(super) struct SecureContext<T: TlsStream> {
    connector: Option<Box<dyn TlsConnector<Stream = T> + Send + Sync>>,
    domain: Option<String>,
    /// Control socket before the handshake; restored by CCC
    plain_stream: Option<TcpStream>,
    state: SecurityState,
    data_protection: ProtectionLevel,
    auth_value: String,
    hostname_verifier: Option<Box<dyn HostnameVerifier>>,
}

impl<T: TlsStream> Default for SecureContext<T> {
    fn default() -> Self {
        Self {
            connector: None,
            domain: None,
            plain_stream: None,
            state: SecurityState::Plain,
            data_protection: ProtectionLevel::Clear,
            auth_value: String::from("TLS"),
            hostname_verifier: None,
        }
    }
}

impl<T: TlsStream> SecureContext<T> {
    /// Connector and domain to wrap data connections with, unless protection is clear
    pub(super) fn data_connector(
        &self,
    ) -> Option<(&(dyn TlsConnector<Stream = T> + Send + Sync), &str)> {
        if self.data_protection == ProtectionLevel::Clear {
            return None;
        }
        match (self.connector.as_deref(), self.domain.as_deref()) {
            (Some(connector), Some(domain)) => Some((connector, domain)),
            _ => None,
        }
    }

    fn handshake(
        &mut self,
        connector: impl TlsConnector<Stream = T> + Send + Sync + 'static,
        domain: &str,
        stream: TcpStream,
    ) -> FtpResult<T> {
        self.state = SecurityState::Negotiating;
        let plain_stream = stream.try_clone().map_err(FtpError::ConnectionError)?;
        debug!("TLS negotiation with {domain}");
        let stream = connector.connect(domain, stream).inspect_err(|err| {
            error!("TLS handshake failed: {err}");
        })?;
        if let Some(verifier) = self.hostname_verifier.as_ref() {
            let certificate = stream.peer_certificate();
            if !verifier.verify(domain, certificate.as_deref()) {
                error!("Hostname verification failed for {domain}");
                return Err(FtpError::SecureError(format!(
                    "Hostname verification failed for {domain}"
                )));
            }
        }
        debug!("TLS stream OK");
        self.connector = Some(Box::new(connector));
        self.domain = Some(domain.to_string());
        self.plain_stream = Some(plain_stream);
        self.state = SecurityState::Secured;
        Ok(stream)
    }
}

#[cfg_attr(docsrs, doc(cfg(feature = "secure")))]
impl<T> ImplFtpStream<T>
where
    T: TlsStream,
{
    /// Switch to explicit secure mode (FTPS), using a provided TLS connector.
    ///
    /// Sends `AUTH`, performs the handshake, then protects data connections with `PBSZ 0` and `PROT P`.
    ///
    /// ## Example
    ///
    /// ```rust,ignore
    /// use xftp::{NativeTlsFtpStream, NativeTlsConnector};
    /// use xftp::native_tls::TlsConnector;
    ///
    /// let ctx = NativeTlsConnector::from(TlsConnector::new().unwrap());
    /// let ftp_stream = NativeTlsFtpStream::connect("127.0.0.1:21").unwrap();
    /// let mut ftp_stream = ftp_stream.into_secure(ctx, "localhost").unwrap();
    /// ```
    pub fn into_secure(
        mut self,
        tls_connector: impl TlsConnector<Stream = T> + Send + Sync + 'static,
        domain: &str,
    ) -> FtpResult<Self> {
        if self.secure.state == SecurityState::Secured {
            debug!("Control connection already secured");
            return Ok(self);
        }
        debug!("Initializing TLS auth");
        self.exec_auth()?;
        let stream = self
            .reader
            .into_inner()
            .into_tcp_stream()
            .map_err(FtpError::ConnectionError)?;
        let stream = self.secure.handshake(tls_connector, domain, stream)?;
        self.reader = BufReader::new(DataStream::Ssl(Box::new(stream)));
        self.exec_pbsz(0)?;
        self.exec_prot(ProtectionLevel::Private)?;
        Ok(self)
    }

    /// Connect to remote ftps server using IMPLICIT secure connection; the handshake happens before the greeting.
    /// Implicit servers usually listen on [`DEFAULT_FTPS_PORT`].
    ///
    /// > Warning: mind that implicit ftps should be considered deprecated, if you can use explicit mode with [`ImplFtpStream::into_secure`]
    pub fn connect_secure_implicit<A: ToSocketAddrs>(
        addr: A,
        tls_connector: impl TlsConnector<Stream = T> + Send + Sync + 'static,
        domain: &str,
    ) -> FtpResult<Self> {
        debug!("Connecting to server (secure)");
        let stream = TcpStream::connect(addr).map_err(FtpError::ConnectionError)?;
        debug!("Established connection with server");
        let mut secure = SecureContext::<T>::default();
        let stream = secure.handshake(tls_connector, domain, stream)?;
        secure.data_protection = ProtectionLevel::Private;
        let mut ftp_stream = Self::new(DataStream::Ssl(Box::new(stream)));
        ftp_stream.secure = secure;
        ftp_stream.read_greeting()?;
        Ok(ftp_stream)
    }

    /// Set the mechanism sent with `AUTH`; `TLS` by default
    pub fn set_auth_value(&mut self, auth_value: impl ToString) {
        self.secure.auth_value = auth_value.to_string();
    }

    /// Verify the server identity after each control connection handshake
    pub fn set_hostname_verifier(&mut self, verifier: impl HostnameVerifier + 'static) {
        self.secure.hostname_verifier = Some(Box::new(verifier));
    }

    /// State of the control connection
    pub fn security_state(&self) -> SecurityState {
        self.secure.state
    }

    /// Current protection level of data connections
    pub fn data_protection(&self) -> ProtectionLevel {
        self.secure.data_protection
    }

    /// Send `AUTH`; the server must accept with 234 or 334
    pub fn exec_auth(&mut self) -> FtpResult<()> {
        let mechanism = self.secure.auth_value.clone();
        self.perform(Command::Auth(mechanism.clone()))?;
        let reply = self.read_reply()?;
        match reply.status {
            Status::AuthOk | Status::SecurityMechanismOk => {
                trace!("AUTH {mechanism} OK");
                self.secure.state = SecurityState::Negotiating;
                Ok(())
            }
            _ => Err(FtpError::SecureError(format!(
                "AUTH {mechanism} refused: {reply}"
            ))),
        }
    }

    /// Set the protection buffer size; `size` must fit in 32 bits
    pub fn exec_pbsz(&mut self, size: u64) -> FtpResult<()> {
        if size > u64::from(u32::MAX) {
            return Err(FtpError::SecureError(format!(
                "Invalid protection buffer size: {size}"
            )));
        }
        self.perform(Command::Pbsz(size))?;
        self.expect_secure_reply("PBSZ")
    }

    /// Set the protection buffer size and return the size the server agreed on,
    /// which is the smallest of `size` and the `PBSZ=` value of the reply
    pub fn parse_pbsz(&mut self, size: u64) -> FtpResult<u64> {
        self.exec_pbsz(size)?;
        let text = self.last_reply_string().unwrap_or_default();
        Ok(PBSZ_RE
            .captures(&text)
            .and_then(|caps| caps[1].parse::<u64>().ok())
            .map(|accepted| accepted.min(size))
            .unwrap_or(size))
    }

    /// Set the data channel protection level. [`ProtectionLevel::Clear`] turns data connections back to plain
    pub fn exec_prot(&mut self, level: ProtectionLevel) -> FtpResult<()> {
        debug!("Setting data protection level {level}");
        self.perform(Command::Prot(level))?;
        self.expect_secure_reply("PROT")?;
        self.secure.data_protection = level;
        Ok(())
    }

    /// Go back to a plain control connection (`CCC`).
    ///
    /// The TLS session is abandoned without close notify and the socket saved before the
    /// handshake is used again. Data connections keep their protection level.
    pub fn clear_command_channel(&mut self) -> FtpResult<()> {
        if self.secure.state != SecurityState::Secured {
            return Err(FtpError::SecureError(String::from(
                "Control connection is not secured",
            )));
        }
        debug!("performing clear command channel");
        self.perform(Command::ClearCommandChannel)?;
        self.expect_secure_reply("CCC")?;
        let plain_stream = self.secure.plain_stream.take().ok_or_else(|| {
            FtpError::SecureError(String::from("No plain control connection to restore"))
        })?;
        let secured = std::mem::replace(
            &mut self.reader,
            BufReader::new(DataStream::Tcp(plain_stream)),
        );
        if let Err(err) = secured.into_inner().into_tcp_stream() {
            warn!("failed to release TLS control stream: {err}");
        }
        self.secure.state = SecurityState::Plain;
        trace!("CCC OK");
        Ok(())
    }

    /// Send `ADAT` with the base64 encoded `data`. Returns the reply code
    pub fn exec_adat(&mut self, data: Option<&[u8]>) -> FtpResult<u32> {
        self.send(Command::Adat(encode_payload(data)))
    }

    /// Send `MIC` with the base64 encoded `data`. Returns the reply code
    pub fn exec_mic(&mut self, data: Option<&[u8]>) -> FtpResult<u32> {
        self.send(Command::Mic(encode_payload(data)))
    }

    /// Send `CONF` with the base64 encoded `data`. Returns the reply code
    pub fn exec_conf(&mut self, data: Option<&[u8]>) -> FtpResult<u32> {
        self.send(Command::Conf(encode_payload(data)))
    }

    /// Send `ENC` with the base64 encoded `data`. Returns the reply code
    pub fn exec_enc(&mut self, data: Option<&[u8]>) -> FtpResult<u32> {
        self.send(Command::Enc(encode_payload(data)))
    }

    /// Decode the `ADAT=` payload of a reply
    pub fn parse_adat_reply(reply: &str) -> Option<Vec<u8>> {
        let (_, payload) = reply.split_once("ADAT=")?;
        let payload = payload.split_whitespace().next().unwrap_or_default();
        BASE64.decode(payload).ok()
    }

    fn expect_secure_reply(&mut self, command: &str) -> FtpResult<()> {
        let reply = self.read_reply()?;
        if reply.status == Status::CommandOk {
            Ok(())
        } else {
            Err(FtpError::SecureError(format!("{command} refused: {reply}")))
        }
    }
}

fn encode_payload(data: Option<&[u8]>) -> String {
    data.map(|data| BASE64.encode(data)).unwrap_or_default()
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::sync_ftp::test_server::{MockServer, Step};
    use crate::sync_ftp::NoTlsStream;
    use crate::FtpStream;

    #[derive(Debug)]
    struct RefusingConnector;

    impl TlsConnector for RefusingConnector {
        type Stream = NoTlsStream;

        fn connect(&self, _domain: &str, _stream: TcpStream) -> FtpResult<Self::Stream> {
            Err(FtpError::SecureError(String::from("handshake failed")))
        }
    }

    #[test]
    fn should_fail_when_auth_is_refused() {
        crate::log_init();
        let server = MockServer::start(
            "220 Ready\r\n",
            vec![Step::Reply("AUTH TLS", "504 Not supported\r\n")],
        );
        let stream = FtpStream::connect(server.addr()).unwrap();
        assert!(matches!(
            stream.into_secure(RefusingConnector, "localhost"),
            Err(FtpError::SecureError(_))
        ));
        server.finish();
    }

    #[test]
    fn should_fail_when_handshake_fails() {
        crate::log_init();
        let server = MockServer::start(
            "220 Ready\r\n",
            vec![Step::Reply("AUTH SSL", "334 Go ahead\r\n")],
        );
        let mut stream = FtpStream::connect(server.addr()).unwrap();
        stream.set_auth_value("SSL");
        assert_eq!(stream.security_state(), SecurityState::Plain);
        assert!(matches!(
            stream.into_secure(RefusingConnector, "localhost"),
            Err(FtpError::SecureError(_))
        ));
        server.finish();
    }

    #[test]
    fn should_negotiate_protection() {
        crate::log_init();
        let server = MockServer::start(
            "220 Ready\r\n",
            vec![
                Step::Reply("PBSZ 16384", "200 PBSZ=1024\r\n"),
                Step::Reply("PBSZ 0", "200 Ok\r\n"),
                Step::Reply("PROT P", "200 Ok\r\n"),
                Step::Reply("PROT E", "536 Not supported\r\n"),
                Step::Reply("PROT C", "200 Ok\r\n"),
            ],
        );
        let mut stream = FtpStream::connect(server.addr()).unwrap();
        assert!(matches!(
            stream.exec_pbsz(u64::from(u32::MAX) + 1),
            Err(FtpError::SecureError(_))
        ));
        assert_eq!(stream.parse_pbsz(16384).unwrap(), 1024);
        assert_eq!(stream.parse_pbsz(0).unwrap(), 0);
        assert!(stream.exec_prot(ProtectionLevel::Private).is_ok());
        assert_eq!(stream.data_protection(), ProtectionLevel::Private);
        assert!(matches!(
            stream.exec_prot(ProtectionLevel::Confidential),
            Err(FtpError::SecureError(_))
        ));
        assert_eq!(stream.data_protection(), ProtectionLevel::Private);
        assert!(stream.exec_prot(ProtectionLevel::Clear).is_ok());
        assert_eq!(stream.data_protection(), ProtectionLevel::Clear);
        drop(stream);
        server.finish();
    }

    #[test]
    fn should_send_security_data_commands() {
        crate::log_init();
        let server = MockServer::start(
            "220 Ready\r\n",
            vec![
                Step::Reply("ADAT aGVsbG8=", "235 ADAT=b2s=\r\n"),
                Step::Reply("ADAT", "501 Missing data\r\n"),
                Step::Reply("MIC aGVsbG8=", "535 Failed\r\n"),
                Step::Reply("CONF aGVsbG8=", "537 Not supported\r\n"),
                Step::Reply("ENC aGVsbG8=", "533 Denied\r\n"),
            ],
        );
        let mut stream = FtpStream::connect(server.addr()).unwrap();
        assert_eq!(stream.exec_adat(Some(b"hello")).unwrap(), 235);
        let reply = stream.last_reply_string().unwrap();
        assert_eq!(FtpStream::parse_adat_reply(&reply), Some(b"ok".to_vec()));
        assert_eq!(stream.exec_adat(None).unwrap(), 501);
        assert_eq!(stream.exec_mic(Some(b"hello")).unwrap(), 535);
        assert_eq!(stream.exec_conf(Some(b"hello")).unwrap(), 537);
        assert_eq!(stream.exec_enc(Some(b"hello")).unwrap(), 533);
        drop(stream);
        server.finish();
    }

    #[test]
    fn should_not_clear_plain_command_channel() {
        crate::log_init();
        let server = MockServer::start("220 Ready\r\n", vec![]);
        let mut stream = FtpStream::connect(server.addr()).unwrap();
        assert!(matches!(
            stream.clear_command_channel(),
            Err(FtpError::SecureError(_))
        ));
        drop(stream);
        server.finish();
    }

    #[test]
    fn should_parse_adat_reply() {
        assert_eq!(
            FtpStream::parse_adat_reply("235 ADAT=aGVsbG8="),
            Some(b"hello".to_vec())
        );
        assert_eq!(FtpStream::parse_adat_reply("235 Done"), None);
        assert_eq!(FtpStream::parse_adat_reply("235 ADAT=***"), None);
    }

    #[test]
    fn should_verify_hostname_with_closure() {
        let verifier = |hostname: &str, certificate: Option<&[u8]>| {
            hostname == "ftp.example.com" && certificate.is_some()
        };
        assert!(verifier.verify("ftp.example.com", Some(&[0x30])));
        assert!(!verifier.verify("ftp.example.com", None));
        assert!(!verifier.verify("evil.example.com", Some(&[0x30])));
    }

    #[cfg(feature = "rustls")]
    #[test]
    #[ignore = "requires network"]
    fn should_connect_to_public_ftps_server() {
        crate::log_init();
        let connector = crate::RustlsConnector::validity_only().unwrap();
        let mut stream = crate::RustlsFtpStream::connect("test.rebex.net:21")
            .unwrap()
            .into_secure(connector, "test.rebex.net")
            .unwrap();
        assert_eq!(stream.security_state(), SecurityState::Secured);
        assert!(stream.login("demo", "password").is_ok());
        assert!(stream.list_files(None).is_ok());
        assert!(stream.quit().is_ok());
    }
}
