//! # Rustls
//!
//! Rustls implementation of tls types

use std::io::Write;
use std::net::TcpStream;
use std::sync::Arc;

use x509_parser::time::ASN1Time;

use super::{TlsConnector, TlsStream};
use crate::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use crate::rustls::crypto::{verify_tls12_signature, verify_tls13_signature, CryptoProvider};
use crate::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use crate::rustls::{
    CertificateError, ClientConfig, ClientConnection, DigitallySignedStruct, SignatureScheme,
    StreamOwned,
};
use crate::{FtpError, FtpResult};

/// A Wrapper for the tls connector
pub struct RustlsConnector {
    connector: Arc<ClientConfig>,
}

impl std::fmt::Debug for RustlsConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<?>")
    }
}

impl From<Arc<ClientConfig>> for RustlsConnector {
    fn from(connector: Arc<ClientConfig>) -> Self {
        Self { connector }
    }
}

impl RustlsConnector {
    /// A connector trusting any certificate within its validity period, see [`ValidityOnlyVerifier`]
    pub fn validity_only() -> FtpResult<Self> {
        let provider = Arc::new(crate::rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(Arc::clone(&provider))
            .with_safe_default_protocol_versions()
            .map_err(|e| FtpError::SecureError(e.to_string()))?
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(ValidityOnlyVerifier::new(provider)))
            .with_no_client_auth();
        Ok(Self::from(Arc::new(config)))
    }
}

impl TlsConnector for RustlsConnector {
    type Stream = RustlsStream;

    fn connect(&self, domain: &str, stream: TcpStream) -> FtpResult<Self::Stream> {
        let server_name = ServerName::try_from(domain.to_string())
            .map_err(|e| FtpError::SecureError(e.to_string()))?;
        let connection = ClientConnection::new(Arc::clone(&self.connector), server_name)
            .map_err(|e| FtpError::SecureError(e.to_string()))?;
        let mut stream = StreamOwned::new(connection, stream);
        // the peer certificate must be available once connected
        while stream.conn.is_handshaking() {
            stream
                .conn
                .complete_io(&mut stream.sock)
                .map_err(|e| FtpError::SecureError(e.to_string()))?;
        }
        Ok(RustlsStream {
            stream,
            ssl_shutdown: true,
        })
    }
}

// -- tls stream wrapper to implement drop...

/// Tls stream wrapper. Sends close notify when dropped.
#[derive(Debug)]
pub struct RustlsStream {
    stream: StreamOwned<ClientConnection, TcpStream>,
    ssl_shutdown: bool,
}

impl TlsStream for RustlsStream {
    type InnerStream = StreamOwned<ClientConnection, TcpStream>;

    fn tcp_stream(mut self) -> std::io::Result<TcpStream> {
        let mut stream = self.get_ref().try_clone()?;
        // Don't perform shutdown later
        self.ssl_shutdown = false;
        // flush stream (otherwise can cause bad chars on channel)
        if let Err(err) = stream.flush() {
            error!("Error in flushing tcp stream: {}", err);
        }
        trace!("TLS stream terminated");
        Ok(stream)
    }

    fn get_ref(&self) -> &TcpStream {
        self.stream.get_ref()
    }

    fn mut_ref(&mut self) -> &mut Self::InnerStream {
        &mut self.stream
    }

    fn peer_certificate(&self) -> Option<Vec<u8>> {
        self.stream
            .conn
            .peer_certificates()
            .and_then(|certs| certs.first())
            .map(|cert| cert.as_ref().to_vec())
    }
}

impl Drop for RustlsStream {
    fn drop(&mut self) {
        if self.ssl_shutdown {
            if let Err(err) = self.stream.flush() {
                error!("error in flushing rustls stream on drop: {err}");
            }
            self.stream.conn.send_close_notify();
            if let Err(err) = self.stream.conn.write_tls(&mut self.stream.sock) {
                error!("error in terminating rustls stream: {err}");
            }
        }
    }
}

/// Certificate verifier which only checks that the end-entity certificate is within its validity period.
///
/// Neither the chain nor the server name are verified; pair it with a hostname verifier
/// on the session when the peer identity matters. Handshake signatures are still checked.
#[derive(Debug)]
pub struct ValidityOnlyVerifier {
    provider: Arc<CryptoProvider>,
}

impl ValidityOnlyVerifier {
    pub fn new(provider: Arc<CryptoProvider>) -> Self {
        Self { provider }
    }

    fn check_validity(der: &[u8], now: UnixTime) -> Result<(), CertificateError> {
        let (_, cert) =
            x509_parser::parse_x509_certificate(der).map_err(|_| CertificateError::BadEncoding)?;
        let now = i64::try_from(now.as_secs())
            .ok()
            .and_then(|secs| ASN1Time::from_timestamp(secs).ok())
            .ok_or(CertificateError::BadEncoding)?;
        let validity = cert.validity();
        if now < validity.not_before {
            debug!("certificate not valid before {}", validity.not_before);
            Err(CertificateError::NotValidYet)
        } else if now > validity.not_after {
            debug!("certificate expired on {}", validity.not_after);
            Err(CertificateError::Expired)
        } else {
            Ok(())
        }
    }
}

impl ServerCertVerifier for ValidityOnlyVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, crate::rustls::Error> {
        Self::check_validity(end_entity.as_ref(), now)
            .map(|_| ServerCertVerified::assertion())
            .map_err(crate::rustls::Error::InvalidCertificate)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, crate::rustls::Error> {
        verify_tls12_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, crate::rustls::Error> {
        verify_tls13_signature(
            message,
            cert,
            dss,
            &self.provider.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.provider
            .signature_verification_algorithms
            .supported_schemes()
    }
}

#[cfg(test)]
mod test {

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn should_reject_garbage_certificate() {
        crate::log_init();
        let provider = Arc::new(crate::rustls::crypto::ring::default_provider());
        let verifier = ValidityOnlyVerifier::new(provider);
        let cert = CertificateDer::from(vec![0x30, 0x03, 0x01, 0x02, 0x03]);
        let server_name = ServerName::try_from("localhost").unwrap();
        assert!(matches!(
            verifier.verify_server_cert(&cert, &[], &server_name, &[], UnixTime::now()),
            Err(crate::rustls::Error::InvalidCertificate(
                CertificateError::BadEncoding
            ))
        ));
        assert_eq!(verifier.supported_verify_schemes().is_empty(), false);
    }

    #[test]
    fn should_build_validity_only_connector() {
        assert!(RustlsConnector::validity_only().is_ok());
    }
}
