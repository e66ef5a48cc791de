//! # Tls
//!
//! Tls wrappers

use std::fmt::Debug;
use std::io::{Read, Write};
use std::net::TcpStream;

#[cfg(feature = "native-tls")]
mod native_tls;
#[cfg(feature = "native-tls")]
pub use self::native_tls::{NativeTlsConnector, NativeTlsStream};

#[cfg(feature = "rustls")]
mod rustls;
#[cfg(feature = "rustls")]
pub use self::rustls::{RustlsConnector, RustlsStream, ValidityOnlyVerifier};

/// Wraps a connected [`TcpStream`] into a TLS session
#[cfg(feature = "secure")]
pub trait TlsConnector: Debug {
    type Stream: TlsStream;

    /// Perform the handshake with `domain` over `stream`
    fn connect(&self, domain: &str, stream: TcpStream) -> crate::FtpResult<Self::Stream>;
}

/// A trait for a TLS stream.
///
/// This kind of stream is used for the control connection once secured and for protected data connections.
pub trait TlsStream: Debug {
    type InnerStream: Read + Write;

    /// Get underlying tcp stream. TLS is left as is: no close notify is sent.
    fn tcp_stream(self) -> std::io::Result<TcpStream>;

    /// Get ref to underlying tcp stream
    fn get_ref(&self) -> &TcpStream;

    /// Get mutable reference to tls stream
    fn mut_ref(&mut self) -> &mut Self::InnerStream;

    /// DER encoded end-entity certificate of the peer
    fn peer_certificate(&self) -> Option<Vec<u8>>;
}

/// The TLS stream of a session built without TLS support. It can't be instantiated.
#[derive(Debug)]
pub enum NoTlsStream {}

impl TlsStream for NoTlsStream {
    type InnerStream = TcpStream;

    fn tcp_stream(self) -> std::io::Result<TcpStream> {
        match self {}
    }

    fn get_ref(&self) -> &TcpStream {
        match *self {}
    }

    fn mut_ref(&mut self) -> &mut Self::InnerStream {
        match *self {}
    }

    fn peer_certificate(&self) -> Option<Vec<u8>> {
        match *self {}
    }
}
