//! # Native tls
//!
//! Native tls implementation of TLS types

use std::io::Write;
use std::net::TcpStream;

use super::{TlsConnector, TlsStream};
use crate::native_tls::{TlsConnector as NativeConnector, TlsStream as NativeStream};
use crate::{FtpError, FtpResult};

#[derive(Debug)]
/// A Wrapper for the tls connector
pub struct NativeTlsConnector {
    connector: NativeConnector,
}

impl From<NativeConnector> for NativeTlsConnector {
    fn from(connector: NativeConnector) -> Self {
        Self { connector }
    }
}

impl TlsConnector for NativeTlsConnector {
    type Stream = NativeTlsStream;

    fn connect(&self, domain: &str, stream: TcpStream) -> FtpResult<Self::Stream> {
        self.connector
            .connect(domain, stream)
            .map(NativeTlsStream::from)
            .map_err(|e| FtpError::SecureError(format!("{e}")))
    }
}

// -- tls stream wrapper to implement drop...

/// Tls stream wrapper. Shuts the TLS session down when dropped.
#[derive(Debug)]
pub struct NativeTlsStream {
    stream: NativeStream<TcpStream>,
    ssl_shutdown: bool,
}

impl TlsStream for NativeTlsStream {
    type InnerStream = NativeStream<TcpStream>;

    fn tcp_stream(mut self) -> std::io::Result<TcpStream> {
        let mut stream = self.stream.get_ref().try_clone()?;
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
        match self.stream.peer_certificate() {
            Ok(Some(cert)) => cert.to_der().ok(),
            Ok(None) => None,
            Err(err) => {
                error!("failed to get peer certificate: {err}");
                None
            }
        }
    }
}

impl From<NativeStream<TcpStream>> for NativeTlsStream {
    fn from(stream: NativeStream<TcpStream>) -> Self {
        Self {
            stream,
            ssl_shutdown: true,
        }
    }
}

impl Drop for NativeTlsStream {
    fn drop(&mut self) {
        if self.ssl_shutdown {
            if let Err(err) = self.stream.shutdown() {
                error!("Failed to shutdown stream: {}", err);
            } else {
                debug!("TLS Stream shut down");
            }
        }
    }
}
