//! Stream types for protocol connections.

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use rustls::pki_types::ServerName;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tokio_rustls::TlsConnector;

use crate::{Error, Result};

/// A stream that can be either plaintext or TLS.
pub enum WireStream {
    /// Plaintext TCP stream (tests and scripted servers).
    Plain(TcpStream),
    /// TLS-encrypted stream (boxed to reduce enum size).
    Tls(Box<TlsStream<TcpStream>>),
}

impl WireStream {
    /// Creates a new plaintext stream.
    pub const fn plain(stream: TcpStream) -> Self {
        Self::Plain(stream)
    }

    /// Creates a new TLS stream.
    pub fn tls(stream: TlsStream<TcpStream>) -> Self {
        Self::Tls(Box::new(stream))
    }

    /// Returns true if the stream is TLS-encrypted.
    #[must_use]
    pub const fn is_tls(&self) -> bool {
        matches!(self, Self::Tls(_))
    }
}

impl AsyncRead for WireStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_read(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for WireStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_write(cx, buf),
            Self::Tls(stream) => Pin::new(stream).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_flush(cx),
            Self::Tls(stream) => Pin::new(stream).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Plain(stream) => Pin::new(stream).poll_shutdown(cx),
            Self::Tls(stream) => Pin::new(stream).poll_shutdown(cx),
        }
    }
}

/// Creates a TLS connector with default root certificates.
pub fn create_tls_connector() -> TlsConnector {
    let root_store = rustls::RootCertStore {
        roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
    };

    let config = rustls::ClientConfig::builder()
        .with_root_certificates(root_store)
        .with_no_client_auth();

    TlsConnector::from(Arc::new(config))
}

/// Connects to a server with implicit TLS, bounded by `connect_timeout`.
///
/// Both the TCP connect and the TLS handshake must complete within the
/// budget; expiry is reported as [`Error::Timeout`].
pub async fn connect_tls(host: &str, port: u16, connect_timeout: Duration) -> Result<WireStream> {
    let fut = async {
        let addr = format!("{host}:{port}");
        let tcp = TcpStream::connect(&addr).await?;

        let connector = create_tls_connector();
        let server_name = ServerName::try_from(host.to_string())?;
        let tls = connector.connect(server_name, tcp).await?;

        Ok(WireStream::Tls(Box::new(tls)))
    };

    tokio::time::timeout(connect_timeout, fut)
        .await
        .map_err(|_| Error::Timeout(connect_timeout))?
}

/// Connects to a server without TLS (scripted test servers only).
pub async fn connect_plain(host: &str, port: u16, connect_timeout: Duration) -> Result<WireStream> {
    let fut = async {
        let addr = format!("{host}:{port}");
        let tcp = TcpStream::connect(&addr).await?;
        Ok(WireStream::Plain(tcp))
    };

    tokio::time::timeout(connect_timeout, fut)
        .await
        .map_err(|_| Error::Timeout(connect_timeout))?
}
