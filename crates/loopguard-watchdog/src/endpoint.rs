//! Socket seam between the session and the transport.

use std::io;
use std::net::Shutdown;

use tokio::io::{AsyncRead, AsyncWrite, DuplexStream};
use tokio::net::TcpStream;

/// A bidirectional byte stream the session can own and tear down.
///
/// Production sessions use [`TcpStream`]; simulations and tests use in-memory
/// [`DuplexStream`] pairs.
pub trait Endpoint: AsyncRead + AsyncWrite + Unpin + Send + 'static {
    /// Close both directions immediately and release the endpoint.
    ///
    /// Synchronous and best-effort: the caller logs any error and carries on.
    ///
    /// # Errors
    ///
    /// Returns the OS error if the shutdown call itself fails.
    fn shutdown_both(self) -> io::Result<()>;

    /// Short description of the remote side, for logging.
    fn peer_label(&self) -> String {
        "endpoint".to_string()
    }
}

impl Endpoint for TcpStream {
    fn shutdown_both(self) -> io::Result<()> {
        self.into_std()?.shutdown(Shutdown::Both)
    }

    fn peer_label(&self) -> String {
        self.peer_addr()
            .map_or_else(|_| "tcp:unknown".to_string(), |addr| addr.to_string())
    }
}

impl Endpoint for DuplexStream {
    fn shutdown_both(self) -> io::Result<()> {
        // Dropping one half closes the pipe in both directions for the peer.
        drop(self);
        Ok(())
    }

    fn peer_label(&self) -> String {
        "duplex".to_string()
    }
}
