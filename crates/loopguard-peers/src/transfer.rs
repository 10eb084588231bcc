//! Frame transfer helpers shared by both peers.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::error::{PeerError, PeerResult};

/// How a frame read ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Transfer {
    /// The whole frame arrived.
    Complete,
    /// The watchdog closed or reset the connection.
    Closed,
}

/// Read exactly `frame.len()` bytes, treating a close by the remote side as
/// an outcome rather than an error.
pub(crate) async fn read_or_closed<R>(
    reader: &mut R,
    frame: &mut [u8],
    context: &'static str,
) -> PeerResult<Transfer>
where
    R: AsyncRead + Unpin,
{
    match reader.read_exact(frame).await {
        Ok(_) => Ok(Transfer::Complete),
        Err(err) if is_close(&err) => Ok(Transfer::Closed),
        Err(err) => Err(PeerError::io(context, err)),
    }
}

fn is_close(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::UnexpectedEof
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
    )
}
