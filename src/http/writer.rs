//! Connection transports and body transfer.
//!
//! [`Transport`] is the seam between the handler and the socket. Its one
//! extra capability over plain async I/O is sending a file body, which TCP
//! sockets on Linux do with `sendfile(2)` so file bytes never pass through
//! user space.

use std::future::Future;
use std::io;

use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpStream;

use crate::http::response::ResponseError;

/// Failure while producing a response body.
///
/// Once headers are on the wire the status can no longer change, so these
/// are logged and the connection is dropped.
#[derive(Debug)]
pub enum TransferError {
    /// The file or directory could not be opened.
    Open(io::Error),
    /// Reading directory entries failed.
    Read(io::Error),
    /// Writing the body to the client failed.
    Send(io::Error),
    /// The file ended before the advertised length was sent.
    Short { expected: u64, sent: u64 },
    Response(ResponseError),
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferError::Open(e) => write!(f, "open: {}", e),
            TransferError::Read(e) => write!(f, "read: {}", e),
            TransferError::Send(e) => write!(f, "send: {}", e),
            TransferError::Short { expected, sent } => {
                write!(f, "sent {} of {} bytes", sent, expected)
            }
            TransferError::Response(e) => write!(f, "response: {}", e),
        }
    }
}

impl std::error::Error for TransferError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransferError::Open(e) | TransferError::Read(e) | TransferError::Send(e) => Some(e),
            TransferError::Response(e) => Some(e),
            TransferError::Short { .. } => None,
        }
    }
}

impl From<ResponseError> for TransferError {
    fn from(e: ResponseError) -> Self {
        TransferError::Response(e)
    }
}

/// A byte stream a connection can be served over.
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {
    /// Sends the first `len` bytes of `file` and returns how many were
    /// written. Fewer than `len` means the file was shorter than expected.
    fn send_file<'a>(
        &'a mut self,
        file: &'a mut File,
        len: u64,
    ) -> impl Future<Output = io::Result<u64>> + Send + 'a {
        async move {
            let mut body = (&mut *file).take(len);
            tokio::io::copy(&mut body, self).await
        }
    }
}

impl Transport for tokio::io::DuplexStream {}

#[cfg(not(target_os = "linux"))]
impl Transport for TcpStream {}

#[cfg(target_os = "linux")]
impl Transport for TcpStream {
    fn send_file<'a>(
        &'a mut self,
        file: &'a mut File,
        len: u64,
    ) -> impl Future<Output = io::Result<u64>> + Send + 'a {
        use std::os::fd::AsRawFd;
        use tokio::io::Interest;

        // Upper bound per syscall, as the kernel caps a single transfer anyway.
        const SENDFILE_CHUNK: usize = 0x7fff_f000;

        async move {
            let out_fd = self.as_raw_fd();
            let in_fd = file.as_raw_fd();
            let mut offset: libc::off_t = 0;
            let mut sent: u64 = 0;

            while sent < len {
                let count = usize::try_from(len - sent)
                    .unwrap_or(usize::MAX)
                    .min(SENDFILE_CHUNK);

                self.writable().await?;
                match self.try_io(Interest::WRITABLE, || sendfile(out_fd, in_fd, &mut offset, count)) {
                    Ok(0) => break,
                    Ok(n) => sent += n as u64,
                    Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                }
            }
            Ok(sent)
        }
    }
}

/// Safe wrapper for `libc::sendfile`.
#[cfg(target_os = "linux")]
fn sendfile(
    out_fd: std::os::fd::RawFd,
    in_fd: std::os::fd::RawFd,
    offset: &mut libc::off_t,
    count: usize,
) -> io::Result<usize> {
    // SAFETY: both descriptors are borrowed from live handles for the whole
    // call and `offset` points to a valid `off_t`.
    let ret = unsafe { libc::sendfile(out_fd, in_fd, offset, count) };
    if ret == -1 {
        Err(io::Error::last_os_error())
    } else {
        Ok(ret as usize)
    }
}
