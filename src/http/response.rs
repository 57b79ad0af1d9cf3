use bytes::{BufMut, BytesMut};
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::http::status::StatusCode;

const HTTP_VERSION: &str = "HTTP/1.1";
const CRLF: &[u8] = b"\r\n";
const SEPARATOR: &[u8] = b": ";

/// Default size of the header region, terminator included.
pub const DEFAULT_HEADER_CAPACITY: usize = 1024;

/// Longest header name accepted by [`Response::add_header`].
pub const HEADER_NAME_MAX_LEN: usize = 41;

/// Misuse of a [`Response`], or a failed socket write.
///
/// Apart from `Io`, these indicate a bug in the handler rather than
/// anything the client did.
#[derive(Debug)]
pub enum ResponseError {
    /// A header was added, or headers were sent, after headers went out.
    HeadersAlreadySent,
    /// The status line was sent a second time.
    StatusLineAlreadySent,
    /// A body write was attempted before the headers were sent.
    HeadersNotSent,
    /// The header would not fit in the remaining capacity.
    CapacityExceeded { needed: usize, available: usize },
    /// Header name too long, empty, or containing CR/LF.
    InvalidHeader,
    Io(std::io::Error),
}

impl std::fmt::Display for ResponseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResponseError::HeadersAlreadySent => write!(f, "headers already sent"),
            ResponseError::StatusLineAlreadySent => write!(f, "status line already sent"),
            ResponseError::HeadersNotSent => write!(f, "body written before headers"),
            ResponseError::CapacityExceeded { needed, available } => write!(
                f,
                "header needs {} bytes but only {} are left",
                needed, available
            ),
            ResponseError::InvalidHeader => write!(f, "invalid header name or value"),
            ResponseError::Io(e) => write!(f, "io: {}", e),
        }
    }
}

impl std::error::Error for ResponseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResponseError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ResponseError {
    fn from(e: std::io::Error) -> Self {
        ResponseError::Io(e)
    }
}

/// An HTTP response being written to a connection.
///
/// Sending follows a fixed order: status line, then headers, then body.
/// Headers are accumulated in a region bounded by `capacity`; an addition
/// that would not leave room for the final blank line is refused and leaves
/// the region untouched.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    status_line_sent: bool,
    headers_sent: bool,
    header_only: bool,
    headers: BytesMut,
    capacity: usize,
    body_len: u64,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(DEFAULT_HEADER_CAPACITY)
    }
}

impl Response {
    /// Creates a response with a 500 status, to be overwritten by the
    /// handler once it knows better.
    pub fn new(capacity: usize) -> Self {
        Self {
            status: StatusCode::InternalServerError,
            status_line_sent: false,
            headers_sent: false,
            header_only: false,
            headers: BytesMut::with_capacity(capacity.min(DEFAULT_HEADER_CAPACITY)),
            capacity,
            body_len: 0,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    pub fn status_line_sent(&self) -> bool {
        self.status_line_sent
    }

    pub fn headers_sent(&self) -> bool {
        self.headers_sent
    }

    pub fn header_only(&self) -> bool {
        self.header_only
    }

    /// Marks the response as carrying no body. Cannot be undone.
    pub fn set_header_only(&mut self) {
        self.header_only = true;
    }

    /// Accumulated header bytes (without the status line).
    pub fn headers(&self) -> &[u8] {
        &self.headers
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes of body written so far.
    pub fn body_len(&self) -> u64 {
        self.body_len
    }

    /// Appends `name: value\r\n` to the header region.
    ///
    /// Fails without modifying the region if headers were already sent, if
    /// the header is malformed, or if it would not fit alongside the final
    /// blank line.
    pub fn add_header(&mut self, name: &str, value: &str) -> Result<(), ResponseError> {
        if self.headers_sent {
            return Err(ResponseError::HeadersAlreadySent);
        }
        if name.is_empty()
            || name.len() > HEADER_NAME_MAX_LEN
            || name.bytes().any(|b| b == b':' || b.is_ascii_whitespace())
            || value.bytes().any(|b| b == b'\r' || b == b'\n')
        {
            return Err(ResponseError::InvalidHeader);
        }

        let needed = name.len() + SEPARATOR.len() + value.len() + CRLF.len();
        let available = self.capacity.saturating_sub(self.headers.len() + CRLF.len());
        if needed > available {
            return Err(ResponseError::CapacityExceeded { needed, available });
        }

        self.headers.reserve(needed);
        self.headers.put_slice(name.as_bytes());
        self.headers.put_slice(SEPARATOR);
        self.headers.put_slice(value.as_bytes());
        self.headers.put_slice(CRLF);
        Ok(())
    }

    fn status_line(&self) -> String {
        format!(
            "{} {} {}\r\n",
            HTTP_VERSION,
            self.status.as_str(),
            self.status.reason_phrase()
        )
    }

    /// Writes the status line on its own.
    ///
    /// Only needed when the status line must go out before the headers are
    /// complete; [`Response::send_headers`] otherwise sends both together.
    pub async fn send_status_line<W>(&mut self, w: &mut W) -> Result<(), ResponseError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        if self.headers_sent {
            return Err(ResponseError::HeadersAlreadySent);
        }
        if self.status_line_sent {
            return Err(ResponseError::StatusLineAlreadySent);
        }

        w.write_all(self.status_line().as_bytes()).await?;
        self.status_line_sent = true;
        Ok(())
    }

    /// Terminates the header region and writes it in a single write,
    /// preceded by the status line if that has not gone out yet.
    pub async fn send_headers<W>(&mut self, w: &mut W) -> Result<(), ResponseError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        if self.headers_sent {
            return Err(ResponseError::HeadersAlreadySent);
        }
        if self.headers.len() + CRLF.len() > self.capacity {
            return Err(ResponseError::CapacityExceeded {
                needed: CRLF.len(),
                available: self.capacity.saturating_sub(self.headers.len()),
            });
        }

        self.headers.put_slice(CRLF);
        // Marked before writing: a failed write must not allow a second
        // terminator to be appended.
        self.headers_sent = true;

        if self.status_line_sent {
            w.write_all(&self.headers).await?;
        } else {
            let status_line = self.status_line();
            let mut block = BytesMut::with_capacity(status_line.len() + self.headers.len());
            block.put_slice(status_line.as_bytes());
            block.put_slice(&self.headers);
            self.status_line_sent = true;
            w.write_all(&block).await?;
        }
        Ok(())
    }

    /// Writes body bytes, or nothing for a header-only response.
    pub async fn send_body<W>(&mut self, w: &mut W, body: &[u8]) -> Result<(), ResponseError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        if !self.headers_sent {
            return Err(ResponseError::HeadersNotSent);
        }
        if self.header_only {
            return Ok(());
        }

        w.write_all(body).await?;
        self.body_len += body.len() as u64;
        Ok(())
    }

    /// Accounts for body bytes written around this type, e.g. by a file
    /// transfer.
    pub fn record_body(&mut self, n: u64) {
        self.body_len += n;
    }

    /// Sends a plain-text error response whose body is the reason phrase.
    ///
    /// Headers already accumulated (such as `Server` and `Date`) are kept.
    pub async fn send_error<W>(&mut self, w: &mut W, status: StatusCode) -> Result<(), ResponseError>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        self.status = status;
        let reason = status.reason_phrase();

        self.add_header("Content-Type", "text/plain")?;
        self.add_header("Content-Length", &reason.len().to_string())?;
        self.send_headers(w).await?;
        self.send_body(w, reason.as_bytes()).await
    }
}
