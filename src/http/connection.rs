use std::net::SocketAddr;
use std::sync::Arc;
use std::time::SystemTime;

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tracing::{debug, error, info, warn};

use crate::config::HttpConfig;
use crate::http::files::serve_file;
use crate::http::listing::serve_directory;
use crate::http::parser::{ParseError, find_headers_end, parse_http_request};
use crate::http::path::{Resolution, ResolutionError, ServerRoot, classify_io_error, resolve};
use crate::http::request::{Method, Request};
use crate::http::response::{DEFAULT_HEADER_CAPACITY, Response, ResponseError};
use crate::http::status::StatusCode;
use crate::http::writer::{TransferError, Transport};

/// Default receive buffer size; also the largest request head accepted.
pub const DEFAULT_REQUEST_BUFFER_SIZE: usize = 1024;

/// Read-only settings shared by every connection.
#[derive(Debug, Clone)]
pub struct Site {
    pub root: ServerRoot,
    pub request_buffer_size: usize,
    pub header_capacity: usize,
    pub server_name: String,
}

impl Site {
    /// Site with default limits serving `root`.
    pub fn new(root: ServerRoot) -> Self {
        Self {
            root,
            request_buffer_size: DEFAULT_REQUEST_BUFFER_SIZE,
            header_capacity: DEFAULT_HEADER_CAPACITY,
            server_name: env!("CARGO_PKG_NAME").to_string(),
        }
    }

    /// Canonicalizes the configured root and copies the limits.
    pub fn from_config(cfg: &HttpConfig) -> std::io::Result<Self> {
        Ok(Self {
            root: ServerRoot::new(&cfg.root)?,
            request_buffer_size: cfg.request_buffer_size,
            header_capacity: cfg.header_capacity,
            server_name: cfg.server_name.clone(),
        })
    }
}

/// Outcome of one connection, logged on target `access`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessRecord {
    pub peer: SocketAddr,
    pub method: String,
    pub path: String,
    pub version: String,
    /// `None` when the client sent nothing or the read failed.
    pub status: Option<StatusCode>,
    pub bytes: u64,
}

impl AccessRecord {
    fn new(peer: SocketAddr) -> Self {
        Self {
            peer,
            method: String::new(),
            path: String::new(),
            version: String::new(),
            status: None,
            bytes: 0,
        }
    }

    fn fill_request(&mut self, request: &Request<'_>) {
        self.method = request.raw_method.to_string();
        self.path = request.path.to_string();
        self.version = request.version.to_string();
    }

    fn log(&self) {
        info!(
            target: "access",
            peer = %self.peer,
            method = ?self.method,
            path = ?self.path,
            version = ?self.version,
            status = self.status.map(|s| s.as_u16()).unwrap_or(0),
            bytes = self.bytes,
            "request served"
        );
    }
}

/// One accepted connection, served once and then dropped.
pub struct Connection<S> {
    stream: S,
    peer: SocketAddr,
    site: Arc<Site>,
}

impl<S: Transport> Connection<S> {
    pub fn new(stream: S, peer: SocketAddr, site: Arc<Site>) -> Self {
        Self { stream, peer, site }
    }

    /// Reads one request, writes one response and returns what happened.
    ///
    /// Never fails: every problem is either answered with an error status
    /// or logged. The stream is closed when `self` is dropped.
    pub async fn run(mut self) -> AccessRecord {
        let mut record = AccessRecord::new(self.peer);

        let buf = match self.read_request().await {
            Ok(Some(buf)) => buf,
            Ok(None) => {
                debug!(peer = %self.peer, "connection closed before a request arrived");
                return record;
            }
            Err(e) => {
                warn!(peer = %self.peer, error = %e, "failed to read request");
                return record;
            }
        };

        let mut response = self.new_response();

        match parse_http_request(&buf) {
            Ok((request, consumed)) => {
                record.fill_request(&request);
                if consumed < buf.len() {
                    debug!(ignored = buf.len() - consumed, "ignoring bytes after request head");
                }
                self.respond(&request, &mut response).await;
            }
            Err(e) => {
                debug!(peer = %self.peer, error = %e, "rejecting request head");
                let status = match e {
                    ParseError::Incomplete => StatusCode::RequestHeaderFieldsTooLarge,
                    ParseError::InvalidEncoding | ParseError::MissingTarget => StatusCode::BadRequest,
                };
                if let Err(e) = response.send_error(&mut self.stream, status).await {
                    self.recover(&mut response, e).await;
                }
            }
        }

        if let Err(e) = self.stream.flush().await {
            debug!(peer = %self.peer, error = %e, "flush failed");
        }

        // Nothing reached the client unless the headers went out.
        record.status = response.headers_sent().then(|| response.status());
        record.bytes = response.body_len();
        record.log();
        record
    }

    /// Reads until the end of the request head, EOF, or a full buffer.
    ///
    /// Returns `None` if the peer closed without sending anything. There is
    /// no timeout: a silent client holds the connection open.
    async fn read_request(&mut self) -> std::io::Result<Option<BytesMut>> {
        let capacity = self.site.request_buffer_size;
        let mut buf = BytesMut::with_capacity(capacity);

        while buf.len() < capacity && find_headers_end(&buf).is_none() {
            let remaining = (capacity - buf.len()) as u64;
            let n = (&mut self.stream).take(remaining).read_buf(&mut buf).await?;
            if n == 0 {
                if buf.is_empty() {
                    return Ok(None);
                }
                break;
            }
        }
        Ok(Some(buf))
    }

    /// Fresh response carrying the `Server` and `Date` headers.
    fn new_response(&self) -> Response {
        let mut response = Response::new(self.site.header_capacity);
        if let Err(e) = add_default_headers(&mut response, &self.site.server_name) {
            error!(error = %e, "default headers do not fit the header capacity");
        }
        response
    }

    /// Answers with a bare 500 when a response could not be built and
    /// nothing has been written yet.
    async fn recover(&mut self, response: &mut Response, e: ResponseError) {
        log_response_error(&e);
        if matches!(e, ResponseError::Io(_)) || response.headers_sent() {
            return;
        }

        let header_only = response.header_only();
        *response = self.new_response();
        if header_only {
            response.set_header_only();
        }
        if let Err(e) = response
            .send_error(&mut self.stream, StatusCode::InternalServerError)
            .await
        {
            log_response_error(&e);
        }
    }

    async fn respond(&mut self, request: &Request<'_>, response: &mut Response) {
        if request.is_head() {
            response.set_header_only();
        }

        let result = match request.method {
            Method::GET | Method::HEAD => self.serve(request, response).await,
            Method::Unsupported => {
                warn!(peer = %self.peer, verb = request.raw_method, "unsupported verb");
                self.send_error(response, StatusCode::NotImplemented).await
            }
            Method::POST | Method::PUT | Method::DELETE => {
                match response.add_header("Allow", "GET, HEAD") {
                    Ok(()) => self.send_error(response, StatusCode::MethodNotAllowed).await,
                    Err(e) => Err(e.into()),
                }
            }
        };

        if let Err(e) = result {
            match e {
                TransferError::Response(e) => self.recover(response, e).await,
                e => warn!(peer = %self.peer, path = request.path, error = %e, "response aborted"),
            }
        }
    }

    async fn serve(
        &mut self,
        request: &Request<'_>,
        response: &mut Response,
    ) -> Result<(), TransferError> {
        let resolved = match resolve(&self.site.root, request.target_path()).await {
            Ok(Resolution::Found(resolved)) => resolved,
            Ok(Resolution::Redirect(location)) => {
                if let Err(e) = response.add_header("Location", &location) {
                    debug!(peer = %self.peer, error = %e, "cannot emit redirect location");
                    let status = match e {
                        ResponseError::CapacityExceeded { .. } => StatusCode::UriTooLong,
                        _ => StatusCode::BadRequest,
                    };
                    return self.send_error(response, status).await;
                }
                response.set_status(StatusCode::MovedPermanently);
                response.set_header_only();
                response.send_headers(&mut self.stream).await?;
                return Ok(());
            }
            Err(e) => return self.reject(request, response, e).await,
        };

        let metadata = match tokio::fs::metadata(&resolved.path).await {
            Ok(metadata) => metadata,
            Err(e) => return self.reject(request, response, classify_io_error(e)).await,
        };

        if metadata.is_file() {
            serve_file(&mut self.stream, request, response, &resolved.path, &metadata).await
        } else if metadata.is_dir() {
            serve_directory(&mut self.stream, response, &self.site.root, &resolved).await
        } else {
            debug!(path = %resolved.path.display(), "not a regular file or directory");
            self.send_error(response, StatusCode::Forbidden).await
        }
    }

    async fn reject(
        &mut self,
        request: &Request<'_>,
        response: &mut Response,
        e: ResolutionError,
    ) -> Result<(), TransferError> {
        match &e {
            ResolutionError::Forbidden(_) | ResolutionError::OutsideRoot(_) => {
                warn!(peer = %self.peer, path = request.path, error = %e, "hiding path from client");
            }
            ResolutionError::Internal(_) => {
                error!(peer = %self.peer, path = request.path, error = %e, "path resolution failed");
            }
            ResolutionError::BadRequest(_) | ResolutionError::NotFound => {
                debug!(peer = %self.peer, path = request.path, error = %e, "path resolution failed");
            }
        }
        self.send_error(response, e.status()).await
    }

    async fn send_error(
        &mut self,
        response: &mut Response,
        status: StatusCode,
    ) -> Result<(), TransferError> {
        response.send_error(&mut self.stream, status).await?;
        Ok(())
    }
}

fn add_default_headers(response: &mut Response, server_name: &str) -> Result<(), ResponseError> {
    response.add_header("Server", server_name)?;
    response.add_header("Date", &httpdate::fmt_http_date(SystemTime::now()))
}

fn log_response_error(e: &ResponseError) {
    match e {
        ResponseError::Io(e) => debug!(error = %e, "client went away"),
        e => error!(error = %e, "response misuse"),
    }
}
