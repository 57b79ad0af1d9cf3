//! Mapping request targets onto the filesystem.
//!
//! Every path that leaves this module has been canonicalized and checked to
//! lie inside the [`ServerRoot`]. Failures that could tell a client whether
//! something exists outside the root are all reported as 404.

use std::ffi::OsStr;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::path::{Component, Path, PathBuf};

use crate::http::parser::percent_decode;
use crate::http::status::StatusCode;

/// The canonical directory all served content must live under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerRoot {
    path: PathBuf,
}

impl ServerRoot {
    /// Canonicalizes `path` once. Fails if it does not exist or is not a
    /// directory.
    pub fn new(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = std::fs::canonicalize(path)?;
        if !path.is_dir() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("server root {} is not a directory", path.display()),
            ));
        }
        Ok(Self { path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether `candidate` is the root itself or lies below it.
    ///
    /// Compares whole components, so `/srv/www-old` is not inside
    /// `/srv/www`.
    pub fn contains(&self, candidate: &Path) -> bool {
        candidate.starts_with(&self.path)
    }
}

#[derive(Debug)]
pub enum ResolutionError {
    /// The target is not a usable origin-form path.
    BadRequest(&'static str),
    NotFound,
    /// Permission denied while resolving. Reported to the client as 404.
    Forbidden(io::Error),
    /// The canonical path escapes the root. Reported to the client as 404.
    OutsideRoot(PathBuf),
    Internal(io::Error),
}

impl ResolutionError {
    /// Status sent to the client for this failure.
    pub fn status(&self) -> StatusCode {
        match self {
            ResolutionError::BadRequest(_) => StatusCode::BadRequest,
            ResolutionError::NotFound
            | ResolutionError::Forbidden(_)
            | ResolutionError::OutsideRoot(_) => StatusCode::NotFound,
            ResolutionError::Internal(_) => StatusCode::InternalServerError,
        }
    }
}

impl std::fmt::Display for ResolutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolutionError::BadRequest(why) => write!(f, "bad request target: {}", why),
            ResolutionError::NotFound => write!(f, "not found"),
            ResolutionError::Forbidden(e) => write!(f, "forbidden: {}", e),
            ResolutionError::OutsideRoot(p) => write!(f, "{} is outside the server root", p.display()),
            ResolutionError::Internal(e) => write!(f, "internal: {}", e),
        }
    }
}

impl std::error::Error for ResolutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ResolutionError::Forbidden(e) | ResolutionError::Internal(e) => Some(e),
            _ => None,
        }
    }
}

enum IoClass {
    NotFound,
    Forbidden,
    Internal,
}

fn io_class(e: &io::Error) -> IoClass {
    match e.raw_os_error() {
        Some(libc::ENOENT | libc::ENOTDIR | libc::ENAMETOOLONG | libc::ELOOP) => IoClass::NotFound,
        Some(libc::EACCES | libc::EPERM) => IoClass::Forbidden,
        _ => match e.kind() {
            io::ErrorKind::NotFound => IoClass::NotFound,
            io::ErrorKind::PermissionDenied => IoClass::Forbidden,
            _ => IoClass::Internal,
        },
    }
}

/// Sorts a filesystem error into the resolution taxonomy.
///
/// Errors whose cause depends on what exists along the path all become
/// `NotFound`.
pub fn classify_io_error(e: io::Error) -> ResolutionError {
    match io_class(&e) {
        IoClass::NotFound => ResolutionError::NotFound,
        IoClass::Forbidden => ResolutionError::Forbidden(e),
        IoClass::Internal => ResolutionError::Internal(e),
    }
}

/// Client-facing status for a filesystem error.
pub fn io_error_status(e: &io::Error) -> StatusCode {
    match io_class(e) {
        IoClass::NotFound | IoClass::Forbidden => StatusCode::NotFound,
        IoClass::Internal => StatusCode::InternalServerError,
    }
}

/// What a request target turned into.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Target had trailing slashes; send 301 to this location.
    Redirect(String),
    Found(ResolvedPath),
}

/// A canonical path inside the server root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Absolute canonical filesystem path.
    pub path: PathBuf,
    /// Path below the root as a percent-encoded URL path: `""` for the root
    /// itself, `/a/b` otherwise. Used as the href base in listings.
    pub web_path: String,
}

impl ResolvedPath {
    fn new(root: &ServerRoot, path: PathBuf) -> Self {
        let mut web_path = String::new();
        if let Ok(rest) = path.strip_prefix(root.path()) {
            for component in rest.components() {
                if let Component::Normal(segment) = component {
                    web_path.push('/');
                    web_path.push_str(&UrlEncoded(segment.as_bytes()).to_string());
                }
            }
        }
        Self { path, web_path }
    }

    /// Human-readable path below the root, `/` for the root itself.
    pub fn display_path(&self, root: &ServerRoot) -> String {
        match self.path.strip_prefix(root.path()) {
            Ok(rest) if !rest.as_os_str().is_empty() => format!("/{}", rest.to_string_lossy()),
            _ => "/".to_string(),
        }
    }
}

/// The filesystem-independent part of resolution.
#[derive(Debug, PartialEq, Eq)]
pub enum Step {
    Root,
    Redirect(String),
    /// Decoded path relative to the root.
    Relative(Vec<u8>),
}

/// Decides what to do with `target` without touching the filesystem.
///
/// `target` must already have its fragment and query removed.
pub fn plan(target: &str) -> Result<Step, ResolutionError> {
    if target.bytes().any(|b| b.is_ascii_control()) {
        return Err(ResolutionError::BadRequest("target contains control characters"));
    }
    if target.len() <= 1 {
        return Ok(Step::Root);
    }
    if !target.starts_with('/') {
        return Err(ResolutionError::BadRequest("target must start with '/'"));
    }

    let trimmed = target.trim_end_matches('/');
    if trimmed.len() < target.len() {
        let location = if trimmed.is_empty() { "/" } else { trimmed };
        return Ok(Step::Redirect(location.to_string()));
    }

    let decoded = percent_decode(&trimmed.as_bytes()[1..]);
    if decoded.contains(&0) {
        return Err(ResolutionError::BadRequest("target contains a NUL byte"));
    }
    Ok(Step::Relative(decoded.into_owned()))
}

/// Resolves `target` to a canonical path inside `root`.
pub async fn resolve(root: &ServerRoot, target: &str) -> Result<Resolution, ResolutionError> {
    let relative = match plan(target)? {
        Step::Root => {
            return Ok(Resolution::Found(ResolvedPath::new(root, root.path().to_path_buf())));
        }
        Step::Redirect(location) => return Ok(Resolution::Redirect(location)),
        Step::Relative(relative) => relative,
    };

    let candidate = root.path().join(OsStr::from_bytes(&relative));
    let canonical = tokio::fs::canonicalize(&candidate)
        .await
        .map_err(classify_io_error)?;

    if !root.contains(&canonical) {
        return Err(ResolutionError::OutsideRoot(canonical));
    }

    Ok(Resolution::Found(ResolvedPath::new(root, canonical)))
}

/// Percent-encodes bytes as an RFC 3986 path segment.
pub struct UrlEncoded<'a>(pub &'a [u8]);

impl std::fmt::Display for UrlEncoded<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for &b in self.0 {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "%{:02X}", b)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_encoded_keeps_unreserved() {
        assert_eq!(UrlEncoded(b"a-b_c.d~e").to_string(), "a-b_c.d~e");
        assert_eq!(UrlEncoded(b"a b/<c>").to_string(), "a%20b%2F%3Cc%3E");
    }

    #[test]
    fn classify_enotdir_as_not_found() {
        let e = io::Error::from_raw_os_error(libc::ENOTDIR);
        assert!(matches!(classify_io_error(e), ResolutionError::NotFound));
    }

    #[test]
    fn classify_eacces_as_forbidden() {
        let e = io::Error::from_raw_os_error(libc::EACCES);
        let err = classify_io_error(e);
        assert!(matches!(err, ResolutionError::Forbidden(_)));
        assert_eq!(err.status(), StatusCode::NotFound);
    }

    #[test]
    fn classify_eio_as_internal() {
        let e = io::Error::from_raw_os_error(libc::EIO);
        assert_eq!(classify_io_error(e).status(), StatusCode::InternalServerError);
    }
}
