use std::fs::Metadata;
use std::io;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs::{File, OpenOptions};
use tracing::debug;

use crate::http::path::io_error_status;
use crate::http::request::Request;
use crate::http::response::Response;
use crate::http::status::StatusCode;
use crate::http::writer::{TransferError, Transport};

/// Content type for every file; the server does not guess media types.
pub const FILE_CONTENT_TYPE: &str = "application/octet-stream";

/// Serves a regular file, answering 304 when the client copy is current.
pub async fn serve_file<S: Transport>(
    stream: &mut S,
    request: &Request<'_>,
    response: &mut Response,
    path: &Path,
    metadata: &Metadata,
) -> Result<(), TransferError> {
    response.add_header("Connection", "Closed")?;

    let modified = metadata.modified().unwrap_or(UNIX_EPOCH);

    if !is_modified_since(request.if_modified_since, modified) {
        response.set_status(StatusCode::NotModified);
        response.set_header_only();
        response.send_headers(stream).await?;
        return Ok(());
    }

    let mut file = if response.header_only() {
        None
    } else {
        match open_file(path).await {
            Ok(file) => Some(file),
            Err(e) => {
                response.send_error(stream, io_error_status(&e)).await?;
                return Err(TransferError::Open(e));
            }
        }
    };

    let len = metadata.len();
    response.set_status(StatusCode::Ok);
    response.add_header("Cache-Control", "public")?;
    response.add_header("Content-Type", FILE_CONTENT_TYPE)?;
    response.add_header("Content-Length", &len.to_string())?;
    response.add_header("Last-Modified", &httpdate::fmt_http_date(modified))?;
    response.send_headers(stream).await?;

    let Some(file) = file.as_mut() else {
        return Ok(());
    };

    let sent = stream
        .send_file(file, len)
        .await
        .map_err(TransferError::Send)?;
    response.record_body(sent);

    if sent < len {
        return Err(TransferError::Short {
            expected: len,
            sent,
        });
    }
    debug!(path = %path.display(), bytes = sent, "file sent");
    Ok(())
}

/// Whether a file modified at `modified` is newer than the client's
/// `If-Modified-Since` value.
///
/// A missing or unparsable header counts as modified. Comparison is in
/// whole seconds, the resolution of HTTP dates.
pub fn is_modified_since(if_modified_since: Option<&str>, modified: SystemTime) -> bool {
    let Some(since) = if_modified_since.and_then(|v| httpdate::parse_http_date(v).ok()) else {
        return true;
    };

    unix_secs(modified) > unix_secs(since)
}

fn unix_secs(t: SystemTime) -> u64 {
    t.duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Opens a file for sending: read-only, refusing symlinks, and without
/// touching its access time.
pub async fn open_file(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.read(true).custom_flags(libc::O_NOFOLLOW | NOATIME);

    match options.open(path).await {
        // O_NOATIME is only permitted to the file owner.
        Err(e) if NOATIME != 0 && e.raw_os_error() == Some(libc::EPERM) => {
            OpenOptions::new()
                .read(true)
                .custom_flags(libc::O_NOFOLLOW)
                .open(path)
                .await
        }
        result => result,
    }
}

#[cfg(target_os = "linux")]
const NOATIME: i32 = libc::O_NOATIME;

#[cfg(not(target_os = "linux"))]
const NOATIME: i32 = 0;

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn missing_header_is_modified() {
        assert!(is_modified_since(None, SystemTime::now()));
    }

    #[test]
    fn garbage_header_is_modified() {
        assert!(is_modified_since(Some("yesterday"), UNIX_EPOCH));
    }

    #[test]
    fn same_second_is_not_modified() {
        let mtime = UNIX_EPOCH + Duration::from_millis(784_111_777_500);
        assert!(!is_modified_since(Some("Sun, 06 Nov 1994 08:49:37 GMT"), mtime));
    }

    #[test]
    fn newer_file_is_modified() {
        let mtime = UNIX_EPOCH + Duration::from_secs(784_111_778);
        assert!(is_modified_since(Some("Sun, 06 Nov 1994 08:49:37 GMT"), mtime));
    }
}
