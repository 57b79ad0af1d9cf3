use std::ffi::OsString;
use std::fmt::Write as _;
use std::os::unix::ffi::OsStrExt;

use crate::http::path::{ResolvedPath, ServerRoot, UrlEncoded};
use crate::http::response::{Response, ResponseError};
use crate::http::status::StatusCode;
use crate::http::writer::{TransferError, Transport};

/// Body is flushed to the socket whenever this much has accumulated.
const CHUNK_SIZE: usize = 8 * 1024;

/// Serves an HTML index of a directory.
///
/// Link text is HTML-escaped and hrefs are percent-encoded per segment, so
/// entry names cannot alter the document structure.
pub async fn serve_directory<S: Transport>(
    stream: &mut S,
    response: &mut Response,
    root: &ServerRoot,
    dir: &ResolvedPath,
) -> Result<(), TransferError> {
    let names = match read_names(dir).await {
        Ok(names) => names,
        Err(e) => {
            response.send_error(stream, StatusCode::InternalServerError).await?;
            return Err(e);
        }
    };

    response.set_status(StatusCode::Ok);
    response.add_header("Cache-Control", "no-cache")?;
    response.add_header("Content-Type", "text/html")?;
    response.add_header("Connection", "Closed")?;
    response.send_headers(stream).await?;

    if response.header_only() {
        return Ok(());
    }

    let title = HtmlEscaped(&dir.display_path(root)).to_string();
    let mut chunk = String::with_capacity(CHUNK_SIZE);
    let _ = write!(
        chunk,
        "<!DOCTYPE html><html><head><meta charset=\"utf-8\"><title>{title}</title></head>\
         <body><h1>Directory listing for {title}</h1><hr>"
    );

    for name in &names {
        let _ = write!(
            chunk,
            "<a href=\"{}/{}\">{}</a><br/>",
            dir.web_path,
            UrlEncoded(name.as_bytes()),
            HtmlEscaped(&name.to_string_lossy()),
        );
        if chunk.len() >= CHUNK_SIZE {
            send_chunk(stream, response, &chunk).await?;
            chunk.clear();
        }
    }

    chunk.push_str("<hr></body></html>");
    send_chunk(stream, response, &chunk).await
}

async fn read_names(dir: &ResolvedPath) -> Result<Vec<OsString>, TransferError> {
    let mut entries = tokio::fs::read_dir(&dir.path)
        .await
        .map_err(TransferError::Open)?;

    let mut names = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(TransferError::Read)? {
        names.push(entry.file_name());
    }
    names.sort();
    Ok(names)
}

async fn send_chunk<S: Transport>(
    stream: &mut S,
    response: &mut Response,
    chunk: &str,
) -> Result<(), TransferError> {
    response
        .send_body(stream, chunk.as_bytes())
        .await
        .map_err(|e| match e {
            ResponseError::Io(e) => TransferError::Send(e),
            e => TransferError::Response(e),
        })
}

/// Escape < > & ' " into HTML entities.
pub struct HtmlEscaped<'a>(pub &'a str);

impl std::fmt::Display for HtmlEscaped<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for c in self.0.chars() {
            match c {
                '<' => f.write_str("&lt;")?,
                '>' => f.write_str("&gt;")?,
                '&' => f.write_str("&amp;")?,
                '\'' => f.write_str("&apos;")?,
                '"' => f.write_str("&quot;")?,
                c => f.write_char(c)?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escaped_works() {
        assert_eq!(
            HtmlEscaped("foo<>&'\"").to_string(),
            "foo&lt;&gt;&amp;&apos;&quot;"
        );
    }
}
