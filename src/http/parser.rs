use std::borrow::Cow;

use crate::http::request::{KnownHeader, Method, Request};

const CRLF: &str = "\r\n";
const HEAD_TERMINATOR: &[u8] = b"\r\n\r\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseError {
    /// No blank line was found in the buffer. Answered with 431.
    Incomplete,
    /// The request head is not valid UTF-8.
    InvalidEncoding,
    /// The request line carries no target.
    MissingTarget,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::Incomplete => write!(f, "request head not terminated within buffer"),
            ParseError::InvalidEncoding => write!(f, "request head is not valid UTF-8"),
            ParseError::MissingTarget => write!(f, "request line has no target"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Parses a request head out of `buf`.
///
/// On success returns the request and the number of bytes consumed, which
/// includes the terminating blank line. Anything after that is body and is
/// left untouched.
pub fn parse_http_request(buf: &[u8]) -> Result<(Request<'_>, usize), ParseError> {
    let headers_end = find_headers_end(buf).ok_or(ParseError::Incomplete)?;

    let head = std::str::from_utf8(&buf[..headers_end]).map_err(|_| ParseError::InvalidEncoding)?;

    let mut lines = head.split(CRLF);

    let mut request = Request::default();

    // Request line: VERB SP TARGET SP VERSION
    let request_line = lines.next().unwrap_or_default();
    let mut parts = request_line.split(' ');

    let verb = parts.next().unwrap_or_default();
    request.method = Method::parse(verb);
    request.raw_method = verb;
    request.path = parts.next().unwrap_or_default().trim_end();
    request.version = parts.next().unwrap_or_default().trim_end();

    if request.path.is_empty() {
        return Err(ParseError::MissingTarget);
    }

    // Headers: only the first occurrence of a recognized name is kept
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            continue;
        };

        if let Some(header) = KnownHeader::from_name(name.trim()) {
            request.set_header_once(header, value.trim());
        }
    }

    Ok((request, headers_end + HEAD_TERMINATOR.len()))
}

/// Position of the blank line ending the request head, if present.
pub fn find_headers_end(buf: &[u8]) -> Option<usize> {
    buf.windows(HEAD_TERMINATOR.len())
        .position(|w| w == HEAD_TERMINATOR)
}

/// Decodes `%XY` escapes where `X` and `Y` are hex digits.
///
/// Anything else, including a `%` not followed by two hex digits, is copied
/// through unchanged. Input without a `%` is returned borrowed.
pub fn percent_decode(input: &[u8]) -> Cow<'_, [u8]> {
    if !input.contains(&b'%') {
        return Cow::Borrowed(input);
    }

    let mut decoded = Vec::with_capacity(input.len());
    let mut i = 0;
    while i < input.len() {
        match (input[i], hex_value(input.get(i + 1)), hex_value(input.get(i + 2))) {
            (b'%', Some(hi), Some(lo)) => {
                decoded.push(hi << 4 | lo);
                i += 3;
            }
            (c, _, _) => {
                decoded.push(c);
                i += 1;
            }
        }
    }
    Cow::Owned(decoded)
}

fn hex_value(digit: Option<&u8>) -> Option<u8> {
    match *digit? {
        d @ b'0'..=b'9' => Some(d - b'0'),
        d @ b'a'..=b'f' => Some(d - b'a' + 10),
        d @ b'A'..=b'F' => Some(d - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_lf_does_not_end_head() {
        assert_eq!(find_headers_end(b"GET / HTTP/1.1\n\n"), None);
        assert_eq!(find_headers_end(b"GET / HTTP/1.1\r\n\n\r\n\r\n"), Some(17));
    }

    #[test]
    fn decode_mixed_case_hex() {
        assert_eq!(&*percent_decode(b"%2f%2F"), b"//");
    }

    #[test]
    fn decode_truncated_escape() {
        assert_eq!(&*percent_decode(b"abc%4"), b"abc%4");
        assert_eq!(&*percent_decode(b"%"), b"%");
    }
}
