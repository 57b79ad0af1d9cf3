use staticd::http::parser::{ParseError, parse_http_request, percent_decode};
use staticd::http::request::Method;

#[test]
fn test_parse_simple_get_request() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::GET);
    assert_eq!(parsed.path, "/");
    assert_eq!(parsed.version, "HTTP/1.1");
    assert_eq!(parsed.host, Some("example.com"));
    assert_eq!(consumed, req.len());
}

#[test]
fn test_parse_recognized_headers() {
    let req = b"GET /path HTTP/1.1\r\n\
        From: ops@example.com\r\n\
        Host: example.com\r\n\
        User-Agent: test-client\r\n\
        Accept: */*\r\n\
        Connection: close\r\n\
        If-Modified-Since: Sun, 06 Nov 1994 08:49:37 GMT\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.from, Some("ops@example.com"));
    assert_eq!(parsed.host, Some("example.com"));
    assert_eq!(parsed.user_agent, Some("test-client"));
    assert_eq!(parsed.accept, Some("*/*"));
    assert_eq!(parsed.connection, Some("close"));
    assert_eq!(
        parsed.if_modified_since,
        Some("Sun, 06 Nov 1994 08:49:37 GMT")
    );
}

#[test]
fn test_parse_header_names_case_insensitive() {
    let req = b"GET / HTTP/1.1\r\nhOsT: example.com\r\nUSER-AGENT: curl\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.host, Some("example.com"));
    assert_eq!(parsed.user_agent, Some("curl"));
}

#[test]
fn test_parse_keeps_first_occurrence() {
    let req = b"GET / HTTP/1.1\r\nHost: first\r\nHost: second\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.host, Some("first"));
}

#[test]
fn test_parse_discards_unknown_headers() {
    let req = b"GET / HTTP/1.1\r\nX-Custom: value\r\nBrokenHeader\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.host, None);
    assert_eq!(parsed.path, "/");
}

#[test]
fn test_parse_request_with_path_and_query_string() {
    let req = b"GET /search?q=rust#top HTTP/1.1\r\nHost: example.com\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.path, "/search?q=rust#top");
    assert_eq!(parsed.target_path(), "/search");
}

#[test]
fn test_parse_versionless_request_line() {
    let req = b"GET /index.html\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.path, "/index.html");
    assert_eq!(parsed.version, "");
}

#[test]
fn test_parse_trailing_space_after_target() {
    let req = b"GET /index.html \r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.path, "/index.html");
    assert_eq!(parsed.version, "");
}

#[test]
fn test_parse_incomplete_request_missing_blank_line() {
    let req = b"GET / HTTP/1.1\r\nHost: example.com\r\n";
    let result = parse_http_request(req);

    assert!(matches!(result, Err(ParseError::Incomplete)));
}

#[test]
fn test_parse_missing_target() {
    let req = b"GET\r\n\r\n";
    assert!(matches!(parse_http_request(req), Err(ParseError::MissingTarget)));
}

#[test]
fn test_parse_invalid_utf8_head() {
    let req = b"GET /\xff\xfe HTTP/1.1\r\n\r\n";
    assert!(matches!(parse_http_request(req), Err(ParseError::InvalidEncoding)));
}

#[test]
fn test_parse_unknown_method_is_not_an_error() {
    let req = b"BREW /pot HTTP/1.1\r\n\r\n";
    let (parsed, _) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::Unsupported);
    assert_eq!(parsed.raw_method, "BREW");
    assert_eq!(parsed.path, "/pot");
}

#[test]
fn test_parse_various_http_methods() {
    let methods = vec![
        ("GET", Method::GET),
        ("HEAD", Method::HEAD),
        ("POST", Method::POST),
        ("PUT", Method::PUT),
        ("DELETE", Method::DELETE),
        ("OPTIONS", Method::Unsupported),
        ("get", Method::Unsupported),
    ];

    for (method_str, expected_method) in methods {
        let req = format!("{} / HTTP/1.1\r\n\r\n", method_str);
        let (parsed, _) = parse_http_request(req.as_bytes()).unwrap();
        assert_eq!(parsed.method, expected_method);
    }
}

#[test]
fn test_parse_ignores_body() {
    let req = b"POST /upload HTTP/1.1\r\nContent-Length: 4\r\n\r\n\x00\x01\x02\x03";
    let (parsed, consumed) = parse_http_request(req).unwrap();

    assert_eq!(parsed.method, Method::POST);
    assert_eq!(consumed, req.len() - 4);
}

#[test]
fn test_percent_decode_valid_escapes() {
    assert_eq!(&*percent_decode(b"/a%20b"), b"/a b");
    assert_eq!(&*percent_decode(b"%41%42%43"), b"ABC");
    assert_eq!(&*percent_decode(b"%e2%9c%93"), "\u{2713}".as_bytes());
}

#[test]
fn test_percent_decode_every_byte() {
    for byte in 0u8..=255 {
        let encoded = format!("%{:02X}", byte);
        assert_eq!(&*percent_decode(encoded.as_bytes()), &[byte]);
    }
}

#[test]
fn test_percent_decode_passes_invalid_sequences() {
    assert_eq!(&*percent_decode(b"100%"), b"100%");
    assert_eq!(&*percent_decode(b"%zz"), b"%zz");
    assert_eq!(&*percent_decode(b"%4g"), b"%4g");
    assert_eq!(&*percent_decode(b"%%41"), b"%A");
}

#[test]
fn test_percent_decode_is_idempotent_on_plain_text() {
    for text in ["/plain/path.txt", "/with space", "/ünïcödé", ""] {
        let once = percent_decode(text.as_bytes()).into_owned();
        let twice = percent_decode(&once).into_owned();
        assert_eq!(once, text.as_bytes());
        assert_eq!(twice, once);
    }
}
