use staticd::http::request::{KnownHeader, Method, Request};

#[test]
fn test_request_header_retrieval() {
    let req = Request {
        method: Method::GET,
        raw_method: "GET",
        path: "/",
        version: "HTTP/1.1",
        host: Some("example.com"),
        if_modified_since: Some("Sun, 06 Nov 1994 08:49:37 GMT"),
        ..Request::default()
    };

    assert_eq!(req.header(KnownHeader::Host), Some("example.com"));
    assert_eq!(
        req.header(KnownHeader::IfModifiedSince),
        Some("Sun, 06 Nov 1994 08:49:37 GMT")
    );
    assert_eq!(req.header(KnownHeader::Accept), None);
}

#[test]
fn test_known_header_names() {
    assert_eq!(KnownHeader::from_name("From"), Some(KnownHeader::From));
    assert_eq!(KnownHeader::from_name("HOST"), Some(KnownHeader::Host));
    assert_eq!(KnownHeader::from_name("user-agent"), Some(KnownHeader::UserAgent));
    assert_eq!(KnownHeader::from_name("Accept"), Some(KnownHeader::Accept));
    assert_eq!(KnownHeader::from_name("Connection"), Some(KnownHeader::Connection));
    assert_eq!(
        KnownHeader::from_name("If-Modified-Since"),
        Some(KnownHeader::IfModifiedSince)
    );
    assert_eq!(KnownHeader::from_name("Content-Length"), None);
}

#[test]
fn test_target_path_strips_fragment_then_query() {
    let mut req = Request::default();

    req.path = "/docs/page.html?x=1";
    assert_eq!(req.target_path(), "/docs/page.html");

    req.path = "/docs/page.html#intro";
    assert_eq!(req.target_path(), "/docs/page.html");

    req.path = "/a#frag?not-a-query";
    assert_eq!(req.target_path(), "/a");

    req.path = "/a?q=%23#frag";
    assert_eq!(req.target_path(), "/a");
}

#[test]
fn test_target_path_keeps_encoded_delimiters() {
    let req = Request {
        path: "/file%3Fname%23x",
        ..Request::default()
    };
    assert_eq!(req.target_path(), "/file%3Fname%23x");
}

#[test]
fn test_is_head() {
    let head = Request {
        method: Method::HEAD,
        ..Request::default()
    };
    let get = Request::default();

    assert!(head.is_head());
    assert!(!get.is_head());
}

#[test]
fn test_method_as_str() {
    assert_eq!(Method::GET.as_str(), "GET");
    assert_eq!(Method::DELETE.as_str(), "DELETE");
    assert_eq!(Method::parse("DELETE"), Method::DELETE);
}
