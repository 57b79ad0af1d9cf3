/// HTTP request methods.
///
/// The server serves GET and HEAD. POST, PUT and DELETE are recognized so
/// they can be answered with 405; any other verb is kept as `Unsupported`
/// and answered with 501 by the connection handler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    /// GET - Retrieve a resource
    #[default]
    GET,
    /// HEAD - Like GET but without the response body
    HEAD,
    /// POST - Create or submit data
    POST,
    /// PUT - Replace a resource
    PUT,
    /// DELETE - Delete a resource
    DELETE,
    /// Any verb outside the set above
    Unsupported,
}

impl Method {
    /// Parses an HTTP method from a string.
    ///
    /// Method names are case-sensitive. Unknown verbs are not an error,
    /// they map to [`Method::Unsupported`].
    ///
    /// # Example
    ///
    /// ```
    /// # use staticd::http::request::Method;
    /// assert_eq!(Method::parse("GET"), Method::GET);
    /// assert_eq!(Method::parse("get"), Method::Unsupported);
    /// ```
    pub fn parse(s: &str) -> Self {
        match s {
            "GET" => Method::GET,
            "HEAD" => Method::HEAD,
            "POST" => Method::POST,
            "PUT" => Method::PUT,
            "DELETE" => Method::DELETE,
            _ => Method::Unsupported,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::HEAD => "HEAD",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::DELETE => "DELETE",
            Method::Unsupported => "-",
        }
    }
}

/// The request headers the server looks at. Everything else is dropped
/// during parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KnownHeader {
    From,
    Host,
    UserAgent,
    Accept,
    Connection,
    IfModifiedSince,
}

impl KnownHeader {
    /// Matches a header name case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        const NAMES: [(&str, KnownHeader); 6] = [
            ("from", KnownHeader::From),
            ("host", KnownHeader::Host),
            ("user-agent", KnownHeader::UserAgent),
            ("accept", KnownHeader::Accept),
            ("connection", KnownHeader::Connection),
            ("if-modified-since", KnownHeader::IfModifiedSince),
        ];
        NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, h)| *h)
    }
}

/// A parsed request head.
///
/// All fields borrow from the receive buffer the request was parsed from,
/// so a `Request` cannot outlive the connection that produced it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Request<'a> {
    /// The HTTP method
    pub method: Method,
    /// Verb exactly as the client sent it, kept for logging
    pub raw_method: &'a str,
    /// Request target, still percent-encoded
    pub path: &'a str,
    /// Protocol version, empty for a version-less request line
    pub version: &'a str,
    pub from: Option<&'a str>,
    pub host: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub accept: Option<&'a str>,
    pub connection: Option<&'a str>,
    pub if_modified_since: Option<&'a str>,
}

impl<'a> Request<'a> {
    /// Returns a recognized header value.
    pub fn header(&self, header: KnownHeader) -> Option<&'a str> {
        match header {
            KnownHeader::From => self.from,
            KnownHeader::Host => self.host,
            KnownHeader::UserAgent => self.user_agent,
            KnownHeader::Accept => self.accept,
            KnownHeader::Connection => self.connection,
            KnownHeader::IfModifiedSince => self.if_modified_since,
        }
    }

    /// Stores a header value unless one was already recorded.
    pub(crate) fn set_header_once(&mut self, header: KnownHeader, value: &'a str) {
        let slot = match header {
            KnownHeader::From => &mut self.from,
            KnownHeader::Host => &mut self.host,
            KnownHeader::UserAgent => &mut self.user_agent,
            KnownHeader::Accept => &mut self.accept,
            KnownHeader::Connection => &mut self.connection,
            KnownHeader::IfModifiedSince => &mut self.if_modified_since,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }

    /// Whether the response to this request must omit its body.
    pub fn is_head(&self) -> bool {
        self.method == Method::HEAD
    }

    /// The request target with any fragment and query removed.
    ///
    /// The fragment is cut at the first `#`, then the query at the first
    /// `?`, before any percent-decoding takes place.
    pub fn target_path(&self) -> &'a str {
        let path = self.path.split('#').next().unwrap_or(self.path);
        path.split('?').next().unwrap_or(path)
    }
}
