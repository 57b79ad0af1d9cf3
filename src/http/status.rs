//! HTTP status code table.
//!
//! Every [`StatusCode`] variant indexes exactly one [`StatusEntry`] in a
//! static table, so a status can always be rendered without bounds checks
//! at runtime.

/// Numeric code, its three-digit string form and the reason phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusEntry {
    pub code: u16,
    pub code_str: &'static str,
    pub reason: &'static str,
}

/// HTTP status codes known to the server.
///
/// The discriminant of each variant is its index into the status table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusCode {
    Continue,
    SwitchingProtocols,
    /// 200 OK
    Ok,
    Created,
    Accepted,
    NonAuthoritativeInformation,
    NoContent,
    ResetContent,
    PartialContent,
    MultipleChoices,
    /// 301 Moved Permanently
    MovedPermanently,
    Found,
    SeeOther,
    /// 304 Not Modified
    NotModified,
    UseProxy,
    TemporaryRedirect,
    /// 400 Bad Request
    BadRequest,
    Unauthorized,
    PaymentRequired,
    /// 403 Forbidden
    Forbidden,
    /// 404 Not Found
    NotFound,
    /// 405 Method Not Allowed
    MethodNotAllowed,
    NotAcceptable,
    ProxyAuthenticationRequired,
    RequestTimeout,
    Conflict,
    Gone,
    LengthRequired,
    PreconditionFailed,
    ContentTooLarge,
    UriTooLong,
    UnsupportedMediaType,
    RangeNotSatisfiable,
    ExpectationFailed,
    /// 431 Request Header Fields Too Large
    RequestHeaderFieldsTooLarge,
    /// 500 Internal Server Error
    InternalServerError,
    /// 501 Not Implemented
    NotImplemented,
    BadGateway,
    /// 503 Service Unavailable
    ServiceUnavailable,
    GatewayTimeout,
    HttpVersionNotSupported,
}

const fn entry(code: u16, code_str: &'static str, reason: &'static str) -> StatusEntry {
    StatusEntry {
        code,
        code_str,
        reason,
    }
}

static STATUS_TABLE: [StatusEntry; StatusCode::COUNT] = [
    entry(100, "100", "Continue"),
    entry(101, "101", "Switching Protocols"),
    entry(200, "200", "OK"),
    entry(201, "201", "Created"),
    entry(202, "202", "Accepted"),
    entry(203, "203", "Non-Authoritative Information"),
    entry(204, "204", "No Content"),
    entry(205, "205", "Reset Content"),
    entry(206, "206", "Partial Content"),
    entry(300, "300", "Multiple Choices"),
    entry(301, "301", "Moved Permanently"),
    entry(302, "302", "Found"),
    entry(303, "303", "See Other"),
    entry(304, "304", "Not Modified"),
    entry(305, "305", "Use Proxy"),
    entry(307, "307", "Temporary Redirect"),
    entry(400, "400", "Bad Request"),
    entry(401, "401", "Unauthorized"),
    entry(402, "402", "Payment Required"),
    entry(403, "403", "Forbidden"),
    entry(404, "404", "Not Found"),
    entry(405, "405", "Method Not Allowed"),
    entry(406, "406", "Not Acceptable"),
    entry(407, "407", "Proxy Authentication Required"),
    entry(408, "408", "Request Timeout"),
    entry(409, "409", "Conflict"),
    entry(410, "410", "Gone"),
    entry(411, "411", "Length Required"),
    entry(412, "412", "Precondition Failed"),
    entry(413, "413", "Content Too Large"),
    entry(414, "414", "URI Too Long"),
    entry(415, "415", "Unsupported Media Type"),
    entry(416, "416", "Range Not Satisfiable"),
    entry(417, "417", "Expectation Failed"),
    entry(431, "431", "Request Header Fields Too Large"),
    entry(500, "500", "Internal Server Error"),
    entry(501, "501", "Not Implemented"),
    entry(502, "502", "Bad Gateway"),
    entry(503, "503", "Service Unavailable"),
    entry(504, "504", "Gateway Timeout"),
    entry(505, "505", "HTTP Version Not Supported"),
];

impl StatusCode {
    /// Number of variants, and the length of the status table.
    pub const COUNT: usize = StatusCode::HttpVersionNotSupported as usize + 1;

    /// Every status code in table order.
    pub const ALL: [StatusCode; StatusCode::COUNT] = [
        StatusCode::Continue,
        StatusCode::SwitchingProtocols,
        StatusCode::Ok,
        StatusCode::Created,
        StatusCode::Accepted,
        StatusCode::NonAuthoritativeInformation,
        StatusCode::NoContent,
        StatusCode::ResetContent,
        StatusCode::PartialContent,
        StatusCode::MultipleChoices,
        StatusCode::MovedPermanently,
        StatusCode::Found,
        StatusCode::SeeOther,
        StatusCode::NotModified,
        StatusCode::UseProxy,
        StatusCode::TemporaryRedirect,
        StatusCode::BadRequest,
        StatusCode::Unauthorized,
        StatusCode::PaymentRequired,
        StatusCode::Forbidden,
        StatusCode::NotFound,
        StatusCode::MethodNotAllowed,
        StatusCode::NotAcceptable,
        StatusCode::ProxyAuthenticationRequired,
        StatusCode::RequestTimeout,
        StatusCode::Conflict,
        StatusCode::Gone,
        StatusCode::LengthRequired,
        StatusCode::PreconditionFailed,
        StatusCode::ContentTooLarge,
        StatusCode::UriTooLong,
        StatusCode::UnsupportedMediaType,
        StatusCode::RangeNotSatisfiable,
        StatusCode::ExpectationFailed,
        StatusCode::RequestHeaderFieldsTooLarge,
        StatusCode::InternalServerError,
        StatusCode::NotImplemented,
        StatusCode::BadGateway,
        StatusCode::ServiceUnavailable,
        StatusCode::GatewayTimeout,
        StatusCode::HttpVersionNotSupported,
    ];

    /// Returns the table entry for this status.
    pub fn entry(self) -> &'static StatusEntry {
        &STATUS_TABLE[self as usize]
    }

    /// Returns the numeric HTTP status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use staticd::http::status::StatusCode;
    /// assert_eq!(StatusCode::Ok.as_u16(), 200);
    /// assert_eq!(StatusCode::NotFound.as_u16(), 404);
    /// ```
    pub fn as_u16(self) -> u16 {
        self.entry().code
    }

    /// Returns the three-digit code as it appears on the status line.
    pub fn as_str(self) -> &'static str {
        self.entry().code_str
    }

    /// Returns the standard HTTP reason phrase for this status code.
    ///
    /// # Example
    ///
    /// ```
    /// # use staticd::http::status::StatusCode;
    /// assert_eq!(StatusCode::Ok.reason_phrase(), "OK");
    /// assert_eq!(StatusCode::NotModified.reason_phrase(), "Not Modified");
    /// ```
    pub fn reason_phrase(self) -> &'static str {
        self.entry().reason
    }

    /// Looks up a status by its numeric code.
    pub fn from_u16(code: u16) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_u16() == code)
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.as_str(), self.reason_phrase())
    }
}
