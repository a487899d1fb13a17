use std::fmt;

/// Status codes the file server can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok,
    MovedPermanently,
    NotModified,
    BadRequest,
    NotFound,
    RequestHeaderFieldsTooLarge,
    NotImplemented,
    HttpVersionNotSupported,
}

impl StatusCode {
    pub fn as_u16(&self) -> u16 {
        match self {
            StatusCode::Ok => 200,
            StatusCode::MovedPermanently => 301,
            StatusCode::NotModified => 304,
            StatusCode::BadRequest => 400,
            StatusCode::NotFound => 404,
            StatusCode::RequestHeaderFieldsTooLarge => 431,
            StatusCode::NotImplemented => 501,
            StatusCode::HttpVersionNotSupported => 505,
        }
    }

    pub fn reason_phrase(&self) -> &'static str {
        match self {
            StatusCode::Ok => "OK",
            StatusCode::MovedPermanently => "Moved Permanently",
            StatusCode::NotModified => "Not Modified",
            StatusCode::BadRequest => "Bad Request",
            StatusCode::NotFound => "Not Found",
            StatusCode::RequestHeaderFieldsTooLarge => "Request Header Fields Too Large",
            StatusCode::NotImplemented => "Not Implemented",
            StatusCode::HttpVersionNotSupported => "HTTP Version Not Supported",
        }
    }

    /// Longer text shown on generated error pages.
    pub fn explanation(&self) -> &'static str {
        match self {
            StatusCode::Ok => "Request fulfilled, document follows.",
            StatusCode::MovedPermanently => "Object moved permanently.",
            StatusCode::NotModified => "Document has not changed since given time.",
            StatusCode::BadRequest => "Bad request syntax or unsupported method.",
            StatusCode::NotFound => "Nothing matches the given URI.",
            StatusCode::RequestHeaderFieldsTooLarge => {
                "The server is unwilling to process the request because its header fields are too large."
            }
            StatusCode::NotImplemented => "Server does not support this operation.",
            StatusCode::HttpVersionNotSupported => "Cannot fulfill request.",
        }
    }

    /// 304 responses never carry a body, whatever the method.
    pub fn allows_body(&self) -> bool {
        !matches!(self, StatusCode::NotModified)
    }

    pub fn status_line(&self) -> String {
        format!("HTTP/1.1 {}", self)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.as_u16(), self.reason_phrase())
    }
}
