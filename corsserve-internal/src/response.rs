use std::io::{self, Write};

use crate::{headers::HeaderMap, status::StatusCode};

#[derive(Clone, Debug)]
pub struct Response {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub mime: Option<String>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new()
    }
}

impl Response {
    pub fn new() -> Response {
        Response {
            status: StatusCode::Ok,
            headers: HeaderMap::new(),
            body: None,
            mime: None,
        }
    }

    /// HTML error page in the style of a stock static file server.
    pub fn error<P: AsRef<str>>(status: StatusCode, message: P) -> Response {
        let page = format!(
            "<!DOCTYPE HTML>\n\
             <html lang=\"en\">\n\
             <head>\n\
             <meta charset=\"utf-8\">\n\
             <title>Error response</title>\n\
             </head>\n\
             <body>\n\
             <h1>Error response</h1>\n\
             <p>Error code: {code}</p>\n\
             <p>Message: {message}.</p>\n\
             <p>Error code explanation: {code} - {explanation}</p>\n\
             </body>\n\
             </html>\n",
            code = status.as_u16(),
            message = escape_html(message.as_ref()),
            explanation = status.explanation(),
        );
        Response::new()
            .status(status)
            .body(page.into_bytes())
            .mime("text/html;charset=utf-8")
    }

    pub fn redirect<P: Into<String>>(location: P) -> Response {
        Response::new()
            .status(StatusCode::MovedPermanently)
            .header("Location", location.into())
            .body(Vec::new())
    }

    pub fn status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    pub fn header(mut self, key: impl ToString, val: impl ToString) -> Self {
        self.headers.set(key, val);
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn mime<P>(mut self, mime: P) -> Self
    where
        P: Into<String>,
    {
        self.mime = Some(mime.into());
        self
    }

    pub fn body_len(&self) -> usize {
        self.body.as_ref().map_or(0, Vec::len)
    }

    /// Serializes the response. `leading` headers are written before any of
    /// the response's own; the body is skipped for HEAD and for statuses that
    /// never carry one, but `Content-Length` still describes it.
    pub fn send<P: Write>(&self, sock: &mut P, leading: &HeaderMap, head_only: bool) -> io::Result<()> {
        let mut out = format!("{}\r\n", self.status.status_line());

        for (name, value) in leading.iter() {
            if !self.headers.contains(name) {
                out.push_str(&format!("{name}: {value}\r\n"));
            }
        }
        if let Some(mime) = &self.mime {
            if !self.headers.contains("Content-Type") {
                out.push_str(&format!("Content-Type: {mime}\r\n"));
            }
        }
        for (name, value) in self.headers.iter() {
            out.push_str(&format!("{name}: {value}\r\n"));
        }
        if self.status.allows_body() && !self.headers.contains("Content-Length") {
            out.push_str(&format!("Content-Length: {}\r\n", self.body_len()));
        }
        out.push_str("\r\n");

        #[cfg(feature = "log")]
        log::trace!("response head: {:?}", out);

        sock.write_all(out.as_bytes())?;
        if !head_only && self.status.allows_body() {
            if let Some(body) = &self.body {
                sock.write_all(body)?;
            }
        }
        sock.flush()
    }
}

pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}
