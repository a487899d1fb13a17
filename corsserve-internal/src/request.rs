use std::io::{self, Read};

use crate::headers::HeaderMap;

/// Largest request head accepted before answering 431.
pub const MAX_HEAD_SIZE: usize = 64 * 1024;

/// Largest request body drained before the response is written. Anything
/// past it stays unread, so the client may see a reset after the status line.
pub const MAX_DRAINED_BODY: u64 = 16 * 1024 * 1024;

/// Struct containing data on a single request.
///
/// Only the head is kept: the server never looks at request bodies.
#[derive(Clone, Debug)]
pub struct Request {
    status_line: Vec<String>,
    headers: HeaderMap,
}

impl Request {
    pub fn new(status_line: Vec<String>, headers: HeaderMap) -> Request {
        Request {
            status_line,
            headers,
        }
    }

    /// Parses a request head (request line and header lines).
    pub fn parse(head: &[u8]) -> Result<Request, RequestError> {
        let text = std::str::from_utf8(head).map_err(|_| RequestError::StatusLineErr)?;
        let mut lines = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l));

        let line = lines.next().ok_or(RequestError::StatusLineErr)?;
        let status_line: Vec<String> = line.split_whitespace().map(String::from).collect();
        if status_line.len() != 3 {
            return Err(RequestError::StatusLineErr);
        }
        check_version(&status_line[2])?;

        let mut headers = HeaderMap::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            let (name, value) = line.split_once(':').ok_or(RequestError::HeadersErr)?;
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(RequestError::HeadersErr);
            }
            headers.set(name, value.trim());
        }

        Ok(Request::new(status_line, headers))
    }

    /// Get status line of request
    pub fn get_status_line(&self) -> &Vec<String> {
        &self.status_line
    }

    pub fn method(&self) -> &str {
        &self.status_line[0]
    }

    /// Raw request target, query and fragment included.
    pub fn target(&self) -> &str {
        &self.status_line[1]
    }

    pub fn version(&self) -> &str {
        &self.status_line[2]
    }

    pub fn get_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn content_length(&self) -> Option<u64> {
        self.header("Content-Length")?.trim().parse().ok()
    }
}

/// Any `HTTP/<major>.<minor>` below 2.0 is served as HTTP/1.1.
fn check_version(version: &str) -> Result<(), RequestError> {
    let digits = version
        .strip_prefix("HTTP/")
        .ok_or(RequestError::StatusLineErr)?;
    let (major, minor) = digits.split_once('.').ok_or(RequestError::StatusLineErr)?;
    match (major.parse::<u32>(), minor.parse::<u32>()) {
        (Ok(major), Ok(_)) if major < 2 => Ok(()),
        (Ok(_), Ok(_)) => Err(RequestError::VersionErr(version.to_string())),
        _ => Err(RequestError::StatusLineErr),
    }
}

/// Bytes read off the socket up to the end of the request head.
#[derive(Debug)]
pub struct RawHead {
    pub head: Vec<u8>,
    /// Bytes that arrived after the head, i.e. the start of a body.
    pub rest: Vec<u8>,
}

/// Reads until the blank line ending the head. Returns `None` when the peer
/// closed the connection without sending anything.
pub fn read_head<P: Read>(stream: &mut P) -> Result<Option<RawHead>, RequestError> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        if let Some(end) = find_head_end(&buf) {
            let rest = buf.split_off(end);
            return Ok(Some(RawHead { head: buf, rest }));
        }
        if buf.len() > MAX_HEAD_SIZE {
            return Err(RequestError::TooLarge);
        }

        let n = match stream.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        };
        if n == 0 {
            // Peer stopped sending: parse whatever arrived.
            return Ok(if buf.is_empty() {
                None
            } else {
                Some(RawHead {
                    head: buf,
                    rest: Vec::new(),
                })
            });
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn find_head_end(buf: &[u8]) -> Option<usize> {
    let crlf = buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4);
    let lf = buf.windows(2).position(|w| w == b"\n\n").map(|i| i + 2);
    match (crlf, lf) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

/// Discards a request body announced by `Content-Length`, so closing the
/// socket does not reset the connection before the client reads the response.
pub fn drain_body<P: Read>(stream: &mut P, req: &Request, already_read: usize) -> io::Result<()> {
    let remaining = req
        .content_length()
        .unwrap_or(0)
        .saturating_sub(already_read as u64)
        .min(MAX_DRAINED_BODY);
    if remaining > 0 {
        io::copy(&mut stream.take(remaining), &mut io::sink())?;
    }
    Ok(())
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RequestError {
    #[error("failed to parse status line")]
    StatusLineErr,
    #[error("failed to parse headers")]
    HeadersErr,
    #[error("unsupported HTTP version ({0})")]
    VersionErr(String),
    #[error("request head too large")]
    TooLarge,
    #[error(transparent)]
    Io(#[from] io::Error),
}
