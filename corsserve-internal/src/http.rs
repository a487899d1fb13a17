use std::{
    fs,
    io::{Read, Write},
    net::SocketAddr,
    path::Path,
    thread,
    time::SystemTime,
};

use chrono::{DateTime, Utc};

use crate::{
    config::{Config, HttpListener},
    headers::HeaderMap,
    mount::{self, Resolved},
    request::{self, Request, RequestError},
    response::Response,
    status::StatusCode,
};

/// Accept loop: one thread per connection, no pool, until shut down.
pub fn start_http(http: HttpListener) {
    let shutdown = http.shutdown_handle();

    let mut incoming = http.get_stream();

    while !shutdown.is_shutdown() {
        let Some(stream) = incoming.next() else {
            break;
        };
        // The wake-up connection from `Shutdown::shutdown` lands here.
        if shutdown.is_shutdown() {
            break;
        }

        let conn = match stream {
            Ok(conn) => conn,
            Err(_e) => {
                #[cfg(feature = "log")]
                log::warn!("failed to accept connection: {}", _e);
                continue;
            }
        };
        let config = http.config.clone();
        let peer = conn.peer_addr().ok();

        thread::spawn(move || {
            let mut conn = conn;
            parse_request(&mut conn, &config, peer);
        });
    }

    #[cfg(feature = "log")]
    log::debug!("accept loop stopped");
}

/// Handles exactly one request on `conn`. Errors stay contained to this
/// connection.
pub fn parse_request<P: Read + Write>(conn: &mut P, config: &Config, peer: Option<SocketAddr>) {
    let raw = match request::read_head(conn) {
        Ok(Some(raw)) => raw,
        Ok(None) => return,
        Err(RequestError::Io(_e)) => {
            #[cfg(feature = "log")]
            log::warn!("failed reading request: {}", _e);
            return;
        }
        Err(e) => {
            let res = request_error_response(&e);
            log_request(peer, "-", &res);
            send(conn, &res, config, false);
            return;
        }
    };

    let req = match Request::parse(&raw.head) {
        Ok(req) => req,
        Err(e) => {
            let res = request_error_response(&e);
            let line = String::from_utf8_lossy(&raw.head);
            log_request(peer, line.lines().next().unwrap_or("-"), &res);
            send(conn, &res, config, false);
            return;
        }
    };

    if let Err(_e) = request::drain_body(conn, &req, raw.rest.len()) {
        #[cfg(feature = "log")]
        log::warn!("failed draining request body: {}", _e);
        return;
    }

    let res = build_res(&req, config);
    log_request(peer, &req.get_status_line().join(" "), &res);
    send(conn, &res, config, req.method() == "HEAD");
}

fn send<P: Write>(conn: &mut P, res: &Response, config: &Config, head_only: bool) {
    let mut leading = config.get_headers().clone();
    leading.set("Server", concat!("corsserve/", env!("CARGO_PKG_VERSION")));
    leading.set("Date", http_date(SystemTime::now()));
    leading.set("Connection", "close");

    if let Err(_e) = res.send(conn, &leading, head_only) {
        #[cfg(feature = "log")]
        log::warn!("failed writing response: {}", _e);
    }
}

fn request_error_response(e: &RequestError) -> Response {
    let status = match e {
        RequestError::VersionErr(_) => StatusCode::HttpVersionNotSupported,
        RequestError::TooLarge => StatusCode::RequestHeaderFieldsTooLarge,
        _ => StatusCode::BadRequest,
    };
    Response::error(status, e.to_string())
}

/// Builds the response for a parsed request: GET and HEAD are served from
/// the mount point, every other method is unsupported.
pub fn build_res(req: &Request, config: &Config) -> Response {
    match req.method() {
        "GET" | "HEAD" => {}
        method => {
            return Response::error(
                StatusCode::NotImplemented,
                format!("Unsupported method ('{method}')"),
            )
        }
    }

    let Some(root) = config.get_mount() else {
        return Response::error(StatusCode::NotFound, "File not found");
    };

    match mount::resolve(root, req.target()) {
        Resolved::File(path) => serve_file(&path, req.get_headers()),
        Resolved::Listing { dir, url_path } => match mount::list_directory(&dir, &url_path) {
            Ok(page) => Response::new()
                .body(page.into_bytes())
                .mime("text/html; charset=utf-8"),
            Err(_) => Response::error(StatusCode::NotFound, "No permission to list directory"),
        },
        Resolved::Redirect(location) => Response::redirect(location),
        Resolved::NotFound => Response::error(StatusCode::NotFound, "File not found"),
    }
}

fn serve_file(path: &Path, req_headers: &HeaderMap) -> Response {
    let modified = fs::metadata(path).and_then(|m| m.modified()).ok();

    if let Some(modified) = modified {
        if not_modified_since(modified, req_headers) {
            return Response::new()
                .status(StatusCode::NotModified)
                .header("Last-Modified", http_date(modified));
        }
    }

    let body = match fs::read(path) {
        Ok(body) => body,
        Err(_e) => {
            #[cfg(feature = "log")]
            log::debug!("cannot read {}: {}", path.display(), _e);
            return Response::error(StatusCode::NotFound, "File not found");
        }
    };

    let mime = guess_mime(path, &body);
    let mut res = Response::new().mime(mime);
    if let Some(modified) = modified {
        res = res.header("Last-Modified", http_date(modified));
    }
    res.body(body)
}

/// Extension first, then magic bytes, then a generic binary type.
fn guess_mime(path: &Path, body: &[u8]) -> String {
    if let Some(mime) = mime_guess::from_path(path).first_raw() {
        return mime.to_string();
    }
    match infer::get(body) {
        Some(kind) => kind.mime_type().to_string(),
        None => "application/octet-stream".to_string(),
    }
}

/// `If-Modified-Since` only counts when `If-None-Match` is absent.
fn not_modified_since(modified: SystemTime, req_headers: &HeaderMap) -> bool {
    if req_headers.contains("If-None-Match") {
        return false;
    }
    let Some(since) = req_headers
        .get("If-Modified-Since")
        .and_then(|v| DateTime::parse_from_rfc2822(v.trim()).ok())
    else {
        return false;
    };
    let modified: DateTime<Utc> = modified.into();
    modified.timestamp() <= since.timestamp()
}

/// IMF-fixdate, e.g. `Sun, 06 Nov 1994 08:49:37 GMT`.
pub fn http_date(time: SystemTime) -> String {
    let time: DateTime<Utc> = time.into();
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

#[allow(unused_variables)]
fn log_request(peer: Option<SocketAddr>, line: &str, res: &Response) {
    #[cfg(feature = "log")]
    log::info!(
        "{} - \"{}\" {} {}",
        peer.map_or_else(|| "-".to_string(), |p| p.ip().to_string()),
        line,
        res.status.as_u16(),
        res.body_len()
    );
}
