use std::{
    fs,
    io::{self, Read, Write},
    net::TcpStream,
    sync::{Arc, Mutex},
    thread::{self, JoinHandle},
};

use corsserve::prelude::*;
use tempfile::TempDir;

struct TestServer {
    port: u16,
    shutdown: Shutdown,
    handle: Option<JoinHandle<()>>,
    root: TempDir,
}

impl TestServer {
    fn start() -> TestServer {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("index.html"), "<!doctype html><h1>preview</h1>").unwrap();
        fs::write(root.path().join("app.js"), "fetch('http://localhost:3000/api')").unwrap();
        fs::write(root.path().join("data.bin"), [0u8, 159, 146, 150, 255]).unwrap();
        fs::create_dir(root.path().join("assets")).unwrap();
        fs::write(root.path().join("assets/site.css"), "h1 { color: red }").unwrap();

        let running = Server::new(root.path())
            .port(0)
            .browser(NoBrowser)
            .bind()
            .unwrap();
        let port = running.local_addr().unwrap().port();
        let shutdown = running.shutdown_handle();
        let handle = thread::spawn(move || running.serve());

        TestServer {
            port,
            shutdown,
            handle: Some(handle),
            root,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://127.0.0.1:{}{}", self.port, path)
    }

    /// Sends `raw` verbatim and reads until the server closes the connection.
    fn raw(&self, raw: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", self.port)).unwrap();
        stream.write_all(raw.as_bytes()).unwrap();
        let mut out = Vec::new();
        stream.read_to_end(&mut out).unwrap();
        String::from_utf8_lossy(&out).into_owned()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.shutdown.shutdown();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn assert_cors(headers: &std::collections::HashMap<String, String>) {
    assert_eq!(headers.get("access-control-allow-origin").map(String::as_str), Some("*"));
    assert_eq!(
        headers.get("access-control-allow-methods").map(String::as_str),
        Some("GET, POST, OPTIONS")
    );
    assert_eq!(
        headers.get("access-control-allow-headers").map(String::as_str),
        Some("Content-Type")
    );
}

#[test]
fn get_returns_exact_file_bytes() {
    let server = TestServer::start();
    for (path, file) in [
        ("/app.js", "app.js"),
        ("/data.bin", "data.bin"),
        ("/assets/site.css", "assets/site.css"),
    ] {
        let res = minreq::get(server.url(path)).send().unwrap();
        assert_eq!(res.status_code, 200, "{path}");
        assert_eq!(res.as_bytes(), fs::read(server.root.path().join(file)).unwrap());
        assert_cors(&res.headers);
    }
}

#[test]
fn content_type_follows_extension() {
    let server = TestServer::start();
    let res = minreq::get(server.url("/assets/site.css")).send().unwrap();
    assert_eq!(res.headers.get("content-type").map(String::as_str), Some("text/css"));
    let res = minreq::get(server.url("/app.js")).send().unwrap();
    assert!(res.headers["content-type"].contains("javascript"));
}

#[test]
fn root_serves_index_html() {
    let server = TestServer::start();
    let res = minreq::get(server.url("/")).send().unwrap();
    assert_eq!(res.status_code, 200);
    assert_eq!(res.as_str().unwrap(), "<!doctype html><h1>preview</h1>");
}

#[test]
fn missing_file_is_404_with_cors() {
    let server = TestServer::start();
    let res = minreq::get(server.url("/nope.js")).send().unwrap();
    assert_eq!(res.status_code, 404);
    assert_cors(&res.headers);
}

#[test]
fn post_is_501_with_cors() {
    let server = TestServer::start();
    let res = minreq::post(server.url("/app.js"))
        .with_header("Content-Type", "application/json")
        .with_body("{\"a\":1}")
        .send()
        .unwrap();
    assert_eq!(res.status_code, 501);
    assert_cors(&res.headers);
}

#[test]
fn options_on_missing_path_carries_cors() {
    let server = TestServer::start();
    let res = server.raw("OPTIONS /does/not/exist HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert!(res.starts_with("HTTP/1.1 501 "), "{res}");
    assert!(res.contains("\r\nAccess-Control-Allow-Origin: *\r\n"));
    assert!(res.contains("\r\nAccess-Control-Allow-Methods: GET, POST, OPTIONS\r\n"));
    assert!(res.contains("\r\nAccess-Control-Allow-Headers: Content-Type\r\n"));
}

#[test]
fn traversal_is_never_served() {
    let server = TestServer::start();
    for target in [
        "/../../etc/passwd",
        "/assets/../../../etc/passwd",
        "/%2e%2e/%2e%2e/etc/passwd",
    ] {
        let res = server.raw(&format!("GET {target} HTTP/1.1\r\nHost: localhost\r\n\r\n"));
        assert!(res.starts_with("HTTP/1.1 404 Not Found\r\n"), "{target}: {res}");
        assert!(!res.contains("root:"));
    }
}

#[test]
fn directory_without_slash_redirects() {
    let server = TestServer::start();
    let res = server.raw("GET /assets HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert!(res.starts_with("HTTP/1.1 301 Moved Permanently\r\n"), "{res}");
    assert!(res.contains("\r\nLocation: /assets/\r\n"));
    assert!(res.contains("\r\nAccess-Control-Allow-Origin: *\r\n"));
}

#[test]
fn directory_without_index_is_listed() {
    let server = TestServer::start();
    let res = minreq::get(server.url("/assets/")).send().unwrap();
    assert_eq!(res.status_code, 200);
    let page = res.as_str().unwrap();
    assert!(page.contains("Directory listing for /assets/"));
    assert!(page.contains("href=\"site.css\""));
}

#[test]
fn head_sends_headers_only() {
    let server = TestServer::start();
    let res = server.raw("HEAD /app.js HTTP/1.1\r\nHost: localhost\r\n\r\n");
    let len = fs::metadata(server.root.path().join("app.js")).unwrap().len();
    assert!(res.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(res.contains(&format!("\r\nContent-Length: {len}\r\n")));
    assert!(res.ends_with("\r\n\r\n"));
}

#[test]
fn concurrent_clients_are_served() {
    let server = TestServer::start();
    let url = server.url("/app.js");
    let clients: Vec<_> = (0..8)
        .map(|_| {
            let url = url.clone();
            thread::spawn(move || minreq::get(url).send().unwrap().status_code)
        })
        .collect();
    for client in clients {
        assert_eq!(client.join().unwrap(), 200);
    }
}

#[test]
fn second_server_on_same_port_fails_fast() {
    let server = TestServer::start();
    let err = Server::new(server.root.path())
        .port(server.port)
        .browser(NoBrowser)
        .bind()
        .unwrap_err();
    assert!(matches!(err, ServeError::AddrInUse { port } if port == server.port));
}

#[test]
fn shutdown_stops_the_accept_loop() {
    let root = tempfile::tempdir().unwrap();
    let running = Server::new(root.path())
        .port(0)
        .browser(NoBrowser)
        .bind()
        .unwrap();
    let shutdown = running.shutdown_handle();
    let handle = thread::spawn(move || running.serve());

    shutdown.shutdown();
    handle.join().unwrap();
}

#[test]
fn redirect_for_double_slash_stays_on_host() {
    let server = TestServer::start();
    fs::create_dir(server.root.path().join("evil.com")).unwrap();
    let res = server.raw("GET //evil.com HTTP/1.1\r\nHost: localhost\r\n\r\n");
    assert!(res.starts_with("HTTP/1.1 301 Moved Permanently\r\n"), "{res}");
    assert!(res.contains("\r\nLocation: /evil.com/\r\n"), "{res}");
}

/// Browser that remembers every URL it was asked to open.
#[derive(Debug, Clone, Default)]
struct RecordingBrowser {
    opened: Arc<Mutex<Vec<String>>>,
    fail: bool,
}

impl Browser for RecordingBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        self.opened.lock().unwrap().push(url.to_string());
        if self.fail {
            Err(io::Error::new(io::ErrorKind::NotFound, "no display"))
        } else {
            Ok(())
        }
    }
}

fn serve_with(browser: RecordingBrowser) {
    let root = tempfile::tempdir().unwrap();
    fs::write(root.path().join("index.html"), "ok").unwrap();

    let running = Server::new(root.path())
        .port(0)
        .browser(browser.clone())
        .bind()
        .unwrap();
    let port = running.local_addr().unwrap().port();
    let url = running.url().to_string();
    assert_eq!(url, format!("http://localhost:{port}/"));

    let shutdown = running.shutdown_handle();
    let handle = thread::spawn(move || running.serve());

    // The browser is opened before the accept loop starts, so a served
    // request means the launch already happened.
    let res = minreq::get(format!("http://127.0.0.1:{port}/")).send().unwrap();
    assert_eq!(res.status_code, 200);
    assert_eq!(res.as_str().unwrap(), "ok");
    assert_eq!(*browser.opened.lock().unwrap(), vec![url]);

    shutdown.shutdown();
    handle.join().unwrap();
}

#[test]
fn browser_is_opened_at_root_url() {
    serve_with(RecordingBrowser::default());
}

#[test]
fn browser_failure_does_not_stop_serving() {
    serve_with(RecordingBrowser {
        fail: true,
        ..Default::default()
    });
}
