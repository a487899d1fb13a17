use std::{
    fs, io,
    net::SocketAddr,
    path::{Path, PathBuf},
};

use corsserve_internal::{
    browser::{Browser, SystemBrowser},
    config::{self, Config, HttpListener, Shutdown, DEFAULT_PORT},
    error::ServeError,
};

/// Directory holding the running executable, which is what gets served when
/// no root is given.
pub fn resolve_root() -> Result<PathBuf, ServeError> {
    let exe = std::env::current_exe().map_err(|source| ServeError::Root {
        path: PathBuf::from("."),
        source,
    })?;
    exe.parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| ServeError::Root {
            path: exe.clone(),
            source: io::Error::new(io::ErrorKind::NotFound, "executable has no parent directory"),
        })
}

/// Startup sequence of the preview server: banner, bind, browser, serve.
#[derive(Debug)]
pub struct Server {
    root: PathBuf,
    port: u16,
    browser: Box<dyn Browser>,
    shutdown: Shutdown,
}

impl Server {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Server {
            root: root.into(),
            port: DEFAULT_PORT,
            browser: Box::new(SystemBrowser),
            shutdown: Shutdown::new(),
        }
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn browser<B: Browser + 'static>(mut self, browser: B) -> Self {
        self.browser = Box::new(browser);
        self
    }

    /// Handle that stops the server once it is serving. Safe to call before
    /// the socket is bound.
    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn url(&self) -> String {
        format!("http://localhost:{}/", self.port)
    }

    pub fn print_banner(&self) {
        println!("🚀 Starting corsserve...");
        println!("📁 Serving files from: {}", self.root.display());
        println!("🌐 Server URL: {}", self.url());
        println!("🔌 Port: {}", self.port);
        println!("⛔ Press Ctrl+C to stop the server");
        println!("{}", "-".repeat(50));
    }

    /// Checks the root and binds the listener. Port contention comes back as
    /// [`ServeError::AddrInUse`].
    pub fn bind(self) -> Result<Running, ServeError> {
        let root = fs::canonicalize(&self.root).map_err(|source| ServeError::Root {
            path: self.root.clone(),
            source,
        })?;
        if !root.is_dir() {
            return Err(ServeError::Root {
                path: root,
                source: io::Error::new(io::ErrorKind::InvalidInput, "not a directory"),
            });
        }

        let socket = config::bind(self.port)?;
        let port = socket
            .local_addr()
            .map(|a| a.port())
            .map_err(|e| ServeError::from_bind(self.port, e))?;
        println!("✅ Server running on port {port}");

        let http = HttpListener::new(socket, Config::new().mount_point(root)).shutdown(self.shutdown);
        Ok(Running {
            http,
            browser: self.browser,
            url: format!("http://localhost:{port}/"),
        })
    }

    /// Runs the whole startup sequence and blocks until shut down.
    pub fn run(self) -> Result<(), ServeError> {
        self.print_banner();
        self.bind()?.serve();
        Ok(())
    }
}

/// A bound server that has not started accepting yet.
#[derive(Debug)]
pub struct Running {
    http: HttpListener,
    browser: Box<dyn Browser>,
    url: String,
}

impl Running {
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.http.local_addr()
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.http.shutdown_handle()
    }

    /// Opens the browser (best effort) and serves until shut down.
    pub fn serve(self) {
        open_browser(self.browser.as_ref(), &self.url);
        self.http.start();
    }
}

fn open_browser(browser: &dyn Browser, url: &str) {
    match browser.open(url) {
        Ok(()) => println!("🌐 Browser opened automatically"),
        Err(e) => {
            log::warn!("could not open a browser: {}", e);
            println!("💡 Manually open: {url}");
        }
    }
}
