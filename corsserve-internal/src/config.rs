use std::{
    io,
    net::{IpAddr, Incoming, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream},
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, OnceLock,
    },
    time::Duration,
};

use crate::{error::ServeError, headers::HeaderMap, http::start_http};

/// Headers written first on every response, whatever its status.
pub const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

pub const DEFAULT_PORT: u16 = 8000;

/// Binds all interfaces on `port`, telling port contention apart from other
/// failures.
pub fn bind(port: u16) -> Result<TcpListener, ServeError> {
    TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).map_err(|e| ServeError::from_bind(port, e))
}

#[derive(Debug)]
pub struct HttpListener {
    socket: TcpListener,
    pub config: Config,
    shutdown: Shutdown,
}

impl HttpListener {
    pub fn new<P: Into<TcpListener>>(socket: P, config: Config) -> HttpListener {
        HttpListener {
            socket: socket.into(),
            config,
            shutdown: Shutdown::new(),
        }
        .arm()
    }

    /// Stops this listener through an existing handle, e.g. one already
    /// wired to a signal handler.
    pub fn shutdown(mut self, shutdown: Shutdown) -> Self {
        self.shutdown = shutdown;
        self.arm()
    }

    fn arm(self) -> Self {
        match self.socket.local_addr() {
            Ok(addr) => self.shutdown.arm(addr),
            Err(_e) => {
                #[cfg(feature = "log")]
                log::warn!("listener has no local address, shutdown will wait for a connection: {}", _e);
            }
        }
        self
    }

    pub fn shutdown_handle(&self) -> Shutdown {
        self.shutdown.clone()
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Serves until the shutdown handle fires.
    pub fn start(self) {
        start_http(self);
    }

    pub fn get_stream(&self) -> Incoming<'_> {
        self.socket.incoming()
    }
}

/// Cloneable handle that stops an accept loop from any thread.
#[derive(Clone, Debug, Default)]
pub struct Shutdown {
    stopped: Arc<AtomicBool>,
    wake_addr: Arc<OnceLock<SocketAddr>>,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_shutdown(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Flags the loop and unblocks a pending `accept` with a throwaway
    /// connection.
    pub fn shutdown(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        if let Some(addr) = self.wake_addr.get() {
            let _ = TcpStream::connect_timeout(addr, Duration::from_secs(1));
        }
    }

    fn arm(&self, bound: SocketAddr) {
        let ip = match bound.ip() {
            IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
            IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
            ip => ip,
        };
        let _ = self.wake_addr.set(SocketAddr::new(ip, bound.port()));
    }
}

/// Per-request settings shared by every connection.
#[derive(Clone, Debug)]
pub struct Config {
    mount_point: Option<PathBuf>,
    headers: HeaderMap,
}

impl Default for Config {
    fn default() -> Self {
        Config::new()
    }
}

impl Config {
    /// Default settings: CORS headers on, nothing mounted.
    ///
    /// ### Example:
    /// ```
    /// use corsserve_internal::config::Config;
    ///
    /// let config = Config::new().mount_point("./site");
    /// assert_eq!(config.get_headers().get("access-control-allow-origin"), Some("*"));
    /// ```
    pub fn new() -> Config {
        #[cfg(feature = "log")]
        log::debug!("corsserve-internal version: {}", env!("CARGO_PKG_VERSION"));

        Config {
            mount_point: None,
            headers: CORS_HEADERS.into_iter().collect(),
        }
    }

    /// Directory whose contents are served. Requests resolving outside of it
    /// are answered with 404.
    pub fn mount_point<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.mount_point = Some(path.into());
        self
    }

    /// Adds a header written on every response, after the CORS headers.
    pub fn header(mut self, name: impl ToString, value: impl ToString) -> Self {
        self.headers.set(name, value);
        self
    }

    pub fn get_headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn get_mount(&self) -> Option<&Path> {
        self.mount_point.as_deref()
    }
}
