//! # corsserve
//!
//! `corsserve` serves a directory over HTTP for local front-end previews.
//! Every response carries permissive CORS headers, so pages loaded from it
//! can call other local services without cross-origin errors.
//!
//! # Example 1: the full startup sequence
//! ```no_run
//! use corsserve::prelude::*;
//!
//! fn main() -> Result<(), ServeError> {
//!     let root = corsserve::server::resolve_root()?;
//!     Server::new(root).port(8000).run()
//! }
//! ```
//!
//! # Example 2: a bare listener, no banner or browser
//! ```no_run
//! use corsserve::prelude::*;
//!
//! let socket = std::net::TcpListener::bind("0.0.0.0:9001").unwrap();
//! let config = Config::new().mount_point("./site");
//! let http = HttpListener::new(socket, config);
//!
//! http.start();
//! ```

pub use corsserve_internal as internal;

pub mod server;

pub mod prelude {
    pub use crate::server::{Running, Server};
    pub use corsserve_internal::browser::{Browser, NoBrowser, SystemBrowser};
    pub use corsserve_internal::config::*;
    pub use corsserve_internal::error::ServeError;
}
