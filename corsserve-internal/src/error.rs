use std::{io, path::PathBuf};

use thiserror::Error;

/// Fatal startup failures. Each one ends the process with exit status 1.
#[derive(Error, Debug)]
pub enum ServeError {
    #[error("port {port} is already in use")]
    AddrInUse { port: u16 },
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("cannot serve from {}: {source}", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ServeError {
    /// Classifies a failed `bind` so that port contention can be reported on its own.
    pub fn from_bind(port: u16, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::AddrInUse {
            ServeError::AddrInUse { port }
        } else {
            ServeError::Bind { port, source }
        }
    }
}
