use std::{fmt::Debug, io};

/// Opens a URL in a web browser. Launching is always best-effort: callers
/// log a failure and carry on serving.
pub trait Browser: Send + Sync + Debug {
    fn open(&self, url: &str) -> io::Result<()>;
}

/// The host's default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBrowser;

impl Browser for SystemBrowser {
    fn open(&self, url: &str) -> io::Result<()> {
        open::that(url)
    }
}

/// Never opens anything, for headless runs and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoBrowser;

impl Browser for NoBrowser {
    fn open(&self, _url: &str) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "browser launch disabled",
        ))
    }
}
