use std::{path::PathBuf, process};

use clap::Parser;
use corsserve::{prelude::*, server::resolve_root};

/// Serves a directory with permissive CORS headers and opens it in a browser.
#[derive(Debug, Parser)]
#[command(name = "corsserve", version)]
struct Settings {
    /// Port to listen on (all interfaces)
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "CORSSERVE_PORT")]
    port: u16,

    /// Directory to serve [default: directory of this executable]
    #[arg(long, env = "CORSSERVE_ROOT")]
    root: Option<PathBuf>,

    /// Do not open a browser on startup
    #[arg(long, env = "CORSSERVE_NO_BROWSER")]
    no_browser: bool,
}

fn main() {
    let settings = Settings::parse();

    if let Err(e) = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Info)
        .env()
        .init()
    {
        eprintln!("logger unavailable: {e}");
    }

    let root = match settings.root {
        Some(root) => root,
        None => resolve_root().unwrap_or_else(|e| fail(&e)),
    };

    let mut server = Server::new(root).port(settings.port);
    if settings.no_browser {
        server = server.browser(NoBrowser);
    }

    let shutdown = server.shutdown_handle();
    if let Err(e) = ctrlc::set_handler(move || shutdown.shutdown()) {
        log::warn!("Ctrl+C handler not installed: {}", e);
    }

    if let Err(e) = server.run() {
        fail(&e);
    }

    println!("\n🛑 Server stopped by user");
}

fn fail(e: &ServeError) -> ! {
    match e {
        ServeError::AddrInUse { port } => {
            eprintln!("❌ Port {port} is already in use");
            eprintln!("💡 Try a different port (--port) or stop the existing server");
        }
        e => eprintln!("❌ Error starting server: {e}"),
    }
    process::exit(1);
}
