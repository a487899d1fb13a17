pub mod browser;
pub mod config;
pub mod error;
pub mod headers;
pub mod http;
pub mod mount;
pub mod request;
pub mod response;
pub mod status;
