//! filedrop: a small HTTP file server that also accepts uploads.
//!
//! `GET`/`HEAD` serve files and directory listings from the served root;
//! `POST /<name>` stores the request body as `<name>` in the write root.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logger;
pub mod server;

pub use config::Config;
pub use error::StartupError;
pub use server::{Server, ShutdownHandle};
