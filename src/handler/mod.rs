//! Request handler module
//!
//! Method dispatch, static serving of the served root and uploads into
//! the write root.

pub mod filename;
pub mod listing;
pub mod router;
pub mod static_files;
pub mod upload;

pub use router::handle_request;
