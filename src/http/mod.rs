//! HTTP protocol layer module
//!
//! Protocol helpers shared by the static and upload handlers, free of any
//! request-routing logic.

pub mod cache;
pub mod mime;
pub mod path;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use range::{parse_range_header, ByteRange};
pub use response::{
    build_403_response, build_404_response, build_405_response, build_error_response,
    build_redirect_response,
};
