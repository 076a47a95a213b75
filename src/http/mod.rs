//! HTTP protocol layer module
//!
//! Provides HTTP protocol-related base functionality, decoupled from the
//! request routing and filesystem logic.

pub mod body;
pub mod cache;
pub mod escape;
pub mod mime;
pub mod range;
pub mod response;

// Re-export commonly used types
pub use body::{FileStreamBody, ResponseBody, STREAM_CHUNK_SIZE};
pub use range::parse_range_header;
pub use response::{
    build_304_response, build_405_response, build_416_response, build_error_response,
    build_file_response, build_listing_response, build_partial_response,
};
