//! HTTP front-end for tempdrop.
//!
//! Thin glue between HTTP clients (the browser UI, curl, ...) and the
//! [`FileRegistry`](crate::file::FileRegistry): upload, download, the
//! administrative listing and forced deletion, plus the upload proxy.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::create_router;
pub use server::WebServer;
