//! Unix socket transport for `cg serve` and `cg request`
//!
//! Newline-delimited JSON: each request line is a [`ServeRequest`], each
//! answer line is a [`GenerateResponse`](crate::api::GenerateResponse).

use std::path::PathBuf;

pub mod client;
pub mod listener;
pub mod messages;

pub use client::GeneratorClient;
pub use listener::{cleanup_socket, create_listener_at, serve};
pub use messages::ServeRequest;

/// Maximum size of one request or response line
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Default socket path for serve mode
pub fn get_socket_path() -> PathBuf {
    dirs::runtime_dir()
        .or_else(dirs::data_local_dir)
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("contractgen")
        .join("contractgen.sock")
}
