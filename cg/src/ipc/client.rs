//! IPC client for `cg request`

use std::path::PathBuf;
use std::time::Duration;

use eyre::{Context, Result};
use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tracing::debug;

use super::messages::ServeRequest;
use super::{MAX_MESSAGE_SIZE, get_socket_path, listener::read_line};
use crate::api::{GenerateRequestBody, GenerateResponse};

/// Generation can spend several provider attempts plus backoff
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Client for a running `cg serve`
#[derive(Debug, Clone)]
pub struct GeneratorClient {
    socket_path: PathBuf,
    timeout: Duration,
}

impl Default for GeneratorClient {
    fn default() -> Self {
        Self::new()
    }
}

impl GeneratorClient {
    /// Create a client for the default socket path
    pub fn new() -> Self {
        Self::with_socket_path(get_socket_path())
    }

    pub fn with_socket_path(socket_path: PathBuf) -> Self {
        Self {
            socket_path,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn socket_exists(&self) -> bool {
        self.socket_path.exists()
    }

    /// Send one generation request and wait for its envelope
    pub async fn generate(&self, identity: &str, request: GenerateRequestBody) -> Result<GenerateResponse> {
        debug!(?self.socket_path, %identity, "GeneratorClient::generate: called");
        let msg = ServeRequest {
            identity: identity.to_string(),
            request,
        };
        let msg_json = serde_json::to_string(&msg).context("Failed to serialize request")?;
        if msg_json.len() > MAX_MESSAGE_SIZE {
            return Err(eyre::eyre!("Request too large: {} bytes", msg_json.len()));
        }

        let mut stream = tokio::time::timeout(self.timeout, UnixStream::connect(&self.socket_path))
            .await
            .context("Connection timeout")?
            .with_context(|| format!("Failed to connect to {}", self.socket_path.display()))?;

        stream
            .write_all(msg_json.as_bytes())
            .await
            .context("Failed to write request")?;
        stream.write_all(b"\n").await.context("Failed to write newline")?;
        stream.flush().await.context("Failed to flush stream")?;

        let mut reader = BufReader::new(&mut stream);
        let line = tokio::time::timeout(self.timeout, read_line(&mut reader))
            .await
            .context("Read timeout")??
            .ok_or_else(|| eyre::eyre!("Server closed the connection without a response"))?;

        let response: GenerateResponse = serde_json::from_str(line.trim()).context("Failed to parse response")?;
        debug!(success = response.success, "GeneratorClient::generate: received response");
        Ok(response)
    }
}
