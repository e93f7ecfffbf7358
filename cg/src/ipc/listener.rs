//! IPC listener for serve mode
//!
//! Binds the Unix socket and runs one task per connection. A connection may
//! carry any number of request lines; each gets exactly one response line.

use std::path::PathBuf;
use std::sync::Arc;

use eyre::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, info, warn};

use super::MAX_MESSAGE_SIZE;
use super::messages::ServeRequest;
use crate::api::GenerateResponse;
use crate::error::GenerationError;
use crate::generator::ContractGenerator;

/// Create a listener at `socket_path`, replacing a stale socket file
pub fn create_listener_at(socket_path: &PathBuf) -> Result<(UnixListener, PathBuf)> {
    debug!(?socket_path, "create_listener_at: creating IPC socket");

    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create socket directory")?;
    }

    if socket_path.exists() {
        debug!(?socket_path, "create_listener_at: removing stale socket");
        std::fs::remove_file(socket_path).context("Failed to remove stale socket")?;
    }

    let listener = UnixListener::bind(socket_path).context("Failed to bind IPC socket")?;
    debug!(?socket_path, "create_listener_at: socket bound successfully");

    Ok((listener, socket_path.clone()))
}

/// Remove the socket file on shutdown
pub fn cleanup_socket(socket_path: &PathBuf) {
    if socket_path.exists() {
        debug!(?socket_path, "cleanup_socket: removing socket file");
        if let Err(e) = std::fs::remove_file(socket_path) {
            warn!(?socket_path, error = %e, "Failed to remove socket file");
        }
    }
}

/// Accept connections forever, handling each on its own task
pub async fn serve(listener: UnixListener, generator: Arc<ContractGenerator>) -> Result<()> {
    info!("Serving generation requests");
    loop {
        let (stream, _) = listener.accept().await.context("Failed to accept IPC connection")?;
        debug!("serve: accepted connection");
        let generator = Arc::clone(&generator);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, generator).await {
                warn!(error = %e, "IPC connection ended with error");
            }
        });
    }
}

/// Answer every request line on one connection until the peer closes it
pub async fn handle_connection(stream: UnixStream, generator: Arc<ContractGenerator>) -> Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    loop {
        let line = match read_line(&mut reader).await {
            Ok(Some(line)) => line,
            Ok(None) => {
                debug!("handle_connection: peer closed connection");
                return Ok(());
            }
            Err(e) => {
                let response = GenerateResponse::failure(&GenerationError::validation(format!("{:#}", e)));
                send_response(&mut write_half, &response).await?;
                return Err(e);
            }
        };

        let response = match parse_request(&line) {
            Ok(msg) => generator.handle(&msg.identity, msg.request).await,
            Err(e) => GenerateResponse::failure(&GenerationError::validation(format!("{:#}", e))),
        };
        send_response(&mut write_half, &response).await?;
    }
}

/// Read one non-empty line; `None` at end of stream
///
/// At most `MAX_MESSAGE_SIZE + 1` bytes are buffered per line.
pub async fn read_line<R: AsyncBufRead + Unpin>(reader: &mut R) -> Result<Option<String>> {
    loop {
        let mut line = String::new();
        let bytes_read = (&mut *reader)
            .take(MAX_MESSAGE_SIZE as u64 + 1)
            .read_line(&mut line)
            .await
            .context("Failed to read IPC message")?;

        if bytes_read == 0 {
            return Ok(None);
        }
        if bytes_read > MAX_MESSAGE_SIZE {
            return Err(eyre::eyre!("Message too large: {} bytes", bytes_read));
        }
        if !line.trim().is_empty() {
            return Ok(Some(line));
        }
    }
}

fn parse_request(line: &str) -> Result<ServeRequest> {
    let msg: ServeRequest = serde_json::from_str(line.trim()).context("Invalid request")?;
    debug!(identity = %msg.identity, "parse_request: parsed message");
    Ok(msg)
}

/// Write one response line
pub async fn send_response<W: AsyncWrite + Unpin>(stream: &mut W, response: &GenerateResponse) -> Result<()> {
    let response_json = serde_json::to_string(response).context("Failed to serialize response")?;
    stream
        .write_all(response_json.as_bytes())
        .await
        .context("Failed to write response")?;
    stream.write_all(b"\n").await.context("Failed to write newline")?;
    stream.flush().await.context("Failed to flush response")?;
    debug!(success = response.success, "send_response: sent response");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GenerateRequestBody;
    use crate::config::Config;
    use crate::error::ErrorKind;
    use crate::ipc::GeneratorClient;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{ProviderGateway, RetryPolicy};
    use tempfile::TempDir;

    fn generator(client: Arc<MockLlmClient>) -> Arc<ContractGenerator> {
        let gateway = ProviderGateway::new(client, RetryPolicy::default());
        Arc::new(ContractGenerator::new(gateway, &Config::default()).unwrap())
    }

    #[tokio::test]
    async fn test_create_listener_creates_parent_dir() {
        let temp = TempDir::new().unwrap();
        let socket_path = temp.path().join("subdir").join("contractgen.sock");

        let (_, path) = create_listener_at(&socket_path).unwrap();
        assert_eq!(path, socket_path);
        assert!(socket_path.exists());
    }

    #[tokio::test]
    async fn test_create_listener_removes_stale_socket() {
        let temp = TempDir::new().unwrap();
        let socket_path = temp.path().join("contractgen.sock");
        std::fs::write(&socket_path, "stale").unwrap();

        assert!(create_listener_at(&socket_path).is_ok());
    }

    #[test]
    fn test_cleanup_socket_removes_file() {
        let temp = TempDir::new().unwrap();
        let socket_path = temp.path().join("contractgen.sock");
        std::fs::write(&socket_path, "test").unwrap();

        cleanup_socket(&socket_path);
        assert!(!socket_path.exists());
    }

    #[test]
    fn test_cleanup_socket_handles_missing_file() {
        let temp = TempDir::new().unwrap();
        cleanup_socket(&temp.path().join("nonexistent.sock"));
    }

    #[tokio::test]
    async fn test_read_line_skips_blank_lines() {
        let mut input: &[u8] = b"\n\n{\"a\":1}\n";
        let line = read_line(&mut input).await.unwrap();
        assert_eq!(line.as_deref(), Some("{\"a\":1}\n"));
        assert!(read_line(&mut input).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_line_rejects_oversized() {
        let big = format!("{}\n", "x".repeat(MAX_MESSAGE_SIZE + 1));
        let mut input = big.as_bytes();
        assert!(read_line(&mut input).await.is_err());
        // Reading stopped at the cap instead of buffering the whole line
        assert_eq!(input.len(), big.len() - (MAX_MESSAGE_SIZE + 1));
    }

    #[tokio::test]
    async fn test_serve_round_trip() {
        let temp = TempDir::new().unwrap();
        let socket_path = temp.path().join("contractgen.sock");
        let (listener, _) = create_listener_at(&socket_path).unwrap();

        let client = Arc::new(MockLlmClient::new(vec![MockLlmClient::text("contract Club {}")]));
        let server = tokio::spawn(serve(listener, generator(client.clone())));

        let response = GeneratorClient::with_socket_path(socket_path)
            .generate("alice", GenerateRequestBody::new("A DAO where members vote on proposals"))
            .await
            .unwrap();

        assert!(response.success);
        let data = response.data.unwrap();
        assert!(data.artifact.contains("contract Club {}"));
        assert_eq!(data.category.id(), "dao");
        assert_eq!(client.call_count(), 1);

        server.abort();
    }

    #[tokio::test]
    async fn test_malformed_line_gets_validation_envelope() {
        let temp = TempDir::new().unwrap();
        let socket_path = temp.path().join("contractgen.sock");
        let (listener, _) = create_listener_at(&socket_path).unwrap();
        let server = tokio::spawn(serve(listener, generator(Arc::new(MockLlmClient::new(vec![])))));

        let mut stream = UnixStream::connect(&socket_path).await.unwrap();
        stream.write_all(b"not json\n").await.unwrap();

        let mut reader = BufReader::new(&mut stream);
        let line = read_line(&mut reader).await.unwrap().unwrap();
        let response: GenerateResponse = serde_json::from_str(line.trim()).unwrap();

        assert!(!response.success);
        assert_eq!(response.error.unwrap().kind, ErrorKind::Validation);

        server.abort();
    }
}
