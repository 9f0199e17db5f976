//! Unix domain socket transport for the control socket

use std::io;
use std::path::{Path, PathBuf};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tracing::{debug, warn};

use super::{parse_request, IpcResponse};
use crate::application::BusHandle;
use crate::domain::message::Message;

const SOCKET_NAME: &str = "studio-recorder.sock";

/// Socket path resolver
#[derive(Debug, Clone)]
pub struct SocketPath {
    path: PathBuf,
}

impl SocketPath {
    /// Prefer `$XDG_RUNTIME_DIR`, fall back to the temp dir
    pub fn new() -> Self {
        let path = std::env::var("XDG_RUNTIME_DIR")
            .map(|dir| PathBuf::from(dir).join(SOCKET_NAME))
            .unwrap_or_else(|_| std::env::temp_dir().join(SOCKET_NAME));
        Self { path }
    }

    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn cleanup(&self) -> io::Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)?;
        }
        Ok(())
    }
}

impl Default for SocketPath {
    fn default() -> Self {
        Self::new()
    }
}

/// Accepts control connections and relays their requests onto the bus
pub struct UnixSocketServer {
    socket_path: SocketPath,
    listener: Option<UnixListener>,
}

impl UnixSocketServer {
    pub fn new(socket_path: SocketPath) -> Self {
        Self {
            socket_path,
            listener: None,
        }
    }

    pub fn bind(&mut self) -> io::Result<()> {
        // stale socket from a crashed run
        self.socket_path.cleanup()?;
        self.listener = Some(UnixListener::bind(self.socket_path.path())?);
        Ok(())
    }

    pub fn path(&self) -> &Path {
        self.socket_path.path()
    }

    /// Serve until the task is dropped
    pub async fn run(&self, bus: BusHandle) -> io::Result<()> {
        let listener = self
            .listener
            .as_ref()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "Socket not bound"))?;

        loop {
            match listener.accept().await {
                Ok((stream, _addr)) => {
                    let bus = bus.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, bus).await {
                            debug!(error = %e, "control connection error");
                        }
                    });
                }
                Err(e) => warn!(error = %e, "control socket accept failed"),
            }
        }
    }

    pub fn cleanup(&self) {
        let _ = self.socket_path.cleanup();
    }
}

impl Drop for UnixSocketServer {
    fn drop(&mut self) {
        self.cleanup();
    }
}

/// Answer every request line until the client hangs up
async fn handle_connection(stream: UnixStream, bus: BusHandle) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match parse_request(&line) {
            Ok(message) => {
                debug!(event = message.name(), "control request");
                IpcResponse::from_bus(bus.request(message).await)
            }
            Err(response) => response,
        };

        let mut encoded = serde_json::to_string(&response)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Sends single requests to a running recorder
pub struct UnixSocketClient {
    socket_path: SocketPath,
}

impl UnixSocketClient {
    pub fn new(socket_path: SocketPath) -> Self {
        Self { socket_path }
    }

    /// Whether a recorder appears to be listening
    pub fn is_running(&self) -> bool {
        self.socket_path.exists()
    }

    pub async fn request(&self, message: &Message) -> io::Result<IpcResponse> {
        let stream = UnixStream::connect(self.socket_path.path()).await?;
        let (reader, mut writer) = stream.into_split();

        let mut line = serde_json::to_string(message)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
        line.push('\n');
        writer.write_all(line.as_bytes()).await?;
        writer.flush().await?;

        let mut response = String::new();
        BufReader::new(reader).read_line(&mut response).await?;
        if response.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "recorder closed the connection",
            ));
        }

        serde_json::from_str(&response).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{DeviceEnumerator, EnumerationError};
    use crate::application::{Coordinator, LifecyclePolicy};
    use crate::domain::devices::{AudioInput, MediaSources, ScreenSource};
    use crate::domain::message::Reply;
    use crate::infrastructure::HeadlessWindowHost;
    use async_trait::async_trait;

    struct OneScreen;

    #[async_trait]
    impl DeviceEnumerator for OneScreen {
        async fn list_sources(&self) -> Result<MediaSources, EnumerationError> {
            Ok(MediaSources {
                screens: vec![ScreenSource {
                    id: "screen:0:0".to_string(),
                    name: "eDP-1".to_string(),
                    geometry: None,
                }],
                audio_inputs: vec![AudioInput {
                    device_id: "default".to_string(),
                    label: "default".to_string(),
                }],
            })
        }
    }

    async fn serve(dir: &Path) -> (SocketPath, tokio::task::JoinHandle<()>) {
        let coordinator = Coordinator::new(
            OneScreen,
            HeadlessWindowHost::new(),
            LifecyclePolicy::default(),
        );
        let bus = coordinator.handle();
        tokio::spawn(coordinator.run());

        let socket_path = SocketPath::with_path(dir.join("test.sock"));
        let mut server = UnixSocketServer::new(socket_path.clone());
        server.bind().unwrap();
        let task = tokio::spawn(async move {
            let _ = server.run(bus).await;
        });
        (socket_path, task)
    }

    #[test]
    fn socket_path_name() {
        assert!(SocketPath::new().path().ends_with(SOCKET_NAME));
    }

    #[tokio::test]
    async fn relays_requests_to_bus() {
        let dir = tempfile::tempdir().unwrap();
        let (socket_path, server) = serve(dir.path()).await;
        let client = UnixSocketClient::new(socket_path);
        assert!(client.is_running());

        let response = client.request(&Message::GetSources).await.unwrap();
        let Ok(Reply::Sources(sources)) = response.into_result() else {
            panic!("expected sources");
        };
        assert_eq!(sources.screens[0].id, "screen:0:0");

        let response = client.request(&Message::StudioStatus).await.unwrap();
        assert!(matches!(response, IpcResponse::Error { .. }));

        server.abort();
    }

    #[tokio::test]
    async fn malformed_line_gets_error_reply() {
        let dir = tempfile::tempdir().unwrap();
        let (socket_path, server) = serve(dir.path()).await;

        let stream = UnixStream::connect(socket_path.path()).await.unwrap();
        let (reader, mut writer) = stream.into_split();
        writer.write_all(b"toggle\n").await.unwrap();

        let mut line = String::new();
        BufReader::new(reader).read_line(&mut line).await.unwrap();
        let response: IpcResponse = serde_json::from_str(&line).unwrap();
        assert!(matches!(response, IpcResponse::Error { .. }));

        server.abort();
    }

    #[test]
    fn client_reports_missing_socket() {
        let client = UnixSocketClient::new(SocketPath::with_path("/nonexistent/rec.sock"));
        assert!(!client.is_running());
    }
}
