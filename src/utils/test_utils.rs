use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

use crate::auth::CredentialStore;
use crate::core::app::{App, AppInit};
use crate::core::config::ConfigOrchestrator;
use crate::core::connectivity::FixedConnectivity;
use crate::core::gateway::{GatewaySettings, ModelGateway};
use crate::core::persistence::{MemoryStorage, PersistError, SessionPersistence};
use crate::core::session::Session;
use crate::core::voice::UnsupportedVoiceCapture;
use crate::utils::logging::TranscriptLog;

/// One request as seen by [`MockServer`].
#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub request_line: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl CapturedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).expect("request body should be json")
    }
}

/// Canned response served by [`MockServer`].
#[derive(Debug, Clone)]
pub struct MockResponse {
    pub status: u16,
    pub body: String,
}

impl MockResponse {
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
        }
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// A minimal successful completion carrying `content`.
    pub fn completion(content: &str) -> Self {
        Self::json(
            200,
            serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": content}}]
            }),
        )
    }
}

/// Serves one canned response per connection, in order, then stops listening.
pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    task: JoinHandle<()>,
}

impl MockServer {
    pub async fn start(responses: Vec<MockResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let addr = listener.local_addr().expect("local addr should resolve");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let captured = Arc::clone(&requests);

        let task = tokio::spawn(async move {
            for response in responses {
                let Ok((mut stream, _)) = listener.accept().await else {
                    return;
                };
                let Ok(request) = read_http_request(&mut stream).await else {
                    return;
                };
                captured.lock().expect("requests lock").push(request);

                let payload = format!(
                    "HTTP/1.1 {} {}\r\ncontent-type: application/json\r\nconnection: close\r\ncontent-length: {}\r\n\r\n{}",
                    response.status,
                    reason_phrase(response.status),
                    response.body.len(),
                    response.body
                );
                let _ = stream.write_all(payload.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        Self {
            base_url: format!("http://{addr}/v1"),
            requests,
            task,
        }
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().expect("requests lock").len()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// A base URL nothing listens on.
pub async fn unreachable_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("listener should bind");
    let addr = listener.local_addr().expect("local addr should resolve");
    drop(listener);
    format!("http://{addr}/v1")
}

/// HTTP client that ignores proxy settings from the environment.
pub fn test_http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("client should build")
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        400 => "Bad Request",
        401 => "Unauthorized",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        _ => "Status",
    }
}

async fn read_http_request(stream: &mut TcpStream) -> Result<CapturedRequest, String> {
    let mut buffer = Vec::new();
    let mut header_end = None;
    while header_end.is_none() {
        let mut chunk = [0_u8; 1024];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP headers".to_string());
        }
        buffer.extend_from_slice(&chunk[..read]);
        header_end = buffer
            .windows(4)
            .position(|window| window == b"\r\n\r\n")
            .map(|index| index + 4);
    }

    let header_end = header_end.expect("header end should exist");
    let header_text =
        std::str::from_utf8(&buffer[..header_end]).map_err(|err| err.to_string())?;
    let mut lines = header_text.split("\r\n").filter(|line| !line.is_empty());
    let request_line = lines
        .next()
        .ok_or_else(|| "Missing HTTP request line".to_string())?
        .to_string();

    let mut headers = Vec::new();
    let mut content_length = 0_usize;
    for line in lines {
        let mut parts = line.splitn(2, ':');
        let Some(name) = parts.next() else {
            continue;
        };
        let value = parts.next().unwrap_or_default().trim().to_string();
        if name.eq_ignore_ascii_case("content-length") {
            content_length = value.parse::<usize>().map_err(|err| err.to_string())?;
        }
        headers.push((name.to_string(), value));
    }

    let mut body = buffer[header_end..].to_vec();
    while body.len() < content_length {
        let mut chunk = vec![0_u8; content_length.saturating_sub(body.len())];
        let read = stream
            .read(&mut chunk)
            .await
            .map_err(|err| err.to_string())?;
        if read == 0 {
            return Err("Unexpected EOF while reading HTTP body".to_string());
        }
        body.extend_from_slice(&chunk[..read]);
    }
    body.truncate(content_length);

    Ok(CapturedRequest {
        request_line,
        headers,
        body,
    })
}

/// An [`App`] wired to `base_url` with in-memory session storage and
/// preferences under `config_dir`.
pub fn create_test_app(
    base_url: &str,
    credential: Option<&str>,
    config_dir: &Path,
) -> (App, MemoryStorage) {
    let storage = MemoryStorage::new();
    let app = create_test_app_with_storage(
        base_url,
        credential,
        config_dir,
        Box::new(storage.clone()),
    );
    (app, storage)
}

/// Like [`create_test_app`], with caller-supplied session storage.
pub fn create_test_app_with_storage(
    base_url: &str,
    credential: Option<&str>,
    config_dir: &Path,
    persistence: Box<dyn SessionPersistence>,
) -> App {
    let gateway = ModelGateway::new(
        test_http_client(),
        GatewaySettings {
            base_url: base_url.to_string(),
            ..GatewaySettings::default()
        },
        credential.map(str::to_string),
        Arc::new(FixedConnectivity(true)),
    );
    App::new(AppInit {
        persistence,
        gateway: Arc::new(gateway),
        config: ConfigOrchestrator::new(config_dir.join("config.toml")),
        credentials: CredentialStore::new_with_keyring(false)
            .with_env_var("CAUSERIE_TEST_UNSET_KEY"),
        transcript: TranscriptLog::new(None).expect("transcript"),
        voice: Box::new(UnsupportedVoiceCapture),
        style_override: None,
    })
    .expect("app should start")
}

/// Session storage that accepts `allowed` saves and then fails every write.
pub struct FailingStorage {
    inner: MemoryStorage,
    allowed: AtomicUsize,
}

impl FailingStorage {
    pub fn after(allowed: usize, inner: MemoryStorage) -> Self {
        Self {
            inner,
            allowed: AtomicUsize::new(allowed),
        }
    }
}

impl SessionPersistence for FailingStorage {
    fn load(&self) -> Vec<Session> {
        self.inner.load()
    }

    fn save(&self, sessions: &[Session]) -> Result<(), PersistError> {
        let remaining = self.allowed.load(Ordering::SeqCst);
        if remaining == 0 {
            return Err(PersistError::Io {
                path: PathBuf::from("sessions.json"),
                source: std::io::Error::other("disk full"),
            });
        }
        self.allowed.store(remaining - 1, Ordering::SeqCst);
        self.inner.save(sessions)
    }
}
