use crate::api::types::{
    RpcRequest, RpcResponse, SessionInfo, TorrentGetResult, TorrentSummary, METHOD_SESSION_GET,
    METHOD_TORRENT_GET,
};
use crate::api::Dispatcher;
use crate::error::{StageError, StageResult};
use async_trait::async_trait;
use base64::Engine;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::sleep;
use tracing::{debug, instrument, trace, warn};

/// Header Transmission uses for its CSRF session token.
const SESSION_ID_HEADER: &str = "X-Transmission-Session-Id";

/// HTTP client for a Transmission RPC endpoint.
///
/// Handles the 409 session-id handshake transparently: the first call (and
/// any call after the server expires the session) receives a 409 carrying a
/// fresh session id, which is stored and the request replayed.
pub struct TransmissionClient {
    client: Client,
    rpc_url: String,
    max_retries: u32,
    retry_delay: Duration,
    auth_credentials: Option<(String, String)>,
    session_id: RwLock<Option<String>>,
}

impl TransmissionClient {
    /// Create a new TransmissionClient with default configuration.
    pub fn new(rpc_url: String) -> StageResult<Self> {
        Self::with_config(rpc_url, 3, Duration::from_millis(500), None)
    }

    /// Create a new TransmissionClient with authentication.
    pub fn with_auth(rpc_url: String, username: String, password: String) -> StageResult<Self> {
        Self::with_config(
            rpc_url,
            3,
            Duration::from_millis(500),
            Some((username, password)),
        )
    }

    /// Create a new TransmissionClient with custom retry configuration.
    pub fn with_config(
        rpc_url: String,
        max_retries: u32,
        retry_delay: Duration,
        auth_credentials: Option<(String, String)>,
    ) -> StageResult<Self> {
        // Validate URL at construction time (fail fast on invalid URL)
        let _ = reqwest::Url::parse(&rpc_url)
            .map_err(|e| StageError::InvalidArgument(format!("Invalid URL: {}", e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| StageError::IoError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            rpc_url,
            max_retries,
            retry_delay,
            auth_credentials,
            session_id: RwLock::new(None),
        })
    }

    /// Create Authorization header for HTTP Basic Auth.
    fn create_auth_header(&self) -> Option<String> {
        self.auth_credentials.as_ref().map(|(username, password)| {
            let credentials = format!("{}:{}", username, password);
            let encoded = base64::engine::general_purpose::STANDARD.encode(credentials);
            format!("Basic {}", encoded)
        })
    }

    /// Send one RPC envelope and return the parsed response envelope.
    ///
    /// A 409 is the session handshake, not a failure: the replacement session
    /// id from the response header is stored and the request replayed, once.
    /// Transient transport failures and 5xx statuses are retried with linear
    /// backoff up to `max_retries`.
    #[instrument(skip(self, request), fields(rpc_op = %request.method))]
    pub async fn call(&self, request: &RpcRequest) -> StageResult<RpcResponse> {
        let mut handshake_done = false;
        let mut attempt = 0;

        loop {
            let mut req = self.client.post(&self.rpc_url).json(request);
            if let Some(auth_header) = self.create_auth_header() {
                req = req.header("Authorization", auth_header);
            }
            if let Some(session_id) = self.session_id.read().await.clone() {
                req = req.header(SESSION_ID_HEADER, session_id);
            }

            match req.send().await {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::CONFLICT {
                        let new_id = response
                            .headers()
                            .get(SESSION_ID_HEADER)
                            .and_then(|v| v.to_str().ok())
                            .map(|v| v.to_string());

                        match new_id {
                            Some(id) if !handshake_done => {
                                trace!(rpc_op = %request.method, "Session id refreshed");
                                *self.session_id.write().await = Some(id);
                                handshake_done = true;
                                continue;
                            }
                            _ => {
                                return Err(StageError::ApiError {
                                    status: 409,
                                    message: "Session id handshake failed".to_string(),
                                });
                            }
                        }
                    }

                    if status.is_server_error() && attempt < self.max_retries {
                        warn!(
                            rpc_op = %request.method,
                            status = status.as_u16(),
                            attempt = attempt + 1,
                            "Server error, retrying"
                        );
                        sleep(self.retry_delay * (attempt + 1)).await;
                        attempt += 1;
                        continue;
                    }

                    if status == StatusCode::UNAUTHORIZED {
                        let message = response.text().await.unwrap_or_default();
                        return Err(StageError::ApiError {
                            status: 401,
                            message: if message.is_empty() {
                                "Invalid credentials".to_string()
                            } else {
                                message
                            },
                        });
                    }

                    if !status.is_success() {
                        let message = response.text().await.unwrap_or_default();
                        return Err(StageError::ApiError {
                            status: status.as_u16(),
                            message,
                        });
                    }

                    let envelope: RpcResponse = response.json().await?;
                    debug!(rpc_op = %request.method, result = %envelope.result);
                    return Ok(envelope);
                }
                Err(e) => {
                    let err: StageError = e.into();
                    if err.is_transient() && attempt < self.max_retries {
                        warn!(rpc_op = %request.method, attempt = attempt + 1, error = %err, "Retrying");
                        sleep(self.retry_delay * (attempt + 1)).await;
                        attempt += 1;
                        continue;
                    }
                    return Err(err);
                }
            }
        }
    }

    /// Call a method and require a successful envelope with arguments.
    async fn call_expecting_arguments(
        &self,
        request: &RpcRequest,
    ) -> StageResult<serde_json::Value> {
        let envelope = self.call(request).await?;
        if !envelope.is_success() {
            return Err(StageError::RpcFailure(envelope.result));
        }
        envelope
            .arguments
            .ok_or_else(|| StageError::ParseError("Response carried no arguments".to_string()))
    }

    /// Read session settings (default download directory among them).
    #[instrument(skip(self), fields(rpc_op = "session-get"))]
    pub async fn session_get(&self) -> StageResult<SessionInfo> {
        let request = RpcRequest::new(METHOD_SESSION_GET, serde_json::Value::Null);
        let arguments = self.call_expecting_arguments(&request).await?;
        Ok(serde_json::from_value(arguments)?)
    }

    /// List existing torrents with their download directories.
    #[instrument(skip(self), fields(rpc_op = "torrent-get"))]
    pub async fn torrent_summaries(&self) -> StageResult<Vec<TorrentSummary>> {
        let request = RpcRequest::new(
            METHOD_TORRENT_GET,
            serde_json::json!({ "fields": ["id", "name", "downloadDir"] }),
        );
        let arguments = self.call_expecting_arguments(&request).await?;
        let result: TorrentGetResult = serde_json::from_value(arguments)?;
        Ok(result.torrents)
    }

    /// Quick connectivity probe against the endpoint.
    pub async fn health_check(&self) -> StageResult<bool> {
        match self.session_get().await {
            Ok(_) => Ok(true),
            Err(e) if e.is_transient() => Ok(false),
            Err(StageError::ApiError { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Dispatcher for TransmissionClient {
    async fn dispatch(&self, request: RpcRequest) -> StageResult<RpcResponse> {
        self.call(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::TorrentAddArgs;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rpc_url(server: &MockServer) -> String {
        format!("{}/transmission/rpc", server.uri())
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = TransmissionClient::new("http://localhost:9091/transmission/rpc".to_string())
            .unwrap();
        assert_eq!(client.rpc_url, "http://localhost:9091/transmission/rpc");
        assert_eq!(client.max_retries, 3);
    }

    #[tokio::test]
    async fn test_client_rejects_invalid_url() {
        let result = TransmissionClient::new("not a url".to_string());
        assert!(matches!(result, Err(StageError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_call_success() {
        let mock_server = MockServer::start().await;
        let client = TransmissionClient::new(rpc_url(&mock_server)).unwrap();

        Mock::given(method("POST"))
            .and(path("/transmission/rpc"))
            .and(body_partial_json(serde_json::json!({"method": "torrent-add"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "success",
                "arguments": {
                    "torrent-added": {"id": 1, "name": "test", "hashString": "abc"}
                }
            })))
            .mount(&mock_server)
            .await;

        let response = client
            .call(&TorrentAddArgs::default().into_request())
            .await
            .unwrap();
        assert!(response.is_success());
        assert_eq!(response.added_torrent().unwrap().id, 1);
    }

    #[tokio::test]
    async fn test_session_id_handshake() {
        let mock_server = MockServer::start().await;
        let client = TransmissionClient::new(rpc_url(&mock_server)).unwrap();

        // First request is rejected with 409 + a session id
        Mock::given(method("POST"))
            .and(path("/transmission/rpc"))
            .respond_with(
                ResponseTemplate::new(409).insert_header(SESSION_ID_HEADER, "token-1234"),
            )
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        // Replay carrying the session id succeeds
        Mock::given(method("POST"))
            .and(path("/transmission/rpc"))
            .and(header(SESSION_ID_HEADER, "token-1234"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "success",
                "arguments": {}
            })))
            .mount(&mock_server)
            .await;

        let response = client
            .call(&RpcRequest::new(METHOD_SESSION_GET, serde_json::Value::Null))
            .await
            .unwrap();
        assert!(response.is_success());

        // Session id is remembered for later calls
        assert_eq!(
            client.session_id.read().await.as_deref(),
            Some("token-1234")
        );
    }

    #[tokio::test]
    async fn test_repeated_conflict_is_an_error() {
        let mock_server = MockServer::start().await;
        let client = TransmissionClient::new(rpc_url(&mock_server)).unwrap();

        Mock::given(method("POST"))
            .and(path("/transmission/rpc"))
            .respond_with(
                ResponseTemplate::new(409).insert_header(SESSION_ID_HEADER, "never-accepted"),
            )
            .mount(&mock_server)
            .await;

        let result = client
            .call(&RpcRequest::new(METHOD_SESSION_GET, serde_json::Value::Null))
            .await;
        assert!(matches!(
            result,
            Err(StageError::ApiError { status: 409, .. })
        ));
    }

    #[tokio::test]
    async fn test_envelope_failure_is_ok_at_dispatch_level() {
        let mock_server = MockServer::start().await;
        let client = TransmissionClient::new(rpc_url(&mock_server)).unwrap();

        Mock::given(method("POST"))
            .and(path("/transmission/rpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "invalid or corrupt torrent file"
            })))
            .mount(&mock_server)
            .await;

        let response = client
            .call(&TorrentAddArgs::default().into_request())
            .await
            .unwrap();
        assert!(!response.is_success());
        assert_eq!(response.result, "invalid or corrupt torrent file");
    }

    #[tokio::test]
    async fn test_retry_on_server_error() {
        let mock_server = MockServer::start().await;
        let client = TransmissionClient::with_config(
            rpc_url(&mock_server),
            1,
            Duration::from_millis(10),
            None,
        )
        .unwrap();

        Mock::given(method("POST"))
            .and(path("/transmission/rpc"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&mock_server)
            .await;

        Mock::given(method("POST"))
            .and(path("/transmission/rpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "success",
                "arguments": {}
            })))
            .mount(&mock_server)
            .await;

        let response = client
            .call(&RpcRequest::new(METHOD_SESSION_GET, serde_json::Value::Null))
            .await
            .unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_auth_header_sent() {
        let mock_server = MockServer::start().await;
        let client = TransmissionClient::with_auth(
            rpc_url(&mock_server),
            "user".to_string(),
            "pass".to_string(),
        )
        .unwrap();

        // "user:pass" base64-encoded
        Mock::given(method("POST"))
            .and(path("/transmission/rpc"))
            .and(header("Authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "success",
                "arguments": {}
            })))
            .mount(&mock_server)
            .await;

        let response = client
            .call(&RpcRequest::new(METHOD_SESSION_GET, serde_json::Value::Null))
            .await
            .unwrap();
        assert!(response.is_success());
    }

    #[tokio::test]
    async fn test_session_get_parses_download_dir() {
        let mock_server = MockServer::start().await;
        let client = TransmissionClient::new(rpc_url(&mock_server)).unwrap();

        Mock::given(method("POST"))
            .and(path("/transmission/rpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "success",
                "arguments": {"download-dir": "/srv/downloads", "version": "4.0.5"}
            })))
            .mount(&mock_server)
            .await;

        let info = client.session_get().await.unwrap();
        assert_eq!(info.download_dir, "/srv/downloads");
    }

    #[tokio::test]
    async fn test_session_get_maps_envelope_failure() {
        let mock_server = MockServer::start().await;
        let client = TransmissionClient::new(rpc_url(&mock_server)).unwrap();

        Mock::given(method("POST"))
            .and(path("/transmission/rpc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "method not allowed"
            })))
            .mount(&mock_server)
            .await;

        let result = client.session_get().await;
        assert!(matches!(result, Err(StageError::RpcFailure(ref msg)) if msg == "method not allowed"));
    }

    #[tokio::test]
    async fn test_torrent_summaries() {
        let mock_server = MockServer::start().await;
        let client = TransmissionClient::new(rpc_url(&mock_server)).unwrap();

        Mock::given(method("POST"))
            .and(path("/transmission/rpc"))
            .and(body_partial_json(serde_json::json!({
                "method": "torrent-get",
                "arguments": {"fields": ["id", "name", "downloadDir"]}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "success",
                "arguments": {
                    "torrents": [
                        {"id": 1, "name": "a", "downloadDir": "/srv/downloads"},
                        {"id": 2, "name": "b", "downloadDir": "/srv/media"}
                    ]
                }
            })))
            .mount(&mock_server)
            .await;

        let torrents = client.torrent_summaries().await.unwrap();
        assert_eq!(torrents.len(), 2);
        assert_eq!(torrents[1].download_dir.as_deref(), Some("/srv/media"));
    }

    #[tokio::test]
    async fn test_http_error_surfaces_status() {
        let mock_server = MockServer::start().await;
        let client = TransmissionClient::new(rpc_url(&mock_server)).unwrap();

        Mock::given(method("POST"))
            .and(path("/transmission/rpc"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&mock_server)
            .await;

        let result = client
            .call(&RpcRequest::new(METHOD_SESSION_GET, serde_json::Value::Null))
            .await;
        assert!(matches!(
            result,
            Err(StageError::ApiError { status: 403, .. })
        ));
    }
}
