//! Recognition backend client.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;

use crate::{
    error::{Error, Result},
    http::HttpClient,
    types::{Enrollment, PredictResponse, TrainResponse, UsersResponse, Verdict},
};

/// Default HTTP endpoint of the recognition backend.
pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Default maximum number of retries for retryable failures.
pub const DEFAULT_MAX_RETRIES: u32 = 2;

/// Client for the recognition backend.
///
/// Exposes the three backend operations: listing enrolled users, enrolling
/// a voice sample under a name, and verifying a sample against a name.
///
/// # Example
///
/// ```rust,no_run
/// use voiceid_gateway::Client;
///
/// # async fn run() -> voiceid_gateway::Result<()> {
/// let client = Client::new("http://localhost:5000")?;
/// let users = client.users().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    config: Arc<ClientConfig>,
    http: Arc<HttpClient>,
}

/// Client configuration.
#[derive(Clone)]
struct ClientConfig {
    base_url: String,
}

impl Client {
    /// Creates a new backend client with default options.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL is empty.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        ClientBuilder::new(base_url).build()
    }

    /// Creates a new client builder for more configuration options.
    pub fn builder(base_url: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(base_url)
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Fetches the names that have an enrolled voice model.
    ///
    /// `GET /users`
    pub async fn users(&self) -> Result<Vec<String>> {
        let resp: UsersResponse = self.http.get_json("/users").await?;
        Ok(resp.users)
    }

    /// Enrolls a WAV sample under `name`.
    ///
    /// `POST /train-model` with multipart fields `file` and `name`.
    pub async fn train(&self, name: &str, audio: Bytes, filename: &str) -> Result<Enrollment> {
        let resp: TrainResponse = self
            .http
            .upload(
                "/train-model",
                audio,
                filename,
                "audio/wav",
                &[("name", name)],
            )
            .await?;

        tracing::debug!(name, "enrollment accepted by backend");
        Ok(Enrollment {
            message: resp.message,
        })
    }

    /// Verifies a WAV sample against the model enrolled under `name`.
    ///
    /// `POST /predict` with multipart fields `file` and `name`. A negative
    /// prediction is a successful completion, not an error.
    pub async fn predict(&self, name: &str, audio: Bytes, filename: &str) -> Result<Verdict> {
        let resp: PredictResponse = self
            .http
            .upload("/predict", audio, filename, "audio/wav", &[("name", name)])
            .await?;

        Ok(Verdict::from(resp.prediction))
    }
}

/// Builder for [`Client`].
pub struct ClientBuilder {
    base_url: String,
    timeout: Duration,
    max_retries: u32,
}

impl ClientBuilder {
    /// Creates a new builder with the given base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the maximum number of retries for retryable failures.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Builds the client.
    pub fn build(self) -> Result<Client> {
        if self.base_url.is_empty() {
            return Err(Error::Config("base URL must not be empty".to_string()));
        }

        let base_url = self.base_url.trim_end_matches('/').to_string();
        let http = HttpClient::new(base_url.clone(), self.timeout, self.max_retries)?;

        Ok(Client {
            config: Arc::new(ClientConfig { base_url }),
            http: Arc::new(http),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use axum::{
        extract::{Multipart, State},
        http::StatusCode,
        response::{IntoResponse, Json},
        routing::{get, post},
        Router,
    };
    use serde_json::json;

    use super::*;

    #[derive(Clone, Default)]
    struct Backend {
        train_calls: Arc<AtomicUsize>,
    }

    async fn users_handler() -> Json<serde_json::Value> {
        Json(json!({ "users": ["alice", "bob"] }))
    }

    async fn train_handler(
        State(backend): State<Backend>,
        mut multipart: Multipart,
    ) -> impl IntoResponse {
        backend.train_calls.fetch_add(1, Ordering::SeqCst);

        let mut name = None;
        let mut file_len = 0usize;
        while let Some(field) = multipart.next_field().await.unwrap() {
            match field.name().unwrap_or_default() {
                "name" => name = Some(field.text().await.unwrap()),
                "file" => file_len = field.bytes().await.unwrap().len(),
                _ => {}
            }
        }

        match name {
            Some(name) if !name.is_empty() && file_len > 0 => (
                StatusCode::OK,
                Json(json!({ "message": format!("model trained for {name}") })),
            ),
            _ => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "missing name or file" })),
            ),
        }
    }

    async fn predict_handler(mut multipart: Multipart) -> Json<serde_json::Value> {
        let mut name = String::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            if field.name() == Some("name") {
                name = field.text().await.unwrap();
            } else {
                let _ = field.bytes().await.unwrap();
            }
        }
        Json(json!({ "prediction": name == "alice" }))
    }

    async fn broken_handler() -> impl IntoResponse {
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    }

    async fn spawn_backend() -> (SocketAddr, Backend) {
        let backend = Backend::default();
        let app = Router::new()
            .route("/users", get(users_handler))
            .route("/train-model", post(train_handler))
            .route("/predict", post(predict_handler))
            .route("/broken", get(broken_handler))
            .with_state(backend.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (addr, backend)
    }

    fn test_client(addr: SocketAddr) -> Client {
        Client::builder(format!("http://{addr}"))
            .max_retries(0)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn users_returns_enrolled_names() {
        let (addr, _) = spawn_backend().await;
        let client = test_client(addr);

        let users = client.users().await.unwrap();
        assert_eq!(users, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[tokio::test]
    async fn train_sends_multipart_fields() {
        let (addr, backend) = spawn_backend().await;
        let client = test_client(addr);

        let enrollment = client
            .train("carol", Bytes::from_static(b"RIFFdata"), "sample.wav")
            .await
            .unwrap();

        assert_eq!(enrollment.message, "model trained for carol");
        assert_eq!(backend.train_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn negative_prediction_is_a_success() {
        let (addr, _) = spawn_backend().await;
        let client = test_client(addr);

        let verdict = client
            .predict("mallory", Bytes::from_static(b"RIFFdata"), "sample.wav")
            .await
            .unwrap();

        assert_eq!(verdict, Verdict::NotMatched);
    }

    #[tokio::test]
    async fn positive_prediction_maps_to_matched() {
        let (addr, _) = spawn_backend().await;
        let client = test_client(addr);

        let verdict = client
            .predict("alice", Bytes::from_static(b"RIFFdata"), "sample.wav")
            .await
            .unwrap();

        assert!(verdict.is_match());
    }

    #[tokio::test]
    async fn server_error_is_classified() {
        let (addr, _) = spawn_backend().await;
        let client = test_client(addr);

        let err = client
            .http
            .get_json::<UsersResponse>("/broken")
            .await
            .unwrap_err();
        assert!(err.is_server_error());
    }

    #[tokio::test]
    async fn transport_error_surfaces_as_http() {
        // Bind and immediately drop a listener so the port refuses connections.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = test_client(addr);
        let err = client.users().await.unwrap_err();
        assert!(matches!(err, Error::Http(_)));
    }

    #[test]
    fn builder_rejects_empty_base_url() {
        assert!(matches!(
            Client::new(""),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn builder_strips_trailing_slash() {
        let client = Client::new("http://localhost:5000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
