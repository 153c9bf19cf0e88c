use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, error, instrument};

use crate::config::TriageConfig;
use crate::errors::{TriageError, TriageResult};
use crate::types::*;

/// The operations the client needs from the TruthTriage backend.
///
/// `TriageClient` is the HTTP implementation; sessions take the trait so they
/// can be driven without a server.
#[async_trait]
pub trait TriageBackend: Send + Sync {
    /// Ask a question (`POST /chat`)
    async fn send_message(&self, query: &str) -> TriageResult<ChatResponse>;

    /// Find specialists near a location (`POST /doctors`)
    async fn find_doctors(&self, query: &str, location: &str) -> TriageResult<DoctorSearch>;
}

/// Client for the TruthTriage HTTP API
#[derive(Debug, Clone)]
pub struct TriageClient {
    client: Client,
    base_url: String,
}

impl TriageClient {
    /// Create a new client for the configured backend
    pub fn new(config: &TriageConfig) -> TriageResult<Self> {
        Self::with_base_url(&config.api_base_url())
    }

    pub fn with_base_url(base_url: &str) -> TriageResult<Self> {
        let base_url = base_url.trim().trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(TriageError::ConfigError(format!(
                "Backend URL must start with http:// or https://, got '{}'",
                base_url
            )));
        }

        let client = Client::builder().build().map_err(|e| {
            TriageError::ConfigError(format!("Failed to build HTTP client: {}", e))
        })?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Liveness probe (`GET /health`)
    #[instrument(skip(self))]
    pub async fn check_health(&self) -> TriageResult<HealthStatus> {
        let response = self
            .client
            .get(self.url("/health"))
            .send()
            .await
            .map_err(|e| TriageError::RequestError(format!("Failed to send request: {}", e)))?;
        Self::parse(response, "/health").await
    }

    /// Documents the backend has indexed (`GET /documents`)
    #[instrument(skip(self))]
    pub async fn list_documents(&self) -> TriageResult<Vec<DocumentInfo>> {
        let response = self
            .client
            .get(self.url("/documents"))
            .send()
            .await
            .map_err(|e| TriageError::RequestError(format!("Failed to send request: {}", e)))?;
        let list: DocumentList = Self::parse(response, "/documents").await?;
        Ok(list.documents)
    }

    async fn post<B, T>(&self, path: &str, body: &B) -> TriageResult<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        debug!("POST {}", path);
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(path, error = %e, "Backend unreachable");
                TriageError::RequestError(format!("Failed to send request: {}", e))
            })?;
        Self::parse(response, path).await
    }

    async fn parse<T: DeserializeOwned>(response: Response, path: &str) -> TriageResult<T> {
        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.map_err(|e| {
                TriageError::RequestError(format!("Failed to read error response: {}", e))
            })?;
            error!(path, status = status.as_u16(), "Backend returned an error");

            return Err(TriageError::HttpError {
                status_code: status.as_u16(),
                message: format!("API request failed: {}", error_body),
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| TriageError::ParsingError(format!("Failed to parse response: {}", e)))
    }
}

#[async_trait]
impl TriageBackend for TriageClient {
    #[instrument(skip(self, query))]
    async fn send_message(&self, query: &str) -> TriageResult<ChatResponse> {
        let request = ChatRequest {
            query: query.to_string(),
        };
        let response: ChatResponse = self.post("/chat", &request).await?;
        debug!(
            sources = response.sources.len(),
            medicines = response.medicines.len(),
            "Received answer"
        );
        Ok(response)
    }

    #[instrument(skip(self, query))]
    async fn find_doctors(&self, query: &str, location: &str) -> TriageResult<DoctorSearch> {
        let request = DoctorRequest {
            query: query.to_string(),
            location: location.to_string(),
        };
        let search: DoctorSearch = self.post("/doctors", &request).await?;
        debug!(doctors = search.doctors.len(), "Received doctor search");
        Ok(search)
    }
}
