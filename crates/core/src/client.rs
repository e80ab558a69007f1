use crate::models::{
    DocumentDetail, DocumentDetailPayload, DocumentListPayload, DocumentSummary, HealthCheck,
    SearchRequest, SearchResponse, TfidfMatrix, UploadRequest, UploadResponse,
};
use crate::progress::IngestionState;
use crate::session::{IngestionSession, SessionReport};
use crate::{ClientError, Result};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    /// Applies to every request except the ingestion stream.
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub default_top_k: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            default_top_k: 10,
        }
    }
}

pub struct ApiClient {
    client: Client,
    base_url: Url,
    request_timeout: Duration,
    default_top_k: usize,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url,
            request_timeout: config.request_timeout,
            default_top_k: config.default_top_k,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn default_top_k(&self) -> usize {
        self.default_top_k
    }

    pub async fn health(&self) -> Result<HealthCheck> {
        self.get_json(self.endpoint("")?).await
    }

    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let payload: DocumentListPayload = self.get_json(self.endpoint("api/documents")?).await?;
        Ok(payload.into_documents())
    }

    pub async fn document_detail(&self, id: &str) -> Result<DocumentDetail> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ClientError::InvalidArgument(
                "document id is empty".to_string(),
            ));
        }

        let mut url = self.endpoint("api/document")?;
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidArgument("base url cannot carry a path".to_string()))?
            .push(id);

        let payload: DocumentDetailPayload = self.get_json(url).await?;
        Ok(payload.into_detail())
    }

    pub async fn search(&self, query: &str, top_k: Option<usize>) -> Result<SearchResponse> {
        if query.trim().is_empty() {
            return Err(ClientError::InvalidArgument("query is empty".to_string()));
        }

        let request = SearchRequest {
            query,
            top_k: top_k.unwrap_or(self.default_top_k),
        };
        self.post_json(self.endpoint("api/search")?, &request).await
    }

    /// Non-streaming ingestion; blocks until the server has indexed the whole folder.
    pub async fn upload(&self, folder_path: &str) -> Result<UploadResponse> {
        let folder_path = require_folder(folder_path)?;
        self.post_json(self.endpoint("api/upload")?, &UploadRequest { folder_path })
            .await
    }

    pub async fn tfidf_matrix(&self) -> Result<TfidfMatrix> {
        self.get_json(self.endpoint("api/tfidf-matrix")?).await
    }

    /// Starts a streamed ingestion and returns the still-unread response body.
    pub async fn open_ingestion_stream(&self, folder_path: &str) -> Result<Response> {
        let folder_path = require_folder(folder_path)?;
        let url = self.endpoint("api/upload-stream")?;
        debug!(%url, folder_path, "opening ingestion stream");

        let response = self
            .client
            .post(url.clone())
            .json(&UploadRequest { folder_path })
            .send()
            .await?;

        ensure_success(&url, response).await
    }

    /// Streams ingestion of `folder_path` to completion.
    pub async fn ingest<F>(
        &self,
        folder_path: &str,
        cancel: &CancellationToken,
        on_update: F,
    ) -> Result<SessionReport>
    where
        F: FnMut(&IngestionState),
    {
        let mut response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ClientError::Cancelled),
            response = self.open_ingestion_stream(folder_path) => response?,
        };

        IngestionSession::new()
            .run(&mut response, cancel, on_update)
            .await
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.request_timeout)
            .send()
            .await?;

        let response = ensure_success(&url, response).await?;
        Ok(response.json().await?)
    }

    async fn post_json<B, T>(&self, url: Url, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(url.clone())
            .timeout(self.request_timeout)
            .json(body)
            .send()
            .await?;

        let response = ensure_success(&url, response).await?;
        Ok(response.json().await?)
    }
}

fn require_folder(folder_path: &str) -> Result<&str> {
    let folder_path = folder_path.trim();
    if folder_path.is_empty() {
        return Err(ClientError::InvalidArgument(
            "folder path is empty".to_string(),
        ));
    }
    Ok(folder_path)
}

async fn ensure_success(url: &Url, response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status, &body);
    warn!(endpoint = %url.path(), status = status.as_u16(), %message, "request failed");

    Err(ClientError::Api {
        endpoint: url.path().to_string(),
        status: status.as_u16(),
        message,
    })
}

/// Best available explanation for a failed response: the JSON `detail`, the body text, or the status reason.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        match value.get("detail") {
            Some(Value::String(detail)) if !detail.trim().is_empty() => {
                return detail.trim().to_string()
            }
            Some(Value::Null) | Some(Value::String(_)) | None => {}
            Some(other) => return other.to_string(),
        }
    }

    let body = body.trim();
    if !body.is_empty() {
        return body.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("request failed")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> ApiClient {
        ApiClient::new(&ClientConfig {
            base_url: base_url.to_string(),
            ..ClientConfig::default()
        })
        .expect("client should build")
    }

    #[test]
    fn endpoints_keep_the_base_path_prefix() {
        let api = client("http://indexer.local:9000/v1");
        assert_eq!(
            api.endpoint("/api/search").unwrap().as_str(),
            "http://indexer.local:9000/v1/api/search"
        );
        assert_eq!(api.endpoint("").unwrap().as_str(), "http://indexer.local:9000/v1/");

        let api = client(DEFAULT_BASE_URL);
        assert_eq!(
            api.endpoint("api/documents").unwrap().as_str(),
            "http://localhost:8000/api/documents"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = ApiClient::new(&ClientConfig {
            base_url: "not a url".to_string(),
            ..ClientConfig::default()
        });
        assert!(matches!(result, Err(ClientError::Url(_))));
    }

    #[test]
    fn error_message_prefers_detail_then_body_then_status() {
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, r#"{"detail":"Folder not found"}"#),
            "Folder not found"
        );
        assert_eq!(
            error_message(
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"detail":[{"loc":["body","query"]}]}"#
            ),
            r#"[{"loc":["body","query"]}]"#
        );
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "upstream unavailable\n"),
            "upstream unavailable"
        );
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "Internal Server Error"
        );
    }

    #[tokio::test]
    async fn blank_inputs_are_rejected_before_any_request() {
        let api = client("http://127.0.0.1:9");

        assert!(matches!(
            api.search("   ", None).await,
            Err(ClientError::InvalidArgument(_))
        ));
        assert!(matches!(
            api.open_ingestion_stream("").await,
            Err(ClientError::InvalidArgument(_))
        ));
        assert!(matches!(
            api.document_detail(" ").await,
            Err(ClientError::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn cancelled_ingest_never_opens_the_stream() {
        let api = client("http://127.0.0.1:9");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = api.ingest("/docs", &cancel, |_| {}).await;
        assert!(matches!(result, Err(ClientError::Cancelled)));
    }
}
