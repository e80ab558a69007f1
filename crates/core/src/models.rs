use serde::{Deserialize, Deserializer, Serialize};

/// Lightweight listing entry for one indexed document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSummary {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub filename: String,
    #[serde(default)]
    pub original_text_preview: String,
    #[serde(default)]
    pub processed_text_preview: String,
    #[serde(default)]
    pub word_count: u64,
}

/// Full record for one document as returned by the detail endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentDetail {
    #[serde(deserialize_with = "id_from_string_or_number")]
    pub id: String,
    pub filename: String,
    #[serde(default, rename = "file_path")]
    pub path: String,
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub processed_text: String,
    #[serde(default)]
    pub tokens: Vec<String>,
    #[serde(default)]
    pub word_count: u64,
}

/// The detail endpoint answers either with the record itself or wrapped in `{"document": ...}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum DocumentDetailPayload {
    Wrapped { document: DocumentDetail },
    Bare(DocumentDetail),
}

impl DocumentDetailPayload {
    pub(crate) fn into_detail(self) -> DocumentDetail {
        match self {
            DocumentDetailPayload::Wrapped { document } => document,
            DocumentDetailPayload::Bare(document) => document,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum DocumentListPayload {
    Wrapped { documents: Vec<DocumentSummary> },
    Bare(Vec<DocumentSummary>),
}

impl DocumentListPayload {
    pub(crate) fn into_documents(self) -> Vec<DocumentSummary> {
        match self {
            DocumentListPayload::Wrapped { documents } => documents,
            DocumentListPayload::Bare(documents) => documents,
        }
    }
}

/// One progress report from the ingestion stream, as sent by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressUpdate {
    pub current: i64,
    pub total: i64,
    pub filename: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionEvent {
    Progress(ProgressUpdate),
    Complete(Vec<DocumentSummary>),
}

impl IngestionEvent {
    pub fn is_complete(&self) -> bool {
        matches!(self, IngestionEvent::Complete(_))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadRequest<'a> {
    pub folder_path: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub total_documents: u64,
    #[serde(default)]
    pub documents: Vec<DocumentSummary>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchRequest<'a> {
    pub query: &'a str,
    pub top_k: usize,
}

/// One ranked hit. Results arrive sorted by descending similarity with rank starting at 1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchResult {
    pub rank: u32,
    #[serde(default)]
    pub doc_index: Option<u64>,
    pub filename: String,
    pub similarity: f64,
    #[serde(default)]
    pub original_text: String,
    #[serde(default)]
    pub processed_text: String,
    #[serde(default)]
    pub word_count: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub query_original: String,
    #[serde(default)]
    pub query_processed: String,
    #[serde(default)]
    pub query_tokens: Vec<String>,
    #[serde(default)]
    pub total_results: u64,
    #[serde(default)]
    pub results: Vec<SearchResult>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HealthCheck {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub indexed: bool,
    #[serde(default)]
    pub total_documents: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeightedTerm {
    pub term: String,
    pub tfidf: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentTerms {
    pub doc_index: u64,
    #[serde(default)]
    pub top_terms: Vec<WeightedTerm>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TfidfMatrix {
    #[serde(default)]
    pub num_documents: u64,
    #[serde(default)]
    pub num_terms: u64,
    #[serde(default)]
    pub documents: Vec<DocumentTerms>,
    #[serde(default)]
    pub terms: Vec<String>,
    #[serde(default)]
    pub matrix: Vec<Vec<f64>>,
}

fn id_from_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Integer(i64),
        Unsigned(u64),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(value) => value,
        RawId::Integer(value) => value.to_string(),
        RawId::Unsigned(value) => value.to_string(),
    })
}
