pub mod analytics;
pub mod client;
pub mod decoder;
pub mod error;
pub mod highlight;
pub mod models;
pub mod progress;
pub mod ranking;
pub mod session;
pub mod traits;

pub use analytics::{
    analyze, collection_stats, paragraphs, AnalyticsReport, CollectionStats, TokenCount,
    TOP_TOKEN_LIMIT,
};
pub use client::{error_message, ApiClient, ClientConfig, DEFAULT_BASE_URL};
pub use decoder::{parse_payload, StreamDecoder, DEFAULT_MAX_LINE_BYTES, EVENT_PREFIX};
pub use error::{ClientError, DecodeError, Result};
pub use highlight::{highlight, Segment};
pub use models::{
    DocumentDetail, DocumentSummary, DocumentTerms, HealthCheck, IngestionEvent, ProgressUpdate,
    SearchRequest, SearchResponse, SearchResult, TfidfMatrix, UploadRequest, UploadResponse,
    WeightedTerm,
};
pub use progress::{apply_progress, IngestionState, PipelineStage, ProgressSnapshot};
pub use ranking::{normalize, RankedDisplay, RelevanceTier};
pub use session::{IngestionSession, SessionReport};
pub use traits::ChunkSource;
pub use tokio_util::sync::CancellationToken;
