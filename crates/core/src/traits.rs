use crate::ClientError;
use async_trait::async_trait;

/// A body that yields raw chunks in arrival order, `None` once the channel ends.
#[async_trait]
pub trait ChunkSource: Send {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ClientError>;
}

#[async_trait]
impl ChunkSource for reqwest::Response {
    async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, ClientError> {
        Ok(self.chunk().await?.map(|bytes| bytes.to_vec()))
    }
}
