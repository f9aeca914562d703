use async_trait::async_trait;
use xcali_core::store::StoreResult;

#[async_trait]
pub trait DrawingStore: Send + Sync {
    /// Titles in ascending order.
    async fn list_titles(&self) -> StoreResult<Vec<String>>;

    /// Raw drawing content; `StoreError::NotFound` when no drawing has `title`.
    async fn get_by_title(&self, title: &str) -> StoreResult<Vec<u8>>;

    async fn put_by_title(
        &self,
        title: &str,
        content: Vec<u8>,
        modified_by: Option<&str>,
    ) -> StoreResult<()>;
}
