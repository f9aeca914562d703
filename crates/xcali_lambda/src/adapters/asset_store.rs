use async_trait::async_trait;
use xcali_core::store::StoreResult;

#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Client asset bytes for an absolute request path such as `/index.html`.
    async fn get_asset(&self, path: &str) -> StoreResult<Vec<u8>>;
}
