use tracing::info;
use xcali_core::content_type::content_type_for_path;
use xcali_core::envelope::{OperationResponse, CONTENT_TYPE_HEADER};
use xcali_core::invocation::Invocation;

use crate::adapters::asset_store::AssetStore;
use crate::handlers::error::OperationError;

/// Serves a client asset with a content type derived from its path.
pub async fn serve_asset(
    store: &dyn AssetStore,
    invocation: &Invocation,
    path: &str,
) -> Result<OperationResponse, OperationError> {
    let content = match invocation.bound("get_asset", store.get_asset(path)).await {
        Ok(content) => content,
        Err(error) if error.is_not_found() => {
            info!(component = "assets", event = "asset_not_found", path);
            return Ok(OperationResponse::not_found());
        }
        Err(source) => {
            return Err(OperationError::store(
                format!("failed to read client asset {path}"),
                source,
            ))
        }
    };

    let content_type = content_type_for_path(path);
    info!(
        component = "assets",
        event = "asset_served",
        path,
        content_type = %content_type,
        bytes = content.len()
    );

    Ok(OperationResponse::bytes(content).with_header(CONTENT_TYPE_HEADER, content_type))
}
