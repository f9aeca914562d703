use serde_json::Value;
use tracing::info;
use xcali_core::envelope::{OperationResponse, CONTENT_TYPE_HEADER};
use xcali_core::invocation::Invocation;

use crate::adapters::drawing_store::DrawingStore;
use crate::handlers::error::OperationError;

const JSON_CONTENT_TYPE: &str = "application/json";

pub async fn list_drawings(
    store: &dyn DrawingStore,
    invocation: &Invocation,
) -> Result<OperationResponse, OperationError> {
    let titles = invocation
        .bound("list_titles", store.list_titles())
        .await
        .map_err(|source| OperationError::store("failed to list drawing titles", source))?;

    info!(component = "drawings", event = "drawings_listed", count = titles.len());
    Ok(OperationResponse::json(Value::from(titles)))
}

/// Returns the stored drawing parsed as JSON, or a not-found response.
pub async fn get_drawing(
    store: &dyn DrawingStore,
    invocation: &Invocation,
    title: &str,
) -> Result<OperationResponse, OperationError> {
    let content = match invocation
        .bound("get_by_title", store.get_by_title(title))
        .await
    {
        Ok(content) => content,
        Err(error) if error.is_not_found() => {
            info!(component = "drawings", event = "drawing_not_found", title);
            return Ok(OperationResponse::not_found());
        }
        Err(source) => {
            return Err(OperationError::store(
                format!("failed to get drawing content for {title}"),
                source,
            ))
        }
    };

    let drawing: Value =
        serde_json::from_slice(&content).map_err(|source| OperationError::InvalidDrawing {
            title: title.to_string(),
            source,
        })?;

    info!(
        component = "drawings",
        event = "drawing_loaded",
        title,
        bytes = content.len()
    );
    Ok(OperationResponse::json(drawing).with_header(CONTENT_TYPE_HEADER, JSON_CONTENT_TYPE))
}

/// Stores the request body verbatim under `title`.
pub async fn put_drawing(
    store: &dyn DrawingStore,
    invocation: &Invocation,
    title: &str,
    content: &str,
) -> Result<OperationResponse, OperationError> {
    // TODO: pass the editor as `modified_by` once sessions carry an identity.
    invocation
        .bound(
            "put_by_title",
            store.put_by_title(title, content.as_bytes().to_vec(), None),
        )
        .await
        .map_err(|source| OperationError::store(format!("failed to store drawing {title}"), source))?;

    info!(
        component = "drawings",
        event = "drawing_stored",
        title,
        bytes = content.len()
    );
    Ok(OperationResponse::empty())
}
