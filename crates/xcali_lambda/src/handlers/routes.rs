use xcali_core::event::InboundEvent;

use crate::handlers::error::OperationError;

pub const DRAWING_COLLECTION_PATH: &str = "/api/drawing";
const DRAWING_ITEM_PREFIX: &str = "/api/drawing/";
const TITLE_PARAM: &str = "title";
const INDEX_PATH: &str = "/index.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Asset { path: String },
    ListDrawings,
    GetDrawing { title: String },
    PutDrawing { title: String, content: String },
}

/// Maps an authenticated event to the operation serving it.
///
/// `/api/drawing` takes the title from the query string, `/api/drawing/{title}`
/// from the path parameters. Every other path is a client asset.
pub fn resolve_route(event: &InboundEvent) -> Result<Route, OperationError> {
    let method = event.http_method.as_str();

    if event.path == DRAWING_COLLECTION_PATH {
        let title = non_empty(event.query_param(TITLE_PARAM)?);
        return match (method, title) {
            ("GET", None) => Ok(Route::ListDrawings),
            ("GET", Some(title)) => Ok(Route::GetDrawing {
                title: title.to_string(),
            }),
            ("PUT", Some(title)) => put_route(event, title),
            ("PUT", None) => Err(OperationError::MissingTitle),
            _ => Err(OperationError::UnsupportedMethod(method.to_string())),
        };
    }

    if event.path.starts_with(DRAWING_ITEM_PREFIX) {
        if method != "GET" && method != "PUT" {
            return Err(OperationError::UnsupportedMethod(method.to_string()));
        }
        let title =
            non_empty(event.path_param(TITLE_PARAM)?).ok_or(OperationError::MissingTitle)?;
        return match method {
            "GET" => Ok(Route::GetDrawing {
                title: title.to_string(),
            }),
            _ => put_route(event, title),
        };
    }

    if method != "GET" {
        return Err(OperationError::UnsupportedMethod(method.to_string()));
    }

    Ok(Route::Asset {
        path: asset_path(&event.path).to_string(),
    })
}

/// The site root serves the client's entry page.
pub fn asset_path(path: &str) -> &str {
    if path == "/" {
        INDEX_PATH
    } else {
        path
    }
}

fn put_route(event: &InboundEvent, title: &str) -> Result<Route, OperationError> {
    let content = event
        .body_text()?
        .ok_or_else(|| OperationError::MissingBody {
            title: title.to_string(),
        })?;
    Ok(Route::PutDrawing {
        title: title.to_string(),
        content: content.to_string(),
    })
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|text| !text.is_empty())
}
