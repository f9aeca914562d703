const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// Content type for a client asset, derived from its file extension.
///
/// Any other extension is served as `font/<ext>`. A file name without an
/// extension, or ending in a dot, is served as `application/octet-stream`.
pub fn content_type_for_path(path: &str) -> String {
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let Some((_, extension)) = file_name.rsplit_once('.') else {
        return FALLBACK_CONTENT_TYPE.to_string();
    };

    match extension {
        "html" => "text/html".to_string(),
        "js" => "text/javascript".to_string(),
        "css" => "text/css".to_string(),
        "" => FALLBACK_CONTENT_TYPE.to_string(),
        other => format!("font/{other}"),
    }
}
