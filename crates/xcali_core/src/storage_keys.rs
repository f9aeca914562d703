pub const SESSIONS_PREFIX: &str = "sessions/";
pub const DRAWINGS_PREFIX: &str = "drawings/";
pub const CLIENT_ASSETS_PREFIX: &str = "webclient/";
pub const ALLOWED_CREDENTIAL_KEY: &str = "credentials/authorization";

pub fn session_object_key(token: &str) -> String {
    format!("{SESSIONS_PREFIX}{token}")
}

pub fn drawing_object_key(title: &str) -> String {
    format!("{DRAWINGS_PREFIX}{title}")
}

pub fn client_asset_object_key(path: &str) -> String {
    format!("{CLIENT_ASSETS_PREFIX}{}", path.trim_start_matches('/'))
}

/// Strips `prefix` from a listed key. Returns `None` for the prefix
/// placeholder object itself and for keys outside the prefix.
pub fn name_under_prefix<'a>(prefix: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(prefix).filter(|name| !name.is_empty())
}
