use crate::event::{EventError, Headers};

pub const SESSION_COOKIE_NAME: &str = "xcaliapp-session";
pub const SESSION_COOKIE_MAX_AGE_SECS: u32 = 3600;

pub const COOKIE_HEADER: &str = "Cookie";

/// Finds the session cookie value in the `Cookie` header.
///
/// Segments without `=` are skipped unless their name is the session cookie.
/// When the cookie appears more than once the last occurrence wins.
pub fn extract_session_token(headers: &Headers) -> Result<Option<String>, EventError> {
    let Some(cookie_header) = headers.get(COOKIE_HEADER) else {
        return Ok(None);
    };

    let mut token = None;
    for segment in cookie_header.split(';') {
        let segment = segment.trim();
        match segment.split_once('=') {
            Some((name, value)) if name.trim() == SESSION_COOKIE_NAME => {
                token = Some(value.trim().to_string());
            }
            None if segment == SESSION_COOKIE_NAME => {
                return Err(EventError::MalformedCookie(SESSION_COOKIE_NAME.to_string()));
            }
            _ => {}
        }
    }

    Ok(token.filter(|value| !value.is_empty()))
}

/// `Set-Cookie` value establishing a session.
pub fn session_cookie(token: &str) -> String {
    format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; Max-Age={SESSION_COOKIE_MAX_AGE_SECS}; HttpOnly; Secure; SameSite=Lax"
    )
}
