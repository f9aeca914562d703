//! Response envelope returned to API Gateway, and the single function that
//! assembles it from an operation result.

use std::collections::BTreeMap;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::cookie::session_cookie;
use crate::session::SessionToken;

pub const CHALLENGE_HEADER: &str = "WWW-Authenticate";
pub const CHALLENGE_SCHEME: &str = "Basic";
pub const SET_COOKIE_HEADER: &str = "Set-Cookie";
pub const CONTENT_TYPE_HEADER: &str = "Content-Type";

pub type ResponseHeaders = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiGatewayResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub headers: ResponseHeaders,
    #[serde(rename = "isBase64Encoded")]
    pub is_base64_encoded: bool,
    pub body: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationStatus {
    Ok,
    NotFound,
}

impl OperationStatus {
    fn status_code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::NotFound => 404,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    Json(Value),
    /// Stored file content. UTF-8 content is encoded as a JSON string, any
    /// other content as a JSON string of its standard base64 form.
    Bytes(Vec<u8>),
}

impl Body {
    fn encode(self) -> Result<String, serde_json::Error> {
        match self {
            Self::Json(value) => serde_json::to_string(&value),
            Self::Bytes(bytes) => match String::from_utf8(bytes) {
                Ok(text) => serde_json::to_string(&text),
                Err(error) => serde_json::to_string(&STANDARD.encode(error.into_bytes())),
            },
        }
    }
}

/// What an operation produced, before session headers are merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResponse {
    pub status: OperationStatus,
    pub headers: ResponseHeaders,
    pub body: Option<Body>,
}

impl OperationResponse {
    pub fn empty() -> Self {
        Self {
            status: OperationStatus::Ok,
            headers: ResponseHeaders::new(),
            body: None,
        }
    }

    pub fn not_found() -> Self {
        Self {
            status: OperationStatus::NotFound,
            ..Self::empty()
        }
    }

    pub fn json(value: Value) -> Self {
        Self {
            body: Some(Body::Json(value)),
            ..Self::empty()
        }
    }

    pub fn bytes(content: Vec<u8>) -> Self {
        Self {
            body: Some(Body::Bytes(content)),
            ..Self::empty()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }
}

/// How the negotiated session affects the envelope.
#[derive(Debug, Clone, Copy)]
pub struct SessionDirective<'a> {
    pub challenge: bool,
    pub new_token: Option<&'a SessionToken>,
}

impl SessionDirective<'static> {
    pub const NONE: Self = SessionDirective {
        challenge: false,
        new_token: None,
    };

    pub const CHALLENGE: Self = SessionDirective {
        challenge: true,
        new_token: None,
    };
}

impl<'a> SessionDirective<'a> {
    pub fn issue(token: &'a SessionToken) -> Self {
        Self {
            challenge: false,
            new_token: Some(token),
        }
    }
}

#[derive(Debug, Error)]
pub enum ResponseError {
    #[error("invalid arguments: either challenge or session, not both")]
    ChallengeWithSession,

    #[error("failed to encode response body: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Builds the envelope for one request.
///
/// A challenge discards the operation result and yields a bare 401. Otherwise
/// operation headers are layered over the session cookie header, so an
/// operation header wins on key collision.
pub fn assemble_response(
    directive: SessionDirective<'_>,
    result: OperationResponse,
) -> Result<ApiGatewayResponse, ResponseError> {
    if directive.challenge && directive.new_token.is_some() {
        return Err(ResponseError::ChallengeWithSession);
    }

    if directive.challenge {
        return Ok(ApiGatewayResponse {
            status_code: 401,
            headers: ResponseHeaders::from([(
                CHALLENGE_HEADER.to_string(),
                CHALLENGE_SCHEME.to_string(),
            )]),
            is_base64_encoded: false,
            body: String::new(),
        });
    }

    let mut headers = ResponseHeaders::new();
    if let Some(token) = directive.new_token {
        headers.insert(
            SET_COOKIE_HEADER.to_string(),
            session_cookie(token.as_str()),
        );
    }
    headers.extend(result.headers);

    let body = match result.body {
        Some(body) => body.encode()?,
        None => String::new(),
    };

    Ok(ApiGatewayResponse {
        status_code: result.status.status_code(),
        headers,
        is_base64_encoded: false,
        body,
    })
}
