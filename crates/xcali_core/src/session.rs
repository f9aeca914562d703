use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::event::Headers;
use crate::invocation::Invocation;
use crate::store::{StoreError, StoreResult};

pub const AUTHORIZATION_HEADER: &str = "authorization";

/// Opaque session identifier exchanged through the session cookie.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Tokens are bearer secrets; keep them out of debug logs.
impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken(..)")
    }
}

/// Backing store for sessions and the deployment credential.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn list_valid_tokens(&self) -> StoreResult<Vec<String>>;

    async fn allowed_credential(&self) -> StoreResult<String>;

    async fn create_token(&self) -> StoreResult<SessionToken>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationOutcome {
    /// The request may proceed. `new_token` is set only when a session was
    /// issued during this negotiation and must be handed to the client.
    Authenticated { new_token: Option<SessionToken> },
    ChallengeRequired,
}

impl NegotiationOutcome {
    pub fn is_challenge(&self) -> bool {
        matches!(self, Self::ChallengeRequired)
    }

    pub fn new_token(&self) -> Option<&SessionToken> {
        match self {
            Self::Authenticated { new_token } => new_token.as_ref(),
            Self::ChallengeRequired => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStep {
    ListSessions,
    FetchCredential,
    CreateSession,
}

impl fmt::Display for NegotiationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ListSessions => "failed to list sessions",
            Self::FetchCredential => "failed to get allowed credentials",
            Self::CreateSession => "failed to create session",
        })
    }
}

#[derive(Debug, Error)]
#[error("{step}")]
pub struct NegotiationError {
    pub step: NegotiationStep,
    #[source]
    pub source: StoreError,
}

#[derive(Clone)]
pub struct SessionNegotiator {
    store: Arc<dyn SessionStore>,
}

impl SessionNegotiator {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Decides whether a request is authenticated.
    ///
    /// A received token must be in the store's valid set; it is never
    /// upgraded through the authorization header. Without a token, a missing
    /// `authorization` header is challenged, the allowed credential passes
    /// as is, and any other value is issued a fresh session.
    pub async fn negotiate(
        &self,
        invocation: &Invocation,
        received_token: Option<&str>,
        headers: &Headers,
    ) -> Result<NegotiationOutcome, NegotiationError> {
        if let Some(received) = received_token.filter(|token| !token.is_empty()) {
            let valid_tokens = invocation
                .bound("list_valid_tokens", self.store.list_valid_tokens())
                .await
                .map_err(|source| NegotiationError {
                    step: NegotiationStep::ListSessions,
                    source,
                })?;

            if valid_tokens.iter().any(|valid| valid == received) {
                debug!(component = "negotiator", event = "session_accepted");
                return Ok(NegotiationOutcome::Authenticated { new_token: None });
            }

            info!(
                component = "negotiator",
                event = "session_rejected",
                known_sessions = valid_tokens.len()
            );
            return Ok(NegotiationOutcome::ChallengeRequired);
        }

        let Some(authorization) = headers.get(AUTHORIZATION_HEADER) else {
            info!(component = "negotiator", event = "authorization_missing");
            return Ok(NegotiationOutcome::ChallengeRequired);
        };

        let allowed = invocation
            .bound("allowed_credential", self.store.allowed_credential())
            .await
            .map_err(|source| NegotiationError {
                step: NegotiationStep::FetchCredential,
                source,
            })?;

        if &allowed == authorization {
            debug!(component = "negotiator", event = "credential_accepted");
            return Ok(NegotiationOutcome::Authenticated { new_token: None });
        }

        let token = invocation
            .bound("create_token", self.store.create_token())
            .await
            .map_err(|source| NegotiationError {
                step: NegotiationStep::CreateSession,
                source,
            })?;

        info!(component = "negotiator", event = "session_issued");
        Ok(NegotiationOutcome::Authenticated {
            new_token: Some(token),
        })
    }
}
