use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{info, warn};
use xcali_core::cookie::extract_session_token;
use xcali_core::envelope::{
    assemble_response, ApiGatewayResponse, OperationResponse, SessionDirective,
};
use xcali_core::event::InboundEvent;
use xcali_core::invocation::Invocation;
use xcali_core::session::{NegotiationOutcome, SessionNegotiator, SessionStore};

use crate::adapters::asset_store::AssetStore;
use crate::adapters::drawing_store::DrawingStore;
use crate::handlers::assets::serve_asset;
use crate::handlers::drawings::{get_drawing, list_drawings, put_drawing};
use crate::handlers::error::{DispatchError, OperationError};
use crate::handlers::routes::{resolve_route, Route};

pub const ECHO_MESSAGE: &str = "hello, xcali!";

#[derive(Debug, Clone, Copy)]
enum EntryPoint {
    Routed,
    Echo,
}

/// Authenticates inbound events and turns them into API Gateway responses.
///
/// Store handles are injected once per process and shared by every
/// invocation.
#[derive(Clone)]
pub struct RequestDispatcher {
    negotiator: SessionNegotiator,
    drawings: Arc<dyn DrawingStore>,
    assets: Arc<dyn AssetStore>,
}

impl RequestDispatcher {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        drawings: Arc<dyn DrawingStore>,
        assets: Arc<dyn AssetStore>,
    ) -> Self {
        Self {
            negotiator: SessionNegotiator::new(sessions),
            drawings,
            assets,
        }
    }

    /// Serves client assets and the drawing API.
    pub async fn dispatch(
        &self,
        raw_event: Value,
        invocation: &Invocation,
    ) -> Result<ApiGatewayResponse, DispatchError> {
        self.handle(raw_event, invocation, EntryPoint::Routed).await
    }

    /// Authenticates like [`Self::dispatch`] but answers with a fixed greeting.
    pub async fn echo(
        &self,
        raw_event: Value,
        invocation: &Invocation,
    ) -> Result<ApiGatewayResponse, DispatchError> {
        self.handle(raw_event, invocation, EntryPoint::Echo).await
    }

    async fn handle(
        &self,
        raw_event: Value,
        invocation: &Invocation,
        entry: EntryPoint,
    ) -> Result<ApiGatewayResponse, DispatchError> {
        let result = self.respond(raw_event, invocation, entry).await;
        if let Err(error) = &result {
            warn!(
                component = "dispatcher",
                event = "request_failed",
                request_id = invocation.request_id(),
                client_input = error.is_client_input(),
                error = %error
            );
        }
        result
    }

    async fn respond(
        &self,
        raw_event: Value,
        invocation: &Invocation,
        entry: EntryPoint,
    ) -> Result<ApiGatewayResponse, DispatchError> {
        let event = InboundEvent::from_value(raw_event)?;
        info!(
            component = "dispatcher",
            event = "request_received",
            request_id = invocation.request_id(),
            method = %event.http_method,
            path = %event.path
        );

        let received_token = extract_session_token(&event.headers)?;
        let outcome = self
            .negotiator
            .negotiate(invocation, received_token.as_deref(), &event.headers)
            .await?;

        let new_token = match &outcome {
            NegotiationOutcome::ChallengeRequired => {
                info!(
                    component = "dispatcher",
                    event = "challenge_sent",
                    request_id = invocation.request_id()
                );
                return Ok(assemble_response(
                    SessionDirective::CHALLENGE,
                    OperationResponse::empty(),
                )?);
            }
            NegotiationOutcome::Authenticated { new_token } => new_token.as_ref(),
        };

        let result = match entry {
            EntryPoint::Routed => self.run_operation(&event, invocation).await?,
            EntryPoint::Echo => OperationResponse::json(json!({ "message": ECHO_MESSAGE })),
        };

        let directive = new_token.map_or(SessionDirective::NONE, SessionDirective::issue);
        let response = assemble_response(directive, result)?;
        info!(
            component = "dispatcher",
            event = "request_completed",
            request_id = invocation.request_id(),
            status_code = response.status_code,
            session_issued = new_token.is_some()
        );
        Ok(response)
    }

    async fn run_operation(
        &self,
        event: &InboundEvent,
        invocation: &Invocation,
    ) -> Result<OperationResponse, OperationError> {
        match resolve_route(event)? {
            Route::Asset { path } => serve_asset(self.assets.as_ref(), invocation, &path).await,
            Route::ListDrawings => list_drawings(self.drawings.as_ref(), invocation).await,
            Route::GetDrawing { title } => {
                get_drawing(self.drawings.as_ref(), invocation, &title).await
            }
            Route::PutDrawing { title, content } => {
                put_drawing(self.drawings.as_ref(), invocation, &title, &content).await
            }
        }
    }
}
