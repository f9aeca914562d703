use thiserror::Error;
use xcali_core::envelope::ResponseError;
use xcali_core::event::EventError;
use xcali_core::session::NegotiationError;
use xcali_core::store::StoreError;

/// Failure of a routed operation. Not-found lookups are not errors; they
/// become 404 responses inside the operation.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("unexpected httpMethod: {0}")]
    UnsupportedMethod(String),

    #[error("'title' parameter is required")]
    MissingTitle,

    #[error("body for {title} isn't a string")]
    MissingBody { title: String },

    #[error(transparent)]
    Event(#[from] EventError),

    #[error("failed to parse drawing content for {title} as JSON")]
    InvalidDrawing {
        title: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{context}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },
}

impl OperationError {
    pub fn store(context: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            context: context.into(),
            source,
        }
    }

    pub fn is_client_input(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedMethod(_)
                | Self::MissingTitle
                | Self::MissingBody { .. }
                | Self::Event(_)
        )
    }
}

/// Everything that aborts an invocation. All variants surface to the platform
/// as a generic failure; `is_client_input` only distinguishes them in logs.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("invalid event: {0}")]
    Event(#[from] EventError),

    #[error(transparent)]
    Negotiation(#[from] NegotiationError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Response(#[from] ResponseError),
}

impl DispatchError {
    pub fn is_client_input(&self) -> bool {
        match self {
            Self::Event(_) => true,
            Self::Operation(error) => error.is_client_input(),
            Self::Negotiation(_) | Self::Response(_) => false,
        }
    }
}
