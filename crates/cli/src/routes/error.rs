use axum::{
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use runny_engine::{DispatchError, LookupTarget};
use runny_registry::{CatalogueError, WebhookError};
use runny_remote::ExecError;
use tracing::{debug, error, warn};

/// A failed request: status plus a plain-text body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    output: Vec<u8>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            output: Vec::new(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    fn with_output(mut self, output: &[u8]) -> Self {
        self.output = output.to_vec();
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut body = self.message.into_bytes();
        body.push(b'\n');
        body.extend_from_slice(&self.output);
        (self.status, [(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response()
    }
}

impl From<DispatchError> for ApiError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::Validation(error) => {
                debug!(variable = %error.variable_name(), "rejected command arguments");
                Self::bad_request(error.to_string())
            }
            DispatchError::NotFound(LookupTarget::Command) => Self::not_found("Command not found"),
            DispatchError::NotFound(LookupTarget::Webhook) => Self::not_found("Webhook not found"),
            DispatchError::Execution(error) => error.into(),
            DispatchError::Catalogue(error) => error.into(),
            DispatchError::Webhook(error) => error.into(),
        }
    }
}

impl From<ExecError> for ApiError {
    fn from(error: ExecError) -> Self {
        let status = match error {
            ExecError::TimedOut(_) => StatusCode::GATEWAY_TIMEOUT,
            ExecError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        warn!(error = %error, "command execution failed");
        let message = format!("Failed to execute command: {error}");
        let output = error.output().unwrap_or_default();
        Self::new(status, message).with_output(output)
    }
}

impl From<CatalogueError> for ApiError {
    fn from(error: CatalogueError) -> Self {
        match error {
            CatalogueError::ManipulationDisabled => Self::new(StatusCode::UNAUTHORIZED, error.to_string()),
            CatalogueError::DuplicateName(_) | CatalogueError::InvalidInput(_) => Self::bad_request(error.to_string()),
            CatalogueError::NotFound(_) => Self::not_found(error.to_string()),
            CatalogueError::Read { .. } | CatalogueError::Write { .. } => {
                error!(error = %error, "catalogue storage failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
        }
    }
}

impl From<WebhookError> for ApiError {
    fn from(error: WebhookError) -> Self {
        match error {
            WebhookError::Duplicate(_) => Self::bad_request(error.to_string()),
            WebhookError::NotFound(_) => Self::not_found("Webhook not found"),
            WebhookError::Read { .. } | WebhookError::Write { .. } | WebhookError::Json { .. } | WebhookError::Url(_) => {
                error!(error = %error, "webhook registry failure");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
            }
        }
    }
}
