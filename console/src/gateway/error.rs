//! Gateway error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Errors answered by the gateway
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid IP address format")]
    InvalidIp,

    #[error("IP not found in credential vault")]
    UnknownIp,

    #[error("Device not found")]
    DeviceNotFound,

    #[error("Failed to connect to device: {0}")]
    ApplianceUnreachable(String),
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::InvalidIp => StatusCode::BAD_REQUEST,
            GatewayError::UnknownIp | GatewayError::DeviceNotFound => StatusCode::NOT_FOUND,
            GatewayError::ApplianceUnreachable(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Error body, `{"detail": "..."}`
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}
