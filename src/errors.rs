use axum::http::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("scheduling API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl RelayError {
    /// Only authentication failures leave the 200 lane; everything else is
    /// handed back to the agent as a readable reply.
    pub fn status_code(&self) -> StatusCode {
        match self {
            RelayError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            RelayError::InvalidInput(_) => StatusCode::OK,
            RelayError::Upstream { .. } => StatusCode::OK,
            RelayError::Internal(_) => StatusCode::OK,
        }
    }
}
