use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::response;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Error fetching URL: {0}")]
    FetchError(String),

    #[error(
        "OpenAI API key not found. Please set OPENAI_API_KEY environment variable or pass it as a parameter."
    )]
    MissingCredential,

    #[error("Error calling OpenAI API: {0}")]
    CompletionError(String),

    #[error("Error summarizing content: {0}")]
    SummarizationError(String),

    #[error("LLM request failed: {0}")]
    LlmError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::InvalidUrl(_) | AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::FetchError(_) => StatusCode::BAD_GATEWAY,
            AppError::MissingCredential => StatusCode::UNAUTHORIZED,
            AppError::CompletionError(_)
            | AppError::SummarizationError(_)
            | AppError::LlmError(_) => StatusCode::BAD_GATEWAY,
            AppError::ConfigError(_) | AppError::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (status, body): (StatusCode, Json<response::ApiResponse<()>>) =
            response::error(status, self.to_string());
        (status, body).into_response()
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::FetchError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
