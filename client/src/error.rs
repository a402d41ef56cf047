use reqwest::StatusCode;
use thiserror::Error;
use zoekt_nav_core::NavError;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("search request failed: {status} - {body}")]
    Status { status: StatusCode, body: String },

    #[error("search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Config(#[from] NavError),

    #[error("query is empty")]
    EmptyQuery,
}

pub type Result<T> = std::result::Result<T, ClientError>;
