use thiserror::Error;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Graph request failed: {0}")]
    Http(String),

    #[error("Graph query failed ({code}): {message}")]
    Query { code: String, message: String },

    #[error("Unexpected graph response: {0}")]
    UnexpectedResponse(String),

    #[error("Record not found: {0}")]
    NotFound(String),
}

pub type GraphResult<T> = Result<T, GraphError>;

impl From<reqwest::Error> for GraphError {
    fn from(err: reqwest::Error) -> Self {
        GraphError::Http(err.to_string())
    }
}
