use thiserror::Error;

/// Errors surfaced by location resolution, the upstream clients and the tool handlers.
///
/// Nothing is recovered locally: each variant is logged where it is detected and
/// returned unchanged to the caller, which reports a failed tool invocation.
#[derive(Debug, Error)]
pub enum Error {
    #[error("No locations found for '{query}'. Please try a different search term.")]
    NotFound { query: String },

    #[error("Location selection failed: {0}")]
    Selection(String),

    #[error("{service} API error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },

    #[error("Unexpected response shape: {0}")]
    Shape(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unknown tool '{0}'")]
    UnknownTool(String),
}

impl Error {
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Error::Upstream { service, message: message.into() }
    }

    pub fn shape(message: impl Into<String>) -> Self {
        Error::Shape(message.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
