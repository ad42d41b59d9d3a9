//! Error types for ndl-db

use ndl_core::Location;
use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, DbError>;

/// Database error type
///
/// Absorbs the lower layers' errors and adds the runtime kinds that only
/// exist at the embedding level (patch rejection, API misuse, fetch
/// failures).
#[derive(Error, Debug)]
pub enum DbError {
    /// Lexer/parser failure in a loaded file
    #[error(transparent)]
    Syntax(#[from] ndl_syntax::SyntaxError),

    /// Name/type/linearization/value failure from the semantic core
    #[error(transparent)]
    Core(#[from] ndl_core::Error),

    /// The file fetcher could not deliver a requested file
    #[error("{location}: cannot read '{filename}': {message}")]
    File {
        location: Location,
        filename: String,
        message: String,
    },

    /// Runtime patch rejected; the view is unchanged
    #[error("patch rejected: {0}")]
    Patch(String),

    /// Consumer API misuse (unknown object/member, wrong typed accessor)
    #[error("api error: {0}")]
    Api(String),
}

impl DbError {
    /// Create a file fetch error
    pub fn file(location: Location, filename: impl Into<String>, message: impl Into<String>) -> Self {
        DbError::File {
            location,
            filename: filename.into(),
            message: message.into(),
        }
    }

    /// Create a patch rejection error
    pub fn patch(message: impl Into<String>) -> Self {
        DbError::Patch(message.into())
    }

    /// Create an API error
    pub fn api(message: impl Into<String>) -> Self {
        DbError::Api(message.into())
    }
}
