//! Error types for clustering operations.
//!
//! Only two kinds exist. Everything caused by the content of the input
//! (arguments, malformed rows, dimension mismatches, out-of-range
//! parameters) is [`KMeansError::InvalidInput`]; everything else, mostly
//! I/O, is [`KMeansError::GenericFailure`].

use thiserror::Error;

/// Fixed text printed by the binary for [`KMeansError::InvalidInput`].
pub const INVALID_INPUT_MESSAGE: &str = "Invalid Input!";

/// Fixed text printed by the binary for [`KMeansError::GenericFailure`].
pub const GENERIC_FAILURE_MESSAGE: &str = "An Error Has Occurred";

#[derive(Debug, Error)]
pub enum KMeansError {
    /// Bad arguments, malformed data or inconsistent dimensions.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// I/O or environment failure unrelated to the input content.
    #[error("generic failure: {0}")]
    GenericFailure(String),
}

pub type Result<T> = std::result::Result<T, KMeansError>;

impl KMeansError {
    #[inline]
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }

    #[inline]
    pub fn generic(message: impl Into<String>) -> Self {
        Self::GenericFailure(message.into())
    }

    #[inline]
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// The message shown to the user at the program boundary.
    ///
    /// Details stay in the log; the user only ever sees one of two lines.
    pub fn exit_message(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => INVALID_INPUT_MESSAGE,
            Self::GenericFailure(_) => GENERIC_FAILURE_MESSAGE,
        }
    }

    /// Both kinds are fatal with status 1.
    #[inline]
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl From<std::io::Error> for KMeansError {
    fn from(err: std::io::Error) -> Self {
        Self::GenericFailure(err.to_string())
    }
}
