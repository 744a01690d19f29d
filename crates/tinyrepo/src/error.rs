// Error types for repository operations

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed source error handed through from a backend, unmodified.
pub type BackendError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The method name looks like a derived finder but violates the grammar.
    #[error("invalid finder name '{name}': {reason}")]
    InvalidFinderName { name: String, reason: String },

    /// A derived finder was called with the wrong number of positional values.
    #[error("'{method}' expects {expected} argument(s), received {received}")]
    ArgumentCountMismatch {
        method: String,
        expected: usize,
        received: usize,
    },

    /// The name is neither a fixed operation nor a parseable finder.
    #[error("method '{name}' is not implemented")]
    MethodNotImplemented { name: String },

    /// Bad construction-time or call-site argument.
    #[error("invalid argument: {message}")]
    InvalidArgument { message: String },

    /// Failure raised by the backend; never interpreted or retried here.
    #[error(transparent)]
    Backend(BackendError),
}

impl Error {
    pub fn invalid_finder_name<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Error::InvalidFinderName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn argument_count_mismatch<M: Into<String>>(
        method: M,
        expected: usize,
        received: usize,
    ) -> Self {
        Error::ArgumentCountMismatch {
            method: method.into(),
            expected,
            received,
        }
    }

    pub fn method_not_implemented<N: Into<String>>(name: N) -> Self {
        Error::MethodNotImplemented { name: name.into() }
    }

    pub fn invalid_argument<M: Into<String>>(message: M) -> Self {
        Error::InvalidArgument {
            message: message.into(),
        }
    }

    pub fn backend<E: Into<BackendError>>(source: E) -> Self {
        Error::Backend(source.into())
    }

    /// Stable machine-readable code, for handling errors without matching
    /// on message text.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidFinderName { .. } => "INVALID_FINDER_NAME",
            Error::ArgumentCountMismatch { .. } => "ARGUMENT_COUNT_MISMATCH",
            Error::MethodNotImplemented { .. } => "METHOD_NOT_IMPLEMENTED",
            Error::InvalidArgument { .. } => "INVALID_ARGUMENT",
            Error::Backend(_) => "BACKEND",
        }
    }
}
