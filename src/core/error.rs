//! Error types for the appender layer

pub type Result<T> = std::result::Result<T, AppenderError>;

#[derive(Debug, thiserror::Error)]
pub enum AppenderError {
    /// Invalid or incomplete appender configuration
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// A filter predicate failed; callers treat this as "no match"
    #[error("Filter evaluation failed: {0}")]
    FilterEvaluation(String),

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// The sink or its external client rejected the event
    #[error("Delivery to {sink} failed: {message}")]
    Delivery { sink: String, message: String },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl AppenderError {
    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        AppenderError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a filter evaluation error
    pub fn filter<S: Into<String>>(msg: S) -> Self {
        AppenderError::FilterEvaluation(msg.into())
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        AppenderError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create a delivery error
    pub fn delivery(sink: impl Into<String>, message: impl Into<String>) -> Self {
        AppenderError::Delivery {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        AppenderError::Other(msg.into())
    }

    pub fn is_configuration(&self) -> bool {
        matches!(self, AppenderError::InvalidConfiguration { .. })
    }
}
