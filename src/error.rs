//! Error types shared by the gallery core and the shell.
//!
//! Every variant carries owned strings so the error can travel inside
//! UI messages (which must be `Clone`).

/// Errors produced by the gallery
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GalleryError {
    /// The API answered with a non-2xx status
    #[error("Failed to {operation} (HTTP {status})")]
    Api {
        /// Human readable name of the failed operation
        operation: String,
        /// HTTP status code
        status: u16,
    },

    /// The request never produced a response (network, DNS, TLS, ...)
    #[error("Failed to {operation}: {message}")]
    Transport { operation: String, message: String },

    /// The response body could not be decoded
    #[error("Failed to {operation}: invalid response ({message})")]
    Decode { operation: String, message: String },

    /// Missing or invalid configuration, or a component used outside
    /// of the session that owns it
    #[error("Configuration error: {0}")]
    Config(String),

    /// A column layout was requested that cannot hold the items
    #[error("Cannot distribute {items} items into {count} columns")]
    InvalidColumnCount { count: isize, items: usize },
}

impl GalleryError {
    /// Classify a reqwest failure for the named operation
    pub fn from_reqwest(operation: &str, err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            GalleryError::Api {
                operation: operation.to_string(),
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            GalleryError::Decode {
                operation: operation.to_string(),
                message: err.to_string(),
            }
        } else {
            GalleryError::Transport {
                operation: operation.to_string(),
                message: err.to_string(),
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, GalleryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_names_operation() {
        let err = GalleryError::Api {
            operation: "fetch curated photos".to_string(),
            status: 503,
        };
        assert_eq!(err.to_string(), "Failed to fetch curated photos (HTTP 503)");
    }

    #[test]
    fn test_column_count_message() {
        let err = GalleryError::InvalidColumnCount { count: 0, items: 3 };
        assert!(err.to_string().contains("3 items"));
    }
}
