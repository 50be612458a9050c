use thiserror::Error;

/// The generation-service call itself failed.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server returned {status}: {body}")]
    Server { status: u16, body: String },

    #[error("completion contained no content")]
    EmptyResponse,
}

impl TransportError {
    /// Network faults, timeouts, rate limits and 5xx are worth another
    /// attempt; authentication and other client errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Http(e) => !e.is_builder(),
            Self::Server { status, .. } => matches!(status, 408 | 409 | 429 | 500..=599),
            Self::EmptyResponse => true,
        }
    }
}

/// A structured call that gave up. Carries the last failure seen.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generation service failed after {attempts} attempt(s): {source}")]
    Transport {
        attempts: u32,
        source: TransportError,
    },

    #[error("response was not a JSON object after {attempts} attempt(s): {message}")]
    Parse { attempts: u32, message: String },
}

impl GenerationError {
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Transport { attempts, .. } | Self::Parse { attempts, .. } => *attempts,
        }
    }
}
