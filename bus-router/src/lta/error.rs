//! DataMall failure modes.

use std::fmt;

/// How a DataMall request can fail.
///
/// DataMall answers a bad `AccountKey` with 401 and throttles with 429;
/// both get their own variant so callers can tell a misconfiguration from
/// a transient outage.
#[derive(Debug)]
pub enum LtaError {
    /// Transport failure before a status was received
    Http(reqwest::Error),

    /// The body was not the OData envelope we expected. Holds the start of
    /// the body for diagnosis.
    Json {
        message: String,
        body: Option<String>,
    },

    /// Any other non-2xx status
    ApiError { status: u16, message: String },

    Unauthorized,

    RateLimited,

    /// No response within the configured client timeout
    Timeout,

    /// A row or arrival decoded but holds an unusable value, such as a
    /// malformed `EstimatedArrival`
    InvalidRecord(String),
}

impl fmt::Display for LtaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LtaError::Http(e) => write!(f, "DataMall request failed: {e}"),
            LtaError::Json { message, body } => {
                write!(f, "unexpected DataMall response: {message}")?;
                if let Some(body) = body {
                    write!(f, " (body: {body})")?;
                }
                Ok(())
            }
            LtaError::ApiError { status, message } => {
                write!(f, "DataMall returned {status}: {message}")
            }
            LtaError::Unauthorized => write!(f, "DataMall rejected the account key"),
            LtaError::RateLimited => write!(f, "DataMall rate limit reached"),
            LtaError::Timeout => write!(f, "DataMall request timed out"),
            LtaError::InvalidRecord(msg) => write!(f, "unusable DataMall record: {msg}"),
        }
    }
}

impl std::error::Error for LtaError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LtaError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for LtaError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            LtaError::Timeout
        } else {
            LtaError::Http(err)
        }
    }
}
