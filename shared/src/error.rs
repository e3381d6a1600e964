use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::ConfigError;
use crate::model::IdError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Network,
    Timeout,
    NotFound,
    Server,
    Client,
    Serialization,
    Deserialization,
    Configuration,
}

impl ErrorKind {
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Network => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::NotFound => "NOT_FOUND",
            Self::Server => "SERVER_ERROR",
            Self::Client => "CLIENT_ERROR",
            Self::Serialization => "SERIALIZATION_ERROR",
            Self::Deserialization => "DESERIALIZATION_ERROR",
            Self::Configuration => "CONFIGURATION_ERROR",
        }
    }
}

/// Why a request against the remote city resource did not produce a value.
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApiError {
    #[error("request could not complete: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("unexpected HTTP status {status}")]
    Status { status: u16 },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("could not encode request: {0}")]
    Encode(String),

    #[error("response carried no body")]
    EmptyBody,

    #[error("invalid request url: {0}")]
    Url(String),
}

impl ApiError {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Network,
            Self::Timeout => ErrorKind::Timeout,
            Self::Status { status: 404 } => ErrorKind::NotFound,
            Self::Status { status } if *status >= 500 => ErrorKind::Server,
            Self::Status { .. } => ErrorKind::Client,
            Self::Decode(_) | Self::EmptyBody => ErrorKind::Deserialization,
            Self::Encode(_) => ErrorKind::Serialization,
            Self::Url(_) => ErrorKind::Configuration,
        }
    }

    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.kind().code()
    }
}

impl From<crux_http::Error> for ApiError {
    fn from(e: crux_http::Error) -> Self {
        match e {
            crux_http::Error::Http(http) => Self::Status {
                status: http.code.into(),
            },
            crux_http::Error::Json(msg) => Self::Decode(msg),
            crux_http::Error::Url(msg) => Self::Url(msg),
            crux_http::Error::Io(msg) => Self::Transport(msg),
            crux_http::Error::Timeout => Self::Timeout,
        }
    }
}

impl From<url::ParseError> for ApiError {
    fn from(e: url::ParseError) -> Self {
        Self::Url(e.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        Self::Url(e.to_string())
    }
}

// An id that cannot be coerced never makes it into a request path.
impl From<IdError> for ApiError {
    fn from(e: IdError) -> Self {
        Self::Url(e.to_string())
    }
}

/// Unwraps a settled crux_http response into its decoded body.
pub fn settle<T>(result: crux_http::Result<crux_http::Response<T>>) -> Result<T, ApiError> {
    result?.take_body().ok_or(ApiError::EmptyBody)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_maps_to_kind() {
        assert_eq!(ApiError::Status { status: 404 }.kind(), ErrorKind::NotFound);
        assert_eq!(ApiError::Status { status: 502 }.code(), "SERVER_ERROR");
        assert_eq!(ApiError::Status { status: 422 }.kind(), ErrorKind::Client);
    }

    #[test]
    fn test_transport_errors_are_network_kind() {
        let e: ApiError = crux_http::Error::Io("connection reset".into()).into();
        assert_eq!(e.kind(), ErrorKind::Network);
        assert_eq!(e.to_string(), "request could not complete: connection reset");
    }

    #[test]
    fn test_json_errors_are_decode_failures() {
        let e: ApiError = crux_http::Error::Json("expected value".into()).into();
        assert_eq!(e, ApiError::Decode("expected value".into()));
        assert_eq!(e.kind(), ErrorKind::Deserialization);
    }

    #[test]
    fn test_unusable_ids_are_url_errors() {
        let e: ApiError = IdError::NotNumeric("abc".into()).into();
        assert_eq!(e.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_settle_requires_a_body() {
        let response = crux_http::testing::ResponseBuilder::ok()
            .body(vec![1u8, 2, 3])
            .build();
        assert_eq!(settle(Ok(response)), Ok(vec![1, 2, 3]));
        assert_eq!(
            settle::<Vec<u8>>(Err(crux_http::Error::Timeout)),
            Err(ApiError::Timeout)
        );
    }
}
