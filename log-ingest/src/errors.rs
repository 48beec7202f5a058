use crate::producer::ProducerError;
use hyper::StatusCode;
use serde::Serialize;
use thiserror::Error;

/// Result type alias for log ingestion operations
pub type Result<T, E = LogApiError> = std::result::Result<T, E>;

/// Category of a request failure, as rendered to the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    BadRequest,
    MissingHeader,
    Forbidden,
    NotFound,
    MethodNotAllowed,
    LengthRequired,
    PayloadTooLarge,
    UnsupportedMediaType,
    UnprocessableEntity,
    ServerError,
}

impl ErrorKind {
    pub const fn status(&self) -> StatusCode {
        match self {
            ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
            ErrorKind::MissingHeader => StatusCode::BAD_REQUEST,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ErrorKind::LengthRequired => StatusCode::LENGTH_REQUIRED,
            ErrorKind::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorKind::UnprocessableEntity => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorKind::ServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Machine readable tag used as the top level key of the error body.
    pub const fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::BadRequest => "bad_request",
            ErrorKind::MissingHeader => "missing_header",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::NotFound => "not_found",
            ErrorKind::MethodNotAllowed => "method_not_allowed",
            ErrorKind::LengthRequired => "length_required",
            ErrorKind::PayloadTooLarge => "payload_too_large",
            ErrorKind::UnsupportedMediaType => "unsupported_media_type",
            ErrorKind::UnprocessableEntity => "unprocessable_entity",
            ErrorKind::ServerError => "server_error",
        }
    }
}

/// Errors raised while accepting a single log
#[derive(Error, Debug)]
pub enum LogApiError {
    #[error("Failed to read request body: {0}")]
    RequestBody(String),

    #[error("The {0} header is required")]
    MissingHeader(&'static str),

    #[error("{0}")]
    Forbidden(String),

    #[error("No resource found at {0}")]
    NotFound(String),

    #[error("Invalid Version ID {0}")]
    InvalidVersion(String),

    #[error("Method {0} is not allowed")]
    MethodNotAllowed(String),

    #[error("Content length header is missing")]
    LengthRequired,

    #[error("Log payload size exceeded, maximum allowed size is {max} bytes")]
    PayloadTooLarge { max: u64 },

    #[error("Content type {content_type} is not supported, expected one of: {supported}")]
    UnsupportedMediaType {
        content_type: String,
        supported: String,
    },

    #[error("{0}")]
    UnprocessableEntity(String),

    #[error("Envelope size exceeded, maximum allowed size is {max} bytes")]
    EnvelopeTooLarge { max: u64 },

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Producer(#[from] ProducerError),
}

impl LogApiError {
    pub fn unprocessable(message: impl Into<String>) -> Self {
        LogApiError::UnprocessableEntity(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LogApiError::RequestBody(_) | LogApiError::InvalidVersion(_) => ErrorKind::BadRequest,
            LogApiError::MissingHeader(_) => ErrorKind::MissingHeader,
            LogApiError::Forbidden(_) => ErrorKind::Forbidden,
            LogApiError::NotFound(_) => ErrorKind::NotFound,
            LogApiError::MethodNotAllowed(_) => ErrorKind::MethodNotAllowed,
            LogApiError::LengthRequired => ErrorKind::LengthRequired,
            LogApiError::PayloadTooLarge { .. } => ErrorKind::PayloadTooLarge,
            LogApiError::UnsupportedMediaType { .. } => ErrorKind::UnsupportedMediaType,
            LogApiError::UnprocessableEntity(_) => ErrorKind::UnprocessableEntity,
            LogApiError::EnvelopeTooLarge { .. }
            | LogApiError::Internal(_)
            | LogApiError::Producer(_) => ErrorKind::ServerError,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.kind().status()
    }

    /// Builds the `{"<kind>": {"code": .., "message": .., "details": ..}}` error body.
    pub fn to_body(&self) -> ErrorBody {
        let kind = self.kind();
        let details = match self {
            LogApiError::LengthRequired => {
                "Content length is required to estimate if payload can be processed".to_string()
            }
            LogApiError::Producer(e) => e.to_string(),
            _ => String::new(),
        };
        let message = match self {
            LogApiError::Producer(_) => "Failed to publish log".to_string(),
            other => other.to_string(),
        };

        ErrorBody {
            tag: kind.as_str(),
            detail: ErrorDetail {
                code: kind.status().as_u16(),
                message,
                details,
            },
        }
    }
}

#[derive(Debug)]
pub struct ErrorBody {
    tag: &'static str,
    detail: ErrorDetail,
}

#[derive(Debug, Serialize, PartialEq)]
pub struct ErrorDetail {
    pub code: u16,
    pub message: String,
    pub details: String,
}

impl Serialize for ErrorBody {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.tag, &self.detail)?;
        map.end()
    }
}
