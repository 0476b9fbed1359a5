// src/error.rs
use axum::http::StatusCode;
use std::io;
use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Everything that can go wrong while accepting an upload.
///
/// Each variant maps to one fixed client-facing message and status code;
/// the sources are only ever logged.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("request body is too large or not a valid multipart form: {0}")]
    SizeExceeded(#[source] BoxError),

    #[error("multipart form has no file under the configured field name")]
    FieldMissing,

    #[error("could not read the uploaded file for sniffing: {0}")]
    SniffFailed(#[source] io::Error),

    #[error("no file extension can be derived for media type '{0}'")]
    UnsupportedMediaType(String),

    #[error("could not create the destination file: {0}")]
    DestinationOpenFailed(#[source] io::Error),

    #[error("could not write the destination file: {0}")]
    DestinationWriteFailed(#[source] io::Error),
}

impl UploadError {
    pub fn size_exceeded<E: Into<BoxError>>(err: E) -> Self {
        UploadError::SizeExceeded(err.into())
    }

    /// Short text shown to the client.
    pub fn message(&self) -> &'static str {
        match self {
            UploadError::SizeExceeded(_) => "File too big",
            UploadError::FieldMissing => "Error retrieving file",
            UploadError::SniffFailed(_) => "Invalid file",
            UploadError::UnsupportedMediaType(_) => "Can't read file type",
            UploadError::DestinationOpenFailed(_) => "Can't open destination file",
            UploadError::DestinationWriteFailed(_) => "Can't write destination file",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            UploadError::SizeExceeded(_) => StatusCode::BAD_REQUEST,
            UploadError::FieldMissing | UploadError::SniffFailed(_) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            UploadError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            UploadError::DestinationOpenFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            UploadError::DestinationWriteFailed(_) => StatusCode::INSUFFICIENT_STORAGE,
        }
    }

    /// Whether the failure was caused by the client rather than the server.
    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = vec![
            (UploadError::size_exceeded("limit"), "File too big", 400),
            (UploadError::FieldMissing, "Error retrieving file", 422),
            (
                UploadError::SniffFailed(io::Error::other("read")),
                "Invalid file",
                422,
            ),
            (
                UploadError::UnsupportedMediaType("bogus".to_string()),
                "Can't read file type",
                415,
            ),
            (
                UploadError::DestinationOpenFailed(io::Error::other("open")),
                "Can't open destination file",
                500,
            ),
            (
                UploadError::DestinationWriteFailed(io::Error::other("write")),
                "Can't write destination file",
                507,
            ),
        ];

        for (err, message, status) in cases {
            assert_eq!(err.message(), message);
            assert_eq!(err.status().as_u16(), status);
        }
    }

    #[test]
    fn test_client_errors() {
        assert!(UploadError::FieldMissing.is_client_error());
        assert!(!UploadError::DestinationOpenFailed(io::Error::other("x")).is_client_error());
    }
}
