use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use kpop_core::{
    errors::{RangeError, ResolveError},
    range::unsatisfied_content_range,
};
use log::{error, warn};
use thiserror::Error;

use crate::responses::ErrorBody;

/// Everything a request handler can fail with.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Track {0} not found")]
    TrackNotFound(String),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error("{error}")]
    Range {
        #[source]
        error: RangeError,
        file_size: u64,
    },
    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<tokio::task::JoinError> for ApiError {
    #[inline]
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Internal(e.to_string())
    }
}

impl ApiError {
    /// The HTTP status this error is reported with.
    #[must_use]
    #[inline]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::TrackNotFound(_) | Self::Resolve(ResolveError::NotFound(_)) => {
                StatusCode::NOT_FOUND
            }
            Self::Resolve(ResolveError::Forbidden(_)) => StatusCode::FORBIDDEN,
            Self::Range { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
            Self::Resolve(ResolveError::IO(_)) | Self::IO(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// The JSON body sent to the client.
    ///
    /// Details that would reveal the server's file system layout are left out.
    fn body(&self) -> ErrorBody {
        match self {
            Self::TrackNotFound(_) => ErrorBody::new("Track not found", self.to_string()),
            Self::Resolve(ResolveError::NotFound(name)) => ErrorBody {
                hint: Some("Add FLAC files to the music directory".into()),
                ..ErrorBody::new(
                    "File not found",
                    format!("File {name} was not found in the music directory"),
                )
            },
            Self::Resolve(ResolveError::Forbidden(_)) => ErrorBody::new(
                "Access denied",
                "The requested path is outside the music directory".into(),
            ),
            Self::Range { .. } => ErrorBody::new("Range not satisfiable", self.to_string()),
            Self::Resolve(ResolveError::IO(_)) | Self::IO(_) | Self::Internal(_) => {
                ErrorBody::new("Internal server error", self.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    #[inline]
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{self}");
        } else {
            warn!("{status}: {self}");
        }

        let mut response = (status, Json(self.body())).into_response();
        if let Self::Range { file_size, .. } = self {
            if let Ok(value) = HeaderValue::from_str(&unsatisfied_content_range(file_size)) {
                response.headers_mut().insert(header::CONTENT_RANGE, value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case(ApiError::TrackNotFound("7".into()), StatusCode::NOT_FOUND)]
    #[case(ResolveError::NotFound("a.flac".into()).into(), StatusCode::NOT_FOUND)]
    #[case(ResolveError::Forbidden("/etc/passwd".into()).into(), StatusCode::FORBIDDEN)]
    #[case(
        ApiError::Range { error: RangeError::Malformed("x".into()), file_size: 10 },
        StatusCode::RANGE_NOT_SATISFIABLE
    )]
    #[case(std::io::Error::other("disk on fire").into(), StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(ApiError::Internal("oops".into()), StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_status(#[case] error: ApiError, #[case] expected: StatusCode) {
        assert_eq!(error.status(), expected);
        assert_eq!(error.into_response().status(), expected);
    }

    #[rstest]
    #[case::numeric("99999", "Track 99999 not found")]
    #[case::not_a_number("abc", "Track abc not found")]
    fn test_track_not_found_keeps_raw_id(#[case] id: &str, #[case] expected: &str) {
        let body = ApiError::TrackNotFound(id.into()).body();

        assert_eq!(body.error, "Track not found");
        assert_eq!(body.message, expected);
    }

    #[test]
    fn test_forbidden_body_hides_path() {
        let body = ApiError::from(ResolveError::Forbidden("/etc/passwd".into())).body();

        assert_eq!(body.error, "Access denied");
        assert!(!body.message.contains("passwd"));
    }

    #[test]
    fn test_range_error_sets_content_range() {
        let response = ApiError::Range {
            error: RangeError::Unsatisfiable { file_size: 1000 },
            file_size: 1000,
        }
        .into_response();

        assert_eq!(
            response.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes */1000"
        );
    }
}
