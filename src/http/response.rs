//! Dispatch outcome → HTTP response.
//!
//! | outcome         | status                    |
//! |-----------------|---------------------------|
//! | `permitted`     | 200, JSON dispatch document |
//! | `redirect`      | 302, `Location: <path>`   |
//! | `navigate`      | 302, `Location: <url>`    |
//! | `not_found`     | 404                       |
//! | `unresolved`    | 421, `Retry-After: 1`     |
//! | `redirect_loop` | 500                       |
//! | `aborted`       | 503                       |

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::dispatch::DispatchOutcome;

impl IntoResponse for DispatchOutcome {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Permitted { .. } => StatusCode::OK,
            Self::Redirect { target, .. } => return found(target, &self),
            Self::Navigate { url, .. } => return found(url, &self),
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unresolved { .. } => {
                let mut response = (StatusCode::MISDIRECTED_REQUEST, Json(&self)).into_response();
                response
                    .headers_mut()
                    .insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
                return response;
            }
            Self::RedirectLoop { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Aborted => StatusCode::SERVICE_UNAVAILABLE,
        };
        (status, Json(self)).into_response()
    }
}

fn found(location: &str, outcome: &DispatchOutcome) -> Response {
    match HeaderValue::try_from(location) {
        Ok(value) => (StatusCode::FOUND, [(header::LOCATION, value)], Json(outcome)).into_response(),
        Err(_) => {
            tracing::error!(location, "Redirect target is not a valid header value");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
