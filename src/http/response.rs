//! Mapping gateway outcomes onto HTTP responses.
//!
//! # Responsibilities
//! - Wrap page models in the HTML page template
//! - Pass raw bodies through with the gemini media type
//! - Turn gemini redirects into 307/308 responses
//!
//! # Design Decisions
//! - Protocol errors keep HTTP 200; the page shows the gemini status
//! - A page without a gemini status (fetch or read failed) is 502
//! - Header values that cannot be represented never panic; they degrade

use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{Html, IntoResponse, Response};

use crate::gateway::{Outcome, PageStatus};
use crate::http::page::render_page;

const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        match self {
            Outcome::Page(page) => {
                let status = match page.status {
                    PageStatus::Unavailable => StatusCode::BAD_GATEWAY,
                    PageStatus::Code(_) => StatusCode::OK,
                };
                (status, Html(render_page(&page).into_string())).into_response()
            }
            Outcome::Raw { content_type, body } => {
                let value = HeaderValue::from_str(&content_type).unwrap_or_else(|_| {
                    tracing::debug!(content_type = %content_type, "Unrepresentable content type");
                    HeaderValue::from_static(FALLBACK_CONTENT_TYPE)
                });
                ([(header::CONTENT_TYPE, value)], body).into_response()
            }
            Outcome::Redirect { location, permanent } => redirect(&location, permanent),
        }
    }
}

/// Redirect to `location`: 308 when permanent, 307 otherwise.
pub fn redirect(location: &str, permanent: bool) -> Response {
    let status = if permanent {
        StatusCode::PERMANENT_REDIRECT
    } else {
        StatusCode::TEMPORARY_REDIRECT
    };

    match HeaderValue::from_str(location) {
        Ok(value) => (status, [(header::LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::warn!(location = %location, "Redirect target is not a valid header value");
            (StatusCode::BAD_GATEWAY, "Invalid redirect target").into_response()
        }
    }
}
