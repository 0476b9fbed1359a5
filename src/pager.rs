// src/pager.rs
use crate::sniff::detect_content_type;
use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

/// Supplies customised error pages.
///
/// Given the raw error text and the status about to be sent, returns the
/// page to send instead, or `None` to keep the raw text.
pub trait ErrorPager: Send + Sync {
    fn error_page(&self, text: &[u8], status: StatusCode) -> Option<Vec<u8>>;
}

/// Pager used when none is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoErrorPages;

impl ErrorPager for NoErrorPages {
    fn error_page(&self, _text: &[u8], _status: StatusCode) -> Option<Vec<u8>> {
        None
    }
}

impl<F> ErrorPager for F
where
    F: Fn(&[u8], StatusCode) -> Option<Vec<u8>> + Send + Sync,
{
    fn error_page(&self, text: &[u8], status: StatusCode) -> Option<Vec<u8>> {
        self(text, status)
    }
}

/// Final response for a failed upload.
pub fn error_response(pager: &dyn ErrorPager, text: &str, status: StatusCode) -> Response {
    let body = pager
        .error_page(text.as_bytes(), status)
        .filter(|page| !page.is_empty())
        .unwrap_or_else(|| text.as_bytes().to_vec());

    let content_type = detect_content_type(&body);
    let mut response = (status, Body::from(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(&content_type) {
        response.headers_mut().insert(header::CONTENT_TYPE, value);
    }
    response
}
