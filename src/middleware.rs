// src/middleware.rs
use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::{
    config::UploadConfig,
    pager::error_response,
    persist::{self, UploadOutcome},
    routing::PathMatcher,
};

/// Shared state of the upload middleware.
#[derive(Debug)]
pub struct UploadHandler {
    config: UploadConfig,
    matcher: PathMatcher,
    upload_segment: String,
}

impl UploadHandler {
    pub fn new(config: UploadConfig) -> Result<Self, regex::Error> {
        let matcher = PathMatcher::new()?;
        let upload_segment = matcher.leading_segment(config.upload_path());

        Ok(Self {
            config,
            matcher,
            upload_segment,
        })
    }

    pub fn config(&self) -> &UploadConfig {
        &self.config
    }

    /// Whether a request with `method` and `path` is an upload.
    pub fn intercepts(&self, method: &Method, path: &str) -> bool {
        method == Method::POST && self.matcher.matches(path, &self.upload_segment)
    }

    /// Processes an intercepted upload and turns the outcome into the
    /// client's response.
    pub async fn handle(&self, request: Request) -> Response {
        match persist::process(&self.config, request).await {
            UploadOutcome::Success { stored_path } => {
                tracing::debug!(
                    "Upload stored at {}, redirecting to {}",
                    stored_path.display(),
                    self.config.next_url()
                );
                Redirect::to(self.config.next_url()).into_response()
            }
            UploadOutcome::Failure { message, status } => {
                error_response(self.config.error_pager(), message, status)
            }
        }
    }
}

/// Takes over POSTs to the upload path and hands everything else on.
pub async fn intercept_uploads(
    State(handler): State<Arc<UploadHandler>>,
    request: Request,
    next: Next,
) -> Response {
    if handler.intercepts(request.method(), request.uri().path()) {
        tracing::debug!("Intercepting upload to {}", request.uri().path());
        return handler.handle(request).await;
    }

    next.run(request).await
}
