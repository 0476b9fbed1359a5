// src/lib.rs
//! Middleware that accepts multipart file uploads on one path and passes
//! every other request to the wrapped handler.
//!
//! Uploaded files are sniffed, given a sensible extension, stored under a
//! timestamped name in the configured directory, and answered with a
//! `303 See Other` redirect.
use axum::{Router, extract::Request, response::IntoResponse};
use std::convert::Infallible;
use std::sync::Arc;
use tower::Service;

pub mod config;
pub mod error;
pub mod extension;
pub mod filename;
pub mod middleware;
pub mod pager;
pub mod persist;
pub mod routing;
pub mod sniff;

pub use config::{DEFAULT_MAX_UPLOAD_SIZE, ServerConfig, UploadConfig};
pub use error::UploadError;
pub use middleware::{UploadHandler, intercept_uploads};
pub use pager::{ErrorPager, NoErrorPages};
pub use persist::UploadOutcome;

/// Wraps `inner` so that uploads to the configured path are handled here
/// and all other requests reach `inner` untouched.
pub fn wrap<S>(inner: S, config: UploadConfig) -> Result<Router, regex::Error>
where
    S: Service<Request, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
{
    let handler = Arc::new(UploadHandler::new(config)?);

    Ok(Router::new()
        .fallback_service(inner)
        .layer(axum::middleware::from_fn_with_state(
            handler,
            intercept_uploads,
        )))
}

pub mod server {
    use crate::config::ServerConfig;
    use anyhow::Context;
    use axum::{Router, extract::State, response::Html, routing::get};
    use std::sync::Arc;
    use tower_http::trace::TraceLayer;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    /// Serves a bare upload form on `/`, wrapped by the upload middleware.
    pub async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "upload_handler=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();

        std::fs::create_dir_all(&config.upload_dir)
            .with_context(|| format!("Cannot create upload directory {}", config.upload_dir))?;

        let upload_config = config.upload_config();
        let port = config.port;

        let pages = Router::new()
            .route("/", get(upload_form))
            .with_state(Arc::new(config));

        let app = crate::wrap(pages, upload_config.clone())?.layer(TraceLayer::new_for_http());

        let listener = tokio::net::TcpListener::bind(&format!("0.0.0.0:{}", port)).await?;
        tracing::info!("Server starting on port {}", port);
        tracing::info!(
            "Uploads to /{} are stored in {}",
            upload_config.upload_path().trim_start_matches('/'),
            upload_config.dest_dir().display()
        );

        axum::serve(listener, app).await?;
        Ok(())
    }

    async fn upload_form(State(config): State<Arc<ServerConfig>>) -> Html<String> {
        Html(render_form(&config))
    }

    pub fn render_form(config: &ServerConfig) -> String {
        format!(
            r#"<!DOCTYPE html><html><head><title>Upload</title></head><body>
<form action="/{action}" method="post" enctype="multipart/form-data">
	<p><label for="{field}">Filename:</label>
	<input type="file" name="{field}" id="{field}"></p>
	<p><input type="submit" name="submit" value="Submit"></p>
</form></body></html>"#,
            action = config.upload_path.trim_start_matches('/'),
            field = config.field_name,
        )
    }
}
