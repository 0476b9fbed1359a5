// src/config.rs
use crate::pager::{ErrorPager, NoErrorPages};
use anyhow::{Context, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Upload size ceiling used when none (or a non-positive one) is configured.
pub const DEFAULT_MAX_UPLOAD_SIZE: i64 = 8 * 1024 * 1024;

/// Settings of one upload interceptor. Fixed once constructed.
#[derive(Clone)]
pub struct UploadConfig {
    dest_dir: PathBuf,
    field_name: String,
    upload_path: String,
    next_url: String,
    max_size: u64,
    error_pager: Arc<dyn ErrorPager>,
}

impl UploadConfig {
    /// `dest_dir` is made absolute when possible; `max_size <= 0` selects
    /// [`DEFAULT_MAX_UPLOAD_SIZE`].
    pub fn new(
        dest_dir: impl AsRef<Path>,
        field_name: impl Into<String>,
        upload_path: impl Into<String>,
        next_url: impl Into<String>,
        max_size: i64,
    ) -> Self {
        let dest_dir = dest_dir.as_ref();
        let dest_dir = std::path::absolute(dest_dir).unwrap_or_else(|_| dest_dir.to_path_buf());
        let max_size = if max_size > 0 {
            max_size
        } else {
            DEFAULT_MAX_UPLOAD_SIZE
        };

        Self {
            dest_dir,
            field_name: field_name.into(),
            upload_path: upload_path.into(),
            next_url: next_url.into(),
            max_size: max_size as u64,
            error_pager: Arc::new(NoErrorPages),
        }
    }

    pub fn with_error_pager(mut self, pager: impl ErrorPager + 'static) -> Self {
        self.error_pager = Arc::new(pager);
        self
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub fn field_name(&self) -> &str {
        &self.field_name
    }

    pub fn upload_path(&self) -> &str {
        &self.upload_path
    }

    pub fn next_url(&self) -> &str {
        &self.next_url
    }

    pub fn max_size(&self) -> u64 {
        self.max_size
    }

    pub fn error_pager(&self) -> &dyn ErrorPager {
        self.error_pager.as_ref()
    }
}

impl fmt::Debug for UploadConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadConfig")
            .field("dest_dir", &self.dest_dir)
            .field("field_name", &self.field_name)
            .field("upload_path", &self.upload_path)
            .field("next_url", &self.next_url)
            .field("max_size", &self.max_size)
            .finish_non_exhaustive()
    }
}

/// Settings of the demo server binary.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    pub upload_dir: String,
    pub field_name: String,
    pub upload_path: String,
    pub next_url: String,
    pub max_upload_size: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            upload_dir: "./static".to_string(),
            field_name: "uploadFile".to_string(),
            upload_path: "up".to_string(),
            next_url: "/".to_string(),
            max_upload_size: 10 * 1024 * 1024,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `lookup`, falling back to the defaults for
    /// unset keys.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(port) => port.parse().with_context(|| format!("Invalid PORT: {}", port))?,
            None => defaults.port,
        };
        let max_upload_size = match lookup("UPLOAD_MAX_SIZE") {
            Some(size) => size
                .parse()
                .with_context(|| format!("Invalid UPLOAD_MAX_SIZE: {}", size))?,
            None => defaults.max_upload_size,
        };

        Ok(Self {
            port,
            upload_dir: lookup("UPLOAD_DIR").unwrap_or(defaults.upload_dir),
            field_name: lookup("UPLOAD_FIELD").unwrap_or(defaults.field_name),
            upload_path: lookup("UPLOAD_PATH").unwrap_or(defaults.upload_path),
            next_url: lookup("UPLOAD_NEXT_URL").unwrap_or(defaults.next_url),
            max_upload_size,
        })
    }

    pub fn upload_config(&self) -> UploadConfig {
        UploadConfig::new(
            &self.upload_dir,
            &self.field_name,
            &self.upload_path,
            &self.next_url,
            self.max_upload_size,
        )
    }
}
