// src/persist.rs
use crate::{
    config::UploadConfig,
    error::UploadError,
    extension::resolve_extension,
    filename::{client_base_name, destination_path, timestamp_nanos},
    sniff::{OCTET_STREAM, sniff_content_type},
};
use axum::{
    extract::Request,
    http::{StatusCode, header},
};
use multer::{Constraints, Multipart, SizeLimit};
use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

/// Attempts at finding an unused destination name before giving up.
const MAX_CREATE_ATTEMPTS: usize = 8;

/// Result of processing one upload request.
#[derive(Debug)]
pub enum UploadOutcome {
    Success { stored_path: PathBuf },
    Failure { message: &'static str, status: StatusCode },
}

impl From<UploadError> for UploadOutcome {
    fn from(err: UploadError) -> Self {
        UploadOutcome::Failure {
            message: err.message(),
            status: err.status(),
        }
    }
}

/// The named file part, spooled to an anonymous temporary file.
#[derive(Debug)]
pub struct ReceivedFile {
    pub file: File,
    pub file_name: String,
}

/// Runs the whole pipeline for one request. Never fails; every error is
/// folded into [`UploadOutcome::Failure`].
pub async fn process(config: &UploadConfig, request: Request) -> UploadOutcome {
    match persist_upload(config, request).await {
        Ok(stored_path) => UploadOutcome::Success { stored_path },
        Err(e) => {
            if e.is_client_error() {
                tracing::warn!(status = %e.status(), "Rejected upload: {}", e);
            } else {
                tracing::error!(status = %e.status(), "Upload failed: {}", e);
            }
            e.into()
        }
    }
}

async fn persist_upload(config: &UploadConfig, request: Request) -> Result<PathBuf, UploadError> {
    let ReceivedFile {
        mut file,
        file_name,
    } = receive_upload(config, request).await?;
    let dest_dir = config.dest_dir().to_path_buf();

    tokio::task::spawn_blocking(move || store_upload(&mut file, &file_name, &dest_dir))
        .await
        .map_err(|e| UploadError::DestinationWriteFailed(io::Error::other(e)))?
}

/// Reads the size-bounded multipart body and spools the configured file
/// field. Every part is consumed so that a malformed form is always
/// reported as such.
pub async fn receive_upload(
    config: &UploadConfig,
    request: Request,
) -> Result<ReceivedFile, UploadError> {
    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let boundary = multer::parse_boundary(content_type).map_err(UploadError::size_exceeded)?;

    let constraints =
        Constraints::new().size_limit(SizeLimit::new().whole_stream(config.max_size()));
    let stream = request.into_body().into_data_stream();
    let mut multipart = Multipart::with_constraints(stream, boundary, constraints);

    let mut received = None;
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(UploadError::size_exceeded)?
    {
        let file_name = if received.is_none() && field.name() == Some(config.field_name()) {
            field.file_name().and_then(client_base_name)
        } else {
            None
        };

        match file_name {
            Some(file_name) => {
                let file = spool_field(&mut field).await?;
                tracing::debug!("Received form file '{}'", file_name);
                received = Some(ReceivedFile { file, file_name });
            }
            None => {
                while field
                    .chunk()
                    .await
                    .map_err(UploadError::size_exceeded)?
                    .is_some()
                {}
            }
        }
    }

    received.ok_or(UploadError::FieldMissing)
}

async fn spool_field(field: &mut multer::Field<'_>) -> Result<File, UploadError> {
    let spool = tempfile::tempfile().map_err(UploadError::size_exceeded)?;
    let mut spool = tokio::fs::File::from_std(spool);

    while let Some(chunk) = field.chunk().await.map_err(UploadError::size_exceeded)? {
        spool
            .write_all(&chunk)
            .await
            .map_err(UploadError::size_exceeded)?;
    }
    spool.flush().await.map_err(UploadError::size_exceeded)?;
    spool
        .seek(SeekFrom::Start(0))
        .await
        .map_err(UploadError::size_exceeded)?;

    Ok(spool.into_std().await)
}

/// Sniffs `source`, names the destination and copies the data over.
pub fn store_upload<R: Read + Seek>(
    source: &mut R,
    original_name: &str,
    dest_dir: &Path,
) -> Result<PathBuf, UploadError> {
    let mut content_type = sniff_content_type(source).map_err(UploadError::SniffFailed)?;
    if content_type.is_empty() {
        content_type = OCTET_STREAM.to_string();
    }

    let extension = resolve_extension(&content_type, original_name)?;
    tracing::debug!(
        content_type = %content_type,
        extension = %extension,
        "Classified upload '{}'",
        original_name
    );

    let (mut destination, path) = create_destination(dest_dir, original_name, &extension)?;
    let written = io::copy(source, &mut destination).map_err(UploadError::DestinationWriteFailed)?;
    destination
        .flush()
        .map_err(UploadError::DestinationWriteFailed)?;

    tracing::info!(bytes = written, "Stored upload '{}' as {}", original_name, path.display());
    Ok(path)
}

/// Opens a fresh destination file, never an existing one. A name clash
/// moves the timestamp forward and tries again.
fn create_destination(
    dest_dir: &Path,
    original_name: &str,
    extension: &str,
) -> Result<(File, PathBuf), UploadError> {
    let mut stamp = timestamp_nanos();
    let mut last_err = None;

    for _ in 0..MAX_CREATE_ATTEMPTS {
        let path = destination_path(dest_dir, original_name, extension, stamp);
        match open_exclusive(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                tracing::warn!("Destination {} already exists, retrying", path.display());
                last_err = Some(e);
                stamp = timestamp_nanos().max(stamp + 1);
            }
            Err(e) => return Err(UploadError::DestinationOpenFailed(e)),
        }
    }

    Err(UploadError::DestinationOpenFailed(last_err.unwrap_or_else(
        || io::Error::from(io::ErrorKind::AlreadyExists),
    )))
}

fn open_exclusive(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o640);
    }
    options.open(path)
}
