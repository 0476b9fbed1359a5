// src/filename.rs
use crate::extension::file_extension;
use chrono::Utc;
use std::path::{Path, PathBuf};

/// Nanoseconds since the Unix epoch, used as the unique name prefix.
pub fn timestamp_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or_default()
}

/// `<hex stamp>_<base name><extension>` for an upload called `original`.
///
/// When `extension` is non-empty it replaces the original's last extension
/// instead of being stacked on top of it, unless the original is nothing
/// but an extension (a dotfile such as `.bashrc`).
pub fn synthesize_name(original: &str, extension: &str, stamp: i64) -> String {
    let base = if extension.is_empty() {
        original
    } else {
        let ext = file_extension(original);
        match &original[..original.len() - ext.len()] {
            "" => original,
            stem => stem,
        }
    };

    format!("{:x}_{}{}", stamp, base.replace(' ', "_"), extension)
}

pub fn destination_path(dir: &Path, original: &str, extension: &str, stamp: i64) -> PathBuf {
    dir.join(synthesize_name(original, extension, stamp))
}

/// Base name of a client supplied filename, or `None` when nothing usable
/// is left once directories are stripped.
pub fn client_base_name(raw: &str) -> Option<String> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    match base {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}
