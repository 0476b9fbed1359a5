// tests/common/mod.rs
#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, header},
    routing::get,
};
use std::io::Write;
use std::path::Path;
use upload_handler::UploadConfig;

pub const BOUNDARY: &str = "---------------------------testboundary";
pub const FIELD: &str = "uploadFile";

pub fn png_bytes() -> Vec<u8> {
    let mut data = vec![
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, // PNG signature
        0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, // IHDR chunk
        0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, // 1x1
        0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89,
    ];
    data.extend_from_slice(&[0x00; 64]);
    data
}

/// One file part under `field`.
pub fn multipart_file(field: &str, file_name: &str, content: &[u8]) -> Vec<u8> {
    let mut data = Vec::new();
    write!(
        data,
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
        BOUNDARY, field, file_name
    )
    .unwrap();
    data.extend_from_slice(content);
    write!(data, "\r\n--{}--\r\n", BOUNDARY).unwrap();
    data
}

/// One plain text part under `field`.
pub fn multipart_text(field: &str, value: &str) -> Vec<u8> {
    format!(
        "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n--{}--\r\n",
        BOUNDARY, field, value, BOUNDARY
    )
    .into_bytes()
}

pub fn upload_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn test_config(dest: &Path, max_size: i64) -> UploadConfig {
    UploadConfig::new(dest, FIELD, "up", "/done", max_size)
}

/// The handler being wrapped in every test.
pub fn pages() -> Router {
    Router::new()
        .route("/", get(|| async { "index" }).post(|| async { "posted" }))
        .route("/upload", get(|| async { "other page" }).post(|| async { "other post" }))
}

pub fn stored_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
