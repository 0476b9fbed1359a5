// src/sniff.rs
use std::io::{self, Read, Seek, SeekFrom};
use std::ops::{Deref, DerefMut};

/// Number of leading bytes considered when classifying content.
pub const SNIFF_LEN: usize = 512;

/// A read error is tolerated once at least this many bytes are buffered.
const MIN_SNIFF_LEN: usize = 64;

pub const OCTET_STREAM: &str = "application/octet-stream";
const TEXT_PLAIN_UTF8: &str = "text/plain; charset=utf-8";

const HTML_TAGS: &[&[u8]] = &[
    b"<!DOCTYPE HTML",
    b"<HTML",
    b"<HEAD",
    b"<SCRIPT",
    b"<IFRAME",
    b"<H1",
    b"<DIV",
    b"<FONT",
    b"<TABLE",
    b"<A",
    b"<STYLE",
    b"<TITLE",
    b"<B",
    b"<BODY",
    b"<BR",
    b"<P",
    b"<!--",
];

/// Seeks the wrapped stream back to its start when dropped.
struct Rewind<'a, R: Seek>(&'a mut R);

impl<R: Seek> Deref for Rewind<'_, R> {
    type Target = R;

    fn deref(&self) -> &R {
        &*self.0
    }
}

impl<R: Seek> DerefMut for Rewind<'_, R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut *self.0
    }
}

impl<R: Seek> Drop for Rewind<'_, R> {
    fn drop(&mut self) {
        if let Err(e) = self.0.seek(SeekFrom::Start(0)) {
            tracing::warn!("Failed to rewind sniffed stream: {}", e);
        }
    }
}

/// Classifies the leading bytes of `source` and leaves it positioned at
/// offset 0 whatever the result.
pub fn sniff_content_type<R: Read + Seek>(source: &mut R) -> io::Result<String> {
    let mut source = Rewind(source);
    let mut buf = [0u8; SNIFF_LEN];
    let mut filled = 0;

    while filled < SNIFF_LEN {
        match source.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if filled < MIN_SNIFF_LEN => return Err(e),
            Err(e) => {
                tracing::debug!("Short read after {} bytes, sniffing partial buffer: {}", filled, e);
                break;
            }
        }
    }

    if filled == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "no content to sniff",
        ));
    }

    Ok(detect_content_type(&buf[..filled]))
}

/// Magic-number signatures first, then the browser text heuristics.
pub fn detect_content_type(data: &[u8]) -> String {
    let data = &data[..data.len().min(SNIFF_LEN)];

    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    let trimmed = skip_whitespace(data);
    if HTML_TAGS.iter().any(|tag| matches_html_tag(trimmed, tag)) {
        return "text/html; charset=utf-8".to_string();
    }
    if trimmed.starts_with(b"<?xml") {
        return "text/xml; charset=utf-8".to_string();
    }
    if data.starts_with(b"%PDF-") {
        return "application/pdf".to_string();
    }

    if data.starts_with(&[0xFE, 0xFF]) {
        return "text/plain; charset=utf-16be".to_string();
    }
    if data.starts_with(&[0xFF, 0xFE]) {
        return "text/plain; charset=utf-16le".to_string();
    }
    if data.starts_with(&[0xEF, 0xBB, 0xBF]) || !data.iter().copied().any(is_binary_byte) {
        return TEXT_PLAIN_UTF8.to_string();
    }

    OCTET_STREAM.to_string()
}

fn skip_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !matches!(b, b'\t' | b'\n' | b'\x0c' | b'\r' | b' '))
        .unwrap_or(data.len());
    &data[start..]
}

/// Case-insensitive tag prefix followed by a space or `>`.
fn matches_html_tag(data: &[u8], tag: &[u8]) -> bool {
    if data.len() <= tag.len() || !data[..tag.len()].eq_ignore_ascii_case(tag) {
        return false;
    }
    matches!(data[tag.len()], b' ' | b'>')
}

fn is_binary_byte(b: u8) -> bool {
    matches!(b, 0x00..=0x08 | 0x0B | 0x0E..=0x1A | 0x1C..=0x1F)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const PNG_HEADER: &[u8] = &[
        0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
        0x52,
    ];

    /// Serves `ok_bytes` bytes, then fails every further read.
    struct FlakyReader {
        inner: Cursor<Vec<u8>>,
        ok_bytes: u64,
    }

    impl Read for FlakyReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let remaining = self.ok_bytes.saturating_sub(self.inner.position()) as usize;
            if remaining == 0 {
                return Err(io::Error::other("connection reset"));
            }
            let len = buf.len().min(remaining);
            self.inner.read(&mut buf[..len])
        }
    }

    impl Seek for FlakyReader {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.inner.seek(pos)
        }
    }

    #[test]
    fn test_detect_magic_numbers() {
        assert_eq!(detect_content_type(PNG_HEADER), "image/png");
        assert_eq!(detect_content_type(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10]), "image/jpeg");
        assert_eq!(detect_content_type(b"GIF89a\x01\x00\x01\x00"), "image/gif");
    }

    #[test]
    fn test_detect_text() {
        assert_eq!(detect_content_type(b"just some notes\n"), TEXT_PLAIN_UTF8);
        assert_eq!(detect_content_type(b""), TEXT_PLAIN_UTF8);
        assert_eq!(
            detect_content_type(b"\xEF\xBB\xBFwith a byte order mark"),
            TEXT_PLAIN_UTF8
        );
        assert!(detect_content_type(b"  <html><body>hi</body></html>").starts_with("text/html"));
    }

    #[test]
    fn test_detect_binary_fallback() {
        assert_eq!(detect_content_type(&[0x01, 0x02, 0x03, 0x10, 0x00]), OCTET_STREAM);
    }

    #[test]
    fn test_sniff_rewinds_on_success() {
        let mut data = PNG_HEADER.to_vec();
        data.extend_from_slice(&[0u8; 2048]);
        let mut cursor = Cursor::new(data.clone());

        let content_type = sniff_content_type(&mut cursor).unwrap();
        assert_eq!(content_type, "image/png");
        assert_eq!(cursor.position(), 0);

        let mut copied = Vec::new();
        cursor.read_to_end(&mut copied).unwrap();
        assert_eq!(copied, data);
    }

    #[test]
    fn test_sniff_rewinds_on_failure() {
        let mut reader = FlakyReader {
            inner: Cursor::new(vec![b'a'; 1024]),
            ok_bytes: 10,
        };

        assert!(sniff_content_type(&mut reader).is_err());
        assert_eq!(reader.inner.position(), 0);
    }

    #[test]
    fn test_sniff_empty_source_fails() {
        let mut cursor = Cursor::new(Vec::<u8>::new());

        let err = sniff_content_type(&mut cursor).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn test_sniff_tolerates_late_read_error() {
        let mut reader = FlakyReader {
            inner: Cursor::new(vec![b'a'; 1024]),
            ok_bytes: 100,
        };

        let content_type = sniff_content_type(&mut reader).unwrap();
        assert_eq!(content_type, TEXT_PLAIN_UTF8);
        assert_eq!(reader.inner.position(), 0);
    }
}
