//! Input reading: load the Markdown document into memory as UTF-8 text.
//!
//! The document is read exactly once per run. Failures are split into the
//! three cases an author can act on: the file is missing, it is not
//! readable, or it is not UTF-8 (with the offset of the first bad byte).

use crate::error::Md2PdfError;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Read `path` as UTF-8 text.
pub async fn read_document(path: &Path) -> Result<String, Md2PdfError> {
    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::PermissionDenied => Md2PdfError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => Md2PdfError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    let text = decode(path, bytes)?;
    debug!("Read {} bytes from {}", text.len(), path.display());
    Ok(text)
}

fn decode(path: &Path, bytes: Vec<u8>) -> Result<String, Md2PdfError> {
    String::from_utf8(bytes).map_err(|e| Md2PdfError::NotUtf8 {
        path: path.to_path_buf(),
        offset: e.utf8_error().valid_up_to(),
    })
}
