//! Upload resolution: read a local document and decide how to extract it.
//!
//! Only PDF, PNG, JPG and JPEG files are accepted, by extension. PDFs are
//! checked for the `%PDF` magic bytes so a mislabelled file gets a clear
//! error instead of a pdfium failure.

use crate::error::AssistantError;
use crate::extract::DocumentKind;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// A document read from disk, ready for extraction.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    /// File name shown to the user.
    pub name: String,
    pub kind: DocumentKind,
    pub bytes: Vec<u8>,
}

/// Read `path` and classify it.
pub async fn load_document(path: &Path) -> Result<LoadedDocument, AssistantError> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    let kind = DocumentKind::from_path(path)
        .ok_or_else(|| AssistantError::UnsupportedDocument { name: name.clone() })?;

    let bytes = tokio::fs::read(path).await.map_err(|e| match e.kind() {
        ErrorKind::NotFound => AssistantError::FileNotFound {
            path: path.to_path_buf(),
        },
        ErrorKind::PermissionDenied => AssistantError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => AssistantError::Internal(format!("reading '{}': {}", path.display(), e)),
    })?;

    if kind == DocumentKind::Pdf && !bytes.starts_with(b"%PDF") {
        // Files shorter than the header are zero-padded.
        let mut magic = [0u8; 4];
        let n = bytes.len().min(4);
        magic[..n].copy_from_slice(&bytes[..n]);
        return Err(AssistantError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    debug!("Loaded {} ({:?}, {} bytes)", name, kind, bytes.len());
    Ok(LoadedDocument { name, kind, bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loads_pdf_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("labs.pdf");
        std::fs::write(&path, b"%PDF-1.7\n...").unwrap();

        let doc = load_document(&path).await.unwrap();
        assert_eq!(doc.name, "labs.pdf");
        assert_eq!(doc.kind, DocumentKind::Pdf);
        assert_eq!(doc.bytes.len(), 12);
    }

    #[tokio::test]
    async fn rejects_mislabelled_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"GIF89a").unwrap();

        let err = load_document(&path).await.unwrap_err();
        assert!(matches!(err, AssistantError::NotAPdf { magic, .. } if &magic == b"GIF8"));
    }

    #[tokio::test]
    async fn rejects_truncated_pdf() {
        let dir = tempfile::tempdir().unwrap();

        let empty = dir.path().join("empty.pdf");
        std::fs::write(&empty, b"").unwrap();
        let err = load_document(&empty).await.unwrap_err();
        assert!(matches!(err, AssistantError::NotAPdf { magic, .. } if magic == [0; 4]));

        let short = dir.path().join("short.pdf");
        std::fs::write(&short, b"%P").unwrap();
        let err = load_document(&short).await.unwrap_err();
        assert!(matches!(err, AssistantError::NotAPdf { magic, .. } if &magic == b"%P\0\0"));
    }

    #[tokio::test]
    async fn rejects_unsupported_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, b"hello").unwrap();

        let err = load_document(&path).await.unwrap_err();
        assert!(matches!(err, AssistantError::UnsupportedDocument { ref name } if name == "notes.txt"));
    }

    #[tokio::test]
    async fn missing_file_is_reported() {
        let err = load_document(Path::new("/definitely/not/here.png"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssistantError::FileNotFound { .. }));
    }
}
