//! Image OCR via the `tesseract` executable.
//!
//! The uploaded bytes are decoded first so a corrupt or mislabelled image
//! fails with a decode error rather than an opaque OCR exit status. The
//! decoded image is re-encoded as PNG (lossless, so text edges stay crisp)
//! into a temp file, and tesseract reads it and prints the text to stdout.

use crate::error::ExtractionError;
use image::ImageFormat;
use std::io::{Cursor, Write};
use tokio::process::Command;
use tracing::{debug, info};

/// OCR a PNG or JPEG image and return the recognised text.
pub async fn ocr_image(
    bytes: Vec<u8>,
    tesseract_cmd: &str,
    language: Option<&str>,
) -> Result<String, ExtractionError> {
    let png = tokio::task::spawn_blocking(move || normalise_to_png(&bytes))
        .await
        .map_err(|e| ExtractionError::Internal(format!("Image task panicked: {}", e)))??;

    let mut tmp = tempfile::Builder::new()
        .prefix("carebuddy-ocr-")
        .suffix(".png")
        .tempfile()?;
    tmp.write_all(&png)?;
    tmp.flush()?;

    let mut cmd = Command::new(tesseract_cmd);
    cmd.arg(tmp.path()).arg("stdout");
    if let Some(lang) = language {
        cmd.arg("-l").arg(lang);
    }

    info!("Running OCR with '{}'", tesseract_cmd);
    let output = cmd
        .output()
        .await
        .map_err(|e| ExtractionError::Ocr(format!("failed to run '{}': {}", tesseract_cmd, e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ExtractionError::Ocr(format!(
            "'{}' exited with {}: {}",
            tesseract_cmd,
            output.status,
            stderr.trim()
        )));
    }

    let text = String::from_utf8_lossy(&output.stdout).into_owned();
    debug!("OCR produced {} chars", text.len());
    Ok(text)
}

/// Decode any supported image and re-encode it as PNG.
fn normalise_to_png(bytes: &[u8]) -> Result<Vec<u8>, ExtractionError> {
    let img = image::load_from_memory(bytes)?;
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)?;
    debug!(
        "Normalised {}x{} image → {} bytes PNG",
        img.width(),
        img.height(),
        buf.len()
    );
    Ok(buf)
}
