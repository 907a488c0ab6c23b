//! "Download Chat": render a transcript as plain text and write it to disk.
//!
//! Each turn is rendered as `"<Role>:\n<content>"` and turns are separated
//! by one blank line. Files are named `CareBuddy_Chat_<YYYY-MM-DD_HH-MM>.txt`.

use crate::error::AssistantError;
use crate::session::Transcript;
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};
use tracing::info;

/// Render the transcript as plain text.
pub fn render_transcript(transcript: &Transcript) -> String {
    transcript
        .turns()
        .iter()
        .map(|turn| format!("{}:\n{}", turn.role().title(), turn.content()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// File name for an export taken at `at`.
pub fn export_file_name(at: NaiveDateTime) -> String {
    format!("CareBuddy_Chat_{}.txt", at.format("%Y-%m-%d_%H-%M"))
}

/// Write the transcript into `dir` and return the file's path.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
pub async fn export_transcript(
    transcript: &Transcript,
    dir: impl AsRef<Path>,
    at: NaiveDateTime,
) -> Result<PathBuf, AssistantError> {
    let dir = dir.as_ref();
    let path = dir.join(export_file_name(at));
    let write_err = |source: std::io::Error| AssistantError::ExportFailed {
        path: path.clone(),
        source,
    };

    tokio::fs::create_dir_all(dir).await.map_err(write_err)?;

    let tmp_path = path.with_extension("txt.tmp");
    tokio::fs::write(&tmp_path, render_transcript(transcript))
        .await
        .map_err(write_err)?;
    tokio::fs::rename(&tmp_path, &path)
        .await
        .map_err(write_err)?;

    info!("Chat exported to {}", path.display());
    Ok(path)
}
