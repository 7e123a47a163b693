//! PDF → image conversion. Renders the first page of an uploaded résumé to PNG
//! so the detail view has a preview to show.

use std::path::PathBuf;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{command} is not available: {source}")]
    ToolUnavailable {
        command: String,
        source: std::io::Error,
    },

    #[error("{command} failed: {stderr}")]
    ToolFailed { command: String, stderr: String },

    #[error("renderer produced no image")]
    NoOutput,
}

/// An in-memory file travelling through the pipeline.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub content_type: String,
    pub data: Bytes,
}

#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert(&self, file: &UploadedFile) -> Result<UploadedFile, ConvertError>;
}

/// Shells out to poppler's `pdftoppm`.
pub struct PdftoppmConverter {
    command: String,
    dpi: u32,
}

impl PdftoppmConverter {
    pub fn new(command: String, dpi: u32) -> Self {
        Self { command, dpi }
    }
}

#[async_trait]
impl PdfConverter for PdftoppmConverter {
    async fn convert(&self, file: &UploadedFile) -> Result<UploadedFile, ConvertError> {
        // Removed on drop, along with the rendered page.
        let workdir = tempfile::Builder::new().prefix("resumind-render").tempdir()?;
        let input = workdir.path().join("input.pdf");
        let output_prefix = workdir.path().join("page");
        tokio::fs::write(&input, &file.data).await?;

        debug!(
            "Rendering {} ({} bytes) with {} at {} dpi",
            file.name,
            file.data.len(),
            self.command,
            self.dpi
        );

        let output = Command::new(&self.command)
            .arg("-png")
            .arg("-singlefile")
            .args(["-f", "1", "-l", "1"])
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(&input)
            .arg(&output_prefix)
            .output()
            .await
            .map_err(|source| ConvertError::ToolUnavailable {
                command: self.command.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(ConvertError::ToolFailed {
                command: self.command.clone(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let rendered: PathBuf = output_prefix.with_extension("png");
        let data = match tokio::fs::read(&rendered).await {
            Ok(data) if !data.is_empty() => data,
            Ok(_) => return Err(ConvertError::NoOutput),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConvertError::NoOutput)
            }
            Err(e) => return Err(e.into()),
        };

        info!("Rendered {} to {} byte PNG", file.name, data.len());

        Ok(UploadedFile {
            name: image_file_name(&file.name),
            content_type: "image/png".to_string(),
            data: Bytes::from(data),
        })
    }
}

/// `resume.PDF` → `resume.png`; names without a `.pdf` suffix just gain `.png`.
pub fn image_file_name(pdf_name: &str) -> String {
    let split = pdf_name.len().saturating_sub(4);
    let stem = match pdf_name.get(split..) {
        Some(suffix) if suffix.eq_ignore_ascii_case(".pdf") => &pdf_name[..split],
        _ => pdf_name,
    };
    format!("{stem}.png")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_file_name_replaces_pdf_suffix() {
        assert_eq!(image_file_name("resume.pdf"), "resume.png");
        assert_eq!(image_file_name("Resume.PDF"), "Resume.png");
    }

    #[test]
    fn test_image_file_name_only_touches_trailing_suffix() {
        assert_eq!(image_file_name("my.pdf.notes"), "my.pdf.notes.png");
        assert_eq!(image_file_name("cv"), "cv.png");
    }

    #[test]
    fn test_image_file_name_handles_multibyte_names() {
        assert_eq!(image_file_name("résumé.pdf"), "résumé.png");
        assert_eq!(image_file_name("é"), "é.png");
    }

    #[tokio::test]
    async fn test_missing_tool_is_reported() {
        let converter = PdftoppmConverter::new("definitely-not-a-real-pdftoppm".to_string(), 72);
        let file = UploadedFile {
            name: "cv.pdf".to_string(),
            content_type: "application/pdf".to_string(),
            data: Bytes::from_static(b"%PDF-1.4\n%%EOF"),
        };
        let err = converter.convert(&file).await.unwrap_err();
        assert!(matches!(err, ConvertError::ToolUnavailable { .. }));
    }
}
