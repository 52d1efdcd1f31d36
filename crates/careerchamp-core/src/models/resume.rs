//! Resume upload formats.

use std::path::Path;

use anyhow::{bail, Result};

/// Document types the resume endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Doc,
    Docx,
}

impl ResumeFormat {
    /// Pick the format from the file extension (case-insensitive).
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("pdf") => Ok(ResumeFormat::Pdf),
            Some("doc") => Ok(ResumeFormat::Doc),
            Some("docx") => Ok(ResumeFormat::Docx),
            _ => bail!(
                "Please upload a PDF or Word document (.pdf, .doc, .docx): {}",
                path.display()
            ),
        }
    }

    pub fn mime_type(self) -> &'static str {
        match self {
            ResumeFormat::Pdf => "application/pdf",
            ResumeFormat::Doc => "application/msword",
            ResumeFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
        }
    }
}
