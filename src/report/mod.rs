// Paper report rendering (Markdown and PDF)

pub mod markdown;
pub mod pdf;

pub use markdown::markdown_from_paper;
pub use pdf::pdf_from_markdown;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to render Markdown: {0}")]
    Template(#[from] tera::Error),

    #[error("Failed to serialize paper section: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

impl From<std::io::Error> for ReportError {
    fn from(e: std::io::Error) -> Self {
        ReportError::Pdf(e.to_string())
    }
}
