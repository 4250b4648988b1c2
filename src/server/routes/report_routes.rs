//! Paper download route
//!
//! Handles: GET /result/:run_id/download?format={md|pdf}

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;

use super::json_error;
use crate::report::{markdown_from_paper, pdf_from_markdown};
use crate::server::ServerAppState;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub format: Option<String>,
}

/// Supported download formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadFormat {
    Markdown,
    Pdf,
}

impl DownloadFormat {
    pub fn parse(format: &str) -> Option<Self> {
        match format {
            "md" => Some(DownloadFormat::Markdown),
            "pdf" => Some(DownloadFormat::Pdf),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DownloadFormat::Markdown => "md",
            DownloadFormat::Pdf => "pdf",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DownloadFormat::Markdown => "text/markdown",
            DownloadFormat::Pdf => "application/pdf",
        }
    }
}

/// Stream the paper of a completed run as an attachment.
///
/// The run is looked up before the format is checked, so an unknown run is
/// a 404 whatever format was asked for.
pub async fn download_result(
    State(state): State<ServerAppState>,
    Path(run_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Response {
    let Some(paper) = state.orchestrator.get_result(&run_id) else {
        return json_error(StatusCode::NOT_FOUND, json!({"error": "run_id not found"}));
    };

    let markdown = match markdown_from_paper(&paper) {
        Ok(markdown) => markdown,
        Err(e) => {
            log::error!("Failed to render paper for run {}: {}", run_id, e);
            return json_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({"error": "Markdown generation failed", "detail": e.to_string()}),
            );
        }
    };

    let requested = query.format.as_deref().unwrap_or("md");
    let Some(format) = DownloadFormat::parse(requested) else {
        return json_error(StatusCode::BAD_REQUEST, json!({"error": "unsupported format"}));
    };

    let body = match format {
        DownloadFormat::Markdown => markdown.into_bytes(),
        DownloadFormat::Pdf => {
            match tokio::task::spawn_blocking(move || pdf_from_markdown(&markdown)).await {
                Ok(Ok(bytes)) => bytes,
                Ok(Err(e)) => return pdf_failure(&run_id, e.to_string()),
                Err(e) => return pdf_failure(&run_id, e.to_string()),
            }
        }
    };

    let disposition = format!(
        "attachment; filename=paper_{}.{}",
        run_id,
        format.extension()
    );
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

fn pdf_failure(run_id: &str, detail: String) -> Response {
    log::error!("PDF generation failed for run {}: {}", run_id, detail);
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({"error": "PDF generation failed", "detail": detail}),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_format_parse() {
        assert_eq!(DownloadFormat::parse("md"), Some(DownloadFormat::Markdown));
        assert_eq!(DownloadFormat::parse("pdf"), Some(DownloadFormat::Pdf));
        assert_eq!(DownloadFormat::parse("PDF"), None);
        assert_eq!(DownloadFormat::parse("docx"), None);
    }

    #[test]
    fn test_download_format_headers() {
        assert_eq!(DownloadFormat::Markdown.content_type(), "text/markdown");
        assert_eq!(DownloadFormat::Pdf.content_type(), "application/pdf");
        assert_eq!(DownloadFormat::Pdf.extension(), "pdf");
    }
}
