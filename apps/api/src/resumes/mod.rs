//! Master resumes: the markdown every tailored resume starts from.

use crate::errors::AppError;

pub mod handlers;

/// Name given to a resume created without one.
pub const DEFAULT_NAME: &str = "Master Resume";

/// Turns an uploaded file into resume text. Markdown and plain text are
/// taken as-is; PDFs have their text layer extracted.
pub async fn text_from_upload(file_name: &str, bytes: Vec<u8>) -> Result<String, AppError> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    let text = match extension.as_str() {
        "md" | "markdown" | "txt" => String::from_utf8(bytes)
            .map_err(|_| AppError::Validation(format!("{file_name} is not UTF-8 text")))?,
        // The extractor can panic on malformed files; that reads as unreadable too.
        "pdf" => tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes))
            .await
            .map_err(|e| e.to_string())
            .and_then(|r| r.map_err(|e| e.to_string()))
            .map_err(|e| AppError::Validation(format!("Could not read text from {file_name}: {e}")))?,
        _ => {
            return Err(AppError::Validation(format!(
                "Unsupported file '{file_name}'; upload .md, .txt or .pdf"
            )))
        }
    };

    let text = text.trim().to_string();
    if text.is_empty() {
        return Err(AppError::Validation(format!("{file_name} contains no text")));
    }
    Ok(text)
}

/// Resume name from an upload: the explicit one, else the file stem.
pub fn name_for_upload(explicit: Option<&str>, file_name: &str) -> String {
    explicit
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string)
        .or_else(|| {
            std::path::Path::new(file_name)
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| DEFAULT_NAME.to_string())
}
