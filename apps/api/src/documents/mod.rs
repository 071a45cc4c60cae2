//! Generated documents on disk.
//!
//! Each job owns `applications/{job_id}/` holding `resume.md`, `resume.pdf`,
//! `cover_letter.md` and `cover_letter.pdf`. New versions are written and
//! converted inside a staging directory first and only renamed into place
//! once every PDF exists, so a failed run never leaves a half-written set.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use pulldown_cmark::{html, Options, Parser};
use tracing::{info, warn};

pub mod applicant;
pub mod converter;

pub use applicant::{extract_applicant_info, ApplicantInfo};
pub use converter::{ConversionError, MarkdownToPdf, PdfConverter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Resume,
    CoverLetter,
}

impl DocumentKind {
    fn stem(&self) -> &'static str {
        match self {
            DocumentKind::Resume => "resume",
            DocumentKind::CoverLetter => "cover_letter",
        }
    }
}

/// One downloadable file of an application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFile {
    ResumeMd,
    ResumePdf,
    CoverLetterMd,
    CoverLetterPdf,
}

impl DocumentFile {
    pub fn content_type(&self) -> &'static str {
        match self {
            DocumentFile::ResumeMd | DocumentFile::CoverLetterMd => "text/markdown; charset=utf-8",
            DocumentFile::ResumePdf | DocumentFile::CoverLetterPdf => "application/pdf",
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            DocumentFile::ResumeMd => "resume.md",
            DocumentFile::ResumePdf => "resume.pdf",
            DocumentFile::CoverLetterMd => "cover_letter.md",
            DocumentFile::CoverLetterPdf => "cover_letter.pdf",
        }
    }
}

impl FromStr for DocumentFile {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resume_md" => Ok(DocumentFile::ResumeMd),
            "resume_pdf" => Ok(DocumentFile::ResumePdf),
            "cover_letter_md" => Ok(DocumentFile::CoverLetterMd),
            "cover_letter_pdf" => Ok(DocumentFile::CoverLetterPdf),
            other => Err(format!(
                "unknown document '{other}'; expected resume_md, resume_pdf, cover_letter_md or cover_letter_pdf"
            )),
        }
    }
}

impl fmt::Display for DocumentFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_name())
    }
}

/// Deterministic file locations for one job's documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentPaths {
    pub dir: PathBuf,
    pub resume_md: PathBuf,
    pub resume_pdf: PathBuf,
    pub cover_letter_md: PathBuf,
    pub cover_letter_pdf: PathBuf,
}

impl DocumentPaths {
    pub fn for_job(root: &Path, job_id: i64) -> Self {
        let dir = root.join(job_id.to_string());
        DocumentPaths {
            resume_md: dir.join(DocumentFile::ResumeMd.file_name()),
            resume_pdf: dir.join(DocumentFile::ResumePdf.file_name()),
            cover_letter_md: dir.join(DocumentFile::CoverLetterMd.file_name()),
            cover_letter_pdf: dir.join(DocumentFile::CoverLetterPdf.file_name()),
            dir,
        }
    }

    pub fn path(&self, file: DocumentFile) -> &Path {
        match file {
            DocumentFile::ResumeMd => &self.resume_md,
            DocumentFile::ResumePdf => &self.resume_pdf,
            DocumentFile::CoverLetterMd => &self.cover_letter_md,
            DocumentFile::CoverLetterPdf => &self.cover_letter_pdf,
        }
    }
}

#[derive(Clone)]
pub struct DocumentGenerator {
    root: PathBuf,
    converter: Arc<dyn PdfConverter>,
}

impl DocumentGenerator {
    pub fn new(root: PathBuf, converter: Arc<dyn PdfConverter>) -> Self {
        DocumentGenerator { root, converter }
    }

    pub fn paths(&self, job_id: i64) -> DocumentPaths {
        DocumentPaths::for_job(&self.root, job_id)
    }

    /// Writes and converts both documents, replacing any earlier pair.
    pub async fn write_pair(
        &self,
        job_id: i64,
        resume: &str,
        cover_letter: &str,
    ) -> Result<DocumentPaths, ConversionError> {
        self.write(
            job_id,
            &[
                (DocumentKind::Resume, resume),
                (DocumentKind::CoverLetter, cover_letter),
            ],
        )
        .await
    }

    /// Writes and converts the given documents. Documents not listed are left as they are.
    pub async fn write(
        &self,
        job_id: i64,
        documents: &[(DocumentKind, &str)],
    ) -> Result<DocumentPaths, ConversionError> {
        let paths = self.paths(job_id);
        tokio::fs::create_dir_all(&paths.dir).await?;

        // Dropping the guard removes the staging directory and anything left in it.
        let staging = tempfile::Builder::new()
            .prefix(".staging-")
            .tempdir_in(&paths.dir)?;

        let mut staged = Vec::with_capacity(documents.len() * 2);
        for (kind, markdown) in documents {
            let md = staging.path().join(format!("{}.md", kind.stem()));
            tokio::fs::write(&md, markdown).await?;
            let pdf = self.converter.convert(&md).await?;
            staged.push((md, paths.dir.join(format!("{}.md", kind.stem()))));
            staged.push((pdf, paths.dir.join(format!("{}.pdf", kind.stem()))));
        }

        for (from, to) in &staged {
            tokio::fs::rename(from, to).await?;
        }

        info!(job_id, dir = %paths.dir.display(), count = documents.len(), "Documents written");
        Ok(paths)
    }

    /// Deletes the job's document directory, if any.
    pub async fn remove(&self, job_id: i64) -> Result<(), std::io::Error> {
        let dir = self.paths(job_id).dir;
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(dir = %dir.display(), "Failed to remove documents: {e}");
                Err(e)
            }
        }
    }
}

/// Reads a stored markdown document. A missing file reads as `None`.
pub async fn read_markdown(path: &str) -> Result<Option<String>, std::io::Error> {
    match tokio::fs::read_to_string(path).await {
        Ok(text) => Ok(Some(text)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// HTML preview of a markdown document.
pub fn render_preview(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(markdown, options));
    out
}

#[cfg(test)]
mod tests {
    use super::converter::fake::{fake_pdf_bytes, BrokenConverter, FakeConverter};
    use super::*;
    use sha2::{Digest, Sha256};

    fn generator(dir: &tempfile::TempDir) -> DocumentGenerator {
        DocumentGenerator::new(dir.path().to_path_buf(), Arc::new(FakeConverter))
    }

    fn sha256(bytes: &[u8]) -> Vec<u8> {
        Sha256::digest(bytes).to_vec()
    }

    #[test]
    fn test_layout_is_deterministic() {
        let paths = DocumentPaths::for_job(Path::new("/data/applications"), 42);
        assert_eq!(paths.dir, Path::new("/data/applications/42"));
        assert_eq!(paths.resume_pdf, Path::new("/data/applications/42/resume.pdf"));
        assert_eq!(
            paths.cover_letter_md,
            Path::new("/data/applications/42/cover_letter.md")
        );
    }

    #[tokio::test]
    async fn test_regenerating_overwrites_and_pdf_tracks_latest_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let docs = generator(&dir);

        docs.write_pair(7, "# First draft", "Dear A").await.unwrap();
        let paths = docs.write_pair(7, "# Second draft", "Dear B").await.unwrap();

        let pdf = std::fs::read(&paths.resume_pdf).unwrap();
        assert_eq!(sha256(&pdf), sha256(&fake_pdf_bytes("# Second draft")));
        assert_ne!(sha256(&pdf), sha256(&fake_pdf_bytes("# First draft")));
        assert_eq!(std::fs::read_to_string(&paths.cover_letter_md).unwrap(), "Dear B");

        // Only the four documents remain; staging is gone.
        let mut names: Vec<String> = std::fs::read_dir(&paths.dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(
            names,
            ["cover_letter.md", "cover_letter.pdf", "resume.md", "resume.pdf"]
        );
    }

    #[tokio::test]
    async fn test_failed_conversion_keeps_previous_documents() {
        let dir = tempfile::tempdir().unwrap();
        let paths = generator(&dir).write_pair(3, "# Good", "Dear A").await.unwrap();

        let broken = DocumentGenerator::new(dir.path().to_path_buf(), Arc::new(BrokenConverter));
        let err = broken.write_pair(3, "# Replacement", "Dear B").await.unwrap_err();
        assert!(matches!(err, ConversionError::Failed(_)));

        assert_eq!(std::fs::read_to_string(&paths.resume_md).unwrap(), "# Good");
        assert_eq!(std::fs::read_dir(&paths.dir).unwrap().count(), 4);
    }

    #[tokio::test]
    async fn test_single_document_rewrite_leaves_the_other() {
        let dir = tempfile::tempdir().unwrap();
        let docs = generator(&dir);
        docs.write_pair(5, "# Resume", "Dear A").await.unwrap();

        let paths = docs
            .write(5, &[(DocumentKind::CoverLetter, "Dear Edited")])
            .await
            .unwrap();
        assert_eq!(std::fs::read_to_string(&paths.resume_md).unwrap(), "# Resume");
        assert_eq!(std::fs::read(&paths.cover_letter_pdf).unwrap(), fake_pdf_bytes("Dear Edited"));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let docs = generator(&dir);
        let paths = docs.write_pair(9, "# R", "Dear").await.unwrap();

        docs.remove(9).await.unwrap();
        assert!(!paths.dir.exists());
        docs.remove(9).await.unwrap();
    }

    #[tokio::test]
    async fn test_read_missing_markdown_is_none() {
        assert_eq!(read_markdown("/nonexistent/jobdesk/resume.md").await.unwrap(), None);
    }

    #[test]
    fn test_preview_renders_tables_and_headings() {
        let html = render_preview("# Sam\n\n| a | b |\n|---|---|\n| 1 | 2 |\n");
        assert!(html.contains("<h1>Sam</h1>"));
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_document_file_parsing() {
        assert_eq!("resume_pdf".parse::<DocumentFile>().unwrap(), DocumentFile::ResumePdf);
        assert!("resume.exe".parse::<DocumentFile>().is_err());
    }
}
