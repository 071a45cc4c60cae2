//! Greenhouse job board API client.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, StatusCode};
use scraper::Html;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::{
    company_for_board, BoardJob, BoardQueryError, BoardSource, Submission, SubmissionError,
    SubmissionReceipt,
};

const USER_AGENT: &str = concat!("jobdesk/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<GreenhouseJob>,
}

#[derive(Debug, Deserialize)]
struct GreenhouseJob {
    id: i64,
    #[serde(default)]
    title: String,
    location: Option<Named>,
    absolute_url: Option<String>,
    content: Option<String>,
    #[serde(default)]
    departments: Vec<Named>,
    employment_type: Option<String>,
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Named {
    name: Option<String>,
}

pub struct GreenhouseClient {
    http: Client,
    base_url: String,
    partner_key: Option<String>,
}

impl GreenhouseClient {
    pub fn new(
        base_url: &str,
        partner_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        Ok(GreenhouseClient {
            http: Client::builder().user_agent(USER_AGENT).timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            partner_key,
        })
    }

    fn normalise(&self, token: &str, job: GreenhouseJob) -> BoardJob {
        let description_html = job.content.as_deref().map(decode_entities);
        let description_text = description_html.as_deref().map(html_to_text).unwrap_or_default();

        BoardJob {
            board_job_id: job.id.to_string(),
            board_token: token.to_string(),
            company: company_for_board(token),
            location: job.location.and_then(|l| l.name).filter(|l| !l.is_empty()),
            url: job
                .absolute_url
                .unwrap_or_else(|| format!("https://boards.greenhouse.io/{token}/jobs/{}", job.id)),
            description_html,
            description_text,
            department: job.departments.into_iter().find_map(|d| d.name),
            employment_type: job.employment_type.filter(|t| !t.is_empty()),
            posted_at: job.updated_at.as_deref().and_then(parse_timestamp),
            title: job.title,
        }
    }
}

/// Greenhouse sends listing HTML entity-encoded (`&lt;p&gt;`).
fn decode_entities(content: &str) -> String {
    let fragment = Html::parse_fragment(content);
    fragment.root_element().text().collect()
}

/// Visible text of an HTML fragment, one line per text node.
pub fn html_to_text(html: &str) -> String {
    let fragment = Html::parse_fragment(html);
    fragment
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

async fn pdf_part(path: &Path, file_name: &str) -> Result<Part, SubmissionError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| SubmissionError::Document {
            path: path.to_path_buf(),
            source,
        })?;
    Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str("application/pdf")
        .map_err(|e| SubmissionError::Network(e.to_string()))
}

/// Application id from a submission response: `id` or `application_id`,
/// as a number or a string.
fn receipt_from(body: &Value) -> Option<SubmissionReceipt> {
    let id = ["id", "application_id"].iter().find_map(|key| match &body[*key] {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    })?;
    let confirmed = body["confirmed"].as_bool().unwrap_or(false)
        || body["status"].as_str().is_some_and(|s| s.eq_ignore_ascii_case("confirmed"));
    Some(SubmissionReceipt {
        external_id: id,
        confirmed,
    })
}

#[async_trait]
impl BoardSource for GreenhouseClient {
    async fn fetch_board(&self, token: &str) -> Result<Vec<BoardJob>, BoardQueryError> {
        let url = format!("{}/{token}/jobs", self.base_url);
        debug!(%url, "Fetching board");

        let response = self
            .http
            .get(&url)
            .query(&[("content", "true")])
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| BoardQueryError::Network(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(BoardQueryError::NotFound),
            status if !status.is_success() => return Err(BoardQueryError::Status(status.as_u16())),
            _ => {}
        }

        let body: JobsResponse = response
            .json()
            .await
            .map_err(|e| BoardQueryError::Malformed(e.to_string()))?;
        info!(board = token, jobs = body.jobs.len(), "Fetched board listings");

        Ok(body
            .jobs
            .into_iter()
            .map(|job| self.normalise(token, job))
            .collect())
    }

    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmissionError> {
        let partner_key = self
            .partner_key
            .as_deref()
            .ok_or(SubmissionError::MissingPartnerKey)?;

        let mut form = Form::new()
            .text("first_name", submission.first_name.clone())
            .text("last_name", submission.last_name.clone())
            .text("email", submission.email.clone());
        if let Some(phone) = &submission.phone {
            form = form.text("phone", phone.clone());
        }
        let form = form
            .part("resume", pdf_part(&submission.resume_pdf, "resume.pdf").await?)
            .part(
                "cover_letter",
                pdf_part(&submission.cover_letter_pdf, "cover_letter.pdf").await?,
            );

        let url = format!(
            "{}/{}/jobs/{}/applications",
            self.base_url, submission.board_token, submission.board_job_id
        );
        info!(%url, "Submitting application");

        let response = self
            .http
            .post(&url)
            .basic_auth(partner_key, None::<&str>)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| SubmissionError::Network(e.to_string()))?;
        if !status.is_success() {
            return Err(SubmissionError::Rejected {
                status: status.as_u16(),
                message: text,
            });
        }

        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
        receipt_from(&body).ok_or(SubmissionError::NoReceipt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::{Multipart, Path as UrlPath};
    use axum::http::{HeaderMap, StatusCode as HttpStatus};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;

    use crate::test_support::serve;

    async fn board(UrlPath(token): UrlPath<String>) -> (HttpStatus, String) {
        match token.as_str() {
            "acme" => (
                HttpStatus::OK,
                json!({"jobs": [{
                    "id": 4012,
                    "title": "Senior Rust Engineer",
                    "location": {"name": "Remote - US"},
                    "absolute_url": "https://boards.greenhouse.io/acme/jobs/4012",
                    "content": "&lt;p&gt;Build &amp;amp; run &lt;strong&gt;Rust&lt;/strong&gt; services.&lt;/p&gt;&lt;ul&gt;&lt;li&gt;Kafka&lt;/li&gt;&lt;/ul&gt;",
                    "departments": [{"name": "Platform"}],
                    "updated_at": "2025-03-01T10:30:00-05:00"
                }, {
                    "id": 4013,
                    "title": "Recruiter",
                    "location": null,
                    "departments": []
                }]})
                .to_string(),
            ),
            "broken" => (HttpStatus::INTERNAL_SERVER_ERROR, "oops".to_string()),
            "garbled" => (HttpStatus::OK, "<html>not json</html>".to_string()),
            _ => (HttpStatus::NOT_FOUND, "{}".to_string()),
        }
    }

    async fn apply(
        UrlPath((token, job_id)): UrlPath<(String, String)>,
        headers: HeaderMap,
        mut multipart: Multipart,
    ) -> (HttpStatus, Json<Value>) {
        if headers.get("authorization").is_none() {
            return (HttpStatus::UNAUTHORIZED, Json(json!({"error": "no key"})));
        }
        let mut fields = Vec::new();
        while let Some(field) = multipart.next_field().await.unwrap() {
            let name = field.name().unwrap_or_default().to_string();
            let bytes = field.bytes().await.unwrap();
            fields.push(format!("{name}={}", bytes.len()));
        }
        (
            HttpStatus::OK,
            Json(json!({
                "application_id": format!("{token}-{job_id}"),
                "fields": fields,
                "status": if token == "acme" { "confirmed" } else { "received" }
            })),
        )
    }

    fn router() -> Router {
        Router::new()
            .route("/:token/jobs", get(board))
            .route("/:token/jobs/:job_id/applications", post(apply))
    }

    fn client(base: &str, partner_key: Option<&str>) -> GreenhouseClient {
        GreenhouseClient::new(base, partner_key.map(str::to_string), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_board_normalises_jobs() {
        let base = serve(router()).await;
        let jobs = client(&base, None).fetch_board("acme").await.unwrap();

        assert_eq!(jobs.len(), 2);
        let job = &jobs[0];
        assert_eq!(job.board_job_id, "4012");
        assert_eq!(job.company, "Acme");
        assert_eq!(job.location.as_deref(), Some("Remote - US"));
        assert_eq!(job.department.as_deref(), Some("Platform"));
        assert_eq!(job.description_text, "Build & run\nRust\nservices.\nKafka");
        assert_eq!(
            job.posted_at,
            Some(DateTime::parse_from_rfc3339("2025-03-01T15:30:00Z").unwrap().with_timezone(&Utc))
        );

        let bare = &jobs[1];
        assert_eq!(bare.location, None);
        assert_eq!(bare.url, "https://boards.greenhouse.io/acme/jobs/4013");
        assert_eq!(bare.description_text, "");
    }

    #[tokio::test]
    async fn test_fetch_board_errors() {
        let base = serve(router()).await;
        let client = client(&base, None);
        assert!(matches!(client.fetch_board("ghost").await, Err(BoardQueryError::NotFound)));
        assert!(matches!(client.fetch_board("broken").await, Err(BoardQueryError::Status(500))));
        assert!(matches!(client.fetch_board("garbled").await, Err(BoardQueryError::Malformed(_))));
        assert!(matches!(
            GreenhouseClient::new("http://127.0.0.1:9", None, Duration::from_secs(2))
                .unwrap()
                .fetch_board("acme")
                .await,
            Err(BoardQueryError::Network(_))
        ));
    }

    fn submission(dir: &tempfile::TempDir, token: &str) -> Submission {
        let resume_pdf = dir.path().join("resume.pdf");
        let cover_letter_pdf = dir.path().join("cover_letter.pdf");
        std::fs::write(&resume_pdf, b"%PDF resume").unwrap();
        std::fs::write(&cover_letter_pdf, b"%PDF letter").unwrap();
        Submission {
            board_token: token.to_string(),
            board_job_id: "4012".to_string(),
            first_name: "Sam".to_string(),
            last_name: "Lee".to_string(),
            email: "sam@example.com".to_string(),
            phone: None,
            resume_pdf,
            cover_letter_pdf,
        }
    }

    #[tokio::test]
    async fn test_submit_posts_multipart_and_reads_receipt() {
        let base = serve(router()).await;
        let dir = tempfile::tempdir().unwrap();

        let receipt = client(&base, Some("partner"))
            .submit(&submission(&dir, "acme"))
            .await
            .unwrap();
        assert_eq!(
            receipt,
            SubmissionReceipt {
                external_id: "acme-4012".to_string(),
                confirmed: true
            }
        );

        let receipt = client(&base, Some("partner"))
            .submit(&submission(&dir, "globex"))
            .await
            .unwrap();
        assert!(!receipt.confirmed);
    }

    #[tokio::test]
    async fn test_submit_without_partner_key_is_refused_locally() {
        let dir = tempfile::tempdir().unwrap();
        let err = client("http://127.0.0.1:9", None)
            .submit(&submission(&dir, "acme"))
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::MissingPartnerKey));
    }

    #[tokio::test]
    async fn test_submit_with_missing_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let mut submission = submission(&dir, "acme");
        submission.resume_pdf = dir.path().join("gone.pdf");
        let err = client("http://127.0.0.1:9", Some("partner"))
            .submit(&submission)
            .await
            .unwrap_err();
        assert!(matches!(err, SubmissionError::Document { .. }));
    }

    #[test]
    fn test_receipt_parsing() {
        assert_eq!(
            receipt_from(&json!({"id": 99})),
            Some(SubmissionReceipt {
                external_id: "99".to_string(),
                confirmed: false
            })
        );
        assert_eq!(receipt_from(&json!({"success": true})), None);
    }
}
