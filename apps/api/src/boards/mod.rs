//! Public job board search and application submission.
//!
//! Boards are queried one at a time through [`BoardSource`]. A board that
//! fails is reported in [`SearchOutcome::errors`] and the search carries on
//! with the rest.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::models::job::NewJob;
use crate::parser::{self, ParseHints};

pub mod greenhouse;

pub use greenhouse::GreenhouseClient;

/// Display names for boards whose token is not the company name.
const COMPANY_NAMES: &[(&str, &str)] = &[
    ("sentinellabs", "SentinelOne"),
    ("paloaltonetworks", "Palo Alto Networks"),
    ("zscaler", "Zscaler"),
    ("cloudflare", "Cloudflare"),
    ("crowdstrike", "CrowdStrike"),
    ("tanium", "Tanium"),
    ("rapid7", "Rapid7"),
    ("snyk", "Snyk"),
    ("unity3d", "Unity"),
    ("roblox", "Roblox"),
    ("rivian", "Rivian"),
];

#[derive(Debug, Error)]
pub enum BoardQueryError {
    #[error("board not found")]
    NotFound,

    #[error("board API returned status {0}")]
    Status(u16),

    #[error("network error: {0}")]
    Network(String),

    #[error("unreadable board response: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum SubmissionError {
    #[error("submitting applications needs partner access; set BOARD_PARTNER_KEY")]
    MissingPartnerKey,

    #[error("job has no board listing to submit to")]
    NotABoardJob,

    #[error("could not read {path}: {source}")]
    Document {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("board rejected the application (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("board response had no application id")]
    NoReceipt,
}

/// A job as listed on a board, normalised.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardJob {
    pub board_job_id: String,
    pub board_token: String,
    pub title: String,
    pub company: String,
    pub location: Option<String>,
    pub url: String,
    /// Listing body as HTML.
    pub description_html: Option<String>,
    /// Listing body flattened to text, used for matching and for prompts.
    pub description_text: String,
    pub department: Option<String>,
    pub employment_type: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

impl BoardJob {
    /// Converts a listing into a job to store, filling salary, skills and
    /// arrangement from the listing text.
    pub fn to_new_job(&self) -> NewJob {
        let hints = ParseHints {
            title: Some(self.title.clone()),
            location: self.location.clone(),
        };
        let parsed = parser::parse_job_description(&self.description_text, &hints);

        NewJob {
            board_job_id: Some(self.board_job_id.clone()),
            board_token: Some(self.board_token.clone()),
            source: "greenhouse".to_string(),
            title: self.title.clone(),
            company: self.company.clone(),
            location: self.location.clone(),
            url: Some(self.url.clone()),
            description: Some(self.description_text.clone()),
            department: self.department.clone(),
            employment_type: self.employment_type.clone(),
            salary_min: parsed.salary_min,
            salary_max: parsed.salary_max,
            salary_text: parsed.salary_text,
            is_remote: parsed.is_remote,
            experience_years: parsed.experience_years,
            skills: parsed.skills,
            hiring_manager: parsed.hiring_manager,
            posted_at: self.posted_at,
        }
    }

    fn matches_any(&self, keywords: &[String]) -> bool {
        let title = self.title.to_lowercase();
        let text = self.description_text.to_lowercase();
        keywords
            .iter()
            .any(|kw| title.contains(kw.as_str()) || text.contains(kw.as_str()))
    }

    fn located_in(&self, location: &str) -> bool {
        self.location
            .as_deref()
            .is_some_and(|l| l.to_lowercase().contains(location))
    }
}

/// Everything a board needs to receive an application.
#[derive(Debug, Clone)]
pub struct Submission {
    pub board_token: String,
    pub board_job_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_pdf: PathBuf,
    pub cover_letter_pdf: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionReceipt {
    pub external_id: String,
    /// The board acknowledged the application beyond accepting the upload.
    pub confirmed: bool,
}

#[async_trait]
pub trait BoardSource: Send + Sync {
    async fn fetch_board(&self, token: &str) -> Result<Vec<BoardJob>, BoardQueryError>;

    async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmissionError>;
}

#[derive(Debug, Clone, Default)]
pub struct SearchQuery {
    /// Lowercased; a job matches when any one of them appears.
    pub keywords: Vec<String>,
    pub location: Option<String>,
    pub boards: Vec<String>,
}

impl SearchQuery {
    /// Splits `keywords` on whitespace.
    pub fn new(keywords: &str, location: Option<&str>, boards: Vec<String>) -> Self {
        SearchQuery {
            keywords: keywords.split_whitespace().map(str::to_lowercase).collect(),
            location: location
                .map(|l| l.trim().to_lowercase())
                .filter(|l| !l.is_empty()),
            boards,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BoardFailure {
    pub board: String,
    pub error: String,
}

#[derive(Debug, Default, Serialize)]
pub struct SearchOutcome {
    pub jobs: Vec<BoardJob>,
    pub errors: Vec<BoardFailure>,
}

/// Queries every board in order, waiting `pace` between boards.
pub async fn search(source: &dyn BoardSource, query: &SearchQuery, pace: Duration) -> SearchOutcome {
    info!(
        boards = query.boards.len(),
        keywords = ?query.keywords,
        "Searching job boards"
    );
    let mut outcome = SearchOutcome::default();

    for (i, board) in query.boards.iter().enumerate() {
        if i > 0 && !pace.is_zero() {
            tokio::time::sleep(pace).await;
        }

        match source.fetch_board(board).await {
            Ok(jobs) => {
                let before = outcome.jobs.len();
                outcome.jobs.extend(jobs.into_iter().filter(|job| {
                    job.matches_any(&query.keywords)
                        && query.location.as_deref().map_or(true, |l| job.located_in(l))
                }));
                info!(board, matched = outcome.jobs.len() - before, "Board searched");
            }
            Err(e) => {
                warn!(board, "Board query failed: {e}");
                outcome.errors.push(BoardFailure {
                    board: board.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    // Newest first; undated listings last.
    outcome.jobs.sort_by(|a, b| b.posted_at.cmp(&a.posted_at));
    outcome
}

/// Company display name for a board token.
pub fn company_for_board(token: &str) -> String {
    if let Some((_, name)) = COMPANY_NAMES.iter().find(|(t, _)| *t == token) {
        return name.to_string();
    }
    token
        .split(['-', '_'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            chars
                .next()
                .map(|c| c.to_uppercase().chain(chars).collect::<String>())
                .unwrap_or_default()
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Freshness {
    pub days: Option<i64>,
    pub label: String,
}

/// How long ago a listing was posted or updated.
pub fn freshness(posted_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Freshness {
    let Some(posted_at) = posted_at else {
        return Freshness {
            days: None,
            label: "Unknown".to_string(),
        };
    };
    let days = (now - posted_at).num_days().max(0);
    let label = match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        n => format!("{n}d ago"),
    };
    Freshness {
        days: Some(days),
        label,
    }
}

#[cfg(test)]
pub mod fake {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use super::*;

    /// Boards served from memory. Tokens with no entry fail with a network error.
    #[derive(Default)]
    pub struct FakeBoards {
        pub boards: HashMap<String, Vec<BoardJob>>,
        pub submissions: Mutex<Vec<Submission>>,
        pub confirm: bool,
    }

    impl FakeBoards {
        pub fn with_board(mut self, token: &str, jobs: Vec<BoardJob>) -> Self {
            self.boards.insert(token.to_string(), jobs);
            self
        }
    }

    pub fn board_job(token: &str, id: &str, title: &str, text: &str) -> BoardJob {
        BoardJob {
            board_job_id: id.to_string(),
            board_token: token.to_string(),
            title: title.to_string(),
            company: company_for_board(token),
            location: Some("Remote - US".to_string()),
            url: format!("https://boards.example/{token}/jobs/{id}"),
            description_html: None,
            description_text: text.to_string(),
            department: None,
            employment_type: None,
            posted_at: None,
        }
    }

    #[async_trait]
    impl BoardSource for FakeBoards {
        async fn fetch_board(&self, token: &str) -> Result<Vec<BoardJob>, BoardQueryError> {
            self.boards
                .get(token)
                .cloned()
                .ok_or_else(|| BoardQueryError::Network("connection refused".to_string()))
        }

        async fn submit(&self, submission: &Submission) -> Result<SubmissionReceipt, SubmissionError> {
            self.submissions.lock().unwrap().push(submission.clone());
            Ok(SubmissionReceipt {
                external_id: format!("gh-{}", submission.board_job_id),
                confirmed: self.confirm,
            })
        }
    }
}
