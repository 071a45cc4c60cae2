//! Job description parser: pulls structured fields out of pasted posting text.
//!
//! Every extractor is a pure function over the input. A field is only set when
//! a rule matched it; rules that matched but produced an implausible value are
//! reported as [`ParseWarning`]s instead of being stored.

pub mod generic;
pub mod linkedin;
pub mod rules;
pub mod salary;
pub mod skills;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Linkedin,
    Generic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkArrangement {
    Remote,
    Hybrid,
    OnSite,
}

impl WorkArrangement {
    /// Hybrid counts as remote for filtering purposes.
    pub fn is_remote(self) -> bool {
        !matches!(self, WorkArrangement::OnSite)
    }
}

/// A rule matched but its value was discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub rule: &'static str,
    pub message: String,
}

/// Values the user typed next to the pasted text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParseHints {
    pub title: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedJob {
    pub title: Option<String>,
    pub company: Option<String>,
    pub location: Option<String>,
    pub salary_min: Option<i64>,
    pub salary_max: Option<i64>,
    pub salary_text: Option<String>,
    pub work_arrangement: Option<WorkArrangement>,
    pub is_remote: Option<bool>,
    pub experience_years: Option<String>,
    pub skills: Vec<String>,
    pub hiring_manager: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub cleaned_description: Option<String>,
    pub source_format: SourceFormat,
    pub warnings: Vec<ParseWarning>,
}

impl ParsedJob {
    fn empty(source_format: SourceFormat) -> Self {
        ParsedJob {
            title: None,
            company: None,
            location: None,
            salary_min: None,
            salary_max: None,
            salary_text: None,
            work_arrangement: None,
            is_remote: None,
            experience_years: None,
            skills: Vec::new(),
            hiring_manager: None,
            posted_at: None,
            cleaned_description: None,
            source_format,
            warnings: Vec::new(),
        }
    }
}

pub fn parse_job_description(text: &str, hints: &ParseHints) -> ParsedJob {
    parse_job_description_at(text, hints, Utc::now())
}

/// Same as [`parse_job_description`], with relative dates ("2 days ago")
/// resolved against `now`.
pub fn parse_job_description_at(text: &str, hints: &ParseHints, now: DateTime<Utc>) -> ParsedJob {
    if text.trim().is_empty() {
        return ParsedJob::empty(SourceFormat::Generic);
    }

    let format = rules::detect_format(text);
    let mut parsed = ParsedJob::empty(format);

    if format == SourceFormat::Linkedin {
        let header = linkedin::parse_header(text, now);
        if header.cleaned_description.is_none() {
            parsed.warnings.push(ParseWarning {
                rule: "linkedin_body",
                message: "no 'About the job' section; parsing the whole paste".to_string(),
            });
        }
        parsed.company = header.company;
        parsed.title = header.title;
        parsed.location = header.location;
        parsed.posted_at = header.posted_at;
        parsed.work_arrangement = header.work_arrangement;
        parsed.hiring_manager = header.hiring_manager;
        parsed.cleaned_description = header.cleaned_description;

        if let Some(range) = salary::parse_linkedin(text, &mut parsed.warnings) {
            parsed.apply_salary(range);
        }
    }

    // The LinkedIn header carries UI noise ("1 day ago", applicant counts), so
    // body rules run on the cleaned description when there is one.
    let body = parsed.cleaned_description.as_deref().unwrap_or(text).to_string();

    if parsed.salary_min.is_none() {
        if let Some(range) = salary::parse(&body, &mut parsed.warnings) {
            parsed.apply_salary(range);
        }
    }

    if parsed.work_arrangement.is_none() {
        let scope = [
            hints.title.as_deref().unwrap_or_default(),
            hints.location.as_deref().unwrap_or_default(),
            body.as_str(),
        ]
        .join("\n");
        parsed.work_arrangement = rules::detect_arrangement(&scope);
    }
    parsed.is_remote = parsed.work_arrangement.map(WorkArrangement::is_remote);

    parsed.experience_years = rules::detect_experience(&body);
    parsed.skills = skills::extract(&body);

    let fallback = generic::extract(text);
    parsed.title = parsed.title.or(fallback.title);
    parsed.company = parsed.company.or(fallback.company);
    parsed.hiring_manager = parsed.hiring_manager.or(fallback.hiring_manager);
    parsed.posted_at = parsed.posted_at.or(fallback.posted_at);

    debug!(
        format = ?parsed.source_format,
        title = ?parsed.title,
        company = ?parsed.company,
        salary = ?parsed.salary_text,
        skills = parsed.skills.len(),
        "Parsed job description"
    );

    parsed
}

impl ParsedJob {
    fn apply_salary(&mut self, range: salary::SalaryRange) {
        self.salary_min = Some(range.min);
        self.salary_max = range.max;
        self.salary_text = Some(range.text);
    }
}
