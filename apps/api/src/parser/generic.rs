//! Labelled-line and phrase rules for postings without a known page layout.
//! Also used to fill gaps left by the LinkedIn header rules.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;

use super::rules::compile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Company,
}

struct FieldRule {
    field: Field,
    /// Lower runs first.
    priority: u8,
    pattern: &'static str,
    /// Apply to the first non-empty line only.
    first_line_only: bool,
}

const FIELD_RULES: &[FieldRule] = &[
    FieldRule {
        field: Field::Title,
        priority: 0,
        pattern: r"(?im)^\s*(?:job\s+title|position|role|title)\s*:\s*([^\n]{3,80}?)\s*$",
        first_line_only: false,
    },
    FieldRule {
        field: Field::Title,
        priority: 1,
        pattern: r"(?i:\bwe(?:'re| are) (?:hiring|looking for|seeking))(?: an?)?\s+([A-Z][^\n.,!]{4,60})",
        first_line_only: false,
    },
    FieldRule {
        field: Field::Title,
        priority: 2,
        pattern: r"(?i:\bjoin)\s+[^\n]{1,60}?\s+(?i:as)(?: an?)?\s+([A-Z][^\n.,!]{4,60})",
        first_line_only: false,
    },
    FieldRule {
        field: Field::Title,
        priority: 3,
        pattern: r"^([A-Z][A-Za-z /-]*?(?:Engineer|Developer|Manager|Architect|Lead|Director|Analyst|Scientist|Designer|Specialist|Consultant|Administrator))\b",
        first_line_only: true,
    },
    FieldRule {
        field: Field::Company,
        priority: 0,
        pattern: r"(?im)^\s*(?:company(?:\s+name)?|employer|organization)\s*:\s*([^\n]{2,60}?)\s*$",
        first_line_only: false,
    },
    FieldRule {
        field: Field::Company,
        priority: 1,
        pattern: r"(?m)^([A-Z][A-Za-z0-9&.' ]{1,50}?)\s+(?:is hiring|is looking|is seeking|seeks)\b",
        first_line_only: false,
    },
    FieldRule {
        field: Field::Company,
        priority: 2,
        pattern: r"(?m)(?i:\bjoin)\s+(?:the\s+)?([A-Z][A-Za-z0-9&.' ]{1,50}?)(?:\s+team\b|\s+(?i:as)\b|[!.,]|$)",
        first_line_only: false,
    },
    FieldRule {
        field: Field::Company,
        priority: 3,
        pattern: r"(?m)(?:Engineer|Developer|Manager|Architect|Lead)\s+at\s+([A-Z][A-Za-z0-9&.' ]{1,50}?)(?:[.,]|\s*$)",
        first_line_only: false,
    },
    FieldRule {
        field: Field::Company,
        priority: 4,
        pattern: r"(?m)^(?i:about)\s+([A-Z][A-Za-z0-9&.' ]{1,50}?)(?:\s*$|\s+(?:is|was)\b)",
        first_line_only: false,
    },
];

/// Captures that name a team or the reader rather than a company.
const NOT_A_COMPANY: &[&str] = &[
    "us", "you", "the team", "our team", "a team", "this role", "the role", "engineer",
    "developer", "manager", "we are", "you will",
];

static FIELD_REGEXES: LazyLock<Vec<(Field, &'static FieldRule, Regex)>> = LazyLock::new(|| {
    let mut rules: Vec<&FieldRule> = FIELD_RULES.iter().collect();
    rules.sort_by_key(|rule| rule.priority);
    rules
        .into_iter()
        .map(|rule| (rule.field, rule, compile(rule.pattern)))
        .collect()
});

static HIRING_MANAGER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)^\s*hiring\s+manager\s*:\s*(.{2,60}?)\s*$"));
static POSTED_ON: LazyLock<Regex> = LazyLock::new(|| {
    compile(r"(?im)^\s*(?:posted(?:\s+on)?|date\s+posted)\s*:\s*(\d{4}-\d{2}-\d{2})\b")
});
static PERSON_NAME: LazyLock<Regex> =
    LazyLock::new(|| compile(r"^[A-Z][A-Za-z.'-]*(?:\s+[A-Z][A-Za-z.'-]*){1,3}$"));
static TITLE_TRAILER: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)\s*[-–]\s*$|\s+(?:at|in|to|for)\s+.*$"));

#[derive(Debug, Default, PartialEq)]
pub struct GenericFields {
    pub title: Option<String>,
    pub company: Option<String>,
    pub hiring_manager: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
}

pub fn extract(text: &str) -> GenericFields {
    GenericFields {
        title: first_field(text, Field::Title),
        company: first_field(text, Field::Company),
        hiring_manager: text.lines().find_map(labelled_hiring_manager),
        posted_at: posted_on(text),
    }
}

fn first_field(text: &str, field: Field) -> Option<String> {
    let first_line = text.lines().map(str::trim).find(|l| !l.is_empty())?;

    FIELD_REGEXES
        .iter()
        .filter(|(f, _, _)| *f == field)
        .find_map(|(_, rule, regex)| {
            let haystack = if rule.first_line_only { first_line } else { text };
            regex
                .captures_iter(haystack)
                .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
                .find_map(|raw| clean(field, raw))
        })
}

fn clean(field: Field, raw: &str) -> Option<String> {
    match field {
        Field::Title => {
            let title = TITLE_TRAILER.replace(raw.trim(), "").trim().to_string();
            (title.len() > 3 && title.len() < 80).then_some(title)
        }
        Field::Company => {
            let company = raw.trim().trim_end_matches(['.', ',']).trim().to_string();
            let lower = company.to_lowercase();
            let rejected = NOT_A_COMPANY
                .iter()
                .any(|w| lower == *w || lower.starts_with(&format!("{w} ")));
            (!rejected && company.len() > 1 && company.len() < 60).then_some(company)
        }
    }
}

/// Name from a `Hiring Manager: Name` line.
pub fn labelled_hiring_manager(line: &str) -> Option<String> {
    let caps = HIRING_MANAGER.captures(line)?;
    let name = caps.get(1)?.as_str().trim();
    plausible_name(name).then(|| name.to_string())
}

/// Two to four capitalised words, e.g. "Jane Doe" or "Mary-Kate O'Neil".
pub fn plausible_name(candidate: &str) -> bool {
    candidate.len() < 50 && PERSON_NAME.is_match(candidate.trim())
}

fn posted_on(text: &str) -> Option<DateTime<Utc>> {
    let caps = POSTED_ON.captures(text)?;
    let date = NaiveDate::parse_from_str(&caps[1], "%Y-%m-%d").ok()?;
    Some(date.and_hms_opt(0, 0, 0)?.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hiring_phrase_title() {
        let fields = extract("We are hiring a Senior Data Engineer to own our lakehouse.");
        assert_eq!(fields.title.as_deref(), Some("Senior Data Engineer"));
    }

    #[test]
    fn test_join_as_title_and_company() {
        let fields = extract("Join Initech as a Principal Designer, and shape our product.");
        assert_eq!(fields.title.as_deref(), Some("Principal Designer"));
        assert_eq!(fields.company.as_deref(), Some("Initech"));
    }

    #[test]
    fn test_company_is_hiring() {
        let fields = extract("Hooli is hiring across the platform org.");
        assert_eq!(fields.company.as_deref(), Some("Hooli"));
    }

    #[test]
    fn test_first_line_role() {
        let fields = extract("Backend Developer - Payments\nWe move money.");
        assert_eq!(fields.title.as_deref(), Some("Backend Developer"));
    }

    #[test]
    fn test_about_us_is_not_a_company() {
        let fields = extract("About Us\nWe make tools.");
        assert_eq!(fields.company, None);
    }

    #[test]
    fn test_hiring_manager_requires_a_name() {
        assert_eq!(
            labelled_hiring_manager("Hiring Manager: Jane Doe"),
            Some("Jane Doe".to_string())
        );
        assert_eq!(labelled_hiring_manager("Hiring Manager: TBD"), None);
        assert_eq!(labelled_hiring_manager("Hiring Manager:"), None);
    }

    #[test]
    fn test_nothing_labelled() {
        assert_eq!(extract("just some words here"), GenericFields::default());
    }
}
