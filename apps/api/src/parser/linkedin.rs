//! LinkedIn job page header: the block of UI text above "About the job".

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Utc};
use regex::{Regex, RegexSet};

use super::generic::plausible_name;
use super::rules::compile;
use super::WorkArrangement;

#[derive(Debug, Default)]
pub struct LinkedinHeader {
    pub company: Option<String>,
    pub title: Option<String>,
    pub location: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub work_arrangement: Option<WorkArrangement>,
    pub hiring_manager: Option<String>,
    pub cleaned_description: Option<String>,
}

/// Lowercased header lines that are page chrome, never company or title.
const UI_LINE_PATTERNS: &[&str] = &[
    r"^share$",
    r"^show more options$",
    r"^easy apply$",
    r"^apply$",
    r"^save$",
    r"^promoted",
    r"^message$",
    r"^follow$",
    r"^\d",
    r"^meet the",
    r"^you'd be",
    r"^your profile",
    r"^show match",
    r"^tailor",
    r"^help me",
    r"^create cover",
    r"^beta$",
    r"^is this information",
    r"^people you can",
    r"^company alumni",
    r"^show all$",
    r"hiring team",
    r"^job poster$",
    r"^hiring manager",
    r"^matches your job preferences",
    r"^·",
];

/// Words that mark a line as a role rather than a company.
const ROLE_WORDS: &[&str] = &[
    "developer",
    "engineer",
    "manager",
    "architect",
    "lead",
    "director",
    "analyst",
    "scientist",
    "designer",
    "specialist",
    "consultant",
    "administrator",
    "coordinator",
    "associate",
    "senior",
    "junior",
    "staff",
    "principal",
    "head of",
    "vp ",
    "vice president",
];

/// Words that disqualify a line from being the company name.
const NOT_COMPANY_WORDS: &[&str] = &[
    "developer",
    "engineer",
    "manager",
    "analyst",
    "remote",
    "full-time",
    "part-time",
    "contract",
];

static UI_LINES: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new(UI_LINE_PATTERNS)
        .unwrap_or_else(|e| panic!("invalid built-in LinkedIn pattern: {e}"))
});
static ABOUT_SPLIT: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)(?:^|\n)\s*About the job\s*\n"));
static AGE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"(?i)(\d+)\s*(minute|hour|day|week|month)s?\s*ago"));
static TRAILING_LOCATION: LazyLock<Regex> =
    LazyLock::new(|| compile(r"·\s*([A-Z][A-Za-z\s,()-]+)$"));
static TITLE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| compile(r"(?i)\s+at\s+.*$|\s*·.*$"));

pub fn parse_header(text: &str, now: DateTime<Utc>) -> LinkedinHeader {
    let mut header = LinkedinHeader::default();

    let (head, body) = match ABOUT_SPLIT.find(text) {
        Some(m) => (&text[..m.start()], Some(&text[m.end()..])),
        None => (text, None),
    };
    header.cleaned_description = body
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string);

    let lines: Vec<&str> = head.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    header.company = lines
        .iter()
        .find(|line| {
            let lower = line.to_lowercase();
            !is_ui_line(&lower)
                && line.chars().count() > 1
                && line.chars().count() < 60
                && !NOT_COMPANY_WORDS.iter().any(|w| lower.contains(w))
        })
        .map(|line| line.to_string());

    header.title = lines
        .iter()
        .filter(|line| header.company.as_deref() != Some(**line))
        .filter(|line| !is_ui_line(&line.to_lowercase()))
        .find_map(|line| {
            let lower = line.to_lowercase();
            if !ROLE_WORDS.iter().any(|w| lower.contains(w)) {
                return None;
            }
            let title = TITLE_SUFFIX.replace(line, "").trim().to_string();
            (title.len() > 3 && title.len() < 80).then_some(title)
        });

    let (location, posted_at) = location_and_age(&lines, now);
    header.location = location;
    header.posted_at = posted_at;

    header.work_arrangement = arrangement(&lines, header.location.as_deref());
    header.hiring_manager = hiring_manager(&lines);

    header
}

fn is_ui_line(lower: &str) -> bool {
    UI_LINES.is_match(lower)
}

/// `United States · 3 weeks ago · Over 100 applicants`, or `Company · Location`.
fn location_and_age(lines: &[&str], now: DateTime<Utc>) -> (Option<String>, Option<DateTime<Utc>>) {
    for line in lines.iter().filter(|l| l.contains('·')) {
        let lower = line.to_lowercase();

        if lower.contains("ago") || lower.contains("applicant") {
            let location = line
                .split('·')
                .next()
                .map(str::trim)
                .filter(|loc| {
                    let len = loc.chars().count();
                    len > 2
                        && len < 60
                        && !loc.starts_with(|c: char| c.is_ascii_digit())
                        && !is_ui_line(&loc.to_lowercase())
                })
                .map(str::to_string);
            let posted_at = line
                .split('·')
                .find_map(|part| relative_age(part).map(|age| now - age));
            return (location, posted_at);
        }

        if let Some(caps) = TRAILING_LOCATION.captures(line) {
            let loc = caps[1].trim();
            if loc.len() > 2 && loc.len() < 50 {
                return (Some(loc.to_string()), None);
            }
        }
    }
    (None, None)
}

fn relative_age(part: &str) -> Option<Duration> {
    let caps = AGE.captures(part)?;
    let n: i64 = caps[1].parse().ok()?;
    // Anything beyond a few years is a misread number, not a posting age.
    if n > 1000 {
        return None;
    }
    Some(match caps[2].to_lowercase().as_str() {
        "minute" => Duration::minutes(n),
        "hour" => Duration::hours(n),
        "day" => Duration::days(n),
        "week" => Duration::weeks(n),
        _ => Duration::days(n * 30),
    })
}

fn arrangement(lines: &[&str], location: Option<&str>) -> Option<WorkArrangement> {
    let from_lines = lines.iter().find_map(|line| {
        let lower = line.to_lowercase();
        if lower == "remote" || (lower.contains("remote") && lower.contains("workplace type")) {
            Some(WorkArrangement::Remote)
        } else if lower == "on-site" || lower == "onsite" {
            Some(WorkArrangement::OnSite)
        } else if lower == "hybrid" {
            Some(WorkArrangement::Hybrid)
        } else {
            None
        }
    });

    from_lines.or_else(|| {
        location
            .filter(|loc| loc.to_lowercase().contains("remote"))
            .map(|_| WorkArrangement::Remote)
    })
}

/// `Hiring Manager: Name`, or LinkedIn's card layout where the name sits on
/// the line above a "Hiring Manager" / "Job poster" caption.
fn hiring_manager(lines: &[&str]) -> Option<String> {
    if let Some(name) = lines.iter().find_map(|line| super::generic::labelled_hiring_manager(line)) {
        return Some(name);
    }

    lines.iter().enumerate().find_map(|(i, line)| {
        let lower = line.to_lowercase();
        let is_caption = (lower.starts_with("hiring manager") || lower.starts_with("job poster"))
            && !lower.contains(':');
        if !is_caption {
            return None;
        }
        // Skip connection-degree badges between the name and the caption.
        lines[..i]
            .iter()
            .rev()
            .take(3)
            .find(|prev| !prev.starts_with('·') && !is_degree_badge(prev))
            .filter(|prev| plausible_name(prev))
            .map(|prev| prev.to_string())
    })
}

fn is_degree_badge(line: &str) -> bool {
    matches!(
        line.trim_start_matches('·').trim(),
        "1st" | "2nd" | "3rd" | "3rd+"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_caption_layout_hiring_manager() {
        let text = "Globex\nShare\nPlatform Engineer\nBerlin, Germany · 1 week ago · 40 applicants\nMeet the hiring team\nMaria Lopez\n· 2nd\nHiring Manager\nAbout the job\nWe build.";
        let header = parse_header(text, now());
        assert_eq!(header.hiring_manager.as_deref(), Some("Maria Lopez"));
        assert_eq!(header.location.as_deref(), Some("Berlin, Germany"));
        assert_eq!(header.posted_at, Some(now() - Duration::weeks(1)));
    }

    #[test]
    fn test_job_poster_caption() {
        let text = "Initech\nData Analyst\nAustin, TX · 3 days ago\nSam Lee\nJob poster\nAbout the job\nReports.";
        let header = parse_header(text, now());
        assert_eq!(header.hiring_manager.as_deref(), Some("Sam Lee"));
    }

    #[test]
    fn test_company_location_line() {
        let text = "Luxoft\nSenior Java Developer\nLuxoft · United States (Remote)\nEasy Apply\nAbout the job\nBody";
        let header = parse_header(text, now());
        assert_eq!(header.company.as_deref(), Some("Luxoft"));
        assert_eq!(header.title.as_deref(), Some("Senior Java Developer"));
        assert_eq!(header.location.as_deref(), Some("United States (Remote)"));
        assert_eq!(header.work_arrangement, Some(WorkArrangement::Remote));
        assert_eq!(header.posted_at, None);
    }

    #[test]
    fn test_hybrid_line_and_no_manager() {
        let text = "Umbrella\nStaff Engineer\nParis · 5 hours ago\nHybrid\nAbout the job\nBody";
        let header = parse_header(text, now());
        assert_eq!(header.work_arrangement, Some(WorkArrangement::Hybrid));
        assert_eq!(header.hiring_manager, None);
        assert_eq!(header.posted_at, Some(now() - Duration::hours(5)));
        assert_eq!(header.cleaned_description.as_deref(), Some("Body"));
    }
}
