//! Rule tables shared by both posting formats.
//!
//! Each table is ordered; the first matching rule wins unless noted.

use std::sync::LazyLock;

use regex::Regex;

use super::{SourceFormat, WorkArrangement};

pub(crate) fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("invalid built-in pattern {pattern:?}: {e}"))
}

pub struct FormatRule {
    pub format: SourceFormat,
    pub indicators: &'static [&'static str],
    pub min_hits: usize,
}

/// Checked in order; text matching none of them is treated as generic.
pub const FORMAT_RULES: &[FormatRule] = &[FormatRule {
    format: SourceFormat::Linkedin,
    indicators: &[
        "About the job",
        "Easy Apply",
        "Save\nSave",
        "applicants",
        "Show more options",
        "Matches your job preferences",
        "Meet the hiring team",
    ],
    min_hits: 2,
}];

pub fn detect_format(text: &str) -> SourceFormat {
    FORMAT_RULES
        .iter()
        .find(|rule| {
            rule.indicators
                .iter()
                .filter(|indicator| text.contains(*indicator))
                .count()
                >= rule.min_hits
        })
        .map(|rule| rule.format)
        .unwrap_or(SourceFormat::Generic)
}

pub struct ArrangementRule {
    pub arrangement: WorkArrangement,
    pub patterns: &'static [&'static str],
}

/// Priority order: an explicit hybrid mention beats on-site wording ("2 days
/// in office"), and on-site wording beats a bare "remote" ("no remote").
pub const ARRANGEMENT_RULES: &[ArrangementRule] = &[
    ArrangementRule {
        arrangement: WorkArrangement::Hybrid,
        patterns: &[r"(?i)\bhybrid\b", r"(?i)\bflexible location\b"],
    },
    ArrangementRule {
        arrangement: WorkArrangement::OnSite,
        patterns: &[
            r"(?i)\bon[- ]?site\b",
            r"(?i)\bin[- ]?office\b",
            r"(?i)\bin[- ]person\b",
            r"(?i)\bno remote\b",
        ],
    },
    ArrangementRule {
        arrangement: WorkArrangement::Remote,
        patterns: &[
            r"(?i)\bremote\b",
            r"(?i)\bwork from home\b",
            r"(?i)\bwfh\b",
            r"(?i)\bwork from anywhere\b",
        ],
    },
];

static ARRANGEMENT_REGEXES: LazyLock<Vec<(WorkArrangement, Vec<Regex>)>> = LazyLock::new(|| {
    ARRANGEMENT_RULES
        .iter()
        .map(|rule| {
            (
                rule.arrangement,
                rule.patterns.iter().map(|p| compile(p)).collect(),
            )
        })
        .collect()
});

pub fn detect_arrangement(text: &str) -> Option<WorkArrangement> {
    ARRANGEMENT_REGEXES
        .iter()
        .find(|(_, regexes)| regexes.iter().any(|re| re.is_match(text)))
        .map(|(arrangement, _)| *arrangement)
}

/// Experience requirement patterns. A second capture group means a range.
const EXPERIENCE_PATTERNS: &[&str] = &[
    r"(?i)(\d{1,2})\s*(?:-|–|to)\s*(\d{1,2})\s*(?:years?|yrs?)(?:\s+of)?\s+(?:\w+\s+)?(?:experience|exp)\b",
    r"(?i)(\d{1,2})\+?\s*(?:years?|yrs?)(?:\s+of)?\s+(?:\w+\s+)?(?:experience|exp)\b",
    r"(?i)(?:minimum|at least|min\.?)\s*(?:of\s+)?(\d{1,2})\s*(?:years?|yrs?)",
    r"(?i)experience\s*:\s*(\d{1,2})\+?\s*(?:years?|yrs?)",
];

static EXPERIENCE_REGEXES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| EXPERIENCE_PATTERNS.iter().map(|p| compile(p)).collect());

/// Returns `"5+"` for a floor or `"3-5"` for a range.
pub fn detect_experience(text: &str) -> Option<String> {
    EXPERIENCE_REGEXES.iter().find_map(|re| {
        let caps = re.captures(text)?;
        let low = caps.get(1)?.as_str();
        Some(match caps.get(2) {
            Some(high) => format!("{low}-{}", high.as_str()),
            None => format!("{low}+"),
        })
    })
}
