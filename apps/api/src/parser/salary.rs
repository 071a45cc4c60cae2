use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::rules::compile;
use super::ParseWarning;

/// Plausible annual salary bounds. Matches outside are reported, not stored.
pub const SALARY_FLOOR: i64 = 30_000;
pub const SALARY_CEILING: i64 = 1_000_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SalaryRange {
    pub min: i64,
    pub max: Option<i64>,
    pub text: String,
}

struct SalaryRule {
    name: &'static str,
    pattern: &'static str,
}

/// Named groups: `min`, `mink`, `max`, `maxk`, `period`.
const PERIOD: &str = r"(?:\s*(?P<period>per\s+year|per\s+annum|/\s*(?:year|yr)|annually|a\s+year|pa\b|per\s+hour|/\s*(?:hour|hr)|an\s+hour|hourly))?";

const LINKEDIN_RULES: &[SalaryRule] = &[
    SalaryRule {
        name: "linkedin_range",
        pattern: r"(?i)\$(?P<min>\d+(?:\.\d+)?)(?P<mink>k)/yr\s*[-–]\s*\$(?P<max>\d+(?:\.\d+)?)(?P<maxk>k)/yr",
    },
    SalaryRule {
        name: "linkedin_single",
        pattern: r"(?i)\$(?P<min>\d+(?:\.\d+)?)(?P<mink>k)/yr",
    },
];

static GENERIC_RULES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        (
            "dollar_range",
            format!(r"(?i)\$\s*(?P<min>[\d,]+(?:\.\d+)?)\s*(?P<mink>k)?\s*(?:-|–|to)\s*\$?\s*(?P<max>[\d,]+(?:\.\d+)?)\s*(?P<maxk>k)?{PERIOD}"),
        ),
        (
            "dollar_per_year",
            r"(?i)\$\s*(?P<min>[\d,]+(?:\.\d+)?)\s*(?P<mink>k)?\s*(?P<period>per\s+year|per\s+annum|/\s*(?:year|yr)|annually|a\s+year)".to_string(),
        ),
        (
            "k_range",
            r"(?i)\b(?P<min>\d{2,3})\s*(?P<mink>k)\s*(?:-|–|to)\s*(?P<max>\d{2,3})\s*(?P<maxk>k)\b".to_string(),
        ),
        (
            "salary_label",
            r"(?i)(?:base\s+)?salary\s*:?\s*\$?\s*(?P<min>[\d,]+)\s*(?P<mink>k)?(?:\s*(?:-|–|to)\s*\$?\s*(?P<max>[\d,]+)\s*(?P<maxk>k)?)?".to_string(),
        ),
        (
            "compensation_label",
            r"(?i)compensation\s*:?\s*\$?\s*(?P<min>[\d,]+)\s*(?P<mink>k)?\s*(?:-|–|to)\s*\$?\s*(?P<max>[\d,]+)\s*(?P<maxk>k)?".to_string(),
        ),
    ]
    .into_iter()
    .map(|(name, pattern)| (name, compile(&pattern)))
    .collect()
});

static LINKEDIN_REGEXES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    LINKEDIN_RULES
        .iter()
        .map(|rule| (rule.name, compile(rule.pattern)))
        .collect()
});

/// LinkedIn's own salary notation, `$150K/yr - $200K/yr`.
pub fn parse_linkedin(text: &str, warnings: &mut Vec<ParseWarning>) -> Option<SalaryRange> {
    first_match(&LINKEDIN_REGEXES, text, warnings)
}

pub fn parse(text: &str, warnings: &mut Vec<ParseWarning>) -> Option<SalaryRange> {
    first_match(&GENERIC_RULES, text, warnings)
}

fn first_match(
    rules: &[(&'static str, Regex)],
    text: &str,
    warnings: &mut Vec<ParseWarning>,
) -> Option<SalaryRange> {
    for (name, regex) in rules {
        for caps in regex.captures_iter(text) {
            match range_from(&caps) {
                Ok(range) => return Some(range),
                Err(message) => warnings.push(ParseWarning {
                    rule: *name,
                    message,
                }),
            }
        }
    }
    None
}

fn range_from(caps: &Captures<'_>) -> Result<SalaryRange, String> {
    let text = caps
        .get(0)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();

    if caps
        .name("period")
        .is_some_and(|p| p.as_str().to_ascii_lowercase().contains('h'))
    {
        return Err(format!("'{text}' is an hourly rate"));
    }

    let min = caps
        .name("min")
        .and_then(|m| amount(m.as_str(), caps.name("mink").is_some()))
        .ok_or_else(|| format!("'{text}' has no readable amount"))?;
    if !plausible(min) {
        return Err(format!("'{text}' is outside the plausible salary range"));
    }

    let max = caps
        .name("max")
        .and_then(|m| amount(m.as_str(), caps.name("maxk").is_some()))
        .filter(|max| plausible(*max) && *max >= min);

    Ok(SalaryRange { min, max, text })
}

/// Reads `150,000`, `150k` or a bare `150` (thousands) as whole dollars.
fn amount(raw: &str, thousands: bool) -> Option<i64> {
    let value: f64 = raw.replace(',', "").parse().ok()?;
    if !value.is_finite() {
        return None;
    }
    let value = if thousands || value < 1000.0 {
        value * 1000.0
    } else {
        value
    };
    // Bounded before the cast so oversized numbers cannot wrap.
    (value <= SALARY_CEILING as f64 * 10.0).then_some(value.round() as i64)
}

fn plausible(value: i64) -> bool {
    (SALARY_FLOOR..=SALARY_CEILING).contains(&value)
}
