//! Applicant contact details read from a resume's header block, used to
//! prefill submission fields.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::parser::rules::compile;

/// Lines scanned from the top of the resume.
const HEADER_LINES: usize = 50;

static STYLE_BLOCK: LazyLock<Regex> = LazyLock::new(|| compile(r"(?is)<style[^>]*>.*?</style>"));
static HTML_TAG: LazyLock<Regex> = LazyLock::new(|| compile(r"<[^>]+>"));
static EMAIL: LazyLock<Regex> = LazyLock::new(|| compile(r"([\w.-]+)@[\w.-]+\.\w+"));
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| compile(r"\(?\d{3}\)?[-.\s]?\d{3}[-.\s]?\d{4}"));

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApplicantInfo {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub fn extract_applicant_info(resume: &str) -> ApplicantInfo {
    let content = STYLE_BLOCK.replace_all(resume, "");
    let lines: Vec<&str> = content
        .trim()
        .lines()
        .take(HEADER_LINES)
        .map(str::trim)
        .collect();

    let mut info = ApplicantInfo::default();

    // `# First Last`, possibly wrapped in HTML.
    let header = lines.iter().find(|line| {
        !line.is_empty()
            && !(line.starts_with('<') && !line.contains('#'))
            && line.starts_with('#')
            && !line.starts_with("##")
    });
    if let Some(header) = header {
        let name = HTML_TAG.replace_all(header.trim_start_matches('#'), "");
        (info.first_name, info.last_name) = split_name(name.split_whitespace());
    }

    // Otherwise guess from an address like jane.doe@...
    if info.first_name.is_none() {
        if let Some(caps) = lines.iter().find_map(|line| EMAIL.captures(line)) {
            let parts = caps[1]
                .split(['.', '_'])
                .filter(|p| !p.is_empty())
                .take(2)
                .map(capitalize)
                .collect::<Vec<_>>();
            (info.first_name, info.last_name) = split_name(parts.iter().map(String::as_str));
        }
    }

    for line in lines.iter().filter(|l| !l.starts_with('#')) {
        if let Some(m) = EMAIL.find(line) {
            info.email = Some(m.as_str().to_string());
        }
        if let Some(m) = PHONE.find(line) {
            info.phone = Some(m.as_str().to_string());
        }
        if info.email.is_some() && info.phone.is_some() {
            break;
        }
    }

    info
}

fn split_name<'a>(mut words: impl Iterator<Item = &'a str>) -> (Option<String>, Option<String>) {
    let first = words.next().map(str::to_string);
    let rest = words.collect::<Vec<_>>().join(" ");
    (first, (!rest.is_empty()).then_some(rest))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
