use std::sync::LazyLock;

use regex::Regex;

use super::rules::compile;

struct SkillRule {
    name: &'static str,
    pattern: &'static str,
    /// Match is discarded when the following word is this (case-insensitive).
    not_before: Option<&'static str>,
}

const fn skill(name: &'static str, pattern: &'static str) -> SkillRule {
    SkillRule {
        name,
        pattern,
        not_before: None,
    }
}

/// Canonical skill names in display order. Short or ambiguous words are
/// matched case-sensitively so prose like "the rest of" is not a skill.
const SKILL_RULES: &[SkillRule] = &[
    // Languages
    skill("C++", r"(?i)\bc\+\+(?:\W|$)"),
    skill("Python", r"(?i)\bpython\b"),
    skill("JavaScript", r"(?i:\bjavascript\b)|\bJS\b"),
    skill("TypeScript", r"(?i:\btypescript\b)|\bTS\b"),
    SkillRule {
        name: "Go",
        pattern: r"(?i:\bgolang\b)|\bGo\b",
        not_before: Some("to"),
    },
    skill("Rust", r"(?i)\brust\b"),
    skill("Java", r"(?i)\bjava\b"),
    skill("C#", r"(?i)\bc#(?:\W|$)|\.net\b"),
    skill("Ruby", r"(?i)\bruby\b"),
    skill("PHP", r"(?i)\bphp\b"),
    skill("Swift", r"\bSwift\b"),
    skill("Kotlin", r"(?i)\bkotlin\b"),
    skill("Scala", r"(?i)\bscala\b"),
    // Infrastructure
    skill("AWS", r"(?i)\baws\b|amazon web services"),
    skill("Azure", r"(?i)\bazure\b"),
    skill("GCP", r"(?i)\bgcp\b|google cloud"),
    skill("Docker", r"(?i)\bdocker\b"),
    skill("Kubernetes", r"(?i)\bkubernetes\b|\bk8s\b"),
    skill("Terraform", r"(?i)\bterraform\b"),
    skill("Linux", r"(?i)\blinux\b"),
    // Databases
    skill("PostgreSQL", r"(?i)\bpostgres(?:ql)?\b"),
    skill("MySQL", r"(?i)\bmysql\b"),
    skill("MongoDB", r"(?i)\bmongo(?:db)?\b"),
    skill("Redis", r"(?i)\bredis\b"),
    skill("Elasticsearch", r"(?i)\belasticsearch\b"),
    // Frameworks
    skill("React", r"(?i)\breact(?:\.?js)?\b"),
    skill("Node.js", r"(?i)\bnode\.?js\b"),
    skill("Django", r"(?i)\bdjango\b"),
    skill("Flask", r"(?i)\bflask\b"),
    skill("Spring", r"\bSpring(?: Boot)?\b"),
    skill("FastAPI", r"(?i)\bfastapi\b"),
    // Security
    skill("Security", r"(?i)\b(?:cyber)?security\b"),
    skill("Cryptography", r"(?i)\bcryptograph(?:y|ic)\b"),
    skill("Penetration Testing", r"(?i)\bpentest(?:ing)?\b|\bpenetration test"),
    skill("SIEM", r"(?i)\bsiem\b"),
    skill("SOC", r"\bSOC\b"),
    // Practices
    skill("Git", r"(?i)\bgit\b"),
    skill("CI/CD", r"(?i)\bci\s*/\s*cd\b"),
    skill("Agile", r"(?i)\bagile\b|\bscrum\b"),
    skill("REST", r"(?i:\brest(?:ful)?\s*apis?\b)|\bREST\b"),
    skill("GraphQL", r"(?i)\bgraphql\b"),
    skill("Microservices", r"(?i)\bmicroservices?\b"),
    skill("Machine Learning", r"(?i:\bmachine learning\b)|\bML\b"),
    skill("AI", r"(?i:\bartificial intelligence\b)|\bAI\b"),
];

static SKILL_REGEXES: LazyLock<Vec<(&'static SkillRule, Regex)>> = LazyLock::new(|| {
    SKILL_RULES
        .iter()
        .map(|rule| (rule, compile(rule.pattern)))
        .collect()
});

/// Canonical names of every listed skill mentioned in `text`.
pub fn extract(text: &str) -> Vec<String> {
    SKILL_REGEXES
        .iter()
        .filter(|(rule, regex)| {
            regex
                .find_iter(text)
                .any(|m| !followed_by(&text[m.end()..], rule.not_before))
        })
        .map(|(rule, _)| rule.name.to_string())
        .collect()
}

fn followed_by(rest: &str, word: Option<&str>) -> bool {
    let Some(word) = word else {
        return false;
    };
    rest.split_whitespace()
        .next()
        .is_some_and(|next| next.eq_ignore_ascii_case(word))
}
