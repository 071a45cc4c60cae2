use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::warn;

const DEV_SECRET_KEY: &str = "dev-secret-key-change-in-production";
const DEFAULT_BOARDS_API_BASE: &str = "https://boards-api.greenhouse.io/v1/boards";

/// Boards searched when the caller does not name any.
const DEFAULT_BOARDS: &[&str] = &[
    "sentinellabs",
    "paloaltonetworks",
    "zscaler",
    "cloudflare",
    "crowdstrike",
    "tanium",
    "rapid7",
    "snyk",
    "unity3d",
    "roblox",
    "rivian",
];

/// Application configuration loaded from environment variables.
/// Everything has a local-friendly default; CLI flags override host, port and data dir.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub data_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub secret_key: String,
    pub boards_api_base: String,
    pub default_boards: Vec<String>,
    /// Partner credential for programmatic submission. Search works without it.
    pub board_partner_key: Option<String>,
    pub pdf_converter: String,
    pub claude_cli: String,
    pub ai_timeout: Duration,
    pub pdf_timeout: Duration,
    pub board_timeout: Duration,
    pub board_pace: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let secret_key = std::env::var("SECRET_KEY").unwrap_or_else(|_| {
            warn!("SECRET_KEY is not set; stored AI credentials use the development key");
            DEV_SECRET_KEY.to_string()
        });

        let default_boards = match std::env::var("DEFAULT_BOARDS") {
            Ok(list) => split_board_list(&list),
            Err(_) => DEFAULT_BOARDS.iter().map(|b| b.to_string()).collect(),
        };

        let data_dir = PathBuf::from(env_or("DATA_DIR", "data"));

        Ok(Config {
            database_url: env_or("DATABASE_URL", &database_url_for(&data_dir)),
            data_dir,
            host: env_or("HOST", "127.0.0.1"),
            port: env_or("PORT", "5000")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            secret_key,
            boards_api_base: env_or("BOARDS_API_BASE", DEFAULT_BOARDS_API_BASE),
            default_boards,
            board_partner_key: std::env::var("BOARD_PARTNER_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            pdf_converter: env_or("PDF_CONVERTER", "md-to-pdf"),
            claude_cli: env_or("CLAUDE_CLI", "claude"),
            ai_timeout: env_secs("AI_TIMEOUT_SECS", 300)?,
            pdf_timeout: env_secs("PDF_TIMEOUT_SECS", 120)?,
            board_timeout: env_secs("BOARD_TIMEOUT_SECS", 15)?,
            board_pace: Duration::from_millis(
                env_or("BOARD_PACE_MS", "300")
                    .parse::<u64>()
                    .context("BOARD_PACE_MS must be a whole number of milliseconds")?,
            ),
        })
    }

    /// Moves the data directory. The database follows unless DATABASE_URL is set.
    pub fn with_data_dir(mut self, data_dir: PathBuf) -> Self {
        if std::env::var("DATABASE_URL").is_err() {
            self.database_url = database_url_for(&data_dir);
        }
        self.data_dir = data_dir;
        self
    }

    /// Root of the per-application document directories.
    pub fn applications_dir(&self) -> PathBuf {
        self.data_dir.join("applications")
    }
}

fn database_url_for(data_dir: &Path) -> String {
    format!("sqlite://{}", data_dir.join("jobdesk.db").display())
}

/// Splits a comma-separated board list, dropping blanks.
pub fn split_board_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_secs(key: &str, default: u64) -> Result<Duration> {
    let secs = match std::env::var(key) {
        Ok(raw) => raw
            .parse::<u64>()
            .with_context(|| format!("{key} must be a whole number of seconds"))?,
        Err(_) => default,
    };
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
impl Config {
    /// Configuration for unit tests: temp data dir, no pacing, short timeouts.
    pub fn for_tests(data_dir: PathBuf) -> Self {
        Config {
            database_url: "sqlite::memory:".to_string(),
            data_dir,
            host: "127.0.0.1".to_string(),
            port: 0,
            secret_key: "test-secret".to_string(),
            boards_api_base: "http://127.0.0.1:9/v1/boards".to_string(),
            default_boards: vec!["acme".to_string()],
            board_partner_key: None,
            pdf_converter: "md-to-pdf".to_string(),
            claude_cli: "claude".to_string(),
            ai_timeout: Duration::from_secs(5),
            pdf_timeout: Duration::from_secs(5),
            board_timeout: Duration::from_secs(5),
            board_pace: Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_board_list_drops_blanks() {
        assert_eq!(
            split_board_list(" stripe, ,figma,,  "),
            vec!["stripe".to_string(), "figma".to_string()]
        );
    }

    #[test]
    fn test_applications_dir_is_under_data_dir() {
        let config = Config::for_tests(PathBuf::from("/tmp/jobdesk"));
        assert_eq!(
            config.applications_dir(),
            PathBuf::from("/tmp/jobdesk/applications")
        );
    }

    #[test]
    fn test_database_lives_in_data_dir() {
        assert_eq!(
            database_url_for(Path::new("/srv/jobs")),
            "sqlite:///srv/jobs/jobdesk.db"
        );
    }
}
