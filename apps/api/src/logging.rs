use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Crates that stay at `warn` unless the user asks for everything (`-ddddd`).
const NOISY_CRATES: &[&str] = &["sqlx", "hyper", "reqwest", "tower_http", "h2", "rustls"];

/// Maps the number of `-d` flags to a level for our own crate.
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "warn",
        2 => "info",
        3 => "debug",
        _ => "trace",
    }
}

/// Builds the `EnvFilter` directive string for a verbosity count.
pub fn filter_directive(verbosity: u8) -> String {
    let level = level_for(verbosity);
    if verbosity >= 5 {
        return level.to_string();
    }

    let mut directive = format!("{}={}", env!("CARGO_PKG_NAME"), level);
    for krate in NOISY_CRATES {
        directive.push_str(&format!(",{krate}=warn"));
    }
    directive
}

/// Initialises structured logging. `RUST_LOG` wins over the `-d` count when set.
pub fn init(verbosity: u8) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(filter_directive(verbosity))),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_flags_logs_errors_only() {
        assert_eq!(level_for(0), "error");
        assert!(filter_directive(0).starts_with("jobdesk=error"));
    }

    #[test]
    fn test_each_flag_raises_the_level() {
        assert_eq!(level_for(1), "warn");
        assert_eq!(level_for(2), "info");
        assert_eq!(level_for(3), "debug");
        assert_eq!(level_for(4), "trace");
        assert_eq!(level_for(9), "trace");
    }

    #[test]
    fn test_third_party_crates_capped_below_max_verbosity() {
        let directive = filter_directive(3);
        assert!(directive.contains("sqlx=warn"));
        assert!(directive.contains("reqwest=warn"));
    }

    #[test]
    fn test_max_verbosity_enables_everything() {
        assert_eq!(filter_directive(5), "trace");
    }
}
