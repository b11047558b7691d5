// Tracing subscriber setup for binaries embedding the client

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`;
/// `json` switches to one JSON object per line. Logs go to stderr so command
/// output on stdout stays clean.
pub fn init_tracing(default_filter: &str, json: bool) {
    let registry = tracing_subscriber::registry().with(env_filter(default_filter));
    let result = if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(e) = result {
        tracing::debug!("tracing subscriber already installed: {}", e);
    }
}

// `RUST_LOG` when set and parseable, `default_filter` otherwise
fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_used_without_rust_log() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        let filter = env_filter("hotel_booking_client=debug");
        assert!(filter.to_string().contains("hotel_booking_client=debug"));
    }

    #[test]
    fn test_init_twice_is_harmless() {
        init_tracing("warn", false);
        init_tracing("warn", true);
    }
}
