//! Tracing/logging initialization.

use tracing_subscriber::EnvFilter;

/// Output format for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable lines for local development.
    Pretty,
    /// One JSON object per line for log shippers.
    Json,
}

/// Builds the filter: `RUST_LOG` wins, then `default_directive`, then `info`.
pub fn build_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops).
pub fn init_tracing(default_directive: &str, format: LogFormat) {
    let filter = build_filter(default_directive);

    let _ = match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(false)
            .try_init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_twice_is_harmless() {
        init_tracing("info", LogFormat::Pretty);
        init_tracing("debug", LogFormat::Json);
    }

    #[test]
    fn invalid_directive_falls_back() {
        // Does not panic on garbage input.
        let _ = build_filter("=[not a directive");
    }
}
