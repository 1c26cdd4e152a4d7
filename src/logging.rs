//! Logging setup.
//!
//! Noisy library modules (hyper, reqwest, rustls, ...) are capped at `warn`
//! so long-poll traffic does not drown the business logs. `RUST_LOG`
//! overrides everything.

use tracing_subscriber::EnvFilter;

const NOISY_MODULES: &[&str] = &["hyper", "hyper_util", "reqwest", "h2", "rustls"];

fn build_filter(log_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    let mut directives = String::from(log_level);
    for module in NOISY_MODULES {
        directives.push_str(&format!(",{module}=warn"));
    }
    EnvFilter::new(directives)
}

/// Initialize the global subscriber. Safe to call once per process.
pub fn init(log_level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(build_filter(log_level))
        .try_init();
}
