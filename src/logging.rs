use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "WEEKPLAN_LOG";

/// `-v` wins, then `WEEKPLAN_LOG`, then the configured filter.
pub fn resolve_filter(verbose: bool, env_value: Option<&str>, configured: &str) -> String {
    if verbose {
        return "debug".to_string();
    }
    env_value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(configured)
        .to_string()
}

/// Installs the stderr subscriber. A second call is ignored.
pub fn init(verbose: bool, configured: &str) {
    let env_value = std::env::var(LOG_ENV).ok();
    let directives = resolve_filter(verbose, env_value.as_deref(), configured);
    let filter = EnvFilter::try_new(&directives).unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
