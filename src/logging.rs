use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "HELPDESK_AGENT_LOG";
const DEFAULT_FILTER: &str = "info";

/// Installs the global fmt subscriber. Safe to call more than once.
pub fn init() {
    let directive = filter_directive(
        std::env::var(LOG_ENV).ok(),
        std::env::var("RUST_LOG").ok(),
    );
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|err| {
        eprintln!("ignoring invalid log filter '{directive}': {err}");
        EnvFilter::new(DEFAULT_FILTER)
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

fn filter_directive(agent: Option<String>, rust_log: Option<String>) -> String {
    [agent, rust_log]
        .into_iter()
        .flatten()
        .find(|value| !value.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_FILTER.to_string())
}
