use std::time::Duration;

pub const DEFAULT_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_CONCURRENCY: usize = 8;

// Some hosts reject requests without a browser-like agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Settings for the link reachability pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCheckConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Maximum number of requests in flight.
    pub concurrency: usize,
    /// Overall deadline for the whole pass, measured from its start.
    pub deadline: Option<Duration>,
    /// How long transient failures may be retried. Zero means a single attempt.
    pub retry_window: Duration,
    pub user_agent: String,
}

impl Default for LinkCheckConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            concurrency: DEFAULT_CONCURRENCY,
            deadline: None,
            retry_window: Duration::ZERO,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl LinkCheckConfig {
    /// Build a configuration from `LINK_TIMEOUT_SECS`, `LINK_CONCURRENCY`,
    /// `LINK_DEADLINE_SECS` and `LINK_RETRY_SECS`. Unset or unparsable
    /// variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(secs) = env_u64("LINK_TIMEOUT_SECS") {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(n) = env_u64("LINK_CONCURRENCY") {
            config = config.with_concurrency(n as usize);
        }
        if let Some(secs) = env_u64("LINK_DEADLINE_SECS") {
            config.deadline = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = env_u64("LINK_RETRY_SECS") {
            config.retry_window = Duration::from_secs(secs);
        }

        config
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// A concurrency of zero is clamped to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn with_retry_window(mut self, retry_window: Duration) -> Self {
        self.retry_window = retry_window;
        self
    }
}

fn env_u64(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("Ignoring {}={:?}: not a non-negative integer", name, raw);
            None
        }
    }
}
