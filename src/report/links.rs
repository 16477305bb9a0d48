use backoff::{future::retry, ExponentialBackoff};
use futures::stream::{self, StreamExt};
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};
use serde::{Serialize, Serializer};
use std::collections::BTreeSet;
use std::error::Error as _;
use std::fmt;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

use crate::config::LinkCheckConfig;
use crate::error::CiteAuditError;
use crate::report::URL_REGEX;

/// Why a link was judged unreachable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkFailure {
    /// The server answered with a status of 400 or above.
    Status(u16),
    /// No usable response: DNS, connection, TLS or timeout failure.
    Transport(String),
    /// The overall deadline passed before the link was checked.
    DeadlineExceeded,
}

impl fmt::Display for LinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkFailure::Status(code) => write!(f, "{}", code),
            LinkFailure::Transport(reason) => write!(f, "{}", reason),
            LinkFailure::DeadlineExceeded => write!(f, "link check deadline exceeded"),
        }
    }
}

impl Serialize for LinkFailure {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Outcome of a reachability pass over every distinct URL of a text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkReport {
    pub valid_count: usize,
    /// Unreachable URLs, sorted by URL.
    pub broken: Vec<(String, LinkFailure)>,
}

impl LinkReport {
    /// Number of distinct URLs that were checked.
    pub fn total(&self) -> usize {
        self.valid_count + self.broken.len()
    }

    pub fn is_clean(&self) -> bool {
        self.broken.is_empty()
    }
}

impl fmt::Display for LinkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "✅ {} Sources verified.", self.valid_count)?;
        if !self.broken.is_empty() {
            writeln!(f, "❌ {} Broken links detected:", self.broken.len())?;
            for (url, reason) in &self.broken {
                writeln!(f, "  - {} ({})", url, reason)?;
            }
        }
        Ok(())
    }
}

/// Every distinct http(s) URL in `text`.
pub fn extract_urls(text: &str) -> BTreeSet<String> {
    URL_REGEX
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Checks reachability of the URLs found in a text.
///
/// One validator owns one connection pool; all checks of a pass share it.
#[derive(Debug, Clone)]
pub struct LinkValidator {
    config: LinkCheckConfig,
    client: Client,
}

impl LinkValidator {
    /// Build the HTTP client for `config`. Fails on an unusable user agent
    /// or when no TLS backend can be initialised.
    pub fn new(config: LinkCheckConfig) -> Result<Self, CiteAuditError> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.timeout)
            .build()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &LinkCheckConfig {
        &self.config
    }

    /// Check every distinct URL in `text`.
    ///
    /// Never fails: each URL gets exactly one verdict, so `valid_count +
    /// broken.len()` always equals the number of distinct URLs. Requests run
    /// concurrently, at most `concurrency` at a time. Once the optional
    /// deadline passes, URLs still pending are reported as
    /// [`LinkFailure::DeadlineExceeded`].
    pub async fn validate(&self, text: &str) -> LinkReport {
        let urls = extract_urls(text);
        info!("Validating {} distinct links", urls.len());

        let deadline = self.config.deadline.map(|d| Instant::now() + d);

        let verdicts: Vec<(String, Result<(), LinkFailure>)> = stream::iter(urls)
            .map(|url| async move {
                let verdict = self.check_url(&url, deadline).await;
                (url, verdict)
            })
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let mut report = LinkReport::default();
        for (url, verdict) in verdicts {
            match verdict {
                Ok(()) => report.valid_count += 1,
                Err(reason) => {
                    warn!("Broken link {}: {}", url, reason);
                    report.broken.push((url, reason));
                }
            }
        }
        report.broken.sort_by(|a, b| a.0.cmp(&b.0));

        info!("{} links valid, {} broken", report.valid_count, report.broken.len());
        report
    }

    /// Blocking wrapper around [`validate`](Self::validate) for callers without a runtime.
    pub fn validate_blocking(&self, text: &str) -> Result<LinkReport, CiteAuditError> {
        let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build()?;
        Ok(runtime.block_on(self.validate(text)))
    }

    async fn check_url(&self, url: &str, deadline: Option<Instant>) -> Result<(), LinkFailure> {
        let verdict = match deadline {
            Some(at) => match timeout_at(at, self.probe(url)).await {
                Ok(verdict) => verdict,
                Err(_) => Err(LinkFailure::DeadlineExceeded),
            },
            None => self.probe(url).await,
        };
        debug!("Checked {}: {:?}", url, verdict);
        verdict
    }

    /// Request `url` until it answers or the retry window closes.
    ///
    /// Only transport failures, 429 and 5xx are retried. The body is never read.
    async fn probe(&self, url: &str) -> Result<(), LinkFailure> {
        let backoff = ExponentialBackoff {
            current_interval: Duration::from_millis(100),
            initial_interval: Duration::from_millis(100),
            max_interval: Duration::from_secs(2),
            max_elapsed_time: Some(self.config.retry_window),
            ..Default::default()
        };

        let operation = || async {
            let response = self
                .client
                .get(url)
                .timeout(self.config.timeout)
                .send()
                .await
                .map_err(|e| backoff::Error::transient(LinkFailure::Transport(describe_transport_error(&e))))?;

            let status = response.status();
            if status.as_u16() < 400 {
                Ok(())
            } else if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                Err(backoff::Error::transient(LinkFailure::Status(status.as_u16())))
            } else {
                Err(backoff::Error::permanent(LinkFailure::Status(status.as_u16())))
            }
        };

        retry(backoff, operation).await
    }
}

/// Validate the links of `text` with the default configuration.
///
/// If no HTTP client can be built, every URL is reported as a transport
/// failure carrying the build error.
pub async fn validate_links(text: &str) -> LinkReport {
    match LinkValidator::new(LinkCheckConfig::default()) {
        Ok(validator) => validator.validate(text).await,
        Err(e) => {
            warn!("Failed to build HTTP client: {}", e);
            let reason = LinkFailure::Transport(e.to_string());
            LinkReport {
                valid_count: 0,
                broken: extract_urls(text).into_iter().map(|url| (url, reason.clone())).collect(),
            }
        }
    }
}

fn describe_transport_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        return "request timed out".to_string();
    }
    let mut description = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        description.push_str(": ");
        description.push_str(&cause.to_string());
        source = cause.source();
    }
    description
}
