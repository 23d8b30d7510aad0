//! Environment-driven configuration
//!
//! Values are read from the process environment after loading a local `.env` file.
//! The email section is optional: without `GMAIL_USER`, `GMAIL_PASS` and
//! `EMAIL_RECIPIENTS` the watcher still runs and only logs what it would send.

use std::time::Duration;

use tracing::warn;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://trouverunlogement.lescrous.fr";
pub const DEFAULT_SEARCH_PATH: &str =
    "tools/36/search?bounds=5.2286902_43.3910329_5.5324758_43.1696205&";
pub const DEFAULT_DETAIL_PATH: &str = "tools/36/accommodations";
pub const DEFAULT_SMTP_HOST: &str = "smtp.gmail.com";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub base_url: String,
    /// Catalog entry point with its fixed query parameters already applied
    pub search_url: String,
    pub detail_path: String,
    pub poll_interval: Duration,
    pub max_concurrent_checks: usize,
    pub fetch_timeout: Duration,
    /// Upper bound on the number of catalog pages fetched per cycle
    pub page_limit: u32,
    pub email: Option<EmailConfig>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub username: String,
    pub password: String,
    pub recipients: Vec<String>,
}

// Keeps the password out of logs
impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("username", &self.username)
            .field("recipients", &self.recipients)
            .finish_non_exhaustive()
    }
}

impl Config {
    /// Loads `.env` if present, then reads the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a configuration from any key lookup
    ///
    /// # Arguments
    /// * `lookup` - Returns the raw value of a variable, `None` when unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let base_url = get("CROUS_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let search_url = get("CROUS_SEARCH_URL").unwrap_or_else(|| {
            format!("{}/{}", base_url.trim_end_matches('/'), DEFAULT_SEARCH_PATH)
        });
        let detail_path =
            get("CROUS_DETAIL_PATH").unwrap_or_else(|| DEFAULT_DETAIL_PATH.to_string());

        let number = |key: &'static str, default: u64| -> Result<u64, ConfigError> {
            match get(key) {
                None => Ok(default),
                Some(raw) => raw
                    .parse::<u64>()
                    .ok()
                    .filter(|n| *n > 0)
                    .ok_or(ConfigError::InvalidNumber { key, value: raw }),
            }
        };

        let poll_interval = Duration::from_secs(number("POLL_INTERVAL_SECS", 30)?);
        let fetch_timeout = Duration::from_secs(number("FETCH_TIMEOUT_SECS", 10)?);
        let max_concurrent_checks = usize::try_from(number("MAX_CONCURRENT_CHECKS", 10)?)
            .unwrap_or(usize::MAX);
        let page_limit = u32::try_from(number("PAGE_LIMIT", 100)?).unwrap_or(u32::MAX);

        let email = match (get("GMAIL_USER"), get("GMAIL_PASS"), get("EMAIL_RECIPIENTS")) {
            (Some(username), Some(password), Some(raw_recipients)) => {
                let recipients = raw_recipients
                    .split(',')
                    .map(|r| r.trim().to_string())
                    .collect::<Vec<_>>();
                if recipients.iter().any(String::is_empty) {
                    return Err(ConfigError::InvalidRecipient);
                }
                Some(EmailConfig {
                    smtp_host: get("SMTP_HOST").unwrap_or_else(|| DEFAULT_SMTP_HOST.to_string()),
                    username,
                    password,
                    recipients,
                })
            }
            (None, None, None) => None,
            _ => {
                warn!(
                    "GMAIL_USER, GMAIL_PASS and EMAIL_RECIPIENTS must all be set - email notifications will be disabled"
                );
                None
            }
        };

        Ok(Self {
            base_url,
            search_url,
            detail_path,
            poll_interval,
            max_concurrent_checks,
            fetch_timeout,
            page_limit,
            email,
        })
    }
}
