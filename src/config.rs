//! Runtime configuration.
//!
//! Built from defaults plus `CLOUDECK_*` environment overrides. Use the
//! builder methods to customize in tests.
//!
//! ```ignore
//! use cloudeck::config::AppConfig;
//!
//! let config = AppConfig::default()
//!     .with_project("staging")
//!     .with_poll_interval(Duration::from_secs(10));
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::gateway::{RateLimitConfig, RetryPolicy};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Project selected at startup.
    pub project: String,
    /// Projects offered by the palette's project switcher.
    pub projects: Vec<String>,
    /// Base URL of the resource API.
    pub api_base_url: String,
    /// TTL for cached list results.
    pub cache_ttl: Duration,
    pub rate_limit: RateLimitConfig,
    pub retry: RetryPolicy,
    /// Upper bound for a single outbound attempt.
    pub request_timeout: Duration,
    /// Background refresh interval for the active module.
    pub poll_interval: Duration,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project: "default".to_string(),
            projects: vec!["default".to_string()],
            api_base_url: "http://localhost:8080".to_string(),
            cache_ttl: Duration::from_secs(30),
            rate_limit: RateLimitConfig::default(),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(15),
            poll_interval: Duration::from_secs(30),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overlaid with the process environment.
    pub fn from_env() -> Self {
        Self::default().overlay(|name| std::env::var(name).ok())
    }

    /// Apply overrides from `lookup` (an environment-like source).
    pub fn overlay<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(projects) = lookup("CLOUDECK_PROJECTS") {
            let projects: Vec<String> = projects
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            if !projects.is_empty() {
                self.projects = projects;
            }
        }
        if let Some(project) = lookup("CLOUDECK_PROJECT").filter(|p| !p.trim().is_empty()) {
            self = self.with_project(project.trim());
        } else if let Some(first) = self.projects.first() {
            if !self.projects.contains(&self.project) {
                self.project = first.clone();
            }
        }
        if let Some(url) = lookup("CLOUDECK_API_URL").filter(|u| !u.is_empty()) {
            self.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = parse_secs(&lookup, "CLOUDECK_CACHE_TTL_SECS") {
            self.cache_ttl = secs;
        }
        if let Some(secs) = parse_secs(&lookup, "CLOUDECK_POLL_SECS") {
            self.poll_interval = secs;
        }
        if let Some(level) = lookup("CLOUDECK_LOG").filter(|l| !l.is_empty()) {
            self.log_level = level;
        }
        self
    }

    /// Select `project`, adding it to the switcher list if missing.
    pub fn with_project(mut self, project: impl Into<String>) -> Self {
        let project = project.into();
        if !self.projects.contains(&project) {
            self.projects.push(project.clone());
        }
        self.project = project;
        self
    }

    pub fn with_projects<I, S>(mut self, projects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.projects = projects.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

fn parse_secs<F>(lookup: &F, name: &str) -> Option<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = lookup(name)?;
    match raw.trim().parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            tracing::warn!(name, value = %raw, "ignoring invalid duration override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.project, "default");
        assert_eq!(config.rate_limit.capacity, 20);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.base_delay, Duration::from_millis(500));
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
    }

    #[test]
    fn test_overlay_projects_and_numbers() {
        let config = AppConfig::default().overlay(env(&[
            ("CLOUDECK_PROJECTS", "alpha, beta,,gamma"),
            ("CLOUDECK_API_URL", "https://api.example.com/"),
            ("CLOUDECK_CACHE_TTL_SECS", "5"),
            ("CLOUDECK_POLL_SECS", "soon"),
        ]));

        assert_eq!(config.projects, vec!["alpha", "beta", "gamma"]);
        assert_eq!(config.project, "alpha");
        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.cache_ttl, Duration::from_secs(5));
        assert_eq!(config.poll_interval, Duration::from_secs(30));
    }

    #[test]
    fn test_explicit_project_is_added_to_list() {
        let config = AppConfig::default().overlay(env(&[
            ("CLOUDECK_PROJECTS", "alpha,beta"),
            ("CLOUDECK_PROJECT", "delta"),
        ]));
        assert_eq!(config.project, "delta");
        assert_eq!(config.projects, vec!["alpha", "beta", "delta"]);
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("CLOUDECK_PROJECT", "from-env");
        let config = AppConfig::from_env();
        std::env::remove_var("CLOUDECK_PROJECT");

        assert_eq!(config.project, "from-env");
    }
}
