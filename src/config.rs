// ABOUTME: Execution options and engine configuration for the Jyro runtime

use crate::diagnostics::{DefaultMessageProvider, MessageProvider};
use std::sync::Arc;
use std::time::Duration;

pub const VERSION: &str = "1.0.0";
pub const WELCOME_MESSAGE: &str = "Jyro v1.0";
pub const WELCOME_SUBTITLE: &str = "An embeddable scripting language for safe data transformation";
pub const WELCOME_FOOTER: &str =
    "Type a script to run it against the current Data. Commands: help, data, reset, quit";

/// Quotas and formatting options for one execution. Every limit is a hard
/// ceiling; breaching any of them terminates the script with a runtime
/// diagnostic naming the limit.
#[derive(Clone)]
pub struct ExecutionOptions {
    pub max_wall_time: Duration,
    pub max_statements: u64,
    pub max_loop_iterations: u64,
    pub max_call_depth: u32,
    pub max_script_call_depth: u32,
    /// Formatter for diagnostics; hosts swap this for localized messages.
    pub message_provider: Arc<dyn MessageProvider>,
}

impl ExecutionOptions {
    pub fn with_max_statements(mut self, max: u64) -> Self {
        self.max_statements = max;
        self
    }

    pub fn with_max_loop_iterations(mut self, max: u64) -> Self {
        self.max_loop_iterations = max;
        self
    }

    pub fn with_max_call_depth(mut self, max: u32) -> Self {
        self.max_call_depth = max;
        self
    }

    pub fn with_max_script_call_depth(mut self, max: u32) -> Self {
        self.max_script_call_depth = max;
        self
    }

    pub fn with_max_wall_time(mut self, max: Duration) -> Self {
        self.max_wall_time = max;
        self
    }

    pub fn with_message_provider(mut self, provider: Arc<dyn MessageProvider>) -> Self {
        self.message_provider = provider;
        self
    }
}

impl Default for ExecutionOptions {
    fn default() -> Self {
        Self {
            max_wall_time: Duration::from_secs(5),
            max_statements: 100_000,
            max_loop_iterations: 100_000,
            max_call_depth: 64,
            max_script_call_depth: 8,
            message_provider: Arc::new(DefaultMessageProvider),
        }
    }
}

impl std::fmt::Debug for ExecutionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecutionOptions")
            .field("max_wall_time", &self.max_wall_time)
            .field("max_statements", &self.max_statements)
            .field("max_loop_iterations", &self.max_loop_iterations)
            .field("max_call_depth", &self.max_call_depth)
            .field("max_script_call_depth", &self.max_script_call_depth)
            .finish()
    }
}

/// Network policy for the opt-in HTTP builtin. Disabled by default; an empty
/// allowlist with `enabled` set means any host is reachable.
#[derive(Debug, Clone, Default)]
pub struct NetworkConfig {
    pub enabled: bool,
    pub allowed_hosts: Vec<String>,
}

impl NetworkConfig {
    pub fn is_url_allowed(&self, url: &str) -> bool {
        if !self.enabled {
            return false;
        }
        if self.allowed_hosts.is_empty() {
            return true;
        }
        self.allowed_hosts.iter().any(|host| url.contains(host))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_limits_are_finite() {
        let options = ExecutionOptions::default();
        assert!(options.max_statements > 0);
        assert!(options.max_loop_iterations > 0);
        assert!(options.max_call_depth > 0);
        assert!(options.max_wall_time > Duration::ZERO);
    }

    #[test]
    fn test_network_disabled_by_default() {
        let net = NetworkConfig::default();
        assert!(!net.is_url_allowed("https://example.com"));
    }

    #[test]
    fn test_network_allowlist() {
        let net = NetworkConfig {
            enabled: true,
            allowed_hosts: vec!["api.example.com".into()],
        };
        assert!(net.is_url_allowed("https://api.example.com/v1"));
        assert!(!net.is_url_allowed("https://other.example.com"));
    }
}
