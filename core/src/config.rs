//! Process-wide configuration, read once at startup.
//!
//! # Design
//! `Config` is built once and then only borrowed. `Capabilities` is derived
//! from it a single time; tool discovery and dispatch both read the same
//! `Capabilities` value, so the advertised tool list and the enforced gate
//! cannot disagree.

use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.webhooknotify.dev";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Bearer credential for the channel-management API.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminToken(String);

impl AdminToken {
    /// Returns `None` for empty or whitespace-only input.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AdminToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AdminToken(***)")
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub admin_token: Option<AdminToken>,
    pub debug: bool,
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl Config {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            admin_token: None,
            debug: false,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Empty tokens leave channel management disabled.
    pub fn with_admin_token(mut self, token: Option<String>) -> Self {
        self.admin_token = token.and_then(AdminToken::new);
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            management: self.admin_token.clone(),
        }
    }
}

/// Which operations this process may run.
#[derive(Debug, Clone, Default)]
pub struct Capabilities {
    management: Option<AdminToken>,
}

impl Capabilities {
    pub fn channel_management(&self) -> bool {
        self.management.is_some()
    }

    pub fn admin_token(&self) -> Option<&AdminToken> {
        self.management.as_ref()
    }
}
