//! CLI argument definitions using clap

use clap::{ArgAction, Parser};
use std::fmt;

/// A string that redacts its value in Debug output to prevent credential leakage
#[derive(Clone, Default)]
pub struct SecretString(pub String);

impl SecretString {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            write!(f, "SecretString(\"\")")
        } else {
            write!(f, "SecretString(\"[REDACTED]\")")
        }
    }
}

impl std::str::FromStr for SecretString {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SecretString(s.to_string()))
    }
}

/// authpulse - HTTP client with challenge/response authentication
#[derive(Parser, Debug, Clone)]
#[command(name = "authpulse")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// URL to fetch or probe
    #[arg(value_name = "URL")]
    pub url: String,

    // =========================================================================
    // AUTHENTICATION
    // =========================================================================

    /// Probe an authcheck endpoint and report the authentication status
    #[arg(long = "authcheck", action = ArgAction::SetTrue)]
    pub authcheck: bool,

    /// Use HEAD instead of GET
    #[arg(long = "head", action = ArgAction::SetTrue)]
    pub head: bool,

    /// With --authcheck: log in even if the endpoint allows anonymous
    /// access, discarding remembered credentials
    #[arg(long = "force-login", action = ArgAction::SetTrue, requires = "authcheck")]
    pub force_login: bool,

    /// Credentials as USER[:PASS]; answers every challenge without prompting
    #[arg(short = 'a', long = "auth", value_name = "USER[:PASS]")]
    pub auth: Option<SecretString>,

    /// Never prompt for credentials; challenges are declined
    #[arg(long = "no-prompt", action = ArgAction::SetTrue, conflicts_with = "auth")]
    pub no_prompt: bool,

    /// Auth scheme to use, in order of preference (repeatable)
    #[arg(long = "scheme", value_name = "NAME")]
    pub schemes: Vec<String>,

    // =========================================================================
    // NETWORK
    // =========================================================================

    /// Do not follow redirects
    #[arg(long = "no-follow", action = ArgAction::SetTrue)]
    pub no_follow: bool,

    /// Maximum number of redirects (default: 10)
    #[arg(long = "max-redirects", value_name = "NUM")]
    pub max_redirects: Option<u32>,

    /// Request timeout in seconds
    #[arg(long = "timeout", value_name = "SECONDS")]
    pub timeout: Option<f64>,

    // =========================================================================
    // OUTPUT
    // =========================================================================

    /// Exit with error on non-2xx status codes
    #[arg(long = "check-status", action = ArgAction::SetTrue)]
    pub check_status: bool,

    /// Verbose logging. Use -vv for even more verbose
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}
