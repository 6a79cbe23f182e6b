//! User interaction for credential acquisition
//!
//! The negotiation engine only talks to the narrow [`UserInterface`] trait.
//! Two implementations are provided: an interactive console prompt and a
//! fixed (non-interactive) one for scripted use.

use dialoguer::console::Term;
use dialoguer::{Input, Password};
use std::fmt;
use tracing::{debug, warn};

/// Username and password supplied by the user
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Parse credentials from "username:password" format.
    /// A missing password is taken as empty.
    pub fn parse(creds: &str) -> Self {
        let mut parts = creds.splitn(2, ':');
        let username = parts.next().unwrap_or_default();
        let password = parts.next().unwrap_or_default();
        Self::new(username, password)
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

// Keep passwords out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// How the negotiation engine asks the user for credentials
pub trait UserInterface: Send + Sync {
    /// Ask for credentials. `prompt` describes what is being asked for.
    /// Returns `None` if the user declines.
    fn read_credentials(&self, prompt: &[String]) -> Option<Credentials>;

    /// Show an informational message
    fn message(&self, lines: &[String]);

    /// Whether asking again after a failed attempt makes sense
    fn can_retry(&self) -> bool;
}

/// Interactive prompts on the controlling terminal (stderr, so that
/// prompts never mix with response output on stdout)
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleUi;

impl ConsoleUi {
    pub fn new() -> Self {
        Self
    }
}

impl UserInterface for ConsoleUi {
    fn read_credentials(&self, prompt: &[String]) -> Option<Credentials> {
        let term = Term::stderr();
        for line in prompt {
            term.write_line(line).ok();
        }

        let username = match Input::<String>::new()
            .with_prompt("Username (blank to skip)")
            .allow_empty(true)
            .interact_text_on(&term)
        {
            Ok(input) => input,
            Err(e) => {
                warn!(error = %e, "Failed to read username");
                return None;
            }
        };
        if username.trim().is_empty() {
            debug!("User declined to supply credentials");
            return None;
        }

        let password = match Password::new()
            .with_prompt("Password")
            .allow_empty_password(true)
            .interact_on(&term)
        {
            Ok(input) => input,
            Err(e) => {
                warn!(error = %e, "Failed to read password");
                return None;
            }
        };

        Some(Credentials::new(username.trim(), password))
    }

    fn message(&self, lines: &[String]) {
        let term = Term::stderr();
        for line in lines {
            term.write_line(line).ok();
        }
    }

    fn can_retry(&self) -> bool {
        true
    }
}

/// Non-interactive interface that always answers the same way.
///
/// With credentials it supplies them on every request; without, it always
/// declines. It never asks twice.
#[derive(Debug, Clone, Default)]
pub struct FixedUi {
    credentials: Option<Credentials>,
}

impl FixedUi {
    pub fn new(credentials: Credentials) -> Self {
        Self {
            credentials: Some(credentials),
        }
    }

    /// An interface that declines every request for credentials
    pub fn decline() -> Self {
        Self { credentials: None }
    }
}

impl UserInterface for FixedUi {
    fn read_credentials(&self, _prompt: &[String]) -> Option<Credentials> {
        self.credentials.clone()
    }

    fn message(&self, lines: &[String]) {
        for line in lines {
            debug!("{}", line);
        }
    }

    fn can_retry(&self) -> bool {
        false
    }
}
