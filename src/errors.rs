//! Error types for authpulse

use thiserror::Error;
use url::Url;

/// A scheme recognised a challenge by name but could not make sense of its
/// parameters (for instance a Basic challenge with no realm).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{scheme} challenge error: {reason}")]
pub struct BadChallenge {
    pub scheme: String,
    pub reason: String,
}

impl BadChallenge {
    pub fn new(scheme: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            scheme: scheme.into(),
            reason: reason.into(),
        }
    }
}

/// Main error type for authpulse
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Malformed challenge: {0}")]
    MalformedChallenge(#[from] BadChallenge),

    #[error("401 with no WWW-Authenticate challenges: {0}")]
    ProtocolViolation(Url),

    #[error("No supported auth-schemes in WWW-Authenticate: {0}")]
    NoSupportedScheme(Url),

    #[error("Request error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Too many redirects (max {0})")]
    TooManyRedirects(u32),

    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Server returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: Url },

    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AuthError>;
