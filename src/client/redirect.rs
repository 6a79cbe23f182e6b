//! 3xx redirect policy

use reqwest::header::LOCATION;
use tracing::debug;
use url::Url;

use super::transport::Connection;

/// Redirect status codes followed by [`Redirector::standard`]
pub const STANDARD_REDIRECT_CODES: [u16; 5] = [301, 302, 303, 307, 308];

/// Decides whether a response should be followed to another URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redirector {
    /// Never follow redirects
    NoRedirect,
    /// Follow the listed status codes via the Location header
    Standard(Vec<u16>),
}

impl Redirector {
    pub fn standard() -> Self {
        Redirector::Standard(STANDARD_REDIRECT_CODES.to_vec())
    }

    /// Target URL to follow, or `None` if the response is final
    pub fn redirect_url<C: Connection + ?Sized>(&self, conn: &C) -> Option<Url> {
        let codes = match self {
            Redirector::NoRedirect => return None,
            Redirector::Standard(codes) => codes,
        };
        let status = conn.status();
        if !codes.contains(&status) {
            return None;
        }
        let location = conn.headers().get(LOCATION)?.to_str().ok()?;
        match conn.url().join(location) {
            Ok(url) => Some(url),
            Err(e) => {
                debug!(status, location, error = %e, "Ignoring unparseable redirect target");
                None
            }
        }
    }
}

impl Default for Redirector {
    fn default() -> Self {
        Self::standard()
    }
}
