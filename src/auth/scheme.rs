//! Authentication scheme plug-in contract
//!
//! A scheme looks at a challenge and, if it understands it, hands back a
//! [`ContextFactory`]. The factory talks to the user and produces an
//! [`AuthContext`], which is what actually decorates requests and decides
//! which later URLs and challenges it applies to.

use reqwest::header::HeaderMap;
use reqwest::Method;
use std::fmt;
use std::sync::Arc;
use url::Url;

use super::challenge::Challenge;
use super::space::ProtectionSpace;
use super::ui::UserInterface;
use crate::errors::{BadChallenge, Result};

/// An outbound request before it is handed to the transport
#[derive(Debug, Clone)]
pub struct Request {
    pub url: Url,
    pub method: Method,
    pub headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            url,
            method,
            headers: HeaderMap::new(),
        }
    }

    /// Request target as it appears on the request line (path and query)
    pub fn target(&self) -> String {
        match self.url.query() {
            Some(q) => format!("{}?{}", self.url.path(), q),
            None => self.url.path().to_string(),
        }
    }
}

/// An authentication scheme known to the manager
pub trait AuthScheme: Send + Sync + fmt::Debug {
    /// Scheme name as used in challenges, e.g. "Basic"
    fn name(&self) -> &str;

    /// Returns a factory if this scheme understands `challenge`, `None` if
    /// the challenge belongs to some other scheme, and `BadChallenge` if it
    /// names this scheme but is unusable.
    fn create_context_factory(
        &self,
        challenge: &Challenge,
        url: &Url,
    ) -> std::result::Result<Option<Box<dyn ContextFactory>>, BadChallenge>;
}

/// Builds contexts for one (scheme, challenge, url) combination
pub trait ContextFactory: Send + Sync {
    /// Query the user and build a credentialed context, or `None` if the
    /// user declined.
    fn create_context(&self, ui: &dyn UserInterface) -> Option<Arc<dyn AuthContext>>;

    /// Context with no credentials, used to remember that the user
    /// declined for this challenge.
    fn create_unauth_context(&self) -> Arc<dyn AuthContext>;
}

/// Credentials (or their deliberate absence) for one protection space
pub trait AuthContext: Send + Sync + fmt::Debug {
    fn scheme(&self) -> &dyn AuthScheme;

    fn has_credentials(&self) -> bool;

    fn protection_space(&self) -> &ProtectionSpace;

    /// Whether `url` falls under this context's scope
    fn is_url_domain(&self, url: &Url) -> bool;

    /// Whether `challenge`, received for `url`, is one this context answers
    fn is_challenge_domain(&self, challenge: &Challenge, url: &Url) -> bool {
        ProtectionSpace::from_challenge(challenge, url) == *self.protection_space()
            && matches!(self.scheme().create_context_factory(challenge, url), Ok(Some(_)))
    }

    fn is_expired(&self) -> bool {
        false
    }

    /// Add credentials to an outbound request. Anonymous contexts leave
    /// the request untouched.
    fn configure_request(&self, request: &mut Request) -> Result<()>;

    /// Refresh server-issued state (such as a nonce) from a newer challenge
    /// for this context's own protection space.
    fn update_challenge(&self, _challenge: &Challenge) {}
}

/// Prompt lines shown when asking for credentials
pub(crate) fn login_prompt(scheme: &str, url: &Url, space: &ProtectionSpace) -> Vec<String> {
    let mut lines = vec![format!("Login for {}", url)];
    match space.realm() {
        Some(realm) => lines.push(format!("Realm: {} ({} authentication)", realm, scheme)),
        None => lines.push(format!("{} authentication", scheme)),
    }
    lines
}

/// Scope for schemes that protect "everything at or below" a request path:
/// the URL with query and fragment removed and the path cut after its last
/// slash.
pub(crate) fn path_scope(url: &Url) -> String {
    let mut scope = url.clone();
    scope.set_query(None);
    scope.set_fragment(None);
    let path = scope.path().to_string();
    let cut = path.rfind('/').map(|i| &path[..=i]).unwrap_or("/");
    scope.set_path(cut);
    scope.to_string()
}

/// Whether `url` lies under a scope produced by [`path_scope`]
pub(crate) fn in_scope(scope: &str, url: &Url) -> bool {
    let mut target = url.clone();
    target.set_fragment(None);
    target.as_str().starts_with(scope)
}
