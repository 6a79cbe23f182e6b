//! HTTP Basic Authentication (RFC 7617)

use base64::Engine;
use reqwest::header::{HeaderValue, AUTHORIZATION};
use std::sync::Arc;
use url::Url;

use super::challenge::Challenge;
use super::scheme::{in_scope, login_prompt, path_scope, AuthContext, AuthScheme, ContextFactory, Request};
use super::space::ProtectionSpace;
use super::ui::{Credentials, UserInterface};
use crate::errors::{AuthError, BadChallenge, Result};

/// The Basic scheme
#[derive(Debug, Clone, Copy, Default)]
pub struct BasicScheme;

impl BasicScheme {
    pub const NAME: &'static str = "Basic";
}

impl AuthScheme for BasicScheme {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn create_context_factory(
        &self,
        challenge: &Challenge,
        url: &Url,
    ) -> std::result::Result<Option<Box<dyn ContextFactory>>, BadChallenge> {
        if !challenge.is_scheme(Self::NAME) {
            return Ok(None);
        }
        // realm is REQUIRED for Basic (RFC 7617 section 2)
        if challenge.realm().is_none() {
            return Err(BadChallenge::new(Self::NAME, "no realm"));
        }
        Ok(Some(Box::new(BasicContextFactory {
            space: ProtectionSpace::from_challenge(challenge, url),
            url: url.clone(),
        })))
    }
}

struct BasicContextFactory {
    space: ProtectionSpace,
    url: Url,
}

impl BasicContextFactory {
    fn context(&self, credentials: Option<Credentials>) -> Arc<dyn AuthContext> {
        Arc::new(BasicContext {
            space: self.space.clone(),
            scope: path_scope(&self.url),
            credentials,
        })
    }
}

impl ContextFactory for BasicContextFactory {
    fn create_context(&self, ui: &dyn UserInterface) -> Option<Arc<dyn AuthContext>> {
        let prompt = login_prompt(BasicScheme::NAME, &self.url, &self.space);
        ui.read_credentials(&prompt)
            .map(|credentials| self.context(Some(credentials)))
    }

    fn create_unauth_context(&self) -> Arc<dyn AuthContext> {
        self.context(None)
    }
}

/// Basic credentials for one realm
#[derive(Debug)]
pub struct BasicContext {
    space: ProtectionSpace,
    scope: String,
    credentials: Option<Credentials>,
}

impl BasicContext {
    /// Authorization header value for these credentials
    fn header_value(credentials: &Credentials) -> Result<HeaderValue> {
        let raw = format!("{}:{}", credentials.username(), credentials.password());
        let encoded = base64::engine::general_purpose::STANDARD.encode(raw.as_bytes());
        HeaderValue::from_str(&format!("Basic {}", encoded))
            .map_err(|e| AuthError::InvalidHeader(e.to_string()))
    }
}

impl AuthContext for BasicContext {
    fn scheme(&self) -> &dyn AuthScheme {
        &BasicScheme
    }

    fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn protection_space(&self) -> &ProtectionSpace {
        &self.space
    }

    /// Everything at or below the last path segment of the original
    /// request (RFC 7617 section 2.2)
    fn is_url_domain(&self, url: &Url) -> bool {
        in_scope(&self.scope, url)
    }

    fn configure_request(&self, request: &mut Request) -> Result<()> {
        if let Some(ref credentials) = self.credentials {
            request.headers.insert(AUTHORIZATION, Self::header_value(credentials)?);
        }
        Ok(())
    }
}
