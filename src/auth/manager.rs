//! Authentication manager
//!
//! [`AuthManager`] opens connections on behalf of callers, answering 401/403
//! challenges with credentials obtained from the user and remembering the
//! outcome so that later requests to the same protection space go straight
//! through. It also runs the "authcheck" probe used by services that accept
//! both anonymous and authenticated access on one endpoint.
//!
//! Proxy authentication (407) is not handled.

use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use std::io::Read;
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use super::cache::{ContextCache, TestedContext};
use super::challenge::{parse_challenges, Challenge};
use super::registry::SchemeRegistry;
use super::scheme::{AuthContext, AuthScheme, ContextFactory, Request};
use super::status::{AuthStatus, AuthType, AUTHENTICATED_ID_HEADER};
use super::ui::UserInterface;
use crate::client::{Connection, Redirector, Transport};
use crate::errors::{AuthError, Result};

/// Redirect hops followed before giving up
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;

/// A live connection and the context used to obtain it
#[derive(Debug)]
pub struct AuthConnection<C> {
    pub connection: C,
    pub context: Option<Arc<dyn AuthContext>>,
}

impl<C> AuthConnection<C> {
    pub fn new(connection: C, context: Option<Arc<dyn AuthContext>>) -> Self {
        Self { connection, context }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn context(&self) -> Option<&Arc<dyn AuthContext>> {
        self.context.as_ref()
    }

    pub fn into_connection(self) -> C {
        self.connection
    }
}

fn is_auth_failure(status: u16) -> bool {
    status == 401 || status == 403
}

/// Negotiates HTTP authentication and caches the results.
///
/// Without a user interface installed no negotiation is attempted at all:
/// requests are sent as-is (with any cached context that applies) and
/// responses handed back untouched.
pub struct AuthManager<T: Transport> {
    transport: T,
    ui: RwLock<Option<Arc<dyn UserInterface>>>,
    schemes: SchemeRegistry,
    cache: ContextCache,
    redirector: Redirector,
    max_redirects: u32,
}

impl<T: Transport> AuthManager<T> {
    /// `schemes` are in order of preference.
    pub fn new(
        transport: T,
        ui: Option<Arc<dyn UserInterface>>,
        schemes: Vec<Arc<dyn AuthScheme>>,
        redirector: Redirector,
    ) -> Self {
        Self {
            transport,
            ui: RwLock::new(ui),
            schemes: SchemeRegistry::new(schemes),
            cache: ContextCache::new(),
            redirector,
            max_redirects: DEFAULT_MAX_REDIRECTS,
        }
    }

    pub fn with_max_redirects(mut self, max_redirects: u32) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    pub fn set_user_interface(&self, ui: Option<Arc<dyn UserInterface>>) {
        *self.ui.write().unwrap_or_else(|poisoned| poisoned.into_inner()) = ui;
    }

    pub fn user_interface(&self) -> Option<Arc<dyn UserInterface>> {
        self.ui
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Mutable, thread-safe list of known schemes
    pub fn schemes(&self) -> &SchemeRegistry {
        &self.schemes
    }

    pub fn cache(&self) -> &ContextCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Redirect policy used by [`connect`](Self::connect)
    pub fn redirector(&self) -> &Redirector {
        &self.redirector
    }

    pub fn max_redirects(&self) -> u32 {
        self.max_redirects
    }

    /// Forget all credentials; subsequent protected accesses ask again
    pub fn clear(&self) {
        self.cache.clear();
    }

    /// GET a URL with authentication and default redirect handling
    pub fn connect(&self, url: &Url) -> Result<T::Conn> {
        self.connect_with(url, &Method::GET, &self.redirector)
    }

    pub fn connect_with(&self, url: &Url, method: &Method, redirector: &Redirector) -> Result<T::Conn> {
        self.make_connection(url, method, redirector)
            .map(AuthConnection::into_connection)
    }

    /// GET a URL and hand back its body for reading. Unlike
    /// [`connect`](Self::connect), an error status (including a final 401
    /// or 403) is reported as [`AuthError::HttpStatus`].
    pub fn open_stream(&self, url: &Url) -> Result<T::Conn>
    where
        T::Conn: Read,
    {
        let conn = self.connect(url)?;
        match conn.status() {
            status @ 400.. => Err(AuthError::HttpStatus {
                status,
                url: conn.url().clone(),
            }),
            _ => Ok(conn),
        }
    }

    /// Open a connection to `url`, negotiating authentication as needed and
    /// following redirects as `redirector` dictates. Each redirect target
    /// is negotiated afresh against the cache.
    ///
    /// Failures unrelated to authentication are reported through the
    /// status of the returned connection, not as errors.
    pub fn make_connection(&self, url: &Url, method: &Method, redirector: &Redirector) -> Result<AuthConnection<T::Conn>> {
        let mut target = url.clone();
        let mut hops = 0;
        loop {
            let aconn = self.negotiate(&target, method)?;
            match redirector.redirect_url(&aconn.connection) {
                None => return Ok(aconn),
                Some(next) => {
                    hops += 1;
                    if hops > self.max_redirects {
                        return Err(AuthError::TooManyRedirects(self.max_redirects));
                    }
                    info!(status = aconn.connection.status(), url = %next, "HTTP redirect");
                    target = next;
                }
            }
        }
    }

    /// Follow a redirect from an existing connection, if there is one
    pub fn follow_redirects(&self, conn: T::Conn, method: &Method, redirector: &Redirector) -> Result<AuthConnection<T::Conn>> {
        match redirector.redirect_url(&conn) {
            Some(next) => {
                info!(status = conn.status(), url = %next, "HTTP redirect");
                self.make_connection(&next, method, redirector)
            }
            None => Ok(AuthConnection::new(conn, None)),
        }
    }

    /// Probe an authcheck endpoint and establish authentication for it if
    /// it is required, or if `is_force_login` is set and the endpoint offers
    /// a challenge. With `is_force_login`, previously cached credentials for
    /// the offered challenges are discarded so the user is asked again.
    ///
    /// Redirects are not followed.
    pub fn authcheck(&self, url: &Url, is_head: bool, is_force_login: bool) -> Result<AuthStatus> {
        if !matches!(url.scheme(), "http" | "https") {
            return Ok(AuthStatus::NO_AUTH);
        }
        let method = if is_head { Method::HEAD } else { Method::GET };

        let conn1 = self.connect_with_context(url, &method, None)?;
        let code1 = conn1.status();
        let challenges = parse_challenges(conn1.headers());
        let auth_type = match code1 {
            401 | 403 => AuthType::Required,
            200..=299 if challenges.is_empty() => AuthType::None,
            200..=299 => AuthType::Optional,
            _ => return Ok(AuthStatus::new(AuthType::Unknown)),
        };
        info!(url = %url, status = code1, auth_type = %auth_type, "Initial authcheck connection");

        if challenges.is_empty() || !(auth_type == AuthType::Required || is_force_login) {
            return Ok(AuthStatus::new(auth_type));
        }

        if is_force_login {
            let removed = self.cache.remove_if(|entry| {
                challenges
                    .iter()
                    .any(|ch| entry.context().is_challenge_domain(ch, url))
            });
            debug!(url = %url, removed, "Discarded cached contexts for forced login");
        }

        let mut aconn = None;
        if let Some(tested) = self.cache.find_by_challenges(&challenges, url) {
            refresh_challenge(tested.context().as_ref(), &challenges, url);
            let conn = self.connect_with_context(url, &method, Some(tested.context()))?;
            if self.assess_auth_attempt(&tested, &conn) {
                aconn = Some(AuthConnection::new(conn, Some(tested.context().clone())));
            }
        }

        if aconn.is_none() {
            match self.schemes.select_factory(&challenges, url) {
                None => warn!(url = %url, "No supported auth-schemes in WWW-Authenticate"),
                Some(factory) => {
                    if let Some(ui) = self.user_interface() {
                        aconn = Some(self.connect_with_challenge(url, &method, factory.as_ref(), ui.as_ref(), false)?);
                    }
                }
            }
        }

        Ok(match aconn {
            Some(aconn) => {
                let is_authenticated = aconn.connection.status() == 200
                    && aconn.context.as_ref().is_some_and(|c| c.has_credentials());
                let authenticated_id = authenticated_id(aconn.connection.headers());
                AuthStatus::with_identity(auth_type, is_authenticated, authenticated_id)
            }
            None => AuthStatus::new(auth_type),
        })
    }

    /// One URL, no redirects: cached context first, then challenge handling
    fn negotiate(&self, url: &Url, method: &Method) -> Result<AuthConnection<T::Conn>> {
        let cached = self.cache.find_by_url(url);
        let conn = self.connect_with_context(url, method, cached.as_ref().map(|t| t.context()))?;
        if let Some(ref tested) = cached {
            self.assess_auth_attempt(tested, &conn);
        }
        let aconn = AuthConnection::new(conn, cached.map(|t| t.context().clone()));

        let Some(ui) = self.user_interface() else {
            return Ok(aconn);
        };
        let status = aconn.connection.status();
        if !is_auth_failure(status) {
            return Ok(aconn);
        }

        let challenges = parse_challenges(aconn.connection.headers());
        if challenges.is_empty() {
            // RFC 7235 section 3.1: a 401 MUST carry a challenge; a bare
            // 403 need not be about authentication at all
            if status == 401 {
                return Err(AuthError::ProtocolViolation(url.clone()));
            }
            return Ok(aconn);
        }

        // Reuse an earlier answer to one of these challenges if we have one
        if let Some(tested) = self.cache.find_by_challenges(&challenges, url) {
            refresh_challenge(tested.context().as_ref(), &challenges, url);
            let conn = self.connect_with_context(url, method, Some(tested.context()))?;
            if self.assess_auth_attempt(&tested, &conn) {
                return Ok(AuthConnection::new(conn, Some(tested.context().clone())));
            }
        }

        let factory = self
            .schemes
            .select_factory(&challenges, url)
            .ok_or_else(|| AuthError::NoSupportedScheme(url.clone()))?;
        self.connect_with_challenge(url, method, factory.as_ref(), ui.as_ref(), true)
    }

    /// Record the outcome of using `tested` and say whether the connection
    /// should be handed back. `false` means the context's credentials were
    /// rejected and something else is worth trying.
    fn assess_auth_attempt(&self, tested: &TestedContext, conn: &T::Conn) -> bool {
        match conn.status() {
            200..=399 => {
                tested.mark_succeeded();
                true
            }
            401 | 403 => {
                tested.mark_failed();
                !tested.context().has_credentials()
            }
            _ => true,
        }
    }

    /// Ask the user for credentials for a challenge and connect with them.
    /// With `allow_retry`, rejected credentials lead to another prompt for
    /// as long as the user interface allows it.
    fn connect_with_challenge(
        &self,
        url: &Url,
        method: &Method,
        factory: &dyn ContextFactory,
        ui: &dyn UserInterface,
        allow_retry: bool,
    ) -> Result<AuthConnection<T::Conn>> {
        loop {
            info!(url = %url, "Acquire credentials");
            let Some(context) = factory.create_context(ui) else {
                // Remember the refusal so the same question is not asked again
                let anon = factory.create_unauth_context();
                info!(url = %url, "Configuring anonymous context");
                self.cache.add(Arc::new(TestedContext::new(anon.clone())));
                let conn = self.connect_with_context(url, method, Some(&anon))?;
                return Ok(AuthConnection::new(conn, Some(anon)));
            };

            // Cached before the outcome is known
            let tested = Arc::new(TestedContext::new(context.clone()));
            self.cache.add(tested.clone());
            let conn = self.connect_with_context(url, method, Some(&context))?;
            let status = conn.status();

            if (200..300).contains(&status) {
                tested.mark_succeeded();
                info!(
                    scheme = context.scheme().name(),
                    url = %url,
                    status,
                    "Configuring authenticated context"
                );
                return Ok(AuthConnection::new(conn, Some(context)));
            }
            if !is_auth_failure(status) {
                return Ok(AuthConnection::new(conn, Some(context)));
            }

            tested.mark_failed();
            if allow_retry && ui.can_retry() {
                ui.message(&["Authentication failed".to_string(), failure_message(status)]);
            } else {
                info!(url = %url, status, "Unsuccessful authentication");
                return Ok(AuthConnection::new(conn, Some(context)));
            }
        }
    }

    /// Send a single request, decorated by `context` if given
    fn connect_with_context(&self, url: &Url, method: &Method, context: Option<&Arc<dyn AuthContext>>) -> Result<T::Conn> {
        let mut request = Request::new(method.clone(), url.clone());
        match context {
            None => debug!(url = %url, "Unauthenticated connection"),
            Some(ctx) => {
                let kind = if ctx.has_credentials() { "Authenticated" } else { "Anonymous" };
                debug!(url = %url, space = %ctx.protection_space(), "{} connection", kind);
                ctx.configure_request(&mut request)?;
            }
        }
        self.transport.send(request)
    }
}

/// Let a reused context pick up fresh server state from the challenge it
/// answers
fn refresh_challenge(context: &dyn AuthContext, challenges: &[Challenge], url: &Url) {
    if let Some(ch) = challenges.iter().find(|ch| context.is_challenge_domain(ch, url)) {
        context.update_challenge(ch);
    }
}

fn failure_message(status: u16) -> String {
    match StatusCode::from_u16(status).ok().and_then(|s| s.canonical_reason()) {
        Some(reason) => format!("{} {}", status, reason),
        None => status.to_string(),
    }
}

/// User ID reported by an authcheck endpoint
fn authenticated_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHENTICATED_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
}
