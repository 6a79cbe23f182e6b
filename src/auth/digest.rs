//! HTTP Digest Authentication (RFC 7616)
//!
//! Supports MD5, SHA-256 and SHA-512-256 with `qop=auth` (or no qop for
//! RFC 2069 servers). The server's nonce is tracked per context and
//! refreshed whenever a newer challenge for the same realm arrives.

use reqwest::header::{HeaderValue, AUTHORIZATION};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, RwLock};
use url::Url;

use super::challenge::Challenge;
use super::scheme::{login_prompt, AuthContext, AuthScheme, ContextFactory, Request};
use super::space::ProtectionSpace;
use super::ui::{Credentials, UserInterface};
use crate::errors::{AuthError, BadChallenge, Result};

/// Supported digest algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    MD5,
    SHA256,
    SHA512_256,
}

impl DigestAlgorithm {
    /// Parse algorithm name (case-insensitive); `None` for unsupported ones
    /// such as the `-sess` variants.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "MD5" => Some(DigestAlgorithm::MD5),
            "SHA-256" => Some(DigestAlgorithm::SHA256),
            "SHA-512-256" => Some(DigestAlgorithm::SHA512_256),
            _ => None,
        }
    }

    /// Get algorithm name for Authorization header
    pub fn as_str(&self) -> &'static str {
        match self {
            DigestAlgorithm::MD5 => "MD5",
            DigestAlgorithm::SHA256 => "SHA-256",
            DigestAlgorithm::SHA512_256 => "SHA-512-256",
        }
    }
}

/// Server-issued parameters from a Digest challenge
#[derive(Debug, Clone, PartialEq)]
pub struct DigestParams {
    pub realm: String,
    pub nonce: String,
    pub algorithm: DigestAlgorithm,
    pub qop_auth: bool,
    pub opaque: Option<String>,
    pub domain: Vec<String>,
}

impl DigestParams {
    /// Extract digest parameters from a challenge already known to be Digest
    pub fn from_challenge(challenge: &Challenge) -> std::result::Result<Self, BadChallenge> {
        let realm = challenge
            .realm()
            .ok_or_else(|| BadChallenge::new(DigestScheme::NAME, "missing realm"))?;
        let nonce = challenge
            .param("nonce")
            .ok_or_else(|| BadChallenge::new(DigestScheme::NAME, "missing nonce"))?;
        let algorithm = match challenge.param("algorithm") {
            Some(name) => DigestAlgorithm::parse(name).ok_or_else(|| {
                BadChallenge::new(DigestScheme::NAME, format!("unsupported algorithm {}", name))
            })?,
            None => DigestAlgorithm::MD5,
        };
        let qop_auth = match challenge.param("qop") {
            Some(qop) => {
                let offered: Vec<&str> = qop.split(',').map(str::trim).collect();
                if !offered.iter().any(|q| q.eq_ignore_ascii_case("auth")) {
                    return Err(BadChallenge::new(
                        DigestScheme::NAME,
                        format!("no supported qop in \"{}\"", qop),
                    ));
                }
                true
            }
            None => false,
        };
        let domain = challenge
            .param("domain")
            .map(|d| d.split_whitespace().map(String::from).collect())
            .unwrap_or_default();

        Ok(DigestParams {
            realm: realm.to_string(),
            nonce: nonce.to_string(),
            algorithm,
            qop_auth,
            opaque: challenge.param("opaque").map(String::from),
            domain,
        })
    }
}

/// The Digest scheme
#[derive(Debug, Clone, Copy, Default)]
pub struct DigestScheme;

impl DigestScheme {
    pub const NAME: &'static str = "Digest";
}

impl AuthScheme for DigestScheme {
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
        let params = DigestParams::from_challenge(challenge)?;
        Ok(Some(Box::new(DigestContextFactory {
            space: ProtectionSpace::from_challenge(challenge, url),
            scopes: domain_scopes(&params.domain, url),
            url: url.clone(),
            params,
        })))
    }
}

/// URL prefixes covered by a challenge. Without a `domain` parameter the
/// whole origin is covered (RFC 7616 section 3.3).
fn domain_scopes(domain: &[String], url: &Url) -> Vec<String> {
    let scopes: Vec<String> = domain
        .iter()
        .filter_map(|d| url.join(d).ok())
        .map(|u| u.to_string())
        .collect();
    if scopes.is_empty() {
        let mut origin = url.clone();
        origin.set_path("/");
        origin.set_query(None);
        origin.set_fragment(None);
        vec![origin.to_string()]
    } else {
        scopes
    }
}

struct DigestContextFactory {
    space: ProtectionSpace,
    scopes: Vec<String>,
    url: Url,
    params: DigestParams,
}

impl DigestContextFactory {
    fn context(&self, credentials: Option<Credentials>) -> Arc<dyn AuthContext> {
        Arc::new(DigestContext {
            space: self.space.clone(),
            scopes: self.scopes.clone(),
            credentials,
            params: RwLock::new(self.params.clone()),
            nc: AtomicU32::new(0),
        })
    }
}

impl ContextFactory for DigestContextFactory {
    fn create_context(&self, ui: &dyn UserInterface) -> Option<Arc<dyn AuthContext>> {
        let prompt = login_prompt(DigestScheme::NAME, &self.url, &self.space);
        ui.read_credentials(&prompt)
            .map(|credentials| self.context(Some(credentials)))
    }

    fn create_unauth_context(&self) -> Arc<dyn AuthContext> {
        self.context(None)
    }
}

/// Digest credentials for one realm
#[derive(Debug)]
pub struct DigestContext {
    space: ProtectionSpace,
    scopes: Vec<String>,
    credentials: Option<Credentials>,
    params: RwLock<DigestParams>,
    nc: AtomicU32, // Nonce count for replay protection
}

impl DigestContext {
    fn current_params(&self) -> DigestParams {
        self.params
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Generate Authorization header value for one request
    fn respond(&self, credentials: &Credentials, method: &str, uri: &str) -> String {
        let params = self.current_params();

        let nc = self.nc.fetch_add(1, Ordering::SeqCst) + 1;
        let cnonce = generate_cnonce();
        let response = compute_digest_response(
            params.algorithm,
            credentials.username(),
            &params.realm,
            credentials.password(),
            &params.nonce,
            if params.qop_auth { Some((nc, cnonce.as_str())) } else { None },
            method,
            uri,
        );

        let mut auth_value = format!(
            "Digest username=\"{}\", realm=\"{}\", nonce=\"{}\", uri=\"{}\", response=\"{}\", algorithm={}",
            credentials.username(),
            params.realm,
            params.nonce,
            uri,
            response,
            params.algorithm.as_str()
        );
        if params.qop_auth {
            auth_value.push_str(&format!(", qop=auth, nc={:08x}, cnonce=\"{}\"", nc, cnonce));
        }
        if let Some(ref opaque) = params.opaque {
            auth_value.push_str(&format!(", opaque=\"{}\"", opaque));
        }
        auth_value
    }
}

impl AuthContext for DigestContext {
    fn scheme(&self) -> &dyn AuthScheme {
        &DigestScheme
    }

    fn has_credentials(&self) -> bool {
        self.credentials.is_some()
    }

    fn protection_space(&self) -> &ProtectionSpace {
        &self.space
    }

    fn is_url_domain(&self, url: &Url) -> bool {
        let target = url.as_str();
        self.scopes.iter().any(|scope| target.starts_with(scope.as_str()))
    }

    fn configure_request(&self, request: &mut Request) -> Result<()> {
        if let Some(ref credentials) = self.credentials {
            let value = self.respond(credentials, request.method.as_str(), &request.target());
            let header = HeaderValue::try_from(value)
                .map_err(|e| AuthError::InvalidHeader(e.to_string()))?;
            request.headers.insert(AUTHORIZATION, header);
        }
        Ok(())
    }

    fn update_challenge(&self, challenge: &Challenge) {
        if !challenge.is_scheme(DigestScheme::NAME) {
            return;
        }
        if let Ok(fresh) = DigestParams::from_challenge(challenge) {
            let mut params = self
                .params
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            if params.nonce != fresh.nonce {
                self.nc.store(0, Ordering::SeqCst);
            }
            *params = fresh;
        }
    }
}

/// Compute the digest response hash according to RFC 7616.
/// `qop` carries the nonce count and client nonce when qop=auth is in use.
fn compute_digest_response(
    algorithm: DigestAlgorithm,
    username: &str,
    realm: &str,
    password: &str,
    nonce: &str,
    qop: Option<(u32, &str)>,
    method: &str,
    uri: &str,
) -> String {
    let ha1 = hash(algorithm, &format!("{}:{}:{}", username, realm, password));
    let ha2 = hash(algorithm, &format!("{}:{}", method, uri));

    match qop {
        Some((nc, cnonce)) => hash(
            algorithm,
            &format!("{}:{}:{:08x}:{}:auth:{}", ha1, nonce, nc, cnonce, ha2),
        ),
        None => hash(algorithm, &format!("{}:{}:{}", ha1, nonce, ha2)),
    }
}

/// Hash a string using the specified algorithm
fn hash(algorithm: DigestAlgorithm, data: &str) -> String {
    use sha2::Digest;

    match algorithm {
        DigestAlgorithm::MD5 => hex::encode(md5_digest::Md5::digest(data.as_bytes())),
        DigestAlgorithm::SHA256 => hex::encode(sha2::Sha256::digest(data.as_bytes())),
        DigestAlgorithm::SHA512_256 => hex::encode(sha2::Sha512_256::digest(data.as_bytes())),
    }
}

/// Generate a random client nonce
fn generate_cnonce() -> String {
    use rand::Rng;
    let bytes: [u8; 16] = rand::rng().random();
    hex::encode(bytes)
}
