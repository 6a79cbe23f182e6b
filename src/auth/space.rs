//! Protection spaces (RFC 7235 section 2.2)
//!
//! A protection space is the canonical root URI of a server (scheme and
//! authority) together with the realm it advertised, if any. Two requests
//! sharing a protection space can share credentials.

use std::fmt;
use std::hash::{Hash, Hasher};
use url::Url;

use super::challenge::Challenge;

/// Identity key for credential reuse
#[derive(Debug, Clone)]
pub struct ProtectionSpace {
    scheme: String,
    authority: String,
    realm: Option<String>,
    canonical: String,
}

impl ProtectionSpace {
    /// Protection space for a URL with an optional realm
    pub fn new(url: &Url, realm: Option<&str>) -> Self {
        let scheme = url.scheme().to_ascii_lowercase();
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        // Url elides the port when it is the scheme's default
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host,
        };
        let realm = realm.map(String::from);
        let canonical = match realm {
            Some(ref r) => format!("{}://{}[{}]", scheme, authority, r),
            None => format!("{}://{}", scheme, authority),
        };
        Self {
            scheme,
            authority,
            realm,
            canonical,
        }
    }

    /// Protection space a challenge refers to when issued for `url`
    pub fn from_challenge(challenge: &Challenge, url: &Url) -> Self {
        Self::new(url, challenge.realm())
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn authority(&self) -> &str {
        &self.authority
    }

    pub fn realm(&self) -> Option<&str> {
        self.realm.as_deref()
    }

    /// Canonical `scheme://authority[realm]` form
    pub fn as_str(&self) -> &str {
        &self.canonical
    }
}

impl PartialEq for ProtectionSpace {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for ProtectionSpace {}

impl Hash for ProtectionSpace {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for ProtectionSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}
