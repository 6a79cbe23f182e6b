//! Results of an authcheck probe

use std::fmt;

/// Header carrying the authenticated user ID on authcheck responses
pub const AUTHENTICATED_ID_HEADER: &str = "X-VO-Authenticated";

/// How an endpoint treats authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthType {
    /// Anonymous access only; no challenge offered
    None,
    /// Both anonymous and authenticated access accepted
    Optional,
    /// Anonymous access refused
    Required,
    /// The probe did not yield a recognisable answer
    Unknown,
}

impl AuthType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthType::None => "none",
            AuthType::Optional => "optional",
            AuthType::Required => "required",
            AuthType::Unknown => "unknown",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authentication state established for an authcheck endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthStatus {
    auth_type: AuthType,
    is_authenticated: bool,
    authenticated_id: Option<String>,
}

impl AuthStatus {
    /// Status for a resource that does not involve HTTP authentication
    pub const NO_AUTH: AuthStatus = AuthStatus {
        auth_type: AuthType::None,
        is_authenticated: false,
        authenticated_id: None,
    };

    /// Status carrying only the endpoint's authentication type
    pub fn new(auth_type: AuthType) -> Self {
        Self {
            auth_type,
            is_authenticated: false,
            authenticated_id: None,
        }
    }

    pub fn with_identity(auth_type: AuthType, is_authenticated: bool, authenticated_id: Option<String>) -> Self {
        Self {
            auth_type,
            is_authenticated,
            authenticated_id,
        }
    }

    pub fn auth_type(&self) -> AuthType {
        self.auth_type
    }

    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }

    /// User ID reported by the server, if any
    pub fn authenticated_id(&self) -> Option<&str> {
        self.authenticated_id.as_deref()
    }
}

impl fmt::Display for AuthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "auth-type: {}", self.auth_type)?;
        write!(f, ", authenticated: {}", self.is_authenticated)?;
        if let Some(ref id) = self.authenticated_id {
            write!(f, ", id: {}", id)?;
        }
        Ok(())
    }
}
