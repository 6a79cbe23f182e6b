//! Authentication handling
//!
//! Challenge/response negotiation (RFC 7235) with pluggable schemes:
//! - Basic authentication
//! - Digest authentication
//!
//! [`AuthManager`] ties it together: it parses `WWW-Authenticate`
//! challenges, asks a [`UserInterface`] for credentials and keeps the
//! resulting contexts in a [`ContextCache`] keyed by protection space.

pub mod basic;
pub mod cache;
pub mod challenge;
pub mod digest;
pub mod manager;
pub mod registry;
pub mod scheme;
pub mod space;
pub mod status;
pub mod ui;

pub use basic::BasicScheme;
pub use cache::{ContextCache, TestedContext};
pub use challenge::{parse_challenges, Challenge};
pub use digest::DigestScheme;
pub use manager::{AuthConnection, AuthManager, DEFAULT_MAX_REDIRECTS};
pub use registry::SchemeRegistry;
pub use scheme::{AuthContext, AuthScheme, ContextFactory, Request};
pub use space::ProtectionSpace;
pub use status::{AuthStatus, AuthType, AUTHENTICATED_ID_HEADER};
pub use ui::{ConsoleUi, Credentials, FixedUi, UserInterface};
