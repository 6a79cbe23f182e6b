//! HTTP client functionality

pub mod redirect;
pub mod transport;

// Re-exports
pub use redirect::{Redirector, STANDARD_REDIRECT_CODES};
pub use transport::{Connection, ReqwestTransport, Transport, TransportOptions, USER_AGENT_STRING};
