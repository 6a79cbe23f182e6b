//! authpulse library interface
//!
//! HTTP challenge/response authentication negotiation (RFC 7235) with a
//! credential cache keyed by protection space.
//!
//! # Module Organization
//!
//! - [`auth`] - Challenges, schemes, context cache and the [`auth::AuthManager`]
//! - [`client`] - Transport and redirect handling
//! - [`config`] - Config file loading
//! - [`errors`] - Error types (AuthError, Result)
//! - [`status`] - Exit status codes (ExitStatus)
//! - [`core`] - Command-line execution logic

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod core;
pub mod errors;
pub mod status;
