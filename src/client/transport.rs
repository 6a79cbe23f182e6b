//! HTTP transport used by the negotiation engine
//!
//! The engine only needs to send a fully decorated request and look at the
//! status and headers of the answer; redirects are handled by the engine
//! itself, so transports must never follow them.

use reqwest::blocking::{Client, Response};
use reqwest::header::HeaderMap;
use std::time::Duration;
use url::Url;

use crate::auth::scheme::Request;
use crate::errors::Result;

pub const USER_AGENT_STRING: &str = concat!("authpulse/", env!("CARGO_PKG_VERSION"));

/// A response received from the transport
pub trait Connection {
    /// URL the request was sent to
    fn url(&self) -> &Url;

    fn status(&self) -> u16;

    fn headers(&self) -> &HeaderMap;
}

/// Sends requests and returns connections whose status is available
pub trait Transport: Send + Sync {
    type Conn: Connection;

    fn send(&self, request: Request) -> Result<Self::Conn>;
}

impl Connection for Response {
    fn url(&self) -> &Url {
        Response::url(self)
    }

    fn status(&self) -> u16 {
        Response::status(self).as_u16()
    }

    fn headers(&self) -> &HeaderMap {
        Response::headers(self)
    }
}

/// Transport configuration
#[derive(Debug, Clone)]
pub struct TransportOptions {
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for TransportOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            user_agent: USER_AGENT_STRING.to_string(),
        }
    }
}

/// Blocking reqwest transport
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(options: &TransportOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .user_agent(options.user_agent.clone())
            // Redirects are followed by the auth manager so that each hop
            // gets its own context lookup
            .redirect(reqwest::redirect::Policy::none())
            .referer(false);

        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }
}

impl Transport for ReqwestTransport {
    type Conn = Response;

    fn send(&self, request: Request) -> Result<Response> {
        let Request { url, method, headers } = request;
        let response = self
            .client
            .request(method, url)
            .headers(headers)
            .send()?;
        Ok(response)
    }
}
