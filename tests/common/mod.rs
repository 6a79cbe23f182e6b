//! Common test utilities for authpulse integration tests
//!
//! This module provides shared test infrastructure including:
//! - An in-memory scripted transport and a recording user interface for
//!   driving `AuthManager` without a network
//! - CLI invocation helpers for tests against wiremock servers

use std::collections::{HashMap, VecDeque};
use std::io::{Cursor, Read};
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use authpulse::auth::{Credentials, Request, UserInterface};
use authpulse::client::{Connection, Transport};
use authpulse::errors::Result;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use url::Url;

/// A dummy URL that should never be resolved (for offline tests)
pub const DUMMY_URL: &str = "http://this-should.never-resolve";

// ============================================================================
// In-memory transport
// ============================================================================

/// Response produced by [`ScriptedTransport`]
#[derive(Debug, Clone)]
pub struct MockConn {
    url: Url,
    status: u16,
    headers: HeaderMap,
    body: Cursor<Vec<u8>>,
}

impl MockConn {
    pub fn new(url: &Url, status: u16) -> Self {
        Self {
            url: url.clone(),
            status,
            headers: HeaderMap::new(),
            body: Cursor::new(Vec::new()),
        }
    }

    pub fn body(mut self, body: &str) -> Self {
        self.body = Cursor::new(body.as_bytes().to_vec());
        self
    }

    /// Append a header (repeatable, so several challenges can be offered)
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name = HeaderName::from_bytes(name.as_bytes()).unwrap();
        self.headers.append(name, HeaderValue::from_str(value).unwrap());
        self
    }

    pub fn challenge(self, value: &str) -> Self {
        self.header("WWW-Authenticate", value)
    }
}

impl Connection for MockConn {
    fn url(&self) -> &Url {
        &self.url
    }

    fn status(&self) -> u16 {
        self.status
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl Read for MockConn {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.body.read(buf)
    }
}

type Handler = Box<dyn Fn(&Request) -> MockConn + Send + Sync>;

/// Transport that answers from a closure and records every request
pub struct ScriptedTransport {
    handler: Handler,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedTransport {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Request) -> MockConn + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// Authorization header of the n-th request, if any
    pub fn authorization(&self, index: usize) -> Option<String> {
        self.requests.lock().unwrap()[index]
            .headers
            .get(AUTHORIZATION)
            .map(|v| v.to_str().unwrap().to_string())
    }
}

impl Transport for ScriptedTransport {
    type Conn = MockConn;

    fn send(&self, request: Request) -> Result<MockConn> {
        let conn = (self.handler)(&request);
        self.requests.lock().unwrap().push(request);
        Ok(conn)
    }
}

/// Expected Basic Authorization header value
pub fn basic_header(user: &str, pass: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(format!("{}:{}", user, pass));
    format!("Basic {}", encoded)
}

/// Handler for a server where everything needs Basic credentials `user:pass`
/// in realm `realm`
pub fn basic_server(realm: &str, user: &str, pass: &str) -> impl Fn(&Request) -> MockConn + Send + Sync + 'static {
    let expected = basic_header(user, pass);
    let challenge = format!("Basic realm=\"{}\"", realm);
    move |req: &Request| {
        let authorized = req
            .headers
            .get(AUTHORIZATION)
            .is_some_and(|v| v.to_str().unwrap() == expected);
        if authorized {
            MockConn::new(&req.url, 200).body("protected")
        } else {
            MockConn::new(&req.url, 401).challenge(&challenge)
        }
    }
}

// ============================================================================
// Recording user interface
// ============================================================================

/// User interface that gives scripted answers and records what it was asked
pub struct RecordingUi {
    answers: Mutex<VecDeque<Option<Credentials>>>,
    prompts: Mutex<Vec<Vec<String>>>,
    messages: Mutex<Vec<Vec<String>>>,
    retry: bool,
}

impl RecordingUi {
    /// Answers are used in order; once they run out the user declines
    pub fn new(answers: Vec<Option<Credentials>>, retry: bool) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.into()),
            prompts: Mutex::new(Vec::new()),
            messages: Mutex::new(Vec::new()),
            retry,
        })
    }

    pub fn answering(user: &str, pass: &str) -> Arc<Self> {
        Self::new(vec![Some(Credentials::new(user, pass))], false)
    }

    pub fn declining() -> Arc<Self> {
        Self::new(Vec::new(), false)
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<Vec<String>> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<Vec<String>> {
        self.messages.lock().unwrap().clone()
    }
}

impl UserInterface for RecordingUi {
    fn read_credentials(&self, prompt: &[String]) -> Option<Credentials> {
        self.prompts.lock().unwrap().push(prompt.to_vec());
        self.answers.lock().unwrap().pop_front().flatten()
    }

    fn message(&self, lines: &[String]) {
        self.messages.lock().unwrap().push(lines.to_vec());
    }

    fn can_retry(&self) -> bool {
        self.retry
    }
}

pub fn url(s: &str) -> Url {
    Url::parse(s).unwrap()
}

// ============================================================================
// CLI helpers
// ============================================================================

/// Exit status codes matching the Rust application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitStatus {
    Success = 0,
    Error = 1,
}

impl From<i32> for ExitStatus {
    fn from(code: i32) -> Self {
        match code {
            0 => ExitStatus::Success,
            _ => ExitStatus::Error,
        }
    }
}

/// Result of running the CLI
#[derive(Debug)]
pub struct CliResponse {
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
    /// Exit status code
    pub exit_status: ExitStatus,
    /// Raw exit code
    pub exit_code: i32,
}

impl CliResponse {
    /// Check if stdout contains a substring
    pub fn contains(&self, needle: &str) -> bool {
        self.stdout.contains(needle)
    }

    /// Get the response body (everything after headers)
    pub fn body(&self) -> Option<&str> {
        self.stdout.find("\n\n").map(|pos| &self.stdout[pos + 2..])
    }
}

/// Mock environment for testing
pub struct MockEnvironment {
    /// Temporary config directory
    pub config_dir: TempDir,
    /// Environment variables to set
    pub env_vars: HashMap<String, String>,
}

impl Default for MockEnvironment {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEnvironment {
    /// Create a new mock environment
    pub fn new() -> Self {
        let config_dir = TempDir::new().expect("Failed to create temp config dir");
        Self {
            config_dir,
            env_vars: HashMap::new(),
        }
    }

    /// Set an environment variable
    pub fn set_env(&mut self, key: &str, value: &str) -> &mut Self {
        self.env_vars.insert(key.to_string(), value.to_string());
        self
    }

    /// Write `config.toml` into the config directory
    pub fn write_config(&self, content: &str) -> &Self {
        std::fs::write(self.config_path().join("config.toml"), content)
            .expect("Failed to write config file");
        self
    }

    /// Get the config directory path
    pub fn config_path(&self) -> PathBuf {
        self.config_dir.path().to_path_buf()
    }
}

/// Run the CLI with the given arguments
pub fn authpulse(args: &[&str]) -> CliResponse {
    authpulse_with_env(args, &MockEnvironment::new())
}

/// Run the CLI with the given arguments and environment
pub fn authpulse_with_env(args: &[&str], env: &MockEnvironment) -> CliResponse {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_authpulse"));

    // Add a timeout to prevent hanging tests (2s is plenty for mock servers)
    cmd.args(["--timeout", "2"]);
    cmd.args(args);

    cmd.env("AUTHPULSE_CONFIG_DIR", env.config_path());
    cmd.env_remove("AUTHPULSE_LOG");
    for (key, value) in &env.env_vars {
        cmd.env(key, value);
    }

    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());
    let output = cmd.output().expect("Failed to execute command");
    parse_output(output)
}

fn parse_output(output: Output) -> CliResponse {
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let exit_code = output.status.code().unwrap_or(1);

    CliResponse {
        stdout,
        stderr,
        exit_status: ExitStatus::from(exit_code),
        exit_code,
    }
}
