//! Main execution logic for the command line

use clap::Parser;
use dialoguer::console::Term;
use dialoguer::Password;
use reqwest::blocking::Response;
use reqwest::Method;
use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::auth::{AuthManager, AuthStatus, ConsoleUi, Credentials, FixedUi, UserInterface};
use crate::cli::Args;
use crate::client::{Redirector, ReqwestTransport, TransportOptions};
use crate::config::{resolve_schemes, Config};
use crate::errors::{AuthError, Result};
use crate::status::ExitStatus;

/// Environment variable holding a tracing filter directive
pub const LOG_ENV: &str = "AUTHPULSE_LOG";

/// Main entry point for the CLI.
///
/// Parses arguments, loads configuration and either fetches the URL or
/// runs an authcheck probe against it.
pub fn run(args: Vec<String>) -> ExitStatus {
    let parsed = match Args::try_parse_from(&args) {
        Ok(args) => args,
        Err(e) => {
            e.print().ok();
            return if e.kind() == clap::error::ErrorKind::DisplayHelp
                || e.kind() == clap::error::ErrorKind::DisplayVersion {
                ExitStatus::Success
            } else {
                ExitStatus::Error
            };
        }
    };

    init_logging(parsed.verbose);

    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("authpulse: error: {}", e);
            return ExitStatus::Error;
        }
    };
    debug!(config_dir = %config.config_dir.display(), "Loaded configuration");

    match execute(&parsed, &config) {
        Ok(status) => status,
        Err(e) => {
            eprintln!("authpulse: error: {}", e);
            ExitStatus::Error
        }
    }
}

/// Install a stderr subscriber. `AUTHPULSE_LOG` wins over `-v` flags.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("authpulse={}", level)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn execute(args: &Args, config: &Config) -> Result<ExitStatus> {
    let url = Url::parse(&args.url)?;

    // CLI flags override config values
    let schemes = if args.schemes.is_empty() {
        config.build_schemes()?
    } else {
        resolve_schemes(&args.schemes)?
    };
    let timeout = match args.timeout {
        Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
        Some(secs) => return Err(AuthError::Config(format!("Invalid timeout: {}", secs))),
        None => config.timeout,
    };
    let max_redirects = args.max_redirects.unwrap_or(config.max_redirects);

    let transport = ReqwestTransport::new(&TransportOptions {
        timeout,
        user_agent: config.user_agent.clone(),
    })?;
    let redirector = if args.no_follow {
        Redirector::NoRedirect
    } else {
        Redirector::standard()
    };
    let manager = AuthManager::new(transport, Some(build_ui(args)?), schemes, redirector)
        .with_max_redirects(max_redirects);

    if args.authcheck {
        let status = manager.authcheck(&url, args.head, args.force_login)?;
        print_auth_status(&status)?;
        return Ok(ExitStatus::Success);
    }

    let method = if args.head { Method::HEAD } else { Method::GET };
    let response = manager
        .make_connection(&url, &method, manager.redirector())?
        .into_connection();
    let status = response.status().as_u16();
    print_response(response, args.head)?;
    Ok(ExitStatus::from_http_status(status, args.check_status))
}

/// User interface selected by the auth flags
fn build_ui(args: &Args) -> Result<Arc<dyn UserInterface>> {
    if let Some(ref auth) = args.auth {
        let auth = auth.as_str();
        let credentials = if auth.contains(':') {
            Credentials::parse(auth)
        } else {
            // Username only, ask for the password once up front
            let password = Password::new()
                .with_prompt(format!("Password for {}", auth))
                .allow_empty_password(true)
                .interact_on(&Term::stderr())?;
            Credentials::new(auth, password)
        };
        return Ok(Arc::new(FixedUi::new(credentials)));
    }
    if args.no_prompt {
        return Ok(Arc::new(FixedUi::decline()));
    }
    Ok(Arc::new(ConsoleUi::new()))
}

fn print_auth_status(status: &AuthStatus) -> Result<()> {
    let mut out = io::stdout().lock();
    writeln!(out, "auth-type: {}", status.auth_type())?;
    writeln!(out, "authenticated: {}", status.is_authenticated())?;
    if let Some(id) = status.authenticated_id() {
        writeln!(out, "auth-id: {}", id)?;
    }
    Ok(())
}

/// Status line, headers and (unless `is_head`) the body
fn print_response(response: Response, is_head: bool) -> Result<()> {
    let mut out = io::stdout().lock();
    let status = response.status();
    writeln!(
        out,
        "{:?} {} {}",
        response.version(),
        status.as_u16(),
        status.canonical_reason().unwrap_or("")
    )?;
    for (name, value) in response.headers() {
        writeln!(out, "{}: {}", name, String::from_utf8_lossy(value.as_bytes()))?;
    }
    writeln!(out)?;

    if !is_head {
        let body = response.bytes()?;
        out.write_all(&body)?;
        if !body.ends_with(b"\n") && !body.is_empty() {
            writeln!(out)?;
        }
    }
    out.flush()?;
    Ok(())
}
