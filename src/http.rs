//! Shared HTTP client construction policy.
//!
//! Search, mirror and transfer clients all share one builder so they agree on
//! user-agent, cookies, compression and proxy handling. Every client has a
//! connect timeout. Page clients ([`build_http_client`]) also cap the whole
//! request; transfer clients ([`build_transfer_client`]) instead cap each idle
//! read, so a long body that keeps arriving is never cut off.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::time::Duration;

use reqwest::{Client, ClientBuilder, Proxy};
use tracing::warn;

use crate::user_agent;

/// Default connect timeout for every client (seconds).
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;

/// Default request timeout for page fetches (seconds).
pub const DEFAULT_READ_TIMEOUT_SECS: u64 = 60;

/// Connect and read timeouts applied to a client.
///
/// `read_secs` is a whole-request deadline for page clients and a per-read
/// idle limit for transfer clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect_secs: u64,
    pub read_secs: u64,
}

/// How `read_secs` is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadDeadline {
    /// Whole request, connect through the last body byte.
    Total,
    /// Longest gap between two successful reads.
    Idle,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
            read_secs: DEFAULT_READ_TIMEOUT_SECS,
        }
    }
}

/// Builds a page client: `read_secs` bounds the whole request.
///
/// # Errors
///
/// Returns the underlying [`reqwest::Error`] when the builder rejects the
/// configuration.
pub(crate) fn build_http_client(timeouts: HttpTimeouts) -> Result<Client, reqwest::Error> {
    build_client(timeouts, ReadDeadline::Total)
}

/// Builds a transfer client: `read_secs` bounds each idle read, not the body.
///
/// # Errors
///
/// Returns the underlying [`reqwest::Error`] when the builder rejects the
/// configuration.
pub(crate) fn build_transfer_client(timeouts: HttpTimeouts) -> Result<Client, reqwest::Error> {
    build_client(timeouts, ReadDeadline::Idle)
}

fn build_client(timeouts: HttpTimeouts, deadline: ReadDeadline) -> Result<Client, reqwest::Error> {
    match try_build_client(timeouts, deadline, false) {
        Ok(client) => Ok(client),
        Err(BuildClientFailure::Panic) => {
            // Some sandboxed environments panic when querying system proxy
            // settings; env proxies still apply on the fallback path.
            warn!("HTTP client hit system proxy panic; using env-proxy fallback builder");
            match try_build_client(timeouts, deadline, true) {
                Ok(client) => Ok(client),
                Err(BuildClientFailure::Build(error)) => Err(error),
                Err(BuildClientFailure::Panic) => {
                    panic!("HTTP client builder panicked while applying env-proxy fallback")
                }
            }
        }
        Err(BuildClientFailure::Build(error)) => Err(error),
    }
}

enum BuildClientFailure {
    Panic,
    Build(reqwest::Error),
}

fn try_build_client(
    timeouts: HttpTimeouts,
    deadline: ReadDeadline,
    disable_system_proxy_lookup: bool,
) -> Result<Client, BuildClientFailure> {
    catch_unwind(AssertUnwindSafe(move || {
        let mut builder = base_builder(timeouts, deadline);
        if disable_system_proxy_lookup {
            builder = apply_env_proxy_fallback(builder.no_proxy());
        }
        builder.build().map_err(BuildClientFailure::Build)
    }))
    .map_err(|_| BuildClientFailure::Panic)?
}

fn base_builder(timeouts: HttpTimeouts, deadline: ReadDeadline) -> ClientBuilder {
    let read = Duration::from_secs(timeouts.read_secs);
    let builder = Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .user_agent(user_agent::default_user_agent())
        .cookie_store(true)
        .gzip(true);
    match deadline {
        ReadDeadline::Total => builder.timeout(read),
        ReadDeadline::Idle => builder.read_timeout(read),
    }
}

fn apply_env_proxy_fallback(mut builder: ClientBuilder) -> ClientBuilder {
    if let Some(proxy) = env_proxy_for_scheme("https")
        && let Ok(resolved) = Proxy::https(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    if let Some(proxy) = env_proxy_for_scheme("http")
        && let Ok(resolved) = Proxy::http(&proxy)
    {
        builder = builder.proxy(resolved);
    }
    builder
}

fn env_proxy_for_scheme(scheme: &str) -> Option<String> {
    match scheme {
        "https" => find_first_proxy_var(&["HTTPS_PROXY", "https_proxy", "ALL_PROXY", "all_proxy"]),
        "http" => find_first_proxy_var(&["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"]),
        _ => None,
    }
}

fn find_first_proxy_var(names: &[&str]) -> Option<String> {
    names.iter().find_map(|name| {
        std::env::var(name)
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    })
}
