//! Framework-neutral view of an incoming request.
//!
//! The gate and the screening middleware work on a [`RequestContext`]
//! instead of axum types: token candidates, the resolved client IP, the
//! user agent, the decoded path and query, and an optional body snapshot.

use std::convert::Infallible;
use std::net::{IpAddr, SocketAddr};

use axum::extract::{ConnectInfo, FromRequestParts, Query};
use axum::http::{HeaderMap, header, request::Parts};
use axum_extra::extract::CookieJar;
use newsdesk_auth::{TokenSource, select_token};
use percent_encoding::percent_decode_str;

use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const TOKEN_QUERY_PARAM: &str = "token";

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub cookie_token: Option<String>,
    pub authorization: Option<String>,
    pub query_token: Option<String>,
    pub api_key: Option<String>,
    pub client_ip: Option<IpAddr>,
    pub user_agent: Option<String>,
    /// Percent-decoded request path.
    pub path: String,
    /// Decoded query pairs, in request order.
    pub query: Vec<(String, String)>,
    pub body: Option<String>,
}

impl RequestContext {
    /// Builds the context from request parts.
    ///
    /// With `trust_proxy` the client IP comes from the first
    /// `X-Forwarded-For` entry, then `X-Real-IP`; the socket address is
    /// the fallback (and the only source otherwise).
    pub fn from_parts(parts: &Parts, cookie_name: &str, trust_proxy: bool) -> Self {
        let headers = &parts.headers;
        let jar = CookieJar::from_headers(headers);

        let query = Query::<Vec<(String, String)>>::try_from_uri(&parts.uri)
            .map(|Query(pairs)| pairs)
            .unwrap_or_default();
        let query_token = query
            .iter()
            .find(|(k, _)| k == TOKEN_QUERY_PARAM)
            .map(|(_, v)| v.clone());

        let socket_ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let client_ip = if trust_proxy {
            forwarded_ip(headers).or(socket_ip)
        } else {
            socket_ip
        };

        Self {
            cookie_token: jar.get(cookie_name).map(|c| c.value().to_string()),
            authorization: header_str(headers, header::AUTHORIZATION.as_str()),
            query_token,
            api_key: header_str(headers, API_KEY_HEADER),
            client_ip,
            user_agent: header_str(headers, header::USER_AGENT.as_str()),
            path: percent_decode_str(parts.uri.path())
                .decode_utf8_lossy()
                .into_owned(),
            query,
            body: None,
        }
    }

    pub fn with_body(mut self, body: Option<String>) -> Self {
        self.body = body;
        self
    }

    /// The token to verify, with cookie > header > query precedence.
    pub fn token(&self) -> Option<(&str, TokenSource)> {
        select_token(
            self.cookie_token.as_deref(),
            self.authorization.as_deref(),
            self.query_token.as_deref(),
        )
    }

    /// Rate-limit key component for the client.
    pub fn ip_key(&self) -> String {
        self.client_ip
            .map_or_else(|| "unknown".to_string(), |ip| ip.to_string())
    }

    pub fn query_values(&self) -> impl Iterator<Item = &str> {
        self.query.iter().map(|(_, v)| v.as_str())
    }
}

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(
            parts,
            &state.jwt_config().cookie_name,
            state.security_config().trust_proxy,
        ))
    }
}

fn header_str(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn forwarded_ip(headers: &HeaderMap) -> Option<IpAddr> {
    header_str(headers, "x-forwarded-for")
        .and_then(|v| v.split(',').next().and_then(|ip| ip.trim().parse().ok()))
        .or_else(|| header_str(headers, "x-real-ip").and_then(|v| v.parse().ok()))
}
