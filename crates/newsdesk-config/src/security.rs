//! Request-screening and account-protection settings.
//!
//! # Environment Variables
//!
//! - `TRUSTED_IPS`: comma-separated IPs that skip rate limiting and screening
//! - `MASTER_API_KEY`: key accepted in `X-API-Key` for service-to-service calls
//! - `SUSPICIOUS_THRESHOLD`: flagged events that block an IP (default: 5)
//! - `SUSPICIOUS_HISTORY`: flagged events retained per IP (default: 10)
//! - `ACCOUNT_LOCK_MAX_ATTEMPTS`: failed logins before an account locks (default: 5)
//! - `ACCOUNT_LOCK_MINUTES`: lock duration (default: 30)
//! - `REQUEST_TIMEOUT_SECS`: upper bound on request handling (default: 30)
//! - `MAX_BODY_BYTES`: largest request body accepted (default: 2 MiB)
//! - `MAX_SCAN_BODY_BYTES`: leading body bytes checked for attack signatures (default: 1 MiB)
//! - `TRUST_PROXY`: take the client IP from `X-Forwarded-For` / `X-Real-IP` (default: false)

use std::env;
use std::net::IpAddr;

use crate::env_or;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecurityConfig {
    pub trusted_ips: Vec<IpAddr>,
    pub master_api_key: Option<String>,
    pub suspicious_threshold: usize,
    pub suspicious_history: usize,
    pub max_failed_logins: u32,
    pub lock_minutes: i64,
    pub request_timeout_secs: u64,
    /// Largest request body, in bytes, accepted at all.
    pub max_body_bytes: usize,
    /// Leading body bytes checked for attack signatures.
    pub max_scan_body_bytes: usize,
    /// Resolve the client IP from proxy headers instead of the socket.
    pub trust_proxy: bool,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            trusted_ips: Vec::new(),
            master_api_key: None,
            suspicious_threshold: 5,
            suspicious_history: 10,
            max_failed_logins: 5,
            lock_minutes: 30,
            request_timeout_secs: 30,
            max_body_bytes: 2 * 1024 * 1024,
            max_scan_body_bytes: 1024 * 1024,
            trust_proxy: false,
        }
    }
}

impl SecurityConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            trusted_ips: parse_ip_list(&env::var("TRUSTED_IPS").unwrap_or_default()),
            master_api_key: env::var("MASTER_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            suspicious_threshold: env_or("SUSPICIOUS_THRESHOLD", defaults.suspicious_threshold),
            suspicious_history: env_or("SUSPICIOUS_HISTORY", defaults.suspicious_history),
            max_failed_logins: env_or("ACCOUNT_LOCK_MAX_ATTEMPTS", defaults.max_failed_logins),
            lock_minutes: env_or("ACCOUNT_LOCK_MINUTES", defaults.lock_minutes),
            request_timeout_secs: env_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs),
            max_body_bytes: env_or("MAX_BODY_BYTES", defaults.max_body_bytes),
            max_scan_body_bytes: env_or("MAX_SCAN_BODY_BYTES", defaults.max_scan_body_bytes),
            trust_proxy: env::var("TRUST_PROXY")
                .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
                .unwrap_or(defaults.trust_proxy),
        }
    }

    pub fn is_trusted(&self, ip: &IpAddr) -> bool {
        self.trusted_ips.contains(ip)
    }
}

/// Parses a comma-separated allowlist, skipping blanks and malformed entries.
pub fn parse_ip_list(raw: &str) -> Vec<IpAddr> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse().ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ip_list() {
        let ips = parse_ip_list(" 127.0.0.1, ::1 ,, not-an-ip,10.0.0.5");
        assert_eq!(ips.len(), 3);
        assert_eq!(ips[0], "127.0.0.1".parse::<IpAddr>().unwrap());
        assert_eq!(ips[1], "::1".parse::<IpAddr>().unwrap());
    }

    #[test]
    fn test_is_trusted() {
        let config = SecurityConfig {
            trusted_ips: parse_ip_list("10.0.0.1"),
            ..SecurityConfig::default()
        };
        assert!(config.is_trusted(&"10.0.0.1".parse().unwrap()));
        assert!(!config.is_trusted(&"10.0.0.2".parse().unwrap()));
    }

    #[test]
    fn test_defaults() {
        let config = SecurityConfig::default();
        assert_eq!(config.suspicious_threshold, 5);
        assert_eq!(config.suspicious_history, 10);
        assert!(config.master_api_key.is_none());
        assert!(config.max_scan_body_bytes <= config.max_body_bytes);
    }
}
