//! Attack signature detection.
//!
//! Matching is substring-based over a normalized copy of the input
//! (lowercased, whitespace runs collapsed to one space). It is a tripwire
//! for noisy attacks and scanners, not a WAF.

use std::fmt;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ThreatKind {
    SqlInjection,
    Xss,
    Scanner,
}

impl ThreatKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatKind::SqlInjection => "sql_injection",
            ThreatKind::Xss => "xss",
            ThreatKind::Scanner => "scanner",
        }
    }
}

impl fmt::Display for ThreatKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where in the request a signature matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Path,
    Query,
    Body,
    UserAgent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub kind: ThreatKind,
    pub location: Location,
    pub pattern: &'static str,
}

const SQL_PATTERNS: &[&str] = &[
    "union select",
    "union all select",
    "' or '1'='1",
    "\" or \"1\"=\"1",
    "' or 1=1",
    " or 1=1--",
    "'; drop table",
    "; drop table",
    "drop table ",
    "; delete from",
    "; insert into",
    "xp_cmdshell",
    "information_schema",
    "pg_sleep(",
    "sleep(",
    "benchmark(",
    "waitfor delay",
];

const XSS_PATTERNS: &[&str] = &[
    "<script",
    "</script",
    "javascript:",
    "vbscript:",
    "onerror=",
    "onload=",
    "onmouseover=",
    "<iframe",
    "document.cookie",
    "eval(",
];

const SCANNER_AGENTS: &[&str] = &[
    "sqlmap", "nikto", "nmap", "masscan", "acunetix", "nessus", "dirbuster", "wpscan", "havij",
    "zgrab",
];

fn normalize(input: &str) -> String {
    input
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn first_match(haystack: &str, patterns: &'static [&'static str]) -> Option<&'static str> {
    patterns.iter().copied().find(|p| haystack.contains(p))
}

/// Checks one piece of request text for SQL-injection and XSS signatures.
pub fn scan_text(text: &str, location: Location) -> Vec<Finding> {
    if text.is_empty() {
        return Vec::new();
    }
    let normalized = normalize(text);
    let mut findings = Vec::new();
    if let Some(pattern) = first_match(&normalized, SQL_PATTERNS) {
        findings.push(Finding {
            kind: ThreatKind::SqlInjection,
            location,
            pattern,
        });
    }
    if let Some(pattern) = first_match(&normalized, XSS_PATTERNS) {
        findings.push(Finding {
            kind: ThreatKind::Xss,
            location,
            pattern,
        });
    }
    findings
}

/// Checks a user agent against known scanner tools.
pub fn scan_user_agent(user_agent: &str) -> Option<Finding> {
    let ua = user_agent.to_lowercase();
    first_match(&ua, SCANNER_AGENTS).map(|pattern| Finding {
        kind: ThreatKind::Scanner,
        location: Location::UserAgent,
        pattern,
    })
}

/// Scans the decoded path, every query value, the body snapshot and the
/// user agent. Each returned finding counts as one flagged event.
pub fn scan_request<'a>(
    path: &str,
    query_values: impl IntoIterator<Item = &'a str>,
    body: Option<&str>,
    user_agent: Option<&str>,
) -> Vec<Finding> {
    let mut findings = scan_text(path, Location::Path);
    for value in query_values {
        findings.extend(scan_text(value, Location::Query));
    }
    if let Some(body) = body {
        findings.extend(scan_text(body, Location::Body));
    }
    if let Some(finding) = user_agent.and_then(scan_user_agent) {
        findings.push(finding);
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sql_injection_in_query() {
        let findings = scan_request("/api/news", ["1 UNION   SELECT password FROM users"], None, None);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, ThreatKind::SqlInjection);
        assert_eq!(findings[0].location, Location::Query);
    }

    #[test]
    fn test_xss_in_body() {
        let findings = scan_request(
            "/api/comments",
            [] as [&str; 0],
            Some(r#"{"text":"<SCRIPT>alert(1)</script>"}"#),
            None,
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, ThreatKind::Xss);
    }

    #[test]
    fn test_scanner_user_agent() {
        let finding = scan_user_agent("sqlmap/1.7.2#stable (https://sqlmap.org)").unwrap();
        assert_eq!(finding.kind, ThreatKind::Scanner);
        assert!(scan_user_agent("Mozilla/5.0 (X11; Linux x86_64)").is_none());
    }

    #[test]
    fn test_clean_request() {
        let findings = scan_request(
            "/api/news/select-the-best-union-reps",
            ["election results", "page=2"],
            Some(r#"{"title":"Council drops table tennis funding"}"#),
            Some("Mozilla/5.0"),
        );
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn test_multiple_findings_each_count() {
        let findings = scan_request(
            "/api/search",
            ["' or 1=1", "<iframe src=x>"],
            None,
            Some("Nikto/2.5"),
        );
        assert_eq!(findings.len(), 3);
    }
}
