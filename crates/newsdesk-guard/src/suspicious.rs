//! Per-IP record of flagged requests and the set of blocked IPs.
//!
//! Every flagged event is appended to the IP's history, of which only the
//! most recent `history` entries are kept. Once the retained history holds
//! `threshold` or more events the IP is blocked, and stays blocked until an
//! administrator lifts it.

use std::collections::VecDeque;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use newsdesk_config::SecurityConfig;
use newsdesk_core::Clock;
use serde::Serialize;
use tracing::warn;

use crate::signatures::{Finding, ThreatKind};

#[derive(Debug, Clone, PartialEq, Eq)]
struct SuspiciousEvent {
    kind: ThreatKind,
    at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockedIp {
    pub ip: IpAddr,
    pub blocked_at: DateTime<Utc>,
    /// Kind of the event that tipped the IP over the threshold.
    pub reason: ThreatKind,
    pub events: usize,
}

pub struct SuspiciousActivityTracker {
    threshold: usize,
    history: usize,
    clock: Arc<dyn Clock>,
    events: DashMap<IpAddr, VecDeque<SuspiciousEvent>>,
    blocked: DashMap<IpAddr, BlockedIp>,
}

impl fmt::Debug for SuspiciousActivityTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuspiciousActivityTracker")
            .field("threshold", &self.threshold)
            .field("history", &self.history)
            .field("blocked", &self.blocked.len())
            .finish_non_exhaustive()
    }
}

impl SuspiciousActivityTracker {
    pub fn new(threshold: usize, history: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            threshold: threshold.max(1),
            history: history.max(1),
            clock,
            events: DashMap::new(),
            blocked: DashMap::new(),
        }
    }

    pub fn from_config(config: &SecurityConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config.suspicious_threshold, config.suspicious_history, clock)
    }

    pub fn is_blocked(&self, ip: &IpAddr) -> bool {
        self.blocked.contains_key(ip)
    }

    /// Records each finding as one event. Returns `true` if this call
    /// moved the IP into the blocked set.
    pub fn record(&self, ip: IpAddr, findings: &[Finding]) -> bool {
        if findings.is_empty() {
            return false;
        }
        let now = self.clock.now();

        let retained = {
            let mut history = self.events.entry(ip).or_default();
            for finding in findings {
                history.push_back(SuspiciousEvent {
                    kind: finding.kind,
                    at: now,
                });
                while history.len() > self.history {
                    history.pop_front();
                }
            }
            history.len()
        };

        if retained < self.threshold || self.is_blocked(&ip) {
            return false;
        }

        let reason = findings.last().map_or(ThreatKind::Scanner, |f| f.kind);
        warn!(%ip, events = retained, %reason, "blocking IP after repeated suspicious requests");
        self.blocked.insert(
            ip,
            BlockedIp {
                ip,
                blocked_at: now,
                reason,
                events: retained,
            },
        );
        true
    }

    /// Lifts a block and forgets the IP's history. Returns whether it was blocked.
    pub fn unblock(&self, ip: &IpAddr) -> bool {
        self.events.remove(ip);
        self.blocked.remove(ip).is_some()
    }

    pub fn blocked(&self) -> Vec<BlockedIp> {
        let mut list: Vec<BlockedIp> = self.blocked.iter().map(|e| e.value().clone()).collect();
        list.sort_by_key(|b| b.blocked_at);
        list
    }

    /// Number of retained events for `ip`.
    pub fn event_count(&self, ip: &IpAddr) -> usize {
        self.events.get(ip).map_or(0, |h| h.len())
    }

    /// Timestamp of the newest retained event for `ip`.
    pub fn last_event_at(&self, ip: &IpAddr) -> Option<DateTime<Utc>> {
        self.events.get(ip).and_then(|h| h.back().map(|e| e.at))
    }
}
