//! Per-provider daily request ledger
//!
//! Each provider carries an optional daily request cap. Counters roll
//! over at local midnight; exhausted providers report unavailable until
//! the next day.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which task shapes a provider can handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderTaskKind {
    Text,
    Vision,
    Both,
}

impl ProviderTaskKind {
    /// Whether a provider of this kind can serve the requested kind
    pub fn handles(&self, requested: ProviderTaskKind) -> bool {
        matches!(
            (self, requested),
            (ProviderTaskKind::Both, _)
                | (ProviderTaskKind::Text, ProviderTaskKind::Text)
                | (ProviderTaskKind::Vision, ProviderTaskKind::Vision)
        )
    }
}

impl FromStr for ProviderTaskKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(ProviderTaskKind::Text),
            "vision" => Ok(ProviderTaskKind::Vision),
            "both" => Ok(ProviderTaskKind::Both),
            other => Err(format!("unknown provider kind: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
struct QuotaEntry {
    name: String,
    kind: ProviderTaskKind,
    priority: u8,
    configured: bool,
    rate_limit: Option<u32>,
    requests_today: u32,
    last_reset: NaiveDate,
}

/// Point-in-time quota view for one provider
#[derive(Debug, Clone, Serialize)]
pub struct QuotaStatus {
    pub name: String,
    pub kind: ProviderTaskKind,
    pub configured: bool,
    pub requests_today: u32,
    pub rate_limit: Option<u32>,
    /// None means uncapped
    pub remaining: Option<u32>,
    pub available: bool,
}

/// Daily usage ledger over all registered providers
#[derive(Debug, Default)]
pub struct QuotaLedger {
    entries: Vec<QuotaEntry>,
}

impl QuotaLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: ProviderTaskKind,
        priority: u8,
        configured: bool,
        rate_limit: Option<u32>,
    ) {
        self.entries.push(QuotaEntry {
            name: name.into(),
            kind,
            priority,
            configured,
            rate_limit,
            requests_today: 0,
            last_reset: Self::today(),
        });
    }

    /// Whether the provider is configured and under its daily cap
    pub fn can_use(&mut self, name: &str) -> bool {
        self.rollover(Self::today());
        self.entries
            .iter()
            .find(|e| e.name == name)
            .is_some_and(Self::entry_available)
    }

    /// Count one request against the provider's daily budget
    pub fn record_use(&mut self, name: &str) {
        self.rollover(Self::today());
        if let Some(entry) = self.entries.iter_mut().find(|e| e.name == name) {
            entry.requests_today += 1;
        }
    }

    /// Quota snapshot for every registered provider
    pub fn status(&mut self) -> Vec<QuotaStatus> {
        self.rollover(Self::today());
        self.entries
            .iter()
            .map(|e| QuotaStatus {
                name: e.name.clone(),
                kind: e.kind,
                configured: e.configured,
                requests_today: e.requests_today,
                rate_limit: e.rate_limit,
                remaining: e.rate_limit.map(|l| l.saturating_sub(e.requests_today)),
                available: Self::entry_available(e),
            })
            .collect()
    }

    /// First available provider for the requested kind, lowest priority
    /// value first; ties keep registration order
    pub fn recommended(&mut self, kind: ProviderTaskKind) -> Option<String> {
        self.rollover(Self::today());
        let mut candidates: Vec<&QuotaEntry> = self
            .entries
            .iter()
            .filter(|e| e.kind.handles(kind) && Self::entry_available(e))
            .collect();
        candidates.sort_by_key(|e| e.priority);
        candidates.first().map(|e| e.name.clone())
    }

    fn entry_available(entry: &QuotaEntry) -> bool {
        if !entry.configured {
            return false;
        }
        entry
            .rate_limit
            .is_none_or(|limit| entry.requests_today < limit)
    }

    fn rollover(&mut self, today: NaiveDate) {
        for entry in &mut self.entries {
            if today > entry.last_reset {
                entry.requests_today = 0;
                entry.last_reset = today;
            }
        }
    }

    fn today() -> NaiveDate {
        Local::now().date_naive()
    }
}
