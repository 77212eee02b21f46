//! Agent provider adapters
//!
//! HTTP-backed agent slots plus the shared daily quota ledger. The
//! wiring helpers turn `[providers.*]` config tables into the three
//! agent slots the orchestrator expects.

pub mod http;
pub mod quota;

pub use http::HttpAgentProvider;
pub use quota::{ProviderTaskKind, QuotaLedger, QuotaStatus};

use crate::config::FileConfig;
use std::str::FromStr;
use std::sync::Arc;
use tokio::sync::Mutex;
use trisolve_application::AgentProvider;

/// Build the quota ledger from the config's provider tables
pub fn ledger_from_config(config: &FileConfig) -> QuotaLedger {
    let mut ledger = QuotaLedger::new();
    for (name, provider) in &config.providers {
        let kind = ProviderTaskKind::from_str(&provider.kind).unwrap_or(ProviderTaskKind::Text);
        let configured = std::env::var(&provider.api_key_env)
            .map(|k| !k.is_empty())
            .unwrap_or(false);
        ledger.register(name, kind, provider.priority, configured, provider.rate_limit);
    }
    ledger
}

/// Build one HTTP agent slot per configured provider, lowest priority
/// value first, sharing one quota ledger
pub fn agent_slots_from_config(
    config: &FileConfig,
    ledger: Arc<Mutex<QuotaLedger>>,
) -> Vec<Arc<dyn AgentProvider>> {
    let mut entries: Vec<_> = config.providers.iter().collect();
    entries.sort_by_key(|(name, p)| (p.priority, name.as_str().to_string()));
    entries
        .into_iter()
        .map(|(name, provider)| {
            Arc::new(HttpAgentProvider::from_config(
                name.clone(),
                provider,
                Arc::clone(&ledger),
            )) as Arc<dyn AgentProvider>
        })
        .collect()
}
