//! Parallel solve use case
//!
//! Fans a single task out to exactly three independent agent providers,
//! isolates per-agent failure, and feeds the settled results to the
//! consensus engine. There is no fail-fast short-circuit: a slow agent
//! might still be the tie-breaker, so the barrier waits for all three.

use crate::ports::agent_provider::{AgentProvider, SolveTask};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use trisolve_domain::{
    AgentResult, ConsensusEngine, ConsensusReason, ConsensusStatistics, DomainError,
    QuorumSettings, validate_decision,
};

/// Result of one parallel solve attempt
///
/// All three raw agent results are preserved for audit regardless of which
/// entered the vote; failed agents appear with `error` set and zero
/// confidence.
#[derive(Debug, Clone)]
pub struct SolveOutcome {
    pub success: bool,
    pub answer: Option<String>,
    pub confidence: f64,
    pub reason: ConsensusReason,
    /// Why the attempt failed, when it did
    pub failure: Option<String>,
    pub elapsed_ms: u64,
    pub agent_details: Vec<AgentResult>,
}

impl SolveOutcome {
    fn refused(failure: impl Into<String>, elapsed_ms: u64, details: Vec<AgentResult>) -> Self {
        Self {
            success: false,
            answer: None,
            confidence: 0.0,
            reason: ConsensusReason::NoConsensus,
            failure: Some(failure.into()),
            elapsed_ms,
            agent_details: details,
        }
    }
}

/// Use case for running one task against the full agent pool
pub struct ParallelSolveUseCase {
    providers: Vec<Arc<dyn AgentProvider>>,
    engine: Mutex<ConsensusEngine>,
    agent_timeout: Duration,
}

impl ParallelSolveUseCase {
    /// Create the use case. Fails unless exactly `quorum_size` providers
    /// are supplied; the pool size is part of the voting contract.
    pub fn new(
        providers: Vec<Arc<dyn AgentProvider>>,
        settings: QuorumSettings,
        agent_timeout_ms: u64,
    ) -> Result<Self, DomainError> {
        if providers.len() != settings.quorum_size {
            return Err(DomainError::InvalidInputCount {
                expected: settings.quorum_size,
                actual: providers.len(),
            });
        }
        Ok(Self {
            providers,
            engine: Mutex::new(ConsensusEngine::new(settings)),
            agent_timeout: Duration::from_millis(agent_timeout_ms),
        })
    }

    /// Dispatch the task to all agents, wait for every one to settle, and
    /// run the quorum vote over the results.
    pub async fn solve(
        &self,
        task: &SolveTask,
        token: &CancellationToken,
    ) -> Result<SolveOutcome, DomainError> {
        let started = Instant::now();
        info!("Dispatching task to {} agents", self.providers.len());

        let mut join_set = JoinSet::new();
        for provider in &self.providers {
            let provider = Arc::clone(provider);
            let task = task.clone();
            let agent_timeout = self.agent_timeout;

            join_set.spawn(async move {
                Self::run_agent(provider, &task, agent_timeout).await
            });
        }

        let mut results = tokio::select! {
            results = Self::collect_all(&mut join_set) => results,
            _ = token.cancelled() => {
                join_set.abort_all();
                return Err(DomainError::Cancelled("solve cancelled".into()));
            }
        };

        // A panicked agent task leaves a hole; fill it so the audit trail
        // always carries one entry per agent slot
        for provider in &self.providers {
            if !results.iter().any(|r| r.agent_id == provider.id()) {
                warn!("Agent {} task panicked", provider.id());
                results.push(AgentResult::failed(provider.id(), "agent task panicked", 0));
            }
        }

        results.sort_by(|a, b| a.agent_id.cmp(&b.agent_id));
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let valid = results.iter().filter(|r| r.is_valid()).count();

        if valid == 0 {
            warn!("All agents failed, refusing without vote");
            return Ok(SolveOutcome::refused("all agents failed", elapsed_ms, results));
        }

        let settings = self.settings();
        if valid < settings.agreement_size {
            // No pair can possibly form: refuse without invoking the
            // engine. With agreement_size valid results the full triple is
            // still forwarded; failed entries carry zero confidence and
            // can never join a pair, so they act as padding, not votes.
            info!(valid, "Insufficient valid agent results, refusing without vote");
            return Ok(SolveOutcome::refused(
                format!("insufficient valid agent results: {valid}"),
                elapsed_ms,
                results,
            ));
        }

        let decision = {
            let mut engine = self.engine.lock().unwrap_or_else(|e| e.into_inner());
            engine.decide(&results)?
        };

        if let Err(violations) = validate_decision(&decision, &settings) {
            error!(?violations, "Consensus decision failed invariant validation");
            return Err(DomainError::DecisionInvariantViolation(violations.join("; ")));
        }

        debug!(
            action = %decision.action,
            reason = %decision.reason,
            pattern = %decision.voting_pattern,
            "Consensus decision"
        );

        Ok(SolveOutcome {
            success: decision.is_submit(),
            answer: decision.answer.clone(),
            confidence: decision.confidence,
            reason: decision.reason,
            failure: (!decision.is_submit()).then(|| "no consensus".to_string()),
            elapsed_ms,
            agent_details: decision.agent_results,
        })
    }

    /// One isolated agent invocation: faults and timeouts are folded into
    /// a failed result and never disturb the sibling calls
    async fn run_agent(
        provider: Arc<dyn AgentProvider>,
        task: &SolveTask,
        agent_timeout: Duration,
    ) -> AgentResult {
        let agent_started = Instant::now();
        let id = provider.id().to_string();

        match tokio::time::timeout(agent_timeout, provider.attempt_solve(task)).await {
            Ok(Ok(answer)) => {
                let elapsed = agent_started.elapsed().as_millis() as u64;
                info!(agent = %id, elapsed_ms = elapsed, "Agent answered");
                AgentResult::solved(id, answer.answer, answer.confidence, elapsed, answer.method)
            }
            Ok(Err(e)) => {
                let elapsed = agent_started.elapsed().as_millis() as u64;
                warn!(agent = %id, error = %e, "Agent failed");
                AgentResult::failed(id, e.to_string(), elapsed)
            }
            Err(_) => {
                let elapsed = agent_started.elapsed().as_millis() as u64;
                warn!(agent = %id, timeout_ms = agent_timeout.as_millis() as u64, "Agent timed out");
                AgentResult::failed(id, "agent timeout", elapsed)
            }
        }
    }

    async fn collect_all(join_set: &mut JoinSet<AgentResult>) -> Vec<AgentResult> {
        let mut results = Vec::new();
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => warn!("Agent task join error: {}", e),
            }
        }
        results
    }

    fn settings(&self) -> QuorumSettings {
        *self
            .engine
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .settings()
    }

    /// Statistics over every decision this pool has produced
    pub fn consensus_statistics(&self) -> ConsensusStatistics {
        self.engine
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .statistics()
    }
}
