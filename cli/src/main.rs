//! CLI entrypoint for trisolve
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, bail};
use async_trait::async_trait;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use trisolve_application::{
    AgentProvider, ExecuteJobUseCase, JobEventSender, JobScheduler, ParallelSolveUseCase,
    ProviderAnswer, ProviderError, SolveTask, SubmitRequest,
};
use trisolve_domain::{JobId, JobKind, JobTarget, QuorumSettings};
use trisolve_infrastructure::{
    ConfigLoader, FileConfig, LogAlertSink, MarkerDetector, ProviderTaskKind,
    agent_slots_from_config, ledger_from_config,
};

#[derive(Parser)]
#[command(name = "trisolve", version, about = "Challenge-solving coordinator with three-agent quorum consensus")]
struct Cli {
    /// Path to a config file (overrides discovered configs)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Submit a solve job for a target URL and wait for the verdict
    Solve {
        /// Page the challenge lives on
        url: String,
        /// Challenge kind hint (e.g. "text", "image_grid")
        #[arg(long)]
        kind: Option<String>,
        /// Detect the challenge first, then solve what was found
        #[arg(long)]
        detect: bool,
        /// Dispatch priority, 0 (first) to 100 (last)
        #[arg(long, default_value_t = 50)]
        priority: i32,
        /// Per-job timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Run an offline demo round with scripted agents
    Demo,
    /// Show per-provider daily quota status
    Quota,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity level
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow::anyhow!(e))?;
    config.validate()?;

    match cli.command {
        Command::Solve {
            url,
            kind,
            detect,
            priority,
            timeout_ms,
        } => solve(&config, url, kind, detect, priority, timeout_ms).await,
        Command::Demo => demo(&config).await,
        Command::Quota => quota(&config),
    }
}

async fn solve(
    config: &FileConfig,
    url: String,
    kind: Option<String>,
    detect: bool,
    priority: i32,
    timeout_ms: Option<u64>,
) -> Result<()> {
    let ledger = Arc::new(Mutex::new(ledger_from_config(config)));
    let slots = agent_slots_from_config(config, Arc::clone(&ledger));
    let quorum = QuorumSettings::default();
    if slots.len() < quorum.quorum_size {
        bail!(
            "need {} configured providers under [providers.*], found {}",
            quorum.quorum_size,
            slots.len()
        );
    }
    let slots = slots.into_iter().take(quorum.quorum_size).collect();

    let job_kind = if detect {
        JobKind::DetectAndSolve
    } else {
        JobKind::Solve
    };
    let mut target = JobTarget::new(url);
    target.captcha_kind = kind;
    let mut request = SubmitRequest::new(job_kind, target).with_priority(priority);
    if let Some(timeout_ms) = timeout_ms {
        request = request.with_timeout_ms(timeout_ms);
    }

    run_one_job(config, slots, request).await
}

async fn demo(config: &FileConfig) -> Result<()> {
    println!("Running offline demo: three scripted agents, one text challenge");
    let slots: Vec<Arc<dyn AgentProvider>> = vec![
        Arc::new(DemoAgent::new("demo-a", "7X3K9", 0.97)),
        Arc::new(DemoAgent::new("demo-b", "7X3K9", 0.98)),
        Arc::new(DemoAgent::new("demo-c", "7X3K9", 0.96)),
    ];

    let target = JobTarget::new("https://demo.invalid/challenge");
    let request = SubmitRequest::new(JobKind::Solve, target);
    run_one_job(config, slots, request).await
}

fn quota(config: &FileConfig) -> Result<()> {
    let mut ledger = ledger_from_config(config);
    let statuses = ledger.status();
    if statuses.is_empty() {
        println!("No providers configured. Add [providers.*] tables to the config file.");
        return Ok(());
    }

    println!("{:<16} {:<8} {:>6} {:>10} {:>10}  available", "provider", "kind", "used", "limit", "remaining");
    for status in statuses {
        let kind = match status.kind {
            ProviderTaskKind::Text => "text",
            ProviderTaskKind::Vision => "vision",
            ProviderTaskKind::Both => "both",
        };
        let limit = status
            .rate_limit
            .map_or("unlimited".to_string(), |l| l.to_string());
        let remaining = status
            .remaining
            .map_or("-".to_string(), |r| r.to_string());
        println!(
            "{:<16} {:<8} {:>6} {:>10} {:>10}  {}",
            status.name, kind, status.requests_today, limit, remaining, status.available
        );
    }
    Ok(())
}

/// Wire the full stack, submit one job, and poll until it settles
async fn run_one_job(
    config: &FileConfig,
    slots: Vec<Arc<dyn AgentProvider>>,
    request: SubmitRequest,
) -> Result<()> {
    let solver = config.solver.to_params();
    let orchestrator = Arc::new(ParallelSolveUseCase::new(
        slots,
        QuorumSettings::default(),
        solver.agent_timeout_ms,
    )?);
    let executor = Arc::new(ExecuteJobUseCase::new(
        orchestrator,
        Arc::new(MarkerDetector::new()),
        solver.retry,
        JobEventSender::disabled(),
    ));
    let scheduler = Arc::new(JobScheduler::new(
        config.scheduler.to_params(),
        executor,
        Arc::new(LogAlertSink),
        JobEventSender::disabled(),
    ));
    scheduler.clone().start().await;

    let job_id = scheduler.submit(request).await?;
    info!(job = %job_id, "Job submitted, waiting for verdict");

    let snapshot = wait_for_verdict(&scheduler, &job_id).await?;
    scheduler.stop().await;

    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}

async fn wait_for_verdict(
    scheduler: &JobScheduler,
    job_id: &JobId,
) -> Result<trisolve_domain::JobSnapshot> {
    loop {
        let snapshot = scheduler.status(job_id).await?;
        if snapshot.status.is_terminal() {
            return Ok(snapshot);
        }
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

/// Scripted agent for the offline demo
struct DemoAgent {
    id: String,
    answer: String,
    confidence: f64,
}

impl DemoAgent {
    fn new(id: &str, answer: &str, confidence: f64) -> Self {
        Self {
            id: id.to_string(),
            answer: answer.to_string(),
            confidence,
        }
    }
}

#[async_trait]
impl AgentProvider for DemoAgent {
    fn id(&self) -> &str {
        &self.id
    }

    async fn attempt_solve(&self, _task: &SolveTask) -> Result<ProviderAnswer, ProviderError> {
        tokio::time::sleep(Duration::from_millis(150)).await;
        Ok(ProviderAnswer {
            answer: self.answer.clone(),
            confidence: self.confidence,
            method: "scripted".to_string(),
            raw: None,
        })
    }
}
