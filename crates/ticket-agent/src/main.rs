use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use coordination::{DecisionGate, KnowledgeBase, ResolutionReport, StaticKnowledgeBase, Ticket};
use tracing::{info, warn};

use ticket_agent::config::{check_endpoint, AgentConfig};
use ticket_agent::interactive::run_interactive;
use ticket_agent::orchestrator::{workflow_diagram, TicketResolver};

/// Resolve support tickets with a bounded draft/review loop.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Ticket as JSON: {"subject": "...", "description": "..."}.
    /// Without it, tickets are read interactively.
    ticket: Option<String>,

    /// TOML file overriding environment settings
    #[arg(long)]
    config: Option<PathBuf>,

    /// TOML knowledge catalog replacing the built-in one
    #[arg(long)]
    knowledge: Option<PathBuf>,

    /// Print the resolution workflow and exit
    #[arg(long, default_value_t = false)]
    workflow: bool,

    /// Check that the inference endpoint is reachable and exit
    #[arg(long, default_value_t = false)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AgentConfig::load(cli.config.as_deref())?;

    if cli.workflow {
        let gate = DecisionGate::with_config(config.gate)?;
        println!("{}", workflow_diagram(&gate));
        return Ok(ExitCode::SUCCESS);
    }

    if cli.check {
        let reachable = check_endpoint(&config.endpoint.url).await;
        println!(
            "{} {}",
            config.endpoint.url,
            if reachable { "reachable" } else { "unreachable" }
        );
        return Ok(if reachable {
            ExitCode::SUCCESS
        } else {
            ExitCode::FAILURE
        });
    }

    let knowledge: Arc<dyn KnowledgeBase> = match cli.knowledge {
        Some(ref path) => Arc::new(StaticKnowledgeBase::from_file(path)?),
        None => Arc::new(StaticKnowledgeBase::builtin()),
    };

    info!(
        url = %config.endpoint.url,
        model = %config.endpoint.model,
        threshold = config.gate.approval_threshold,
        max_attempts = config.gate.max_attempts,
        "Ticket agent starting"
    );
    if !check_endpoint(&config.endpoint.url).await {
        warn!(url = %config.endpoint.url, "Inference endpoint not reachable, agents will fall back");
    }

    let resolver = TicketResolver::from_config(&config, knowledge)?;

    let Some(payload) = cli.ticket else {
        run_interactive(&resolver).await?;
        return Ok(ExitCode::SUCCESS);
    };

    let ticket = match Ticket::from_json(&payload) {
        Ok(ticket) => ticket,
        Err(e) => {
            println!("{}", ResolutionReport::intake_error(&e).to_pretty_json()?);
            return Ok(ExitCode::from(2));
        }
    };

    let resolution = resolver.resolve(ticket).await?;
    println!("{}", resolution.report().to_pretty_json()?);
    Ok(ExitCode::SUCCESS)
}
