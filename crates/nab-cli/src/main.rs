//! nab binary: composes collaborators and supervises account sessions.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tokio::sync::mpsc;
use tracing::info;

use nab_cli::{init_tracing, load_account_credentials, Cli};
use nab_engine::{run_session_supervisor, SessionRuntimeConfig, SupervisedSession};
use nab_gateway::{run_file_ingress_pump, GatewayFileIngress, GatewaySender, JsonlGatewaySender};
use nab_identify::{HttpSpeciesIdentifier, SpeciesIdentifier};
use nab_species::load_species_index;
use nab_verify::{ChallengeSolver, HttpChallengeSolver};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();
    run(cli).await
}

async fn run(cli: Cli) -> Result<()> {
    let credentials = load_account_credentials(&cli.credentials_file)?;
    let species = Arc::new(load_species_index(&cli.species_data)?);

    let identify_timeout = Duration::from_millis(cli.identify_timeout_ms);
    let solve_timeout = Duration::from_millis(cli.solve_timeout_ms);
    let identifier: Arc<dyn SpeciesIdentifier> = Arc::new(
        HttpSpeciesIdentifier::new(cli.identify_url.clone(), identify_timeout)
            .context("failed to build identify client")?,
    );
    let solver: Arc<dyn ChallengeSolver> = Arc::new(
        HttpChallengeSolver::new(cli.solver_url.clone(), solve_timeout)
            .context("failed to build solver client")?,
    );

    let mut sessions = Vec::new();
    let mut pumps = Vec::new();
    for credential in &credentials {
        let account_dir = cli.state_dir.join(credential.account_id.to_string());
        std::fs::create_dir_all(&account_dir)
            .with_context(|| format!("failed to create {}", account_dir.display()))?;

        let (inbound_tx, inbound_rx) = mpsc::channel(cli.inbound_queue_capacity);
        pumps.push(tokio::spawn(run_file_ingress_pump(
            GatewayFileIngress::new(account_dir.join("inbound-events.jsonl")),
            inbound_tx,
            Duration::from_millis(cli.ingress_poll_interval_ms),
        )));

        let sender: Arc<dyn GatewaySender> =
            Arc::new(JsonlGatewaySender::new(account_dir.join("outbound-events.jsonl")));
        sessions.push(SupervisedSession {
            config: SessionRuntimeConfig {
                account_id: credential.account_id,
                owner_id: cli.owner_id,
                state_path: account_dir.join("state.json"),
                identify_timeout,
                solve_timeout,
                sender,
                identifier: Arc::clone(&identifier),
                solver: Arc::clone(&solver),
                species: Arc::clone(&species),
            },
            inbound: inbound_rx,
        });
    }

    info!(
        "nab starting: sessions={} state_dir={} species_records={}",
        sessions.len(),
        cli.state_dir.display(),
        species.len()
    );

    let mut supervisor = tokio::spawn(run_session_supervisor(sessions));
    let terminations = tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("nab shutdown requested");
            for pump in &pumps {
                pump.abort();
            }
            supervisor.await.context("session supervisor task failed")?
        }
        joined = &mut supervisor => {
            for pump in &pumps {
                pump.abort();
            }
            joined.context("session supervisor task failed")?
        }
    };

    let failed = terminations
        .iter()
        .filter(|termination| !termination.is_clean())
        .count();
    info!(
        "nab stopped: sessions={} failed={}",
        terminations.len(),
        failed
    );
    if failed > 0 {
        bail!("{failed} session(s) terminated with errors");
    }
    Ok(())
}
