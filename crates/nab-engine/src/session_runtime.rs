//! Single-session event loop: one account, one inbound queue, one consumer.
//!
//! The loop processes one event to completion per iteration; the identify
//! call is awaited inline (with its own deadline) while challenge solving
//! runs on a spawned task whose completion signal re-enters the loop through
//! the solver-outcome channel. Admin mutations and classification therefore
//! serialize without locks.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use nab_gateway::{GatewaySender, IncomingMessage};
use nab_identify::SpeciesIdentifier;
use nab_species::SpeciesIndex;
use nab_verify::ChallengeSolver;

use crate::session_classifier::{challenge_url_for, classify_message, MessageEvent};
use crate::session_commands::{
    apply_channel_add, apply_channel_remove, apply_language_add, apply_language_remove,
    parse_session_command, render_command_reply, render_config_reply, SessionCommand,
};
use crate::session_dispatch::dispatch_catch_command;
use crate::session_state_store::SessionStateStore;
use crate::session_verification::VerificationMachine;
use crate::species_pipeline::{resolve_spawn, SpawnOutcome};

#[derive(Clone)]
/// Everything one session runner needs; collaborators are shared read-only.
pub struct SessionRuntimeConfig {
    pub account_id: u64,
    pub owner_id: u64,
    pub state_path: PathBuf,
    pub identify_timeout: Duration,
    pub solve_timeout: Duration,
    pub sender: Arc<dyn GatewaySender>,
    pub identifier: Arc<dyn SpeciesIdentifier>,
    pub solver: Arc<dyn ChallengeSolver>,
    pub species: Arc<SpeciesIndex>,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// Running totals for one session's lifetime.
pub struct SessionReport {
    pub spawns_dispatched: usize,
    pub spawns_dropped_pending: usize,
    pub spawns_malformed: usize,
    pub identify_failures: usize,
    pub low_confidence_skips: usize,
    pub challenges_observed: usize,
    pub commands_handled: usize,
    pub send_failures: usize,
}

#[derive(Debug)]
enum SolveOutcome {
    Solved,
    Failed { detail: String },
}

/// Runs one session until its inbound queue closes.
pub async fn run_session(
    config: SessionRuntimeConfig,
    inbound: mpsc::Receiver<IncomingMessage>,
) -> Result<SessionReport> {
    let runtime = SessionRuntime::new(config)?;
    runtime.run(inbound).await
}

struct SessionRuntime {
    config: SessionRuntimeConfig,
    store: SessionStateStore,
    verification: VerificationMachine,
    last_solve_error: Option<String>,
    solve_tx: mpsc::Sender<SolveOutcome>,
    solve_rx: Option<mpsc::Receiver<SolveOutcome>>,
    report: SessionReport,
}

impl SessionRuntime {
    fn new(config: SessionRuntimeConfig) -> Result<Self> {
        let store = SessionStateStore::load(config.state_path.clone())?;
        let (solve_tx, solve_rx) = mpsc::channel(8);
        Ok(Self {
            config,
            store,
            verification: VerificationMachine::new(),
            last_solve_error: None,
            solve_tx,
            solve_rx: Some(solve_rx),
            report: SessionReport::default(),
        })
    }

    async fn run(mut self, mut inbound: mpsc::Receiver<IncomingMessage>) -> Result<SessionReport> {
        let mut solve_rx = self
            .solve_rx
            .take()
            .context("session solve channel already taken")?;
        info!(
            "session started: account={} state={}",
            self.config.account_id,
            self.config.state_path.display()
        );

        loop {
            tokio::select! {
                maybe_outcome = solve_rx.recv() => {
                    if let Some(outcome) = maybe_outcome {
                        self.handle_solve_outcome(outcome);
                    }
                }
                maybe_message = inbound.recv() => {
                    match maybe_message {
                        Some(message) => self.handle_message(message).await,
                        None => break,
                    }
                }
            }
        }

        self.store
            .save()
            .context("failed to flush session state on shutdown")?;
        info!(
            "session stopped: account={} dispatched={} dropped_pending={} malformed={} identify_failures={} low_confidence={} challenges={} commands={} send_failures={}",
            self.config.account_id,
            self.report.spawns_dispatched,
            self.report.spawns_dropped_pending,
            self.report.spawns_malformed,
            self.report.identify_failures,
            self.report.low_confidence_skips,
            self.report.challenges_observed,
            self.report.commands_handled,
            self.report.send_failures,
        );
        Ok(self.report)
    }

    async fn handle_message(&mut self, message: IncomingMessage) {
        if message.author_id == self.config.owner_id {
            if let Some(command) = parse_session_command(&message.content, self.config.account_id) {
                self.handle_command(command, message.channel_id).await;
                return;
            }
        }

        let event = classify_message(
            &message,
            &self.store.config().whitelisted_channels,
            self.config.account_id,
        );
        match event {
            MessageEvent::Spawn => self.handle_spawn(&message).await,
            MessageEvent::Challenge => self.handle_challenge(&message),
            MessageEvent::Ignored => {}
        }
    }

    async fn handle_command(&mut self, command: SessionCommand, channel_id: u64) {
        self.report.commands_handled += 1;
        let reply = match command {
            SessionCommand::Ping => "Pong!".to_string(),
            SessionCommand::ChannelAdd { tokens } => {
                let lines = apply_channel_add(self.store.config_mut(), &tokens);
                self.persist_config();
                render_command_reply(&lines)
            }
            SessionCommand::ChannelRemove { tokens } => {
                let lines = apply_channel_remove(self.store.config_mut(), &tokens);
                self.persist_config();
                render_command_reply(&lines)
            }
            SessionCommand::LanguageAdd { tokens } => {
                let lines = apply_language_add(self.store.config_mut(), &tokens);
                self.persist_config();
                render_command_reply(&lines)
            }
            SessionCommand::LanguageRemove { tokens } => {
                let lines = apply_language_remove(self.store.config_mut(), &tokens);
                self.persist_config();
                render_command_reply(&lines)
            }
            SessionCommand::Config => render_config_reply(
                self.config.account_id,
                self.config.owner_id,
                self.store.config(),
                self.verification.state(),
                self.last_solve_error.as_deref(),
            ),
            SessionCommand::Invalid { message } => message,
        };
        self.send_reply(channel_id, &reply).await;
    }

    async fn handle_spawn(&mut self, message: &IncomingMessage) {
        if !self.verification.is_verified() {
            self.report.spawns_dropped_pending += 1;
            debug!(
                "session dropped spawn while pending: account={} channel={}",
                self.config.account_id, message.channel_id
            );
            return;
        }

        let outcome = resolve_spawn(
            message,
            self.config.identifier.as_ref(),
            self.config.identify_timeout,
            self.config.species.as_ref(),
            &self.store.config().languages,
        )
        .await;

        match outcome {
            SpawnOutcome::Dispatch { name } => {
                let dispatched =
                    dispatch_catch_command(self.config.sender.as_ref(), message.channel_id, &name)
                        .await;
                match dispatched {
                    Ok(()) => {
                        self.report.spawns_dispatched += 1;
                        info!(
                            "session dispatched catch: account={} channel={} name={name}",
                            self.config.account_id, message.channel_id
                        );
                    }
                    Err(error) => {
                        self.report.send_failures += 1;
                        warn!(
                            "session catch send failed: account={} channel={} detail={error:#}",
                            self.config.account_id, message.channel_id
                        );
                    }
                }
            }
            SpawnOutcome::MalformedEvent => {
                self.report.spawns_malformed += 1;
                debug!(
                    "session dropped malformed spawn: account={} channel={}",
                    self.config.account_id, message.channel_id
                );
            }
            SpawnOutcome::IdentifyFailed { detail } => {
                self.report.identify_failures += 1;
                warn!(
                    "session abandoned spawn: account={} channel={} reason=identify_failed detail={detail}",
                    self.config.account_id, message.channel_id
                );
            }
            SpawnOutcome::LowConfidence { label, confidence } => {
                self.report.low_confidence_skips += 1;
                debug!(
                    "session skipped low-confidence spawn: account={} label={label} confidence={confidence}",
                    self.config.account_id
                );
            }
        }
    }

    fn handle_challenge(&mut self, message: &IncomingMessage) {
        self.report.challenges_observed += 1;
        let previous = self.verification.begin_challenge();
        info!(
            "session entered pending verification: account={} channel={} previous={}",
            self.config.account_id,
            message.channel_id,
            previous.as_str()
        );

        let solver = Arc::clone(&self.config.solver);
        let account_id = self.config.account_id;
        let solve_timeout = self.config.solve_timeout;
        let captcha_url = challenge_url_for(account_id);
        let outcome_tx = self.solve_tx.clone();
        tokio::spawn(async move {
            let outcome =
                match tokio::time::timeout(solve_timeout, solver.solve(account_id, &captcha_url))
                    .await
                {
                    Ok(Ok(())) => SolveOutcome::Solved,
                    Ok(Err(error)) => SolveOutcome::Failed {
                        detail: error.to_string(),
                    },
                    Err(_) => SolveOutcome::Failed {
                        detail: format!(
                            "solve call exceeded {}ms deadline",
                            solve_timeout.as_millis()
                        ),
                    },
                };
            let _ = outcome_tx.send(outcome).await;
        });
    }

    fn handle_solve_outcome(&mut self, outcome: SolveOutcome) {
        match outcome {
            SolveOutcome::Solved => {
                self.verification.complete_challenge();
                self.last_solve_error = None;
                info!(
                    "session verification restored: account={}",
                    self.config.account_id
                );
            }
            SolveOutcome::Failed { detail } => {
                self.last_solve_error = Some(detail.clone());
                warn!(
                    "session remains pending: account={} reason=solve_failed detail={detail}",
                    self.config.account_id
                );
            }
        }
    }

    fn persist_config(&mut self) {
        if let Err(error) = self.store.save() {
            warn!(
                "session state save failed: account={} detail={error:#}",
                self.config.account_id
            );
        }
    }

    async fn send_reply(&mut self, channel_id: u64, content: &str) {
        let sent = self.config.sender.send_message(channel_id, content).await;
        if let Err(error) = sent {
            self.report.send_failures += 1;
            warn!(
                "session reply send failed: account={} channel={channel_id} detail={error:#}",
                self.config.account_id
            );
        }
    }
}
