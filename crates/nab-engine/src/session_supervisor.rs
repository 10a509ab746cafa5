//! Concurrent session supervision with independent failure containment.

use tokio::sync::mpsc;
use tracing::{error, info};

use nab_gateway::IncomingMessage;

use crate::session_runtime::{run_session, SessionReport, SessionRuntimeConfig};

/// One session ready to be started: its config plus its inbound queue.
pub struct SupervisedSession {
    pub config: SessionRuntimeConfig,
    pub inbound: mpsc::Receiver<IncomingMessage>,
}

#[derive(Debug)]
/// How one session ended.
pub struct SessionTermination {
    pub account_id: u64,
    pub report: Option<SessionReport>,
    pub error: Option<String>,
}

impl SessionTermination {
    pub fn is_clean(&self) -> bool {
        self.error.is_none()
    }
}

/// Starts every session on its own task and waits for all of them.
///
/// Sessions share no mutable state; a session that fails or panics is
/// reported in its termination entry and never disturbs its siblings.
pub async fn run_session_supervisor(sessions: Vec<SupervisedSession>) -> Vec<SessionTermination> {
    let mut handles = Vec::new();
    for session in sessions {
        let account_id = session.config.account_id;
        let handle = tokio::spawn(run_session(session.config, session.inbound));
        handles.push((account_id, handle));
    }
    info!("session supervisor started: sessions={}", handles.len());

    let mut terminations = Vec::new();
    for (account_id, handle) in handles {
        let termination = match handle.await {
            Ok(Ok(report)) => SessionTermination {
                account_id,
                report: Some(report),
                error: None,
            },
            Ok(Err(session_error)) => {
                error!("session failed: account={account_id} detail={session_error:#}");
                SessionTermination {
                    account_id,
                    report: None,
                    error: Some(format!("{session_error:#}")),
                }
            }
            Err(join_error) => {
                error!("session task aborted: account={account_id} detail={join_error}");
                SessionTermination {
                    account_id,
                    report: None,
                    error: Some(join_error.to_string()),
                }
            }
        };
        terminations.push(termination);
    }
    terminations
}
