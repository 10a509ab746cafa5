//! Clap-backed flag definitions for the nab binary.

use std::path::PathBuf;

use clap::Parser;

fn parse_positive_u64(value: &str) -> Result<u64, String> {
    let parsed = value
        .parse::<u64>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

fn parse_positive_usize(value: &str) -> Result<usize, String> {
    let parsed = value
        .parse::<usize>()
        .map_err(|error| format!("failed to parse integer: {error}"))?;
    if parsed == 0 {
        return Err("value must be greater than 0".to_string());
    }
    Ok(parsed)
}

#[derive(Debug, Parser)]
#[command(
    name = "nab",
    about = "Concurrent gateway spawn auto-responder",
    version
)]
pub struct Cli {
    #[arg(
        long = "state-dir",
        env = "NAB_STATE_DIR",
        default_value = ".nab",
        help = "Directory holding per-account state files and event logs"
    )]
    pub state_dir: PathBuf,

    #[arg(
        long = "credentials-file",
        env = "NAB_CREDENTIALS_FILE",
        default_value = "credentials.json",
        help = "JSON file listing the account credentials to run sessions for"
    )]
    pub credentials_file: PathBuf,

    #[arg(
        long = "species-data",
        env = "NAB_SPECIES_DATA",
        default_value = "data.json",
        help = "JSON species data file used for localized name lookups"
    )]
    pub species_data: PathBuf,

    #[arg(
        long = "owner-id",
        env = "NAB_OWNER_ID",
        value_parser = parse_positive_u64,
        help = "User id allowed to issue administrative commands to every session"
    )]
    pub owner_id: u64,

    #[arg(
        long = "identify-url",
        env = "NAB_IDENTIFY_URL",
        default_value = "http://127.0.0.1:8091/identify",
        help = "Endpoint of the species identification service"
    )]
    pub identify_url: String,

    #[arg(
        long = "solver-url",
        env = "NAB_SOLVER_URL",
        default_value = "http://127.0.0.1:8092/solve",
        help = "Endpoint of the challenge-solving service"
    )]
    pub solver_url: String,

    #[arg(
        long = "identify-timeout-ms",
        env = "NAB_IDENTIFY_TIMEOUT_MS",
        default_value_t = 10_000,
        value_parser = parse_positive_u64,
        help = "Deadline for one identify call; the spawn event is abandoned past it"
    )]
    pub identify_timeout_ms: u64,

    #[arg(
        long = "solve-timeout-ms",
        env = "NAB_SOLVE_TIMEOUT_MS",
        default_value_t = 120_000,
        value_parser = parse_positive_u64,
        help = "Deadline for one solve call; the session stays pending past it"
    )]
    pub solve_timeout_ms: u64,

    #[arg(
        long = "inbound-queue-capacity",
        env = "NAB_INBOUND_QUEUE_CAPACITY",
        default_value_t = 256,
        value_parser = parse_positive_usize,
        help = "Bounded per-session inbound queue size; events past it are rejected"
    )]
    pub inbound_queue_capacity: usize,

    #[arg(
        long = "ingress-poll-interval-ms",
        env = "NAB_INGRESS_POLL_INTERVAL_MS",
        default_value_t = 500,
        value_parser = parse_positive_u64,
        help = "How often the ingress pump polls each inbound event log"
    )]
    pub ingress_poll_interval_ms: u64,
}
