//! CLI argument models, credential loading, and bootstrap for the nab binary.

pub mod bootstrap;
pub mod cli_args;
pub mod credentials;

pub use bootstrap::init_tracing;
pub use cli_args::Cli;
pub use credentials::{load_account_credentials, AccountCredential};
