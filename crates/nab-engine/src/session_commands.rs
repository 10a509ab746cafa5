//! Administrative command surface for one session.
//!
//! Commands arrive as ordinary gateway messages whose content starts with the
//! session's own mention prefix. Token batches are validated per token:
//! invalid tokens produce their own reply line and never abort the rest of
//! the batch.

use crate::session_state_store::AccountConfig;
use crate::session_verification::VerificationState;

/// Languages the platform recognizes for alternate species names.
pub const RECOGNIZED_LANGUAGES: [&str; 4] = ["english", "french", "german", "japanese"];

#[derive(Debug, Clone, PartialEq, Eq)]
/// Parsed administrative command.
pub enum SessionCommand {
    Ping,
    ChannelAdd { tokens: Vec<String> },
    ChannelRemove { tokens: Vec<String> },
    LanguageAdd { tokens: Vec<String> },
    LanguageRemove { tokens: Vec<String> },
    Config,
    Invalid { message: String },
}

pub fn session_command_usage() -> String {
    [
        "Supported commands:",
        "- `ping`",
        "- `channeladd <channel_id>...`",
        "- `channelremove <channel_id>...`",
        "- `languageadd <language>...`",
        "- `languageremove <language>...`",
        "- `config`",
    ]
    .join("\n")
}

/// Parses `content` as a command addressed to `self_id`.
///
/// Returns `None` when the message is not addressed to the session at all;
/// unknown or malformed command text yields `Invalid` so the caller can
/// reply with usage instead of staying silent.
pub fn parse_session_command(content: &str, self_id: u64) -> Option<SessionCommand> {
    let trimmed = content.trim();
    let prefix = format!("<@{self_id}>");
    let rest = trimmed.strip_prefix(&prefix)?.trim();
    if rest.is_empty() {
        return Some(SessionCommand::Invalid {
            message: session_command_usage(),
        });
    }

    let mut pieces = rest.split_whitespace();
    let command = pieces.next().unwrap_or_default();
    let tokens = pieces.map(str::to_string).collect::<Vec<String>>();

    let parsed = match command {
        "ping" => SessionCommand::Ping,
        "config" => {
            if tokens.is_empty() {
                SessionCommand::Config
            } else {
                SessionCommand::Invalid {
                    message: "Usage: config".to_string(),
                }
            }
        }
        "channeladd" => {
            if tokens.is_empty() {
                SessionCommand::Invalid {
                    message: "You must provide at least one channel ID. Separate multiple IDs with spaces.".to_string(),
                }
            } else {
                SessionCommand::ChannelAdd { tokens }
            }
        }
        "channelremove" => {
            if tokens.is_empty() {
                SessionCommand::Invalid {
                    message: "You must provide at least one channel ID. Separate multiple IDs with spaces.".to_string(),
                }
            } else {
                SessionCommand::ChannelRemove { tokens }
            }
        }
        "languageadd" => {
            if tokens.is_empty() {
                SessionCommand::Invalid {
                    message: "You must provide at least one language. Separate multiple languages with spaces.".to_string(),
                }
            } else {
                SessionCommand::LanguageAdd { tokens }
            }
        }
        "languageremove" => {
            if tokens.is_empty() {
                SessionCommand::Invalid {
                    message: "You must provide at least one language. Separate multiple languages with spaces.".to_string(),
                }
            } else {
                SessionCommand::LanguageRemove { tokens }
            }
        }
        _ => SessionCommand::Invalid {
            message: session_command_usage(),
        },
    };
    Some(parsed)
}

/// Whitelists each valid channel token; one reply line per token.
pub fn apply_channel_add(config: &mut AccountConfig, tokens: &[String]) -> Vec<String> {
    let mut lines = Vec::new();
    for token in tokens {
        match parse_channel_token(token) {
            Some(channel_id) => {
                if config.whitelisted_channels.insert(channel_id) {
                    lines.push(format!("channel {channel_id} whitelisted"));
                } else {
                    lines.push(format!("channel {channel_id} is already whitelisted"));
                }
            }
            None => lines.push(format!("invalid channel id '{token}'")),
        }
    }
    lines
}

/// Removes each valid channel token from the whitelist; one line per token.
pub fn apply_channel_remove(config: &mut AccountConfig, tokens: &[String]) -> Vec<String> {
    let mut lines = Vec::new();
    for token in tokens {
        match parse_channel_token(token) {
            Some(channel_id) => {
                if config.whitelisted_channels.remove(&channel_id) {
                    lines.push(format!("channel {channel_id} removed from whitelist"));
                } else {
                    lines.push(format!("channel {channel_id} is not whitelisted"));
                }
            }
            None => lines.push(format!("invalid channel id '{token}'")),
        }
    }
    lines
}

/// Adds each recognized language token; one reply line per token.
pub fn apply_language_add(config: &mut AccountConfig, tokens: &[String]) -> Vec<String> {
    let mut lines = Vec::new();
    for token in tokens {
        match parse_language_token(token) {
            Some(language) => {
                if config.languages.contains(&language) {
                    lines.push(format!("language {language} is already added"));
                } else {
                    config.languages.push(language.clone());
                    lines.push(format!("language {language} added"));
                }
            }
            None => lines.push(format!("invalid language '{token}'")),
        }
    }
    lines
}

/// Removes each recognized language token; one reply line per token.
pub fn apply_language_remove(config: &mut AccountConfig, tokens: &[String]) -> Vec<String> {
    let mut lines = Vec::new();
    for token in tokens {
        match parse_language_token(token) {
            Some(language) => {
                if config.languages.contains(&language) {
                    config.languages.retain(|existing| existing != &language);
                    lines.push(format!("language {language} removed"));
                } else {
                    lines.push(format!("language {language} is not added"));
                }
            }
            None => lines.push(format!("invalid language '{token}'")),
        }
    }
    lines
}

fn parse_channel_token(token: &str) -> Option<u64> {
    match token.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(channel_id) => Some(channel_id),
    }
}

fn parse_language_token(token: &str) -> Option<String> {
    let normalized = token.to_lowercase();
    RECOGNIZED_LANGUAGES
        .contains(&normalized.as_str())
        .then_some(normalized)
}

/// Wraps per-token reply lines in the code-fence reply format.
pub fn render_command_reply(lines: &[String]) -> String {
    format!("```\n{}\n```", lines.join("\n"))
}

/// Renders the `config` reply: prefix, owner, lists, and verification state.
pub fn render_config_reply(
    account_id: u64,
    owner_id: u64,
    config: &AccountConfig,
    verification: VerificationState,
    last_solve_error: Option<&str>,
) -> String {
    let channels = if config.whitelisted_channels.is_empty() {
        "none".to_string()
    } else {
        config
            .whitelisted_channels
            .iter()
            .map(u64::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };
    let mut lines = vec![
        format!("prefix: <@{account_id}>"),
        format!("owner: {owner_id}"),
        format!("whitelisted channels: {channels}"),
        format!("languages: {}", config.languages.join(", ")),
        format!("verification: {}", verification.as_str()),
    ];
    if let Some(detail) = last_solve_error {
        lines.push(format!("last solve error: {detail}"));
    }
    render_command_reply(&lines)
}
