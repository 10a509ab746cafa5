//! Pure spawn/challenge classification over inbound gateway messages.

use std::collections::BTreeSet;

use nab_gateway::IncomingMessage;

/// User id of the platform bot whose messages carry spawn and challenge events.
pub const PLATFORM_BOT_USER_ID: u64 = 716390085896962058;

/// Phrase a spawn embed title carries, matched case-insensitively.
pub const SPAWN_EMBED_TITLE_MARKER: &str = "wild pokémon has appeared";

const CHALLENGE_URL_PREFIX: &str = "https://verify.poketwo.net/captcha/";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Classification result for one inbound message.
pub enum MessageEvent {
    Spawn,
    Challenge,
    Ignored,
}

/// Returns the verification challenge URL addressed to `account_id`.
pub fn challenge_url_for(account_id: u64) -> String {
    format!("{CHALLENGE_URL_PREFIX}{account_id}")
}

/// Classifies `message` for the session owning `self_id`.
///
/// Spawn and challenge both require the platform-bot author and a
/// whitelisted channel; the content patterns themselves are disjoint, so a
/// message matches at most one event. No side effects.
pub fn classify_message(
    message: &IncomingMessage,
    whitelist: &BTreeSet<u64>,
    self_id: u64,
) -> MessageEvent {
    if message.author_id != PLATFORM_BOT_USER_ID || !whitelist.contains(&message.channel_id) {
        return MessageEvent::Ignored;
    }
    let spawn_title = message
        .embeds
        .first()
        .map(|embed| embed.title.to_lowercase().contains(SPAWN_EMBED_TITLE_MARKER))
        .unwrap_or(false);
    if spawn_title {
        return MessageEvent::Spawn;
    }
    if message.content.contains(&challenge_url_for(self_id)) {
        return MessageEvent::Challenge;
    }
    MessageEvent::Ignored
}
