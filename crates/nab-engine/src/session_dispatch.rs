//! Response dispatcher: emits the catch command for a resolved spawn.

use anyhow::Result;

use nab_gateway::GatewaySender;

use crate::session_classifier::PLATFORM_BOT_USER_ID;

/// Renders the catch directive addressed to the platform bot.
pub fn render_catch_command(name: &str) -> String {
    format!("<@{PLATFORM_BOT_USER_ID}> c {name}")
}

/// Sends one catch command to the spawn's channel of origin.
///
/// Fire-and-forget: no acknowledgement is awaited beyond the sender handing
/// the request to the transport.
pub async fn dispatch_catch_command(
    sender: &dyn GatewaySender,
    channel_id: u64,
    name: &str,
) -> Result<()> {
    sender
        .send_message(channel_id, &render_catch_command(name))
        .await
}

#[cfg(test)]
mod tests {
    use nab_gateway::RecordingGatewaySender;

    use super::*;

    #[test]
    fn unit_render_catch_command_mentions_platform_bot() {
        assert_eq!(
            render_catch_command("raichu"),
            "<@716390085896962058> c raichu"
        );
    }

    #[tokio::test]
    async fn functional_dispatch_sends_to_channel_of_origin() {
        let sender = RecordingGatewaySender::new();
        dispatch_catch_command(&sender, 123, "evoli")
            .await
            .expect("dispatch");
        let sent = sender.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].channel_id, 123);
        assert_eq!(sent[0].content, "<@716390085896962058> c evoli");
    }
}
