use serenity::http::Http;
use serenity::model::id::{ChannelId, MessageId};
use std::sync::Arc;
use std::time::Duration;

/// How long a command-error notice stays in the channel.
pub const NOTICE_LINGER: Duration = Duration::from_secs(5);

/// A place a short-lived notice can be posted to and removed from.
#[allow(async_fn_in_trait)]
pub trait NoticeChannel {
    type MessageId: Copy + Send;

    async fn send(&self, content: &str) -> Result<Self::MessageId, serenity::Error>;
    async fn delete(&self, message_id: Self::MessageId) -> Result<(), serenity::Error>;
}

pub struct DiscordChannel {
    http: Arc<Http>,
    channel_id: ChannelId,
}

impl DiscordChannel {
    pub fn new(http: Arc<Http>, channel_id: ChannelId) -> Self {
        Self { http, channel_id }
    }
}

impl NoticeChannel for DiscordChannel {
    type MessageId = MessageId;

    async fn send(&self, content: &str) -> Result<MessageId, serenity::Error> {
        let message = self.channel_id.say(&*self.http, content).await?;
        Ok(message.id)
    }

    async fn delete(&self, message_id: MessageId) -> Result<(), serenity::Error> {
        self.channel_id.delete_message(&*self.http, message_id).await
    }
}

/// Posts `content`, waits `linger`, then deletes it. Failures are logged and
/// dropped; a notice must never take a handler down.
pub async fn post_transient<C: NoticeChannel>(channel: &C, content: &str, linger: Duration) {
    let message_id = match channel.send(content).await {
        Ok(id) => id,
        Err(e) => {
            tracing::error!("Failed to send notice: {:?}", e);
            return;
        }
    };

    tokio::time::sleep(linger).await;

    if let Err(e) = channel.delete(message_id).await {
        tracing::warn!("Failed to delete notice: {:?}", e);
    }
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        Sent(u64, String),
        Deleted(u64),
    }

    /// Records calls along with the paused tokio clock offset they happened at.
    pub struct RecordingChannel {
        started: tokio::time::Instant,
        pub calls: Mutex<Vec<(Duration, Call)>>,
        pub fail_send: bool,
    }

    impl RecordingChannel {
        pub fn new() -> Self {
            Self {
                started: tokio::time::Instant::now(),
                calls: Mutex::new(Vec::new()),
                fail_send: false,
            }
        }

        pub fn calls(&self) -> Vec<(Duration, Call)> {
            self.calls.lock().unwrap().clone()
        }

        fn push(&self, call: Call) {
            self.calls.lock().unwrap().push((self.started.elapsed(), call));
        }
    }

    impl NoticeChannel for RecordingChannel {
        type MessageId = u64;

        async fn send(&self, content: &str) -> Result<u64, serenity::Error> {
            if self.fail_send {
                return Err(serenity::Error::Other("send refused"));
            }
            self.push(Call::Sent(77, content.to_string()));
            Ok(77)
        }

        async fn delete(&self, message_id: u64) -> Result<(), serenity::Error> {
            self.push(Call::Deleted(message_id));
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{Call, RecordingChannel};
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn notice_is_deleted_after_linger() {
        let channel = RecordingChannel::new();

        post_transient(&channel, "**hello**", NOTICE_LINGER).await;

        let calls = channel.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].1, Call::Sent(77, "**hello**".to_string()));
        assert!(calls[0].0 < NOTICE_LINGER);
        assert_eq!(calls[1].1, Call::Deleted(77));
        assert!(calls[1].0 >= NOTICE_LINGER);
    }

    #[tokio::test(start_paused = true)]
    async fn failed_send_skips_delete() {
        let mut channel = RecordingChannel::new();
        channel.fail_send = true;

        post_transient(&channel, "**hello**", NOTICE_LINGER).await;

        assert!(channel.calls().is_empty());
    }
}
