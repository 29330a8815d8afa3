use crate::domain::entities::Reply;
use crate::application::errors::BotError;
use crate::domain::traits::Bot;

/// Service for delivering replies through a bot adapter
pub struct MessageService<B: Bot> {
    bot: B,
}

impl<B: Bot> MessageService<B> {
    pub fn new(bot: B) -> Self {
        Self { bot }
    }

    pub fn bot(&self) -> &B {
        &self.bot
    }

    /// Send replies in order, returns how many were delivered
    pub async fn deliver(&self, chat_id: &str, replies: &[Reply]) -> usize {
        let mut delivered = 0;

        for reply in replies {
            match reply {
                Reply::Text(text) => match self.respond(chat_id, text).await {
                    Ok(_) => delivered += 1,
                    Err(e) => tracing::error!("Failed to send message to {}: {}", chat_id, e),
                },
                Reply::Voice(clip) => match self.bot.send_voice(chat_id, clip).await {
                    Ok(_) => {
                        tracing::info!("Voice sent to {}: {}", chat_id, clip.file_name());
                        delivered += 1;
                    }
                    Err(e) => {
                        tracing::error!("Failed to send voice {}: {}", clip.path.display(), e);
                        if let Err(e) = self.respond(chat_id, &format!("发送语音失败: {}", e)).await {
                            tracing::error!("Failed to report voice failure to {}: {}", chat_id, e);
                        }
                    }
                },
            }
        }

        delivered
    }

    /// Send a single text message
    pub async fn respond(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        self.bot.send_message(chat_id, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::VoiceClip;
    use crate::domain::traits::BotInfo;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingBot {
        sent: Mutex<Vec<String>>,
        fail_text: bool,
        fail_voice: bool,
    }

    #[async_trait]
    impl Bot for RecordingBot {
        async fn start(&self) -> Result<(), BotError> {
            Ok(())
        }

        async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
            if self.fail_text {
                return Err(BotError::Network("chat unavailable".to_string()));
            }
            self.sent.lock().unwrap().push(format!("{}:text:{}", chat_id, text));
            Ok("1".to_string())
        }

        async fn send_voice(&self, chat_id: &str, clip: &VoiceClip) -> Result<String, BotError> {
            if self.fail_voice {
                return Err(BotError::Network("upload refused".to_string()));
            }
            self.sent.lock().unwrap().push(format!("{}:voice:{}", chat_id, clip.file_name()));
            Ok("2".to_string())
        }

        fn bot_info(&self) -> BotInfo {
            BotInfo { id: "0".to_string(), name: "test".to_string(), username: "test_bot".to_string() }
        }
    }

    fn replies() -> Vec<Reply> {
        vec![
            Reply::text("来，听听这个「hello」~"),
            Reply::Voice(VoiceClip::from_path("/voices/ktxy/hello.mp3").unwrap()),
        ]
    }

    #[tokio::test]
    async fn test_deliver_in_order() {
        let service = MessageService::new(RecordingBot::default());
        let delivered = service.deliver("9", &replies()).await;

        assert_eq!(delivered, 2);
        let sent = service.bot().sent.lock().unwrap().clone();
        assert_eq!(sent, vec!["9:text:来，听听这个「hello」~", "9:voice:hello.mp3"]);
    }

    #[tokio::test]
    async fn test_voice_failure_is_reported_to_chat() {
        let service = MessageService::new(RecordingBot { fail_voice: true, ..Default::default() });
        let delivered = service.deliver("9", &replies()).await;

        assert_eq!(delivered, 1);
        let sent = service.bot().sent.lock().unwrap().clone();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], "9:text:发送语音失败: Network error: upload refused");
    }

    #[tokio::test]
    async fn test_text_failure_does_not_stop_delivery() {
        let service = MessageService::new(RecordingBot { fail_text: true, ..Default::default() });
        let delivered = service.deliver("9", &replies()).await;

        assert_eq!(delivered, 1);
        let sent = service.bot().sent.lock().unwrap().clone();
        assert_eq!(sent, vec!["9:voice:hello.mp3"]);
    }
}
