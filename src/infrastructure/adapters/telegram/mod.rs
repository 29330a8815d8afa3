//! Telegram adapter

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{AudioFormat, VoiceClip};
use crate::domain::traits::{Bot, BotInfo};
use crate::application::errors::BotError;

/// Telegram API base URL
const API_BASE: &str = "https://api.telegram.org";

/// Telegram update type
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

impl User {
    pub fn to_domain(&self) -> crate::domain::entities::User {
        let mut user = crate::domain::entities::User::new(self.id.to_string());
        if let Some(username) = &self.username {
            user = user.with_username(username.clone());
        }
        if let Some(first_name) = &self.first_name {
            user = user.with_first_name(first_name.clone());
        }
        user.is_bot = self.is_bot;
        user
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Chat {
    pub id: i64,
}

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self, method: &str) -> Result<T, BotError> {
        match (self.ok, self.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(BotError::Network(format!(
                "Telegram {} failed: {}",
                method,
                self.description.unwrap_or_else(|| "no description".to_string())
            ))),
        }
    }
}

#[derive(Debug, Deserialize)]
struct MessageResult {
    message_id: i64,
}

/// Bot API method, multipart field and chat action used to upload a format
fn upload_method(format: AudioFormat) -> (&'static str, &'static str, &'static str) {
    match format {
        AudioFormat::Ogg => ("sendVoice", "voice", "upload_voice"),
        AudioFormat::Mp3 => ("sendAudio", "audio", "upload_voice"),
        AudioFormat::Wav => ("sendDocument", "document", "upload_document"),
    }
}

/// Telegram only accepts `[a-z0-9_]{1,32}` in the command menu
fn is_menu_command(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 32
        && name.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Telegram bot adapter
pub struct TelegramAdapter {
    token: String,
    client: Client,
    info: BotInfo,
}

impl TelegramAdapter {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            client: Client::new(),
            info: BotInfo {
                id: "unknown".to_string(),
                name: "random-voice-bot".to_string(),
                username: "random_voice_bot".to_string(),
            },
        }
    }

    /// Get the API URL for a method
    fn api_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", API_BASE, self.token, method)
    }

    async fn post_json<B: Serialize, T: DeserializeOwned>(&self, method: &str, body: &B) -> Result<T, BotError> {
        let response = self.client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let data: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        data.into_result(method)
    }

    /// Fetch bot info from Telegram API
    pub async fn fetch_bot_info(&mut self) -> Result<(), BotError> {
        #[derive(Deserialize)]
        struct BotInfoResponse {
            id: i64,
            first_name: String,
            username: String,
        }

        let response = self.client
            .get(self.api_url("getMe"))
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let data: ApiResponse<BotInfoResponse> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;
        let me = data.into_result("getMe")?;

        self.info = BotInfo {
            id: me.id.to_string(),
            name: me.first_name,
            username: me.username,
        };

        Ok(())
    }

    /// Get updates from Telegram using getUpdates API
    pub async fn get_updates(&self, offset: i64, timeout: i64) -> Result<Vec<Update>, BotError> {
        #[derive(Serialize)]
        struct GetUpdatesRequest {
            offset: i64,
            timeout: i64,
            allowed_updates: Vec<String>,
        }

        let request = GetUpdatesRequest {
            offset,
            timeout,
            allowed_updates: vec!["message".to_string()],
        };

        self.post_json("getUpdates", &request).await
    }

    /// Get the next update offset
    pub fn get_next_offset(updates: &[Update], current: i64) -> i64 {
        updates.iter()
            .map(|u| u.update_id + 1)
            .max()
            .unwrap_or(current)
    }

    /// Register bot commands with Telegram
    pub async fn register_commands(&self, commands: &[(String, String)]) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct Command {
            command: String,
            description: String,
        }

        #[derive(Serialize)]
        struct SetMyCommandsRequest {
            commands: Vec<Command>,
        }

        let commands: Vec<Command> = commands.iter()
            .filter(|(name, _)| is_menu_command(name))
            .map(|(name, description)| Command {
                command: name.clone(),
                description: if description.is_empty() { name.clone() } else { description.clone() },
            })
            .collect();

        let count = commands.len();
        let _: bool = self.post_json("setMyCommands", &SetMyCommandsRequest { commands }).await?;

        tracing::info!("Registered {} bot commands with Telegram", count);
        Ok(())
    }

    /// Send chat action (typing, upload_voice, etc.)
    pub async fn send_chat_action(&self, chat_id: &str, action: &str) -> Result<(), BotError> {
        #[derive(Serialize)]
        struct SendChatActionRequest<'a> {
            chat_id: &'a str,
            action: &'a str,
        }

        let _: bool = self.post_json("sendChatAction", &SendChatActionRequest { chat_id, action }).await?;
        Ok(())
    }

    /// Upload a local file with the method matching its format
    async fn upload(&self, chat_id: &str, clip: &VoiceClip) -> Result<String, BotError> {
        let (method, field, action) = upload_method(clip.format);

        let bytes = tokio::fs::read(&clip.path).await?;
        let part = Part::bytes(bytes)
            .file_name(clip.file_name())
            .mime_str(clip.format.mime_type())
            .map_err(|e| BotError::Internal(e.to_string()))?;

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part(field, part);
        if clip.format == AudioFormat::Mp3 {
            form = form.text("title", clip.title());
        }

        if let Err(e) = self.send_chat_action(chat_id, action).await {
            tracing::debug!("Chat action failed: {}", e);
        }

        let response = self.client
            .post(self.api_url(method))
            .multipart(form)
            .send()
            .await
            .map_err(|e| BotError::Network(e.to_string()))?;

        let data: ApiResponse<MessageResult> = response
            .json()
            .await
            .map_err(|e| BotError::Parse(e.to_string()))?;

        Ok(data.into_result(method)?.message_id.to_string())
    }
}

#[async_trait]
impl Bot for TelegramAdapter {
    async fn start(&self) -> Result<(), BotError> {
        tracing::info!("Starting Telegram bot (token: {}...)", &self.token[..8.min(self.token.len())]);
        Ok(())
    }

    async fn send_message(&self, chat_id: &str, text: &str) -> Result<String, BotError> {
        #[derive(Serialize)]
        struct SendMessageRequest<'a> {
            chat_id: &'a str,
            text: &'a str,
        }

        tracing::debug!("Sending to {}: {}", chat_id, text);
        let result: MessageResult = self.post_json("sendMessage", &SendMessageRequest { chat_id, text }).await?;
        Ok(result.message_id.to_string())
    }

    async fn send_voice(&self, chat_id: &str, clip: &VoiceClip) -> Result<String, BotError> {
        tracing::debug!("Uploading {} to {}", clip.path.display(), chat_id);
        self.upload(chat_id, clip).await
    }

    fn bot_info(&self) -> BotInfo {
        self.info.clone()
    }
}
