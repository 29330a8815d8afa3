//! Message parser - Parses raw messages into structured messages

use crate::domain::entities::{Message, User};

/// Parses incoming messages into structured Message objects
pub struct MessageParser {
    command_prefix: String,
    bot_username: Option<String>,
}

impl MessageParser {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            command_prefix: prefix.into(),
            bot_username: None,
        }
    }

    /// Commands addressed as `/cmd@other_bot` are then left alone
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.bot_username = Some(username.into());
        self
    }

    /// Parse a text message
    pub fn parse(&self, chat_id: impl Into<String>, text: impl Into<String>, sender: Option<User>) -> Message {
        let text = text.into();
        let chat_id = chat_id.into();

        if let Some(cmd_text) = self.strip_prefix(&text) {
            if let Some((name, args)) = self.parse_command(cmd_text) {
                return Message::from_command(chat_id, name, args).with_sender_opt(sender);
            }
        }

        Message::from_text(chat_id, text).with_sender_opt(sender)
    }

    fn strip_prefix<'a>(&self, text: &'a str) -> Option<&'a str> {
        let text = text.trim_start();
        text.strip_prefix('/')
            .or_else(|| {
                if self.command_prefix.is_empty() {
                    None
                } else {
                    text.strip_prefix(self.command_prefix.as_str())
                }
            })
    }

    /// Split command and arguments; `None` when the command targets another bot
    fn parse_command(&self, cmd_text: &str) -> Option<(String, Vec<String>)> {
        let mut parts = cmd_text.split_whitespace();
        let head = parts.next().unwrap_or("");

        let name = match head.split_once('@') {
            Some((name, target)) => {
                if let Some(me) = &self.bot_username {
                    if !target.eq_ignore_ascii_case(me) {
                        return None;
                    }
                }
                name
            }
            None => head,
        };

        if name.is_empty() {
            return None;
        }

        Some((name.to_string(), parts.map(|s| s.to_string()).collect()))
    }
}

impl Message {
    /// Helper to set sender as Option
    pub fn with_sender_opt(self, user: Option<User>) -> Self {
        match user {
            Some(u) => self.with_sender(u),
            None => self,
        }
    }
}
