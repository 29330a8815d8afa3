//! Message dispatcher - Routes messages through middleware to commands

use std::sync::Arc;
use crate::domain::entities::{Message, Reply, User};
use crate::application::errors::BotError;
use crate::application::services::CommandService;
use super::parser::MessageParser;
use super::middleware::{Context, Endpoint, Middleware, MiddlewareError, MiddlewareResult, Next};

/// Dispatch result
pub type DispatchResult = Result<Vec<Reply>, BotError>;

/// Message dispatcher - routes messages through middleware to handlers
pub struct MessageDispatcher {
    parser: MessageParser,
    middleware: Vec<Arc<dyn Middleware>>,
    commands: Arc<CommandService>,
    endpoint: Endpoint,
}

impl MessageDispatcher {
    pub fn new(parser: MessageParser, commands: CommandService, middleware: Vec<Arc<dyn Middleware>>) -> Self {
        let commands = Arc::new(commands);
        let handler = Arc::clone(&commands);

        let endpoint: Endpoint = Arc::new(move |mut ctx: Context| -> MiddlewareResult {
            match handler.handle(&ctx.message) {
                Ok(Some(replies)) => ctx.replies = replies,
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!("[{}] Command failed: {}", ctx.chat_id, e);
                    ctx.replies = vec![Reply::text(format!("Error: {}", e))];
                }
            }
            Ok(ctx)
        });

        Self {
            parser,
            middleware,
            commands,
            endpoint,
        }
    }

    /// Ignore commands addressed to other bots
    pub fn with_bot_username(mut self, username: impl Into<String>) -> Self {
        self.parser = self.parser.with_bot_username(username);
        self
    }

    pub fn commands(&self) -> &CommandService {
        &self.commands
    }

    pub fn parse(&self, chat_id: impl Into<String>, text: impl Into<String>, sender: Option<User>) -> Message {
        self.parser.parse(chat_id, text, sender)
    }

    /// Process a message through the middleware chain, returning the replies to send
    pub fn process(&self, message: Message) -> DispatchResult {
        let ctx = Context::new(message);
        let next = Next::new(self.middleware.clone(), Arc::clone(&self.endpoint));

        match next.run(ctx) {
            Ok(ctx) => Ok(ctx.replies),
            Err(MiddlewareError::RateLimited { retry_after }) => Ok(vec![Reply::text(format!(
                "Rate limited. Please try again in {}s.",
                retry_after.as_secs().max(1)
            ))]),
            Err(MiddlewareError::PermissionDenied(msg)) => {
                Ok(vec![Reply::text(format!("Permission denied: {}", msg))])
            }
            Err(MiddlewareError::Internal(msg)) => Err(BotError::Internal(msg)),
        }
    }
}
