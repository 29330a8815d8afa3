//! Middleware system for message processing pipeline

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use std::collections::{HashMap, HashSet};
use crate::domain::entities::{Message, Reply};

/// Context passed through middleware chain
#[derive(Debug, Clone)]
pub struct Context {
    pub message: Message,
    pub chat_id: String,
    pub user_id: Option<String>,
    pub replies: Vec<Reply>,
}

impl Context {
    pub fn new(message: Message) -> Self {
        let chat_id = message.chat_id.clone();
        let user_id = message.sender.as_ref().map(|u| u.id.clone());

        Self {
            message,
            chat_id,
            user_id,
            replies: Vec::new(),
        }
    }

    /// User id when known, otherwise the chat id
    pub fn requester(&self) -> &str {
        self.user_id.as_deref().unwrap_or(&self.chat_id)
    }
}

/// Middleware trait - processors that can intercept and modify message handling
pub trait Middleware: Send + Sync {
    /// Process a message and optionally modify the context
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult;
}

/// Result of middleware processing
pub type MiddlewareResult = Result<Context, MiddlewareError>;

/// Final step of the chain, run after every middleware passed
pub type Endpoint = Arc<dyn Fn(Context) -> MiddlewareResult + Send + Sync>;

/// Middleware errors
#[derive(Debug, Clone)]
pub enum MiddlewareError {
    /// Rate limited
    RateLimited { retry_after: Duration },
    /// Permission denied
    PermissionDenied(String),
    /// Internal error
    Internal(String),
}

impl std::fmt::Display for MiddlewareError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MiddlewareError::RateLimited { retry_after } => {
                write!(f, "Rate limited, retry after {:?}", retry_after)
            }
            MiddlewareError::PermissionDenied(msg) => write!(f, "Permission denied: {}", msg),
            MiddlewareError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for MiddlewareError {}

/// Next middleware in chain
#[derive(Clone)]
pub struct Next {
    remaining: Arc<[Arc<dyn Middleware>]>,
    endpoint: Endpoint,
}

impl Next {
    pub fn new(middlewares: Vec<Arc<dyn Middleware>>, endpoint: Endpoint) -> Self {
        Self {
            remaining: middlewares.into(),
            endpoint,
        }
    }

    /// Process remaining middleware, then the endpoint
    pub fn run(self, ctx: Context) -> MiddlewareResult {
        match self.remaining.split_first() {
            Some((first, rest)) => {
                let next = Next {
                    remaining: rest.into(),
                    endpoint: Arc::clone(&self.endpoint),
                };
                first.process(ctx, next)
            }
            None => (self.endpoint)(ctx),
        }
    }
}

/// Middleware chain builder
pub struct MiddlewareChain {
    middlewares: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self {
            middlewares: Vec::new(),
        }
    }

    pub fn add<M: Middleware + 'static>(mut self, middleware: M) -> Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    pub fn build(self) -> Vec<Arc<dyn Middleware>> {
        self.middlewares
    }
}

impl Default for MiddlewareChain {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate limit middleware, sliding window per requester
pub struct RateLimitMiddleware {
    requests: Mutex<HashMap<String, Vec<Instant>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimitMiddleware {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        Self::with_window(max_requests, Duration::from_secs(window_secs))
    }

    pub fn with_window(max_requests: u32, window: Duration) -> Self {
        Self {
            requests: Mutex::new(HashMap::new()),
            max_requests,
            window,
        }
    }

    /// Number of requesters with requests inside the window
    #[cfg(test)]
    fn tracked_len(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn check_rate_limit(&self, key: &str) -> Result<(), MiddlewareError> {
        let mut requests = self.requests.lock()
            .map_err(|_| MiddlewareError::Internal("Lock poisoned".to_string()))?;

        let now = Instant::now();

        // Drop requesters whose whole history fell out of the window
        requests.retain(|_, times| {
            times.retain(|&t| now.duration_since(t) < self.window);
            !times.is_empty()
        });

        let times = requests.entry(key.to_string()).or_default();
        if times.len() >= self.max_requests as usize {
            let retry_after = times.first()
                .map(|t| self.window.saturating_sub(now.duration_since(*t)))
                .unwrap_or(self.window);

            return Err(MiddlewareError::RateLimited { retry_after });
        }

        times.push(now);
        Ok(())
    }
}

impl Middleware for RateLimitMiddleware {
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult {
        // Plain chatter does not count against the limit
        if ctx.message.content.is_command() {
            self.check_rate_limit(ctx.requester())?;
        }
        next.run(ctx)
    }
}

/// Whitelist middleware, rejects commands from unknown users
pub struct WhitelistMiddleware {
    users: HashSet<String>,
}

impl WhitelistMiddleware {
    pub fn new(users: impl IntoIterator<Item = String>) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }
}

impl Middleware for WhitelistMiddleware {
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult {
        if ctx.message.content.is_command() && !self.users.contains(ctx.requester()) {
            tracing::warn!("Unauthorized user attempted a command: {}", ctx.requester());
            return Err(MiddlewareError::PermissionDenied("user not in whitelist".to_string()));
        }
        next.run(ctx)
    }
}

/// Logging middleware for debugging
pub struct LoggingMiddleware;

impl Middleware for LoggingMiddleware {
    fn process(&self, ctx: Context, next: Next) -> MiddlewareResult {
        let chat_id = ctx.chat_id.clone();
        let message = &ctx.message;
        let msg_preview = message.content.text()
            .map(|s| s.chars().take(50).collect::<String>())
            .unwrap_or_else(|| "[command]".to_string());
        let sender = message.sender.as_ref()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "-".to_string());

        tracing::debug!(
            "[{}] {} {:?} from {} via {} at {}: {}",
            chat_id,
            message.id,
            message.message_type,
            sender,
            message.platform,
            message.timestamp.to_rfc3339(),
            msg_preview
        );
        if let Some(raw) = &message.raw {
            tracing::trace!("[{}] raw payload: {}", chat_id, raw);
        }

        let result = next.run(ctx);

        match &result {
            Ok(ctx) => {
                tracing::debug!("[{}] Processed OK, {} replies", chat_id, ctx.replies.len());
            }
            Err(e) => {
                tracing::warn!("[{}] Error: {}", chat_id, e);
            }
        }

        result
    }
}
