//! Message handling - Event-driven message processing

pub mod dispatcher;
pub mod middleware;
pub mod parser;

pub use dispatcher::MessageDispatcher;
pub use middleware::{LoggingMiddleware, MiddlewareChain, RateLimitMiddleware, WhitelistMiddleware};
pub use parser::MessageParser;
