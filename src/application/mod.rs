//! Application layer - Use cases and business logic
//!
//! This layer contains:
//! - Services: Command, voice and delivery orchestration
//! - Errors: Domain-specific errors
//! - Messaging: Message parsing, middleware, dispatching

pub mod errors;
pub mod services;
pub mod messaging;
