//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Core business objects (User, Message, Command, VoiceClip)
//! - Traits: Abstractions for infrastructure (Bot, VoiceLibrary)

pub mod entities;
pub mod traits;
