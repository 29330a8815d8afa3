//! Domain traits - Abstractions for infrastructure implementations

pub mod bot;
pub mod library;

pub use bot::{Bot, BotInfo};
pub use library::VoiceLibrary;
