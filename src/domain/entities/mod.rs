//! Domain entities - Core business objects with no external dependencies

pub mod user;
pub mod message;
pub mod command;
pub mod voice;

pub use user::User;
pub use message::{Message, MessageType, Content, Reply};
pub use command::{Command, CommandRegistry};
pub use voice::{AudioFormat, Category, VoiceClip};
