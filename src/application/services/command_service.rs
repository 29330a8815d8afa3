use crate::domain::entities::{Command, CommandRegistry, Message, Content, Reply};
use crate::application::errors::CommandError;

/// Service for managing and executing commands
pub struct CommandService {
    registry: CommandRegistry,
}

impl CommandService {
    pub fn new() -> Self {
        Self {
            registry: CommandRegistry::new(),
        }
    }

    pub fn register(&mut self, command: Command) {
        self.registry.register(command);
    }

    pub fn register_defaults(&mut self) {
        // Help is answered by `handle` itself, it needs the registry
        self.register(Command::new("help")
            .with_description("Show help message")
            .with_usage("/help [command]"));

        self.register(Command::new("version")
            .with_description("Show bot version")
            .with_handler(|_| {
                Ok(vec![Reply::text(format!("random-voice-bot v{}", env!("CARGO_PKG_VERSION")))])
            }));
    }

    /// Run a command message. Non-command messages yield `Ok(None)`.
    pub fn handle(&self, message: &Message) -> Result<Option<Vec<Reply>>, CommandError> {
        let Content::Command { name, args } = &message.content else {
            return Ok(None);
        };

        let cmd = self.registry.find(name)
            .ok_or_else(|| CommandError::NotFound(name.clone()))?;

        if cmd.name == "help" {
            return Ok(Some(vec![Reply::text(self.get_help(args.first().map(String::as_str)))]));
        }

        if let Some(handler) = &cmd.handler {
            Ok(Some(handler(message.clone())?))
        } else {
            Ok(Some(vec![Reply::text(format!("Command {} not implemented", cmd.name))]))
        }
    }

    pub fn get_help(&self, command: Option<&str>) -> String {
        if let Some(name) = command {
            if let Some(cmd) = self.registry.find(name) {
                let mut help = format!("/{} - {}", cmd.name, cmd.description.as_deref().unwrap_or("No description"));
                if !cmd.aliases.is_empty() {
                    help.push_str(&format!("\nAliases: {}", cmd.aliases.join(", ")));
                }
                if let Some(usage) = &cmd.usage {
                    help.push_str(&format!("\nUsage: {}", usage));
                }
                return help;
            }
            return format!("Command /{} not found", name);
        }

        let mut help = "Available commands:\n".to_string();
        for cmd in self.registry.all() {
            help.push_str(&format!("  /{} - {}\n", cmd.name, cmd.description.as_deref().unwrap_or("")));
        }
        help
    }

    /// Name and description of every command, for platform command menus
    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.registry.all()
            .into_iter()
            .map(|c| (c.name.clone(), c.description.clone().unwrap_or_default()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }
}

impl Default for CommandService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> CommandService {
        let mut commands = CommandService::new();
        commands.register_defaults();
        commands.register(Command::new("echo")
            .with_description("Echo arguments")
            .with_aliases(vec!["say".to_string()])
            .with_handler(|msg| Ok(vec![Reply::text(msg.content.args().join(" "))])));
        commands
    }

    #[test]
    fn test_handle_runs_handler_through_alias() {
        let msg = Message::from_command("1", "SAY", vec!["hi".to_string(), "there".to_string()]);
        let replies = service().handle(&msg).unwrap().unwrap();
        assert_eq!(replies, vec![Reply::text("hi there")]);
    }

    #[test]
    fn test_handle_unknown_command() {
        let msg = Message::from_command("1", "nope", vec![]);
        assert!(matches!(service().handle(&msg), Err(CommandError::NotFound(n)) if n == "nope"));
    }

    #[test]
    fn test_handle_ignores_text() {
        let msg = Message::from_text("1", "hello");
        assert!(service().handle(&msg).unwrap().is_none());
    }

    #[test]
    fn test_help_lists_and_describes_commands() {
        let commands = service();
        let msg = Message::from_command("1", "help", vec![]);
        let replies = commands.handle(&msg).unwrap().unwrap();
        let text = replies[0].as_text().unwrap();
        assert!(text.contains("/echo - Echo arguments"));
        assert!(text.contains("/version"));

        let detail = commands.get_help(Some("say"));
        assert!(detail.contains("Aliases: say"));
        assert_eq!(commands.get_help(Some("missing")), "Command /missing not found");
    }
}
