//! Configuration management

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use crate::application::errors::ConfigError;
use crate::domain::entities::AudioFormat;

/// Bot configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct Config {
    pub bot: BotConfig,
    pub voice: VoiceConfig,
    pub security: SecurityConfig,
    pub adapters: AdaptersConfig,
    pub whitelist: WhitelistConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct BotConfig {
    pub name: String,
    pub prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            name: "random-voice-bot".to_string(),
            prefix: "/".to_string(),
        }
    }
}

/// Voice library and command settings
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct VoiceConfig {
    /// Plugin data directory; clips live under `<data-dir>/<voices-dir>/<category>`
    pub data_dir: PathBuf,
    pub voices_dir: String,
    pub formats: Vec<AudioFormat>,
    pub command: String,
    pub aliases: Vec<String>,
    /// Fixed RNG seed, for reproducible picks
    pub seed: Option<u64>,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/random-voice"),
            voices_dir: "voices".to_string(),
            formats: vec![AudioFormat::Wav, AudioFormat::Mp3],
            command: "ww".to_string(),
            aliases: vec!["随机语音".to_string(), "voice".to_string()],
            seed: None,
        }
    }
}

impl VoiceConfig {
    pub fn voices_root(&self) -> PathBuf {
        self.data_dir.join(&self.voices_dir)
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SecurityConfig {
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_seconds: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 20,
            window_seconds: 60,
        }
    }
}

/// Whitelist configuration for user access control
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct WhitelistConfig {
    pub enabled: bool,
    pub users: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct AdaptersConfig {
    pub telegram: Option<TelegramConfig>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct TelegramConfig {
    pub enabled: bool,
    pub token: Option<String>,
}

impl Config {
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| ConfigError::Parse(format!("Failed to read config: {}", e)))?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(content)
            .map_err(|e| ConfigError::Parse(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Parse(format!("Failed to serialize config: {}", e)))
    }

    /// Override fields from `BOT_TOKEN`, `BOT_PREFIX` and `VOICE_DATA_DIR`
    pub fn apply_env(&mut self) {
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            self.set_telegram_token(token);
        }

        if let Ok(prefix) = std::env::var("BOT_PREFIX") {
            self.bot.prefix = prefix;
        }

        if let Ok(dir) = std::env::var("VOICE_DATA_DIR") {
            self.voice.data_dir = PathBuf::from(dir);
        }
    }

    pub fn set_telegram_token(&mut self, token: impl Into<String>) {
        let tg = self.adapters.telegram.get_or_insert_with(TelegramConfig::default);
        tg.token = Some(token.into());
        tg.enabled = true;
    }

    /// Token of an enabled telegram adapter
    pub fn telegram_token(&self) -> Option<&str> {
        self.adapters.telegram
            .as_ref()
            .filter(|t| t.enabled)
            .and_then(|t| t.token.as_deref())
            .filter(|t| !t.is_empty())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bot.prefix.is_empty() {
            return Err(ConfigError::MissingField("bot.prefix".to_string()));
        }
        if self.voice.command.trim().is_empty() {
            return Err(ConfigError::MissingField("voice.command".to_string()));
        }
        if self.voice.formats.is_empty() {
            return Err(ConfigError::InvalidValue("voice.formats must not be empty".to_string()));
        }
        if self.voice.voices_dir.contains(&['/', '\\'][..]) || self.voice.voices_dir.is_empty() {
            return Err(ConfigError::InvalidValue(format!(
                "voice.voices-dir must be a single directory name, got {:?}",
                self.voice.voices_dir
            )));
        }
        let rl = &self.security.rate_limit;
        if rl.enabled && (rl.max_requests == 0 || rl.window_seconds == 0) {
            return Err(ConfigError::InvalidValue(
                "security.rate-limit needs max-requests and window-seconds above zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_round_trips_through_yaml() {
        let yaml = Config::default().to_yaml().unwrap();
        assert!(yaml.contains("voices-dir"));
        let config = Config::from_yaml(&yaml).unwrap();
        assert_eq!(config.voice.command, "ww");
        assert_eq!(config.voice.formats, vec![AudioFormat::Wav, AudioFormat::Mp3]);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config = Config::from_yaml(
            "voice:\n  data-dir: /srv/voice\n  formats: [mp3, ogg]\nwhitelist:\n  enabled: true\n  users: [\"7\"]\n",
        )
        .unwrap();

        assert_eq!(config.bot.prefix, "/");
        assert_eq!(config.voice.voices_root(), PathBuf::from("/srv/voice/voices"));
        assert_eq!(config.voice.formats, vec![AudioFormat::Mp3, AudioFormat::Ogg]);
        assert_eq!(config.voice.aliases, vec!["随机语音", "voice"]);
        assert!(config.whitelist.enabled);
        assert_eq!(config.whitelist.users, vec!["7"]);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.voice.formats.clear();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue(_))));

        let mut config = Config::default();
        config.bot.prefix.clear();
        assert!(matches!(config.validate(), Err(ConfigError::MissingField(_))));

        let mut config = Config::default();
        config.security.rate_limit.max_requests = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.voice.voices_dir = "../voices".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_telegram_token_requires_enabled_adapter() {
        let mut config = Config::default();
        assert!(config.telegram_token().is_none());

        config.set_telegram_token("123:abc");
        assert_eq!(config.telegram_token(), Some("123:abc"));

        if let Some(tg) = config.adapters.telegram.as_mut() {
            tg.enabled = false;
        }
        assert!(config.telegram_token().is_none());
    }

    #[test]
    fn test_apply_env_overrides_fields() {
        std::env::set_var("BOT_TOKEN", "42:env");
        std::env::set_var("BOT_PREFIX", "!");
        std::env::set_var("VOICE_DATA_DIR", "/tmp/voice-env");

        let mut config = Config::default();
        config.apply_env();

        std::env::remove_var("BOT_TOKEN");
        std::env::remove_var("BOT_PREFIX");
        std::env::remove_var("VOICE_DATA_DIR");

        assert_eq!(config.telegram_token(), Some("42:env"));
        assert_eq!(config.bot.prefix, "!");
        assert_eq!(config.voice.voices_root(), PathBuf::from("/tmp/voice-env/voices"));

        let mut untouched = Config::default();
        untouched.apply_env();
        assert!(untouched.telegram_token().is_none());
        assert_eq!(untouched.bot.prefix, "/");
    }
}
