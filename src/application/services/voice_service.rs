//! Random voice playback - picks a clip from a category and builds the replies

use std::sync::{Arc, Mutex};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::application::errors::CommandError;
use crate::application::services::CommandService;
use crate::domain::entities::{Category, Command, Reply, VoiceClip};
use crate::domain::traits::VoiceLibrary;

/// Service behind the random voice commands
pub struct VoiceService {
    library: Arc<dyn VoiceLibrary>,
    rng: Mutex<StdRng>,
    command: String,
}

impl VoiceService {
    pub fn new(library: Arc<dyn VoiceLibrary>, command: impl Into<String>) -> Self {
        Self {
            library,
            rng: Mutex::new(StdRng::from_entropy()),
            command: command.into(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(StdRng::seed_from_u64(seed));
        self
    }

    pub fn usage(&self) -> String {
        format!(
            "请在命令后指定要播放的语音类型（例如：/{0} ktxy 或 /{0} zspms）。",
            self.command
        )
    }

    /// Handle `/ww <category>`: the first argument selects the category
    pub fn random_voice(&self, args: &[String]) -> Result<Vec<Reply>, CommandError> {
        tracing::info!("Random voice requested");

        let Some(raw) = args.first() else {
            return Ok(vec![Reply::text(self.usage())]);
        };

        let category = Category::parse(raw)?;
        tracing::info!("Loading voice category: {}", category);

        let clips = self.library.clips(&category)?;
        let Some(clip) = self.choose(&clips)? else {
            return Ok(vec![Reply::text(format!(
                "目录 '{}' 中没有找到语音文件！请检查文件是否已放置在 {} 目录下。",
                category,
                self.library.category_dir(&category).display()
            ))]);
        };

        Ok(Self::play(clip))
    }

    fn choose(&self, clips: &[VoiceClip]) -> Result<Option<VoiceClip>, CommandError> {
        let mut rng = self.rng.lock()
            .map_err(|_| CommandError::ExecutionFailed("RNG lock poisoned".to_string()))?;
        Ok(clips.choose(&mut *rng).cloned())
    }

    fn play(clip: VoiceClip) -> Vec<Reply> {
        let file_name = clip.file_name();
        let title = clip.title();

        tracing::info!("Selected voice file: {} (title: {})", file_name, title);
        tracing::debug!("Voice path: {}", clip.path.display());

        // The cached listing may be stale
        if !clip.exists() {
            tracing::error!("Voice file does not exist: {}", clip.path.display());
            return vec![Reply::text(format!("文件 {} 不存在，无法播放。", file_name))];
        }

        vec![
            Reply::text(format!("来，听听这个「{}」~", title)),
            Reply::Voice(clip),
        ]
    }

    /// Handle `/voices`: categories with their clip counts
    pub fn list_categories(&self) -> Result<Vec<Reply>, CommandError> {
        let categories = self.library.categories()?;
        if categories.is_empty() {
            return Ok(vec![Reply::text(format!(
                "语音库为空，请在子目录中放置语音文件后使用 /{} <类型> 播放。",
                self.command
            ))]);
        }

        let mut lines = Vec::with_capacity(categories.len());
        for category in categories {
            let count = self.library.clips(&category)?.len();
            lines.push(format!("• {} ({})", category, count));
        }

        Ok(vec![Reply::text(format!("可用的语音类型：\n{}", lines.join("\n")))])
    }

    /// Handle `/reload [category]`: forget cached listings
    pub fn reload(&self, args: &[String]) -> Result<Vec<Reply>, CommandError> {
        match args.first() {
            Some(raw) => {
                let category = Category::parse(raw)?;
                self.library.invalidate(Some(&category));
                tracing::info!("Voice cache cleared for [{}]", category);
                Ok(vec![Reply::text(format!("已刷新语音目录 '{}'。", category))])
            }
            None => {
                self.library.invalidate(None);
                tracing::info!("Voice cache cleared");
                Ok(vec![Reply::text("已刷新全部语音目录。")])
            }
        }
    }

    /// Register `/<command>`, `/voices` and `/reload`
    pub fn register_commands(self: &Arc<Self>, commands: &mut CommandService, aliases: Vec<String>) {
        let svc = Arc::clone(self);
        commands.register(Command::new(self.command.clone())
            .with_description("Play a random voice from a category")
            .with_aliases(aliases)
            .with_usage(format!("/{} <category>", self.command))
            .with_handler(move |msg| svc.random_voice(msg.content.args())));

        let svc = Arc::clone(self);
        commands.register(Command::new("voices")
            .with_description("List voice categories")
            .with_aliases(vec!["语音列表".to_string()])
            .with_handler(move |_| svc.list_categories()));

        let svc = Arc::clone(self);
        commands.register(Command::new("reload")
            .with_description("Rescan voice directories")
            .with_usage("/reload [category]")
            .with_handler(move |msg| svc.reload(msg.content.args())));
    }
}
