//! Directory-backed voice library with a per-category listing cache

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crate::application::errors::LibraryError;
use crate::domain::entities::{AudioFormat, Category, VoiceClip};
use crate::domain::traits::VoiceLibrary;

/// Voice library rooted at `<data_dir>/voices`, one subdirectory per category
pub struct DirectoryLibrary {
    root: PathBuf,
    formats: Vec<AudioFormat>,
    cache: RwLock<HashMap<String, Vec<VoiceClip>>>,
}

impl DirectoryLibrary {
    pub fn new(root: impl Into<PathBuf>, formats: Vec<AudioFormat>) -> Self {
        Self {
            root: root.into(),
            formats,
            cache: RwLock::new(HashMap::new()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the library root if it is missing
    pub fn init(&self) -> Result<(), LibraryError> {
        std::fs::create_dir_all(&self.root)?;
        Ok(())
    }

    /// Number of categories currently cached
    #[cfg(test)]
    pub fn cached_len(&self) -> usize {
        self.cache.read()
            .map(|c| c.len())
            .unwrap_or(0)
    }

    fn format_rank(&self, format: AudioFormat) -> Option<usize> {
        self.formats.iter().position(|f| *f == format)
    }

    /// Read a category directory, keeping enabled formats only
    fn scan(&self, dir: &Path) -> Result<Vec<VoiceClip>, LibraryError> {
        let mut clips = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let Some(clip) = VoiceClip::from_path(entry.path()) else {
                continue;
            };
            if self.format_rank(clip.format).is_some() {
                clips.push(clip);
            }
        }

        clips.sort_by(|a, b| {
            self.format_rank(a.format)
                .cmp(&self.format_rank(b.format))
                .then_with(|| a.path.cmp(&b.path))
        });

        Ok(clips)
    }
}

impl VoiceLibrary for DirectoryLibrary {
    fn clips(&self, category: &Category) -> Result<Vec<VoiceClip>, LibraryError> {
        {
            let cache = self.cache.read()
                .map_err(|_| LibraryError::Internal("Lock poisoned".to_string()))?;
            if let Some(clips) = cache.get(category.as_str()) {
                return Ok(clips.clone());
            }
        }

        let dir = self.category_dir(category);
        if !dir.is_dir() {
            tracing::warn!("Voice directory does not exist: {}", dir.display());
            return Ok(Vec::new());
        }

        let clips = self.scan(&dir)?;
        tracing::info!("Scanned voice category [{}], found {} files", category, clips.len());

        let mut cache = self.cache.write()
            .map_err(|_| LibraryError::Internal("Lock poisoned".to_string()))?;
        cache.insert(category.as_str().to_string(), clips.clone());

        Ok(clips)
    }

    fn category_dir(&self, category: &Category) -> PathBuf {
        self.root.join(category.as_str())
    }

    fn categories(&self) -> Result<Vec<Category>, LibraryError> {
        if !self.root.is_dir() {
            return Ok(Vec::new());
        }

        let mut categories = Vec::new();
        for entry in std::fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            // Commands lowercase the keyword, so only lowercase names are reachable
            match Category::parse(&name) {
                Ok(category) if category.as_str() == name => categories.push(category),
                _ => tracing::warn!(
                    "Skipping voice directory {:?}: rename it to lowercase to use it as a category",
                    name
                ),
            }
        }
        categories.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        Ok(categories)
    }

    fn invalidate(&self, category: Option<&Category>) {
        let Ok(mut cache) = self.cache.write() else {
            tracing::error!("Voice cache lock poisoned, cannot invalidate");
            return;
        };
        match category {
            Some(cat) => {
                cache.remove(cat.as_str());
            }
            None => cache.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn library(temp_dir: &TempDir) -> DirectoryLibrary {
        DirectoryLibrary::new(temp_dir.path().join("voices"), vec![AudioFormat::Wav, AudioFormat::Mp3])
    }

    fn touch(dir: &Path, name: &str) {
        fs::create_dir_all(dir).unwrap();
        fs::write(dir.join(name), b"RIFF").unwrap();
    }

    #[test]
    fn test_init_creates_root() {
        let temp_dir = TempDir::new().unwrap();
        let lib = library(&temp_dir);
        lib.init().unwrap();
        assert!(lib.root().is_dir());
    }

    #[test]
    fn test_scan_keeps_enabled_formats_in_order() {
        let temp_dir = TempDir::new().unwrap();
        let lib = library(&temp_dir);
        let dir = lib.root().join("ktxy");
        touch(&dir, "b.mp3");
        touch(&dir, "z.wav");
        touch(&dir, "a.wav");
        touch(&dir, "voice.ogg");
        touch(&dir, "notes.txt");
        fs::create_dir_all(dir.join("nested.wav")).unwrap();

        let cat = Category::parse("ktxy").unwrap();
        let names: Vec<String> = lib.clips(&cat).unwrap().iter().map(|c| c.file_name()).collect();
        assert_eq!(names, vec!["a.wav", "z.wav", "b.mp3"]);
    }

    #[test]
    fn test_missing_category_is_empty_and_not_cached() {
        let temp_dir = TempDir::new().unwrap();
        let lib = library(&temp_dir);
        let cat = Category::parse("zspms").unwrap();

        assert!(lib.clips(&cat).unwrap().is_empty());
        assert_eq!(lib.cached_len(), 0);

        touch(&lib.category_dir(&cat), "hello.mp3");
        assert_eq!(lib.clips(&cat).unwrap().len(), 1);
        assert_eq!(lib.cached_len(), 1);
    }

    #[test]
    fn test_listing_is_cached_until_invalidated() {
        let temp_dir = TempDir::new().unwrap();
        let lib = library(&temp_dir);
        let cat = Category::parse("ktxy").unwrap();
        let dir = lib.category_dir(&cat);
        touch(&dir, "one.wav");

        assert_eq!(lib.clips(&cat).unwrap().len(), 1);
        touch(&dir, "two.wav");
        assert_eq!(lib.clips(&cat).unwrap().len(), 1);

        lib.invalidate(Some(&cat));
        assert_eq!(lib.clips(&cat).unwrap().len(), 2);

        lib.invalidate(None);
        assert_eq!(lib.cached_len(), 0);
    }

    #[test]
    fn test_empty_directory_is_cached() {
        let temp_dir = TempDir::new().unwrap();
        let lib = library(&temp_dir);
        let cat = Category::parse("empty").unwrap();
        fs::create_dir_all(lib.category_dir(&cat)).unwrap();

        assert!(lib.clips(&cat).unwrap().is_empty());
        assert_eq!(lib.cached_len(), 1);
    }

    #[test]
    fn test_categories_lists_subdirectories() {
        let temp_dir = TempDir::new().unwrap();
        let lib = library(&temp_dir);
        assert!(lib.categories().unwrap().is_empty());

        touch(&lib.root().join("zspms"), "a.wav");
        touch(&lib.root().join("ktxy"), "b.wav");
        touch(lib.root(), "stray.wav");

        let names: Vec<String> = lib.categories().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["ktxy", "zspms"]);
    }

    #[test]
    fn test_categories_skip_mixed_case_directories() {
        let temp_dir = TempDir::new().unwrap();
        let lib = library(&temp_dir);
        touch(&lib.root().join("KTXY"), "a.wav");
        touch(&lib.root().join("zspms"), "b.wav");

        let names: Vec<String> = lib.categories().unwrap().iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["zspms"]);
    }
}
