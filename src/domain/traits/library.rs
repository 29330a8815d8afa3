use std::path::PathBuf;

use crate::application::errors::LibraryError;
use crate::domain::entities::{Category, VoiceClip};

/// VoiceLibrary trait - abstraction over where category clips come from
pub trait VoiceLibrary: Send + Sync {
    /// Clips of a category; empty when the category directory does not exist
    fn clips(&self, category: &Category) -> Result<Vec<VoiceClip>, LibraryError>;

    /// Directory that holds the clips of a category
    fn category_dir(&self, category: &Category) -> PathBuf;

    /// All categories reachable by keyword, sorted
    fn categories(&self) -> Result<Vec<Category>, LibraryError>;

    /// Forget cached listings, for one category or all of them
    fn invalidate(&self, category: Option<&Category>);
}
