use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::application::errors::LibraryError;

/// Audio container recognized in the voice library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Wav,
    Mp3,
    Ogg,
}

impl AudioFormat {
    /// `.oga` and `.opus` files are Ogg containers too
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "wav" => Some(AudioFormat::Wav),
            "mp3" => Some(AudioFormat::Mp3),
            "ogg" | "oga" | "opus" => Some(AudioFormat::Ogg),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "wav",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Ogg => "ogg",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Ogg => "audio/ogg",
        }
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single audio file in a category directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceClip {
    pub path: PathBuf,
    pub format: AudioFormat,
}

impl VoiceClip {
    /// Returns `None` when the extension is not a known audio format
    pub fn from_path(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let format = AudioFormat::from_path(&path)?;
        Some(Self { path, format })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    /// File stem, shown to the chat as the clip title
    pub fn title(&self) -> String {
        self.path
            .file_stem()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }
}

/// Normalized voice category keyword (one subdirectory of the library)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Category(String);

impl Category {
    /// Trims and lowercases the keyword. It must name exactly one path component.
    pub fn parse(raw: &str) -> Result<Self, LibraryError> {
        let name = raw.trim().to_lowercase();

        let invalid = name.is_empty()
            || name == "."
            || name == ".."
            || name.contains(&['/', '\\', '\0'][..]);

        if invalid {
            return Err(LibraryError::InvalidCategory(raw.to_string()));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(AudioFormat::from_extension("wav"), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_extension("MP3"), Some(AudioFormat::Mp3));
        assert_eq!(AudioFormat::from_extension("OGG"), Some(AudioFormat::Ogg));
        assert_eq!(AudioFormat::from_extension("oga"), Some(AudioFormat::Ogg));
        assert_eq!(AudioFormat::from_extension("opus"), Some(AudioFormat::Ogg));
        assert_eq!(AudioFormat::from_extension("txt"), None);
    }

    #[test]
    fn test_clip_title_is_file_stem() {
        let clip = VoiceClip::from_path("/voices/ktxy/zh_vo_Main_Linaxita_2_3_67_15.wav").unwrap();
        assert_eq!(clip.format, AudioFormat::Wav);
        assert_eq!(clip.file_name(), "zh_vo_Main_Linaxita_2_3_67_15.wav");
        assert_eq!(clip.title(), "zh_vo_Main_Linaxita_2_3_67_15");
    }

    #[test]
    fn test_clip_rejects_unknown_extension() {
        assert!(VoiceClip::from_path("/voices/ktxy/readme.md").is_none());
        assert!(VoiceClip::from_path("/voices/ktxy/noext").is_none());
    }

    #[test]
    fn test_category_is_normalized() {
        let cat = Category::parse("  KTXY ").unwrap();
        assert_eq!(cat.as_str(), "ktxy");
    }

    #[test]
    fn test_category_rejects_path_escapes() {
        for raw in ["", "   ", ".", "..", "../etc", "a/b", "a\\b"] {
            assert!(Category::parse(raw).is_err(), "{:?} should be rejected", raw);
        }
    }
}
