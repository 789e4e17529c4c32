//! Configuration management for lingo-tutor.
//!
//! Loads tool configuration from YAML files in standard locations. User
//! settings (API key, model, languages) are not part of this file; they live
//! in the store next to the plan.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::speech::tts::TtsVoice;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the namespaced JSON entries. Empty means the
    /// platform data directory.
    pub data_dir: String,
    pub namespace: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            namespace: "ll".into(),
        }
    }
}

impl StorageConfig {
    pub fn resolved_dir(&self) -> PathBuf {
        if self.data_dir.is_empty() {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("lingo-tutor")
        } else {
            PathBuf::from(&self.data_dir)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub model: String,
    pub voice: TtsVoice,
    pub normal_speed: f64,
    pub slow_speed: f64,
    /// Where synthesized clips are kept while the process runs. Empty means
    /// the platform cache directory.
    pub cache_dir: String,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            model: "tts-1".into(),
            voice: TtsVoice::Alloy,
            normal_speed: 1.0,
            slow_speed: 0.7,
            cache_dir: String::new(),
        }
    }
}

impl TtsConfig {
    pub fn resolved_cache_dir(&self) -> PathBuf {
        if self.cache_dir.is_empty() {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("lingo-tutor")
                .join("audio")
        } else {
            PathBuf::from(&self.cache_dir)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    /// Local synthesizer used for `say` and for listing host voices.
    pub binary: String,
    /// Words per minute passed to the local synthesizer.
    pub rate: u32,
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            binary: "espeak-ng".into(),
            rate: 160,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FeedbackConfig {
    pub notifications: bool,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            notifications: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds. Zero leaves the transport default.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub tts: TtsConfig,
    pub speech: SpeechConfig,
    pub feedback: FeedbackConfig,
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from YAML file.
    ///
    /// Searches standard locations if no path is provided:
    /// 1. ./lingo-tutor.yaml
    /// 2. ~/.config/lingo-tutor/config.yaml
    pub fn load(path: Option<&Path>) -> Self {
        let resolved = path.map(PathBuf::from).or_else(|| {
            let candidates = [
                std::env::current_dir().ok().map(|d| d.join("lingo-tutor.yaml")),
                dirs::config_dir().map(|c| c.join("lingo-tutor").join("config.yaml")),
            ];
            candidates.into_iter().flatten().find(|p| p.exists())
        });

        let Some(config_path) = resolved else {
            info!("No config file found, using defaults");
            return Self::default();
        };

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => Self::from_yaml(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {}: {e}, using defaults", config_path.display());
                Self::default()
            }),
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}, using defaults", config_path.display());
                Self::default()
            }
        }
    }

    pub fn from_yaml(contents: &str) -> Result<Self, serde_yml::Error> {
        let config = serde_yml::from_str(contents)?;
        info!("Loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let config = Config::from_yaml("tts:\n  voice: nova\n  slow_speed: 0.5\n").unwrap();
        assert_eq!(config.tts.voice, TtsVoice::Nova);
        assert_eq!(config.tts.slow_speed, 0.5);
        assert_eq!(config.tts.normal_speed, 1.0);
        assert_eq!(config.tts.model, "tts-1");
        assert_eq!(config.storage.namespace, "ll");
        assert!(config.feedback.notifications);
    }

    #[test]
    fn unknown_voice_is_rejected() {
        assert!(Config::from_yaml("tts:\n  voice: robot\n").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = Config::load(Some(Path::new("/nonexistent/lingo-tutor.yaml")));
        assert_eq!(config.speech.binary, "espeak-ng");
    }

    #[test]
    fn explicit_data_dir_wins() {
        let storage = StorageConfig {
            data_dir: "/tmp/lingo".into(),
            ..StorageConfig::default()
        };
        assert_eq!(storage.resolved_dir(), PathBuf::from("/tmp/lingo"));
    }
}
