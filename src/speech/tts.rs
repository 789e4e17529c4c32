//! Remote text-to-speech with a session-owned clip cache.
//!
//! The audio endpoint sits next to the configured chat-completion URL.
//! Clips are written to a per-session directory and reused for identical
//! (text, speed, voice) requests until the cache is cleared or dropped.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::error::{Result, TutorError};
use crate::model::Settings;
use crate::tutor::client::{error_message, HttpTransport};

const CHAT_SUFFIX: &str = "/chat/completions";
const AUDIO_SUFFIX: &str = "/audio/speech";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TtsVoice {
    #[default]
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl std::fmt::Display for TtsVoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Alloy => "alloy",
            Self::Echo => "echo",
            Self::Fable => "fable",
            Self::Onyx => "onyx",
            Self::Nova => "nova",
            Self::Shimmer => "shimmer",
        };
        write!(f, "{name}")
    }
}

/// Audio endpoint derived from the chat-completion URL.
pub fn derive_tts_url(base_url: &str) -> String {
    match base_url.strip_suffix(CHAT_SUFFIX) {
        Some(root) => format!("{root}{AUDIO_SUFFIX}"),
        None => format!("{}{AUDIO_SUFFIX}", base_url.trim_end_matches('/')),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TtsRequest<'a> {
    pub text: &'a str,
    pub voice: TtsVoice,
    pub speed: f64,
}

/// A synthesized clip on disk. Valid until its cache is cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    text: String,
    speed_bits: u64,
    voice: TtsVoice,
}

impl CacheKey {
    fn new(request: &TtsRequest<'_>) -> Self {
        Self {
            text: request.text.to_string(),
            speed_bits: request.speed.to_bits(),
            voice: request.voice,
        }
    }
}

pub struct AudioCache {
    dir: PathBuf,
    clips: HashMap<CacheKey, AudioClip>,
    next_id: usize,
}

impl AudioCache {
    /// Cache rooted in a fresh session directory under `root`.
    pub fn new(root: &Path) -> Self {
        let dir = root.join(format!("session-{}", uuid::Uuid::new_v4()));
        Self {
            dir,
            clips: HashMap::new(),
            next_id: 0,
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    fn get(&self, request: &TtsRequest<'_>) -> Option<&AudioClip> {
        self.clips.get(&CacheKey::new(request))
    }

    fn insert(&mut self, request: &TtsRequest<'_>, audio: &[u8]) -> Result<AudioClip> {
        fs::create_dir_all(&self.dir).map_err(|e| TutorError::Audio(e.to_string()))?;
        self.next_id += 1;
        let path = self.dir.join(format!("clip-{}.mp3", self.next_id));
        fs::write(&path, audio).map_err(|e| TutorError::Audio(e.to_string()))?;
        let clip = AudioClip { path };
        self.clips.insert(CacheKey::new(request), clip.clone());
        Ok(clip)
    }

    /// Release every clip. Returns how many were released.
    pub fn clear(&mut self) -> usize {
        let released = self.clips.len();
        for clip in self.clips.values() {
            if let Err(e) = fs::remove_file(&clip.path) {
                warn!("Failed to release {}: {e}", clip.path.display());
            }
        }
        self.clips.clear();
        if self.dir.exists() {
            let _ = fs::remove_dir(&self.dir);
        }
        if released > 0 {
            debug!("Released {released} cached clips");
        }
        released
    }
}

impl Drop for AudioCache {
    fn drop(&mut self) {
        self.clear();
    }
}

/// Synthesize `request`, reusing a cached clip when one exists.
pub async fn synthesize<T: HttpTransport>(
    cache: &mut AudioCache,
    transport: &T,
    settings: &Settings,
    model: &str,
    request: &TtsRequest<'_>,
) -> Result<AudioClip> {
    if let Some(clip) = cache.get(request) {
        debug!("TTS cache hit for {} chars", request.text.len());
        return Ok(clip.clone());
    }
    if !settings.has_api_key() {
        return Err(TutorError::MissingApiKey);
    }

    let url = derive_tts_url(&settings.base_url);
    let body = json!({
        "model": model,
        "input": request.text,
        "voice": request.voice,
        "speed": request.speed,
    });
    let resp = transport.post_json(&url, &settings.api_key, &body).await?;
    if !resp.is_success() {
        let text = resp.text();
        let message = match error_message(&text) {
            nested if nested != text => format!("- {nested}"),
            raw => raw,
        };
        return Err(TutorError::Http {
            service: "TTS",
            status: resp.status,
            message,
        });
    }

    info!(
        "Synthesized {} chars ({} bytes, voice={}, speed={})",
        request.text.len(),
        resp.body.len(),
        request.voice,
        request.speed
    );
    cache.insert(request, &resp.body)
}
