//! Host speech voices: selection for a target language and local playback
//! through espeak-ng.

use std::collections::BTreeMap;
use std::process::Command;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info, warn};

use crate::config::SpeechConfig;
use crate::error::{Result, TutorError};

static LANGUAGE_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(([a-z0-9-]+)\)").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Voice {
    pub name: String,
    /// BCP-47 style tag as reported by the host, e.g. `nl-NL` or `nl`.
    pub lang: String,
}

impl Voice {
    pub fn new(name: impl Into<String>, lang: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            lang: lang.into(),
        }
    }
}

/// Code embedded in a label such as `Dutch (nl-NL)`, lowercased.
pub fn language_code(label: &str) -> Option<String> {
    LANGUAGE_CODE
        .captures(label)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_lowercase())
}

/// Pick a voice for `target_language`.
///
/// Precedence: exact tag match on the embedded code (or the whole lowercased
/// label), then a tag sharing its first two characters, then a voice whose
/// name contains the label, then the first voice. Within each step the first
/// voice in list order wins.
pub fn resolve_voice<'a>(target_language: &str, voices: &'a [Voice]) -> Option<&'a Voice> {
    let first = voices.first()?;
    let label = target_language.to_lowercase();
    let key = language_code(target_language).unwrap_or_else(|| label.clone());
    let prefix: String = key.chars().take(2).collect();

    voices
        .iter()
        .find(|v| v.lang.to_lowercase() == key)
        .or_else(|| voices.iter().find(|v| v.lang.to_lowercase().starts_with(&prefix)))
        .or_else(|| voices.iter().find(|v| v.name.to_lowercase().contains(&label)))
        .or(Some(first))
}

/// Language tag to request when speaking: the resolved voice's tag, else the
/// embedded code, else the raw label.
pub fn utterance_lang(target_language: &str, voice: Option<&Voice>) -> String {
    match voice {
        Some(v) => v.lang.clone(),
        None => LANGUAGE_CODE
            .captures(target_language)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| target_language.to_string()),
    }
}

/// One entry per distinct tag, labelled by the first voice carrying it,
/// sorted by tag.
pub fn list_voice_languages(voices: &[Voice]) -> Vec<(String, String)> {
    let mut by_lang: BTreeMap<String, String> = BTreeMap::new();
    for voice in voices {
        by_lang
            .entry(voice.lang.clone())
            .or_insert_with(|| format!("{} - {}", voice.lang, voice.name));
    }
    by_lang.into_iter().collect()
}

/// Parse the table printed by `espeak-ng --voices`.
pub fn parse_espeak_voices(output: &str) -> Vec<Voice> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            match cols.as_slice() {
                [_pty, lang, _age_gender, name, ..] => Some(Voice::new(*name, *lang)),
                _ => None,
            }
        })
        .collect()
}

/// Local synthesizer wrapper.
pub struct LocalSpeaker {
    binary: String,
    rate: u32,
}

impl LocalSpeaker {
    pub fn new(config: &SpeechConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            rate: config.rate,
        }
    }

    /// Voices the host synthesizer offers. Empty when it is not installed.
    pub fn voices(&self) -> Vec<Voice> {
        match Command::new(&self.binary).arg("--voices").output() {
            Ok(out) if out.status.success() => {
                let voices = parse_espeak_voices(&String::from_utf8_lossy(&out.stdout));
                debug!("{} host voices available", voices.len());
                voices
            }
            Ok(out) => {
                warn!("{} --voices exited with {}", self.binary, out.status);
                Vec::new()
            }
            Err(e) => {
                debug!("{} unavailable: {e}", self.binary);
                Vec::new()
            }
        }
    }

    /// Speak `text` in the target language. Returns false when speech
    /// synthesis is not available on this host.
    pub fn speak(&self, text: &str, target_language: &str) -> Result<bool> {
        let voices = self.voices();
        if voices.is_empty() {
            return Ok(false);
        }
        let voice = resolve_voice(target_language, &voices);
        let lang = utterance_lang(target_language, voice);
        info!("Speaking with voice tag {lang}");

        let status = Command::new(&self.binary)
            .args(["-v", &lang, "-s", &self.rate.to_string(), text])
            .status()
            .map_err(|e| TutorError::Audio(format!("Failed to run {}: {e}", self.binary)))?;
        if !status.success() {
            return Err(TutorError::Audio(format!("{} exited with {status}", self.binary)));
        }
        Ok(true)
    }
}
