//! Speech: local voice selection and remote text-to-speech.
//!
//! Components:
//! - `voice`: pick a host synthesis voice for the target language, speak locally
//! - `tts`: derive the audio endpoint, synthesize, cache clips per session
//! - `player`: rodio playback of cached clips

pub mod player;
pub mod tts;
pub mod voice;
