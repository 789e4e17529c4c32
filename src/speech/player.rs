//! Clip playback through rodio.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

use rodio::{Decoder, OutputStreamBuilder, Sink};
use tracing::{debug, info};

use crate::error::{Result, TutorError};
use crate::speech::tts::AudioClip;

/// Play a clip to completion on the default output device.
pub async fn play(clip: &AudioClip) -> Result<()> {
    let path: PathBuf = clip.path.clone();
    tokio::task::spawn_blocking(move || play_blocking(path))
        .await
        .map_err(|e| TutorError::Audio(format!("playback task failed: {e}")))?
}

fn play_blocking(path: PathBuf) -> Result<()> {
    // rodio 0.21: the stream must outlive the sink
    let stream = OutputStreamBuilder::open_default_stream()
        .map_err(|e| TutorError::Audio(format!("Failed to open audio output: {e}")))?;
    let file = File::open(&path).map_err(|e| TutorError::Audio(format!("{}: {e}", path.display())))?;
    let source = Decoder::new(BufReader::new(file))
        .map_err(|e| TutorError::Audio(format!("Failed to decode clip: {e}")))?;

    let sink = Sink::connect_new(stream.mixer());
    sink.append(source);
    info!("Playing {}", path.display());
    sink.sleep_until_end();
    debug!("Playback finished");
    Ok(())
}
