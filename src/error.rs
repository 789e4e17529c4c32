//! Error taxonomy shared by the tutor client, parsers, store and speech.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TutorError {
    #[error("Add your API key to generate content (lingo-tutor settings set api-key <KEY>).")]
    MissingApiKey,

    #[error("{service} request failed: {status} {message}")]
    Http {
        service: &'static str,
        status: u16,
        message: String,
    },

    #[error("Request could not be sent: {0}")]
    Transport(String),

    #[error("Model response was empty. Check the model and try again.")]
    EmptyResponse,

    #[error("Model response was not valid JSON exercises.")]
    InvalidExercises,

    #[error("Could not parse AI response: {0}")]
    InvalidSentences(String),

    #[error("Model returned no exercises.")]
    NoExercises,

    #[error("Plan has no sentences to import.")]
    NoSentences,

    #[error("No lesson {0} in the current plan.")]
    LessonNotFound(usize),

    #[error("No exercise {exercise} in lesson {lesson}.")]
    ExerciseNotFound { lesson: usize, exercise: usize },

    #[error("Storage error for '{key}': {message}")]
    Storage { key: String, message: String },

    #[error("'{0}' is already running, wait for it to finish.")]
    Busy(&'static str),

    #[error("Audio error: {0}")]
    Audio(String),
}

impl TutorError {
    pub fn storage(key: &str, message: impl std::fmt::Display) -> Self {
        Self::Storage {
            key: key.to_string(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TutorError>;
