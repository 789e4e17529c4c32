//! JSON extraction from free-form model replies.
//!
//! Models asked for "JSON only" still wrap it in code fences or surround it
//! with prose. Each parser here tries a short list of strategies in order and
//! fails loudly only when none of them yields the expected shape.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::error::{Result, TutorError};
use crate::model::{Exercise, PracticeSentence, Sentence};
use crate::tutor::normalize::{map_exercise, stringify};

static JSON_FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)```json").unwrap());

/// Accept an array, or an object wrapping one under `exercises`.
fn accept_exercises(text: &str) -> Option<Vec<Value>> {
    match serde_json::from_str::<Value>(text).ok()? {
        Value::Array(items) => Some(items),
        Value::Object(mut obj) => match obj.remove("exercises") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

/// Inclusive span from the first `open` to the last `close`.
fn bracket_span(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

fn strip_fence_markers(text: &str) -> String {
    JSON_FENCE.replace_all(text, "").replace("```", "").trim().to_string()
}

fn strip_fence_lines(text: &str) -> String {
    text.lines()
        .filter(|line| !line.trim().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Extract the raw exercise objects from a model reply.
pub fn parse_exercises(content: &str) -> Result<Vec<Value>> {
    let cleaned = strip_fence_markers(content);
    if let Some(items) = accept_exercises(&cleaned) {
        return Ok(items);
    }

    if let Some(span) = bracket_span(&cleaned, '[', ']') {
        if let Some(items) = accept_exercises(span) {
            debug!("Recovered exercises from bracket span");
            return Ok(items);
        }
    }

    if let Some(items) = accept_exercises(&strip_fence_lines(content)) {
        debug!("Recovered exercises after dropping fence lines");
        return Ok(items);
    }

    error!("Failed to parse exercises: {content}");
    Err(TutorError::InvalidExercises)
}

/// Map raw exercise objects, numbering placeholder prompts from 1.
pub fn map_exercises(items: &[Value]) -> Vec<Exercise> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let exercise = map_exercise(item, &format!("Practice item {}", i + 1));
            if !exercise.answer_in_options() {
                debug!("Exercise {} answer is not among its options", i + 1);
            }
            exercise
        })
        .collect()
}

/// Parse and map a reply to the "more exercises" prompt. An empty list is an
/// error: there is nothing to append.
pub fn exercises_from_reply(content: &str) -> Result<Vec<Exercise>> {
    let exercises = map_exercises(&parse_exercises(content)?);
    if exercises.is_empty() {
        return Err(TutorError::NoExercises);
    }
    Ok(exercises)
}

/// Present and truthy: empty strings, zero, false and null count as absent.
fn truthy_text(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key)? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        value => Some(stringify(value)),
    }
}

fn field_or(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(value) => stringify(value),
    }
}

fn practice_sentence(raw: &Value, default_target: &str) -> PracticeSentence {
    let obj = raw.as_object().cloned().unwrap_or_default();
    PracticeSentence::new(Sentence {
        target: field_or(&obj, "target", default_target),
        translation: field_or(&obj, "translation", ""),
        phonetic: truthy_text(&obj, "phonetic"),
        note: truthy_text(&obj, "note"),
    })
}

fn parse_with_span(content: &str, open: char, close: char) -> Result<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(content) {
        return Ok(value);
    }
    let span = bracket_span(content, open, close)
        .ok_or_else(|| TutorError::InvalidSentences("no JSON found in reply".into()))?;
    serde_json::from_str(span).map_err(|e| TutorError::InvalidSentences(e.to_string()))
}

/// Parse a reply to the "practice sentences" prompt: a JSON array of
/// sentence objects, possibly surrounded by prose.
pub fn parse_sentence_list(content: &str) -> Result<Vec<PracticeSentence>> {
    match parse_with_span(content, '[', ']')? {
        Value::Array(items) => Ok(items.iter().map(|item| practice_sentence(item, "")).collect()),
        _ => Err(TutorError::InvalidSentences("AI response was not an array".into())),
    }
}

/// Parse a reply describing one sentence the learner typed in. The learner's
/// own text stands in for a missing `target`.
pub fn parse_single_sentence(content: &str, input: &str) -> Result<PracticeSentence> {
    let value = parse_with_span(content, '{', '}')?;
    Ok(practice_sentence(&value, input))
}
