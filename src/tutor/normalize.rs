//! Plan normalization.
//!
//! Model output is untrusted and often partial. `normalize_plan` coerces it
//! into a complete `StudyPlan`, defaulting each field on its own so a reply
//! with some good and some bad fields keeps the good ones. It never fails:
//! anything that is not a JSON object yields the fallback plan.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::model::{Exercise, ExerciseKind, Lesson, Sentence, StudyPlan};

const DEFAULT_LESSON_TITLE: &str = "New topic";
const DEFAULT_LESSON_TOPIC: &str = "Language";
const DEFAULT_LESSON_SUMMARY: &str = "Learn the core of this topic.";
const DEFAULT_BASIC: &str = "Key points for this section.";
const DEFAULT_SENTENCE_TARGET: &str = "Example sentence missing.";
const DEFAULT_SENTENCE_TRANSLATION: &str = "Translation missing.";
pub const DEFAULT_EXERCISE_PROMPT: &str = "Choose the correct answer.";

/// Input to the normalizer: reply text still to be parsed, or a value that
/// was already decoded.
#[derive(Debug, Clone)]
pub enum RawPlan<'a> {
    Text(&'a str),
    Value(Value),
}

impl<'a> From<&'a str> for RawPlan<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a String> for RawPlan<'a> {
    fn from(text: &'a String) -> Self {
        Self::Text(text.as_str())
    }
}

#[cfg(test)]
impl From<Value> for RawPlan<'_> {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

/// JSON text of a scalar, strings verbatim.
pub(crate) fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// A present, non-null field as a string.
pub(crate) fn text_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    match obj.get(key) {
        None | Some(Value::Null) => None,
        Some(value) => Some(stringify(value)),
    }
}

/// An array-shaped field with every element stringified.
pub(crate) fn string_list(obj: &Map<String, Value>, key: &str) -> Option<Vec<String>> {
    obj.get(key)
        .and_then(Value::as_array)
        .map(|items| items.iter().map(stringify).collect())
}

fn as_object(value: &Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap_or_default()
}

/// Map one raw exercise object, defaulting the kind to cards and the prompt
/// to `default_prompt`.
pub fn map_exercise(raw: &Value, default_prompt: &str) -> Exercise {
    let obj = as_object(raw);
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .and_then(ExerciseKind::from_tag)
        .unwrap_or_default();
    Exercise {
        kind,
        prompt: text_field(&obj, "prompt").unwrap_or_else(|| default_prompt.to_string()),
        options: string_list(&obj, "options"),
        answer: text_field(&obj, "answer"),
    }
}

fn map_sentence(raw: &Value) -> Sentence {
    let obj = as_object(raw);
    Sentence {
        target: text_field(&obj, "target").unwrap_or_else(|| DEFAULT_SENTENCE_TARGET.into()),
        translation: text_field(&obj, "translation")
            .unwrap_or_else(|| DEFAULT_SENTENCE_TRANSLATION.into()),
        phonetic: text_field(&obj, "phonetic"),
        note: text_field(&obj, "note"),
    }
}

fn map_lesson(raw: &Value, index: usize) -> Lesson {
    let obj = as_object(raw);
    Lesson {
        id: text_field(&obj, "id").unwrap_or_else(|| format!("lesson-{}", index + 1)),
        title: text_field(&obj, "title").unwrap_or_else(|| DEFAULT_LESSON_TITLE.into()),
        topic: text_field(&obj, "topic").unwrap_or_else(|| DEFAULT_LESSON_TOPIC.into()),
        summary: text_field(&obj, "summary").unwrap_or_else(|| DEFAULT_LESSON_SUMMARY.into()),
        basics: string_list(&obj, "basics").unwrap_or_else(|| vec![DEFAULT_BASIC.into()]),
        sentences: obj
            .get("sentences")
            .and_then(Value::as_array)
            .map(|items| items.iter().map(map_sentence).collect())
            .unwrap_or_default(),
        exercises: obj
            .get("exercises")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|e| map_exercise(e, DEFAULT_EXERCISE_PROMPT))
                    .collect()
            })
            .unwrap_or_default(),
    }
}

pub fn normalize_plan<'a>(raw: impl Into<RawPlan<'a>>, fallback: &StudyPlan) -> StudyPlan {
    let parsed = match raw.into() {
        RawPlan::Text(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) => value,
            Err(e) => {
                warn!("Plan parse failed: {e}");
                return fallback.clone();
            }
        },
        RawPlan::Value(value) => value,
    };

    let Some(base) = parsed.as_object() else {
        warn!("Plan parse failed: expected a JSON object");
        return fallback.clone();
    };

    let lessons = match base.get("lessons").and_then(Value::as_array) {
        Some(items) => items
            .iter()
            .enumerate()
            .map(|(i, lesson)| map_lesson(lesson, i))
            .collect(),
        None => {
            debug!("Plan has no lesson list, keeping fallback lessons");
            fallback.lessons.clone()
        }
    };

    StudyPlan {
        title: text_field(base, "title").unwrap_or_else(|| fallback.title.clone()),
        steps: string_list(base, "steps").unwrap_or_else(|| fallback.steps.clone()),
        lessons,
    }
}
