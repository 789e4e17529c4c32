//! Study plan data model and persisted user settings.
//!
//! Field names serialize in camelCase so stored plans and model output share
//! one JSON shape.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudyPlan {
    pub title: String,
    pub steps: Vec<String>,
    pub lessons: Vec<Lesson>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lesson {
    pub id: String,
    pub title: String,
    pub topic: String,
    pub summary: String,
    pub basics: Vec<String>,
    pub sentences: Vec<Sentence>,
    pub exercises: Vec<Exercise>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentence {
    /// Text in the language being learned.
    pub target: String,
    pub translation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExerciseKind {
    #[default]
    Cards,
    Fill,
    Order,
    Match,
}

impl ExerciseKind {
    /// Parse a kind tag from model output. Unknown tags yield `None`.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "cards" => Some(Self::Cards),
            "fill" => Some(Self::Fill),
            "order" => Some(Self::Order),
            "match" => Some(Self::Match),
            _ => None,
        }
    }
}

impl std::fmt::Display for ExerciseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cards => write!(f, "cards"),
            Self::Fill => write!(f, "fill"),
            Self::Order => write!(f, "order"),
            Self::Match => write!(f, "match"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exercise {
    #[serde(rename = "type")]
    pub kind: ExerciseKind,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
}

fn same_answer(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl Exercise {
    /// Evaluate a learner response against the stored answer.
    /// Exercises without an answer accept nothing.
    pub fn check(&self, response: &str) -> bool {
        self.answer
            .as_deref()
            .is_some_and(|answer| same_answer(answer, response))
    }

    /// Whether the stored answer is one of the options. Vacuously true when
    /// either side is absent.
    pub fn answer_in_options(&self) -> bool {
        match (&self.answer, &self.options) {
            (Some(answer), Some(options)) => options.iter().any(|o| same_answer(o, answer)),
            _ => true,
        }
    }
}

/// A sentence in the audio-practice list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticeSentence {
    pub id: String,
    #[serde(flatten)]
    pub sentence: Sentence,
}

impl PracticeSentence {
    pub fn new(sentence: Sentence) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            sentence,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub user_language: String,
    pub target_language: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: "gpt-4o-mini".into(),
            base_url: "https://api.openai.com/v1/chat/completions".into(),
            user_language: "English".into(),
            target_language: "Spanish (es-ES)".into(),
        }
    }
}

impl Settings {
    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// Settings as shown to the user, with the key masked.
    pub fn masked_key(&self) -> String {
        let key = self.api_key.trim();
        if key.is_empty() {
            "(not set)".into()
        } else if key.chars().count() <= 8 {
            "*".repeat(key.chars().count())
        } else {
            let tail: String = key.chars().skip(key.chars().count() - 4).collect();
            format!("****{tail}")
        }
    }
}

pub const DEFAULT_GOAL: &str = "Reach conversational B1 for daily life.";

#[cfg(test)]
mod tests {
    use super::*;

    fn exercise(answer: Option<&str>, options: Option<&[&str]>) -> Exercise {
        Exercise {
            kind: ExerciseKind::Cards,
            prompt: "Pick one".into(),
            options: options.map(|o| o.iter().map(|s| s.to_string()).collect()),
            answer: answer.map(String::from),
        }
    }

    #[test]
    fn check_ignores_case_and_padding() {
        let ex = exercise(Some("Hasta luego"), None);
        assert!(ex.check("  hasta LUEGO "));
        assert!(!ex.check("Buenos días"));
    }

    #[test]
    fn check_without_answer_rejects() {
        assert!(!exercise(None, None).check("anything"));
    }

    #[test]
    fn answer_in_options_matches_normalized() {
        let ex = exercise(Some(" yo duermo"), Some(&["Yo duermo", "Yo corro"]));
        assert!(ex.answer_in_options());
        let ex = exercise(Some("Yo hablo"), Some(&["Yo duermo", "Yo corro"]));
        assert!(!ex.answer_in_options());
        assert!(exercise(Some("x"), None).answer_in_options());
    }

    #[test]
    fn exercise_serializes_kind_as_type() {
        let json = serde_json::to_value(exercise(Some("a"), None)).unwrap();
        assert_eq!(json["type"], "cards");
        assert!(json.get("options").is_none());
    }

    #[test]
    fn settings_use_camel_case_and_fill_missing() {
        let settings: Settings = serde_json::from_str(r#"{"apiKey":"sk-1"}"#).unwrap();
        assert_eq!(settings.api_key, "sk-1");
        assert_eq!(settings.model, "gpt-4o-mini");
        assert!(settings.has_api_key());
        assert!(!Settings::default().has_api_key());
    }

    #[test]
    fn masked_key_hides_all_but_tail() {
        let settings = Settings {
            api_key: "sk-abcdefghij1234".into(),
            ..Settings::default()
        };
        assert_eq!(settings.masked_key(), "****1234");
        assert_eq!(Settings::default().masked_key(), "(not set)");
    }
}
