//! Prompt builders for every tutor action.

use crate::model::{Lesson, Settings};
use crate::tutor::client::ChatMessage;

const PLAN_SYSTEM: &str =
    "You are a concise language tutor creating compact study plans. Respond with pure JSON, no markdown.";

const EXERCISES_SYSTEM: &str = "You are a concise language tutor. Respond with JSON only: an array of 2-3 exercises. \
Each exercise has: type ('cards' | 'fill' | 'order' | 'match'), prompt (string), options? (array), answer? (string). \
Keep prompts short and relevant to the lesson.";

const EXPLAIN_SYSTEM: &str = "Explain the lesson clearly for a learner. Keep it under 120 words. \
Use the learner's language. Highlight tricky points. Respond with plain text only.";

const SENTENCES_SYSTEM: &str = "You are a language tutor. Respond with pure JSON only, no markdown.";

pub fn plan(goal: &str, settings: &Settings) -> Vec<ChatMessage> {
    let native = &settings.user_language;
    let target = &settings.target_language;
    vec![
        ChatMessage::system(PLAN_SYSTEM),
        ChatMessage::user(format!(
            "Goal: {goal}. Native language: {native}. Target: {target}. \
Write all fields (title, steps, summaries, basics, exercises, notes) in {native} except the target-language \
sentence text (use the 'target' field), which must stay in {target}. \
Output JSON with keys: title, steps (array), lessons (array). Each lesson needs: id, title, topic, summary, \
basics (array of 3 points), sentences (3 items with target text in {target}, translation in {native}, phonetic), \
exercises (2 items with type, prompt, options?, answer?). Keep it short and classroom-ready."
        )),
    ]
}

pub fn more_exercises(lesson: &Lesson, settings: &Settings) -> Vec<ChatMessage> {
    let sentences = lesson
        .sentences
        .iter()
        .map(|s| s.target.as_str())
        .collect::<Vec<_>>()
        .join(" | ");
    vec![
        ChatMessage::system(EXERCISES_SYSTEM),
        ChatMessage::user(format!(
            "Target language: {}. Learner language: {}. Lesson topic: {} ({}). Basics: {}. Sentences: {}. \
Return only JSON array of new exercises.",
            settings.target_language,
            settings.user_language,
            lesson.title,
            lesson.topic,
            lesson.basics.join("; "),
            sentences,
        )),
    ]
}

pub fn explain_lesson(lesson: &Lesson, settings: &Settings) -> Vec<ChatMessage> {
    let sentences = lesson
        .sentences
        .iter()
        .map(|s| format!("{} ({})", s.target, s.translation))
        .collect::<Vec<_>>()
        .join(" | ");
    vec![
        ChatMessage::system(EXPLAIN_SYSTEM),
        ChatMessage::user(format!(
            "Learner language: {}. Target: {}. Lesson: {} ({}). Summary: {}. Basics: {}. Sentences: {}.",
            settings.user_language,
            settings.target_language,
            lesson.title,
            lesson.topic,
            lesson.summary,
            lesson.basics.join("; "),
            sentences,
        )),
    ]
}

pub fn practice_sentences(settings: &Settings) -> Vec<ChatMessage> {
    let native = &settings.user_language;
    let target = &settings.target_language;
    vec![
        ChatMessage::system(SENTENCES_SYSTEM),
        ChatMessage::user(format!(
            "Generate 5 useful practice sentences for a student learning {target} (native: {native}). \
Return a JSON array where each item has: \"target\" (sentence in {target}), \"translation\" (in {native}), \
\"phonetic\" (pronunciation guide), \"note\" (brief grammar/usage tip in {native}). \
Keep sentences practical and conversational."
        )),
    ]
}

pub fn single_sentence(input: &str, settings: &Settings) -> Vec<ChatMessage> {
    let native = &settings.user_language;
    let target = &settings.target_language;
    vec![
        ChatMessage::system(SENTENCES_SYSTEM),
        ChatMessage::user(format!(
            "The user is learning {target} (native: {native}). They entered: \"{input}\". \
Determine if this is in {target} or {native}. Return a single JSON object with: \"target\" (the sentence in {target}), \
\"translation\" (in {native}), \"phonetic\" (pronunciation guide for the target), \
\"note\" (brief grammar/usage tip in {native}). If the input is in the target language, use it as \"target\" \
and translate. If in the native language, translate it to the target language."
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::demo_plan::demo_plan;
    use crate::tutor::client::Role;

    #[test]
    fn every_prompt_is_system_then_user() {
        let settings = Settings::default();
        let lesson = &demo_plan().lessons[0];
        for messages in [
            plan("Travel", &settings),
            more_exercises(lesson, &settings),
            explain_lesson(lesson, &settings),
            practice_sentences(&settings),
            single_sentence("Hola", &settings),
        ] {
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[0].role, Role::System);
            assert_eq!(messages[1].role, Role::User);
        }
    }

    #[test]
    fn lesson_prompts_carry_lesson_material() {
        let settings = Settings::default();
        let lesson = &demo_plan().lessons[0];
        let user = &more_exercises(lesson, &settings)[1].content;
        assert!(user.contains("Saludos y Sonidos"));
        assert!(user.contains("¿Cómo estás? |"));
        assert!(user.contains("Spanish (es-ES)"));

        let user = &explain_lesson(lesson, &settings)[1].content;
        assert!(user.contains("¿Cómo estás? (How are you?)"));
    }

    #[test]
    fn plan_prompt_names_goal_and_target_field() {
        let user = &plan("Order tapas", &Settings::default())[1].content;
        assert!(user.starts_with("Goal: Order tapas."));
        assert!(user.contains("'target' field"));
    }
}
