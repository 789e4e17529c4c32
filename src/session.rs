//! Tutor session: loads persisted state, runs actions, writes state back.
//!
//! Each logical action owns an `ActionSlot`. While a request for that action
//! is in flight a second trigger is refused with `TutorError::Busy`, never
//! queued. The slot is released when its guard drops, so failures always
//! leave the action available again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::TtsConfig;
use crate::demo_plan::demo_plan;
use crate::error::{Result, TutorError};
use crate::model::{PracticeSentence, Settings, StudyPlan, DEFAULT_GOAL};
use crate::speech::tts::{self, AudioCache, AudioClip, TtsRequest, TtsVoice};
use crate::store::{Store, AUDIO_SENTENCES_KEY, GOAL_KEY, PLAN_KEY, SETTINGS_KEY};
use crate::tutor::client::{HttpTransport, TutorClient};
use crate::tutor::normalize::normalize_plan;
use crate::tutor::{parse, prompts};

pub struct ActionSlot {
    name: &'static str,
    busy: AtomicBool,
}

impl ActionSlot {
    pub fn new(name: &'static str) -> Arc<Self> {
        Arc::new(Self {
            name,
            busy: AtomicBool::new(false),
        })
    }

    #[cfg(test)]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Occupy the slot, or fail if a request is already in flight.
    pub fn acquire(self: &Arc<Self>) -> Result<SlotGuard> {
        if self
            .busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            warn!("Refusing '{}': already in flight", self.name);
            return Err(TutorError::Busy(self.name));
        }
        Ok(SlotGuard { slot: self.clone() })
    }
}

pub struct SlotGuard {
    slot: Arc<ActionSlot>,
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        self.slot.busy.store(false, Ordering::Release);
    }
}

/// Normal or slow playback rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    Normal,
    Slow,
}

pub struct Session<T: HttpTransport> {
    store: Store,
    client: TutorClient<T>,
    tts: TtsConfig,
    audio: AudioCache,
    settings: Settings,
    goal: String,
    plan: StudyPlan,
    sentences: Vec<PracticeSentence>,
    pub plan_slot: Arc<ActionSlot>,
    pub lesson_slot: Arc<ActionSlot>,
    pub sentences_slot: Arc<ActionSlot>,
    pub add_sentence_slot: Arc<ActionSlot>,
}

impl<T: HttpTransport> Session<T> {
    pub fn new(store: Store, client: TutorClient<T>, tts: TtsConfig) -> Self {
        let audio = AudioCache::new(&tts.resolved_cache_dir());
        Self {
            settings: store.settings(),
            goal: store.goal(),
            plan: store.plan(),
            sentences: store.audio_sentences(),
            store,
            client,
            tts,
            audio,
            plan_slot: ActionSlot::new("generate plan"),
            lesson_slot: ActionSlot::new("lesson action"),
            sentences_slot: ActionSlot::new("generate sentences"),
            add_sentence_slot: ActionSlot::new("add sentence"),
        }
    }

    /// Use a specific clip cache instead of the configured directory.
    pub fn with_audio_cache(mut self, audio: AudioCache) -> Self {
        self.audio = audio;
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn goal(&self) -> &str {
        &self.goal
    }

    pub fn plan(&self) -> &StudyPlan {
        &self.plan
    }

    pub fn sentences(&self) -> &[PracticeSentence] {
        &self.sentences
    }

    pub fn update_settings(&mut self, update: impl FnOnce(&mut Settings)) {
        update(&mut self.settings);
        self.store.save_best_effort(SETTINGS_KEY, &self.settings);
    }

    pub fn set_goal(&mut self, goal: &str) {
        self.goal = goal.trim().to_string();
        self.store.save_best_effort(GOAL_KEY, &self.goal);
    }

    /// Back to demo data; the audio-practice list is kept.
    pub fn reset(&mut self) {
        self.store.reset();
        self.settings = Settings::default();
        self.goal = DEFAULT_GOAL.to_string();
        self.plan = demo_plan();
    }

    fn lesson_index(&self, number: usize) -> Result<usize> {
        number
            .checked_sub(1)
            .filter(|i| *i < self.plan.lessons.len())
            .ok_or(TutorError::LessonNotFound(number))
    }

    /// Replace the plan with a freshly generated one. Unusable model output
    /// degrades to the demo plan rather than failing.
    pub async fn generate_plan(&mut self) -> Result<&StudyPlan> {
        let _busy = self.plan_slot.acquire()?;
        info!("Calling the model for a fresh plan");
        let content = self
            .client
            .complete(&prompts::plan(&self.goal, &self.settings), &self.settings)
            .await?;
        self.plan = normalize_plan(&content, &demo_plan());
        self.store.save_best_effort(PLAN_KEY, &self.plan);
        Ok(&self.plan)
    }

    /// Append newly generated exercises to lesson `number` (1-based).
    /// Returns how many were added.
    pub async fn add_exercises(&mut self, number: usize) -> Result<usize> {
        let _busy = self.lesson_slot.acquire()?;
        let index = self.lesson_index(number)?;
        let messages = prompts::more_exercises(&self.plan.lessons[index], &self.settings);
        let content = self.client.complete(&messages, &self.settings).await?;
        let exercises = parse::exercises_from_reply(&content)?;

        let added = exercises.len();
        self.plan.lessons[index].exercises.extend(exercises);
        self.store.save_best_effort(PLAN_KEY, &self.plan);
        info!("Added {added} exercises to lesson {number}");
        Ok(added)
    }

    pub async fn explain_lesson(&self, number: usize) -> Result<String> {
        let _busy = self.lesson_slot.acquire()?;
        let index = self.lesson_index(number)?;
        let messages = prompts::explain_lesson(&self.plan.lessons[index], &self.settings);
        let content = self.client.complete(&messages, &self.settings).await?;
        Ok(content.trim().to_string())
    }

    /// Evaluate an answer for exercise `exercise` (1-based) of lesson `lesson`.
    pub fn check_answer(&self, lesson: usize, exercise: usize, response: &str) -> Result<bool> {
        let index = self.lesson_index(lesson)?;
        let ex = exercise
            .checked_sub(1)
            .and_then(|i| self.plan.lessons[index].exercises.get(i))
            .ok_or(TutorError::ExerciseNotFound { lesson, exercise })?;
        Ok(ex.check(response))
    }

    pub async fn generate_sentences(&mut self) -> Result<usize> {
        let _busy = self.sentences_slot.acquire()?;
        let content = self
            .client
            .complete(&prompts::practice_sentences(&self.settings), &self.settings)
            .await?;
        let new = parse::parse_sentence_list(&content)?;
        let added = new.len();
        self.sentences.extend(new);
        self.store.save_best_effort(AUDIO_SENTENCES_KEY, &self.sentences);
        Ok(added)
    }

    pub async fn add_sentence(&mut self, input: &str) -> Result<&PracticeSentence> {
        let input = input.trim();
        if input.is_empty() {
            return Err(TutorError::InvalidSentences("nothing to add".into()));
        }
        let _busy = self.add_sentence_slot.acquire()?;
        let content = self
            .client
            .complete(&prompts::single_sentence(input, &self.settings), &self.settings)
            .await?;
        let sentence = parse::parse_single_sentence(&content, input)?;
        self.sentences.push(sentence);
        self.store.save_best_effort(AUDIO_SENTENCES_KEY, &self.sentences);
        Ok(&self.sentences[self.sentences.len() - 1])
    }

    /// Copy every sentence of the stored plan into the audio-practice list.
    pub fn import_sentences_from_plan(&mut self) -> Result<usize> {
        let imported: Vec<PracticeSentence> = self
            .plan
            .lessons
            .iter()
            .flat_map(|lesson| lesson.sentences.iter().cloned())
            .map(PracticeSentence::new)
            .collect();
        if imported.is_empty() {
            return Err(TutorError::NoSentences);
        }
        let count = imported.len();
        self.sentences.extend(imported);
        self.store.save_best_effort(AUDIO_SENTENCES_KEY, &self.sentences);
        Ok(count)
    }

    /// Remove a practice sentence by id or unique id prefix. A blank prefix
    /// matches nothing.
    pub fn remove_sentence(&mut self, id: &str) -> bool {
        let id = id.trim();
        if id.is_empty() {
            return false;
        }
        let matches: Vec<usize> = self
            .sentences
            .iter()
            .enumerate()
            .filter(|(_, s)| s.id.starts_with(id))
            .map(|(i, _)| i)
            .collect();
        let [index] = matches.as_slice() else {
            return false;
        };
        self.sentences.remove(*index);
        self.store.save_best_effort(AUDIO_SENTENCES_KEY, &self.sentences);
        true
    }

    pub async fn synthesize(&mut self, text: &str, pace: Pace, voice: Option<TtsVoice>) -> Result<AudioClip> {
        let speed = match pace {
            Pace::Normal => self.tts.normal_speed,
            Pace::Slow => self.tts.slow_speed,
        };
        let request = TtsRequest {
            text,
            voice: voice.unwrap_or(self.tts.voice),
            speed,
        };
        tts::synthesize(
            &mut self.audio,
            self.client.transport(),
            &self.settings,
            &self.tts.model,
            &request,
        )
        .await
    }

    /// Tear down the audio-practice feature: release all cached clips.
    pub fn close_audio(&mut self) -> usize {
        self.audio.clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tutor::client::tests::{keyed_settings, MockTransport};
    use serde_json::json;
    use tempfile::TempDir;

    fn session_with(transport: MockTransport) -> (TempDir, Session<MockTransport>) {
        let dir = TempDir::new().unwrap();
        let store = Store::new(dir.path().join("data"), "ll");
        store.save(SETTINGS_KEY, &keyed_settings()).unwrap();
        let audio = AudioCache::new(&dir.path().join("audio"));
        let session = Session::new(store, TutorClient::new(transport), TtsConfig::default()).with_audio_cache(audio);
        (dir, session)
    }

    #[test]
    fn slot_refuses_reentry_until_released() {
        let slot = ActionSlot::new("test");
        let guard = slot.acquire().unwrap();
        assert!(slot.is_busy());
        assert!(matches!(slot.acquire(), Err(TutorError::Busy("test"))));
        drop(guard);
        assert!(!slot.is_busy());
        assert!(slot.acquire().is_ok());
    }

    #[tokio::test]
    async fn busy_action_is_refused_without_network() {
        let (_dir, mut session) = session_with(MockTransport::completion(json!("[]")));
        let slot = session.lesson_slot.clone();
        let _held = slot.acquire().unwrap();

        assert!(matches!(session.add_exercises(1).await, Err(TutorError::Busy(_))));
        assert!(matches!(session.explain_lesson(1).await, Err(TutorError::Busy(_))));
        assert_eq!(session.client.transport().call_count(), 0);
    }

    #[tokio::test]
    async fn generated_plan_replaces_and_persists() {
        let reply = json!({"title": "X", "steps": ["a"], "lessons": [{"title": "L1"}]}).to_string();
        let (dir, mut session) = session_with(MockTransport::completion(json!(reply)));

        let plan = session.generate_plan().await.unwrap();
        assert_eq!(plan.title, "X");
        assert!(!session.plan_slot.is_busy());

        let reloaded = Store::new(dir.path().join("data"), "ll").plan();
        assert_eq!(reloaded.title, "X");
        assert_eq!(reloaded.lessons[0].id, "lesson-1");
    }

    #[tokio::test]
    async fn garbage_plan_reply_degrades_to_demo() {
        let (_dir, mut session) = session_with(MockTransport::completion(json!("I cannot help with that.")));
        let plan = session.generate_plan().await.unwrap();
        assert_eq!(*plan, demo_plan());
    }

    #[tokio::test]
    async fn exercises_append_in_place() {
        let reply = "```json\n[{\"type\":\"fill\",\"prompt\":\"Hola, ____ Ana.\",\"answer\":\"soy\"}]\n```";
        let (_dir, mut session) = session_with(MockTransport::completion(json!(reply)));
        let before = session.plan().lessons[1].exercises.len();

        assert_eq!(session.add_exercises(2).await.unwrap(), 1);
        let exercises = &session.plan().lessons[1].exercises;
        assert_eq!(exercises.len(), before + 1);
        assert_eq!(exercises[before].answer.as_deref(), Some("soy"));
        assert_eq!(session.plan().lessons[0].exercises.len(), demo_plan().lessons[0].exercises.len());
        assert!(session.check_answer(2, before + 1, " SOY ").unwrap());
    }

    #[tokio::test]
    async fn empty_exercise_reply_leaves_plan_untouched() {
        let (_dir, mut session) = session_with(MockTransport::completion(json!("[]")));
        assert!(matches!(session.add_exercises(1).await, Err(TutorError::NoExercises)));
        assert_eq!(session.plan(), &demo_plan());
        assert!(!session.lesson_slot.is_busy());
    }

    #[tokio::test]
    async fn unknown_lesson_is_reported() {
        let (_dir, mut session) = session_with(MockTransport::completion(json!("[]")));
        assert!(matches!(session.add_exercises(0).await, Err(TutorError::LessonNotFound(0))));
        assert!(matches!(session.add_exercises(9).await, Err(TutorError::LessonNotFound(9))));
        assert!(matches!(
            session.check_answer(1, 7, "x"),
            Err(TutorError::ExerciseNotFound { lesson: 1, exercise: 7 })
        ));
    }

    #[tokio::test]
    async fn explanation_is_trimmed() {
        let (_dir, session) = session_with(MockTransport::completion(json!("  Vowels are short.\n")));
        assert_eq!(session.explain_lesson(1).await.unwrap(), "Vowels are short.");
    }

    #[tokio::test]
    async fn sentences_generate_import_and_remove() {
        let reply = r#"[{"target":"Buenas noches","translation":"Good night"}]"#;
        let (_dir, mut session) = session_with(MockTransport::completion(json!(reply)));

        assert_eq!(session.generate_sentences().await.unwrap(), 1);
        assert_eq!(session.import_sentences_from_plan().unwrap(), 9);
        assert_eq!(session.sentences().len(), 10);

        let id = session.sentences()[0].id.clone();
        assert!(session.remove_sentence(&id));
        assert!(!session.remove_sentence(&id));
        assert_eq!(session.sentences().len(), 9);
    }

    #[tokio::test]
    async fn import_from_empty_plan_fails() {
        let reply = r#"{"lessons":[{"title":"Only title"}]}"#;
        let (_dir, mut session) = session_with(MockTransport::completion(json!(reply)));
        session.generate_plan().await.unwrap();
        assert!(matches!(session.import_sentences_from_plan(), Err(TutorError::NoSentences)));
    }

    #[tokio::test]
    async fn slow_pace_uses_slow_speed() {
        let (_dir, mut session) = session_with(MockTransport::new(200, b"mp3".to_vec()));
        let clip = session.synthesize("Hola", Pace::Slow, None).await.unwrap();
        assert!(clip.path.exists());
        let (_, _, body) = session.client.transport().last_request.lock().unwrap().clone().unwrap();
        assert_eq!(body["speed"], json!(0.7));
        assert!(body.to_string().contains("\"speed\":0.7"));
        assert_eq!(body["voice"], "alloy");

        assert_eq!(session.close_audio(), 1);
        assert!(!clip.path.exists());
    }

    #[tokio::test]
    async fn blank_prefix_removes_nothing() {
        let reply = r#"[{"target":"Buenas noches","translation":"Good night"}]"#;
        let (_dir, mut session) = session_with(MockTransport::completion(json!(reply)));
        session.generate_sentences().await.unwrap();
        assert_eq!(session.sentences().len(), 1);

        assert!(!session.remove_sentence(""));
        assert!(!session.remove_sentence("   "));
        assert_eq!(session.sentences().len(), 1);

        let prefix: String = session.sentences()[0].id.chars().take(8).collect();
        assert!(session.remove_sentence(&prefix));
        assert!(session.sentences().is_empty());
    }
}
