//! lingo-tutor: language-learning tutor for the terminal.

mod config;
mod demo_plan;
mod error;
mod model;
mod notifier;
mod render;
mod session;
mod speech;
mod store;
mod tutor;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use error::{Result, TutorError};
use notifier::{Level, Notifier};
use session::{Pace, Session};
use speech::tts::TtsVoice;
use speech::voice::{self, LocalSpeaker};
use store::Store;
use tutor::client::{ReqwestTransport, TutorClient};

#[derive(Parser, Debug)]
#[command(name = "lingo-tutor", version, about = "Language-learning tutor backed by a chat-completion endpoint")]
struct Args {
    /// Path to config.yaml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show or change API key, model, endpoint and languages
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },
    /// Show or set the learning goal used for plan generation
    Goal { text: Option<String> },
    /// Generate or show the study plan
    Plan {
        #[command(subcommand)]
        action: PlanAction,
    },
    /// Lessons of the current plan
    Lesson {
        #[command(subcommand)]
        action: LessonAction,
    },
    /// Lesson exercises
    Exercises {
        #[command(subcommand)]
        action: ExercisesAction,
    },
    /// Ask the tutor to explain a lesson
    Explain { lesson: usize },
    /// Check an answer to an exercise
    Check {
        lesson: usize,
        exercise: usize,
        answer: String,
    },
    /// Audio-practice sentence list
    Sentences {
        #[command(subcommand)]
        action: SentencesAction,
    },
    /// List host voices or resolve one for the target language
    Voices {
        #[command(subcommand)]
        action: VoicesAction,
    },
    /// Speak text with the local synthesizer
    Say { text: String },
    /// Synthesize text with the remote TTS endpoint and play it
    Speak {
        text: String,
        #[arg(long)]
        slow: bool,
        #[arg(long, value_enum)]
        voice: Option<TtsVoice>,
        /// Save the clip instead of playing it
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Reset settings, goal and plan to the demo data
    Reset,
}

#[derive(Subcommand, Debug)]
enum SettingsAction {
    Show,
    Set { field: SettingsField, value: String },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum SettingsField {
    ApiKey,
    Model,
    BaseUrl,
    UserLanguage,
    TargetLanguage,
}

#[derive(Subcommand, Debug)]
enum PlanAction {
    Generate,
    Show,
}

#[derive(Subcommand, Debug)]
enum LessonAction {
    /// Show one lesson (1-based)
    Show { number: usize },
}

#[derive(Subcommand, Debug)]
enum ExercisesAction {
    /// Ask the tutor for more exercises and append them to a lesson
    Add { lesson: usize },
}

#[derive(Subcommand, Debug)]
enum SentencesAction {
    List,
    /// Generate five new practice sentences
    Generate,
    /// Add a sentence typed in either language
    Add { text: String },
    /// Copy every sentence of the current plan
    Import,
    /// Remove a sentence by id (a unique prefix is enough)
    Remove { id: String },
}

#[derive(Subcommand, Debug)]
enum VoicesAction {
    List,
    Resolve { language: Option<String> },
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the lesson content
    let filter = if args.verbose {
        EnvFilter::new("debug,hyper=warn,reqwest=warn")
    } else {
        EnvFilter::new("info,hyper=warn,reqwest=warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let config = config::Config::load(args.config.as_deref());
    let notifier = Notifier::new(config.feedback.notifications);

    let store = Store::new(config.storage.resolved_dir(), &config.storage.namespace);
    info!("Using data directory {}", store.base_dir().display());
    let client = TutorClient::new(ReqwestTransport::new(config.http.timeout_secs));
    let mut session = Session::new(store, client, config.tts.clone());
    let speaker = LocalSpeaker::new(&config.speech);

    if let Err(e) = run(args.command, &mut session, &speaker, &notifier).await {
        error!("{e}");
        notifier.notify(Level::Error, &e.to_string());
        eprintln!("error: {e}");
        std::process::exit(1);
    }

    Ok(())
}

async fn run(
    command: Command,
    session: &mut Session<ReqwestTransport>,
    speaker: &LocalSpeaker,
    notifier: &Notifier,
) -> Result<()> {
    match command {
        Command::Settings { action: SettingsAction::Show } => {
            print!("{}", render::settings(session.settings()));
        }
        Command::Settings {
            action: SettingsAction::Set { field, value },
        } => {
            session.update_settings(|s| match field {
                SettingsField::ApiKey => s.api_key = value,
                SettingsField::Model => s.model = value,
                SettingsField::BaseUrl => s.base_url = value,
                SettingsField::UserLanguage => s.user_language = value,
                SettingsField::TargetLanguage => s.target_language = value,
            });
            print!("{}", render::settings(session.settings()));
        }
        Command::Goal { text: Some(text) } => {
            session.set_goal(&text);
            println!("Goal: {}", session.goal());
        }
        Command::Goal { text: None } => println!("Goal: {}", session.goal()),
        Command::Plan { action: PlanAction::Show } => print!("{}", render::plan(session.plan())),
        Command::Plan {
            action: PlanAction::Generate,
        } => {
            let plan = session.generate_plan().await?;
            print!("{}", render::plan(plan));
            notifier.notify(Level::Success, "Plan updated with AI output and saved locally.");
        }
        Command::Lesson {
            action: LessonAction::Show { number },
        } => {
            let lesson = number
                .checked_sub(1)
                .and_then(|i| session.plan().lessons.get(i))
                .ok_or(TutorError::LessonNotFound(number))?;
            print!("{}", render::lesson(number, lesson));
        }
        Command::Exercises {
            action: ExercisesAction::Add { lesson },
        } => {
            let added = session.add_exercises(lesson).await?;
            let message = format!("Added {added} exercises.");
            println!("{message}");
            notifier.notify(Level::Success, &message);
        }
        Command::Explain { lesson } => {
            let explanation = session.explain_lesson(lesson).await?;
            println!("{explanation}");
            notifier.notify(Level::Success, "Lesson explained.");
        }
        Command::Check {
            lesson,
            exercise,
            answer,
        } => {
            if session.check_answer(lesson, exercise, &answer)? {
                println!("Correct!");
            } else {
                println!("Not quite. Try again.");
            }
        }
        Command::Sentences { action } => run_sentences(action, session, notifier).await?,
        Command::Voices {
            action: VoicesAction::List,
        } => {
            let voices = speaker.voices();
            if voices.is_empty() {
                println!("Speech synthesis is not available on this system.");
            }
            for (_, label) in voice::list_voice_languages(&voices) {
                println!("{label}");
            }
        }
        Command::Voices {
            action: VoicesAction::Resolve { language },
        } => {
            let language = language.unwrap_or_else(|| session.settings().target_language.clone());
            let voices = speaker.voices();
            match voice::resolve_voice(&language, &voices) {
                Some(v) => println!("{} ({})", v.name, v.lang),
                None => println!("No voice available for {language}."),
            }
        }
        Command::Say { text } => {
            let spoken = speaker.speak(&text, &session.settings().target_language)?;
            if !spoken {
                println!("Speech synthesis is not available on this system.");
            }
        }
        Command::Speak {
            text,
            slow,
            voice,
            out,
        } => {
            let pace = if slow { Pace::Slow } else { Pace::Normal };
            let clip = session.synthesize(&text, pace, voice).await?;
            let result = match out {
                Some(path) => std::fs::copy(&clip.path, &path)
                    .map(|_| println!("Saved {}", path.display()))
                    .map_err(|e| TutorError::Audio(e.to_string())),
                None => speech::player::play(&clip).await,
            };
            session.close_audio();
            result?;
        }
        Command::Reset => {
            session.reset();
            println!("Reset to demo data.");
        }
    }
    Ok(())
}

async fn run_sentences(
    action: SentencesAction,
    session: &mut Session<ReqwestTransport>,
    notifier: &Notifier,
) -> Result<()> {
    match action {
        SentencesAction::List => print!("{}", render::sentences(session.sentences())),
        SentencesAction::Generate => {
            let added = session.generate_sentences().await?;
            let message = format!("Added {added} sentences");
            println!("{message}");
            notifier.notify(Level::Success, &message);
        }
        SentencesAction::Add { text } => {
            let sentence = session.add_sentence(&text).await?;
            print!("{}", render::sentences(std::slice::from_ref(sentence)));
        }
        SentencesAction::Import => {
            let count = session.import_sentences_from_plan()?;
            let message = format!("Imported {count} sentences from plan");
            println!("{message}");
            notifier.notify(Level::Success, &message);
        }
        SentencesAction::Remove { id } => {
            if session.remove_sentence(&id) {
                println!("Removed.");
            } else {
                println!("No single sentence matches '{id}'.");
            }
        }
    }
    Ok(())
}
