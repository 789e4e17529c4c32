//! Plain-text rendering of plans, lessons and practice sentences.

use std::fmt::Write;

use crate::model::{Lesson, PracticeSentence, Settings, StudyPlan};

pub fn plan(plan: &StudyPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", plan.title);
    let _ = writeln!(out, "{}", "=".repeat(plan.title.chars().count()));
    for (i, step) in plan.steps.iter().enumerate() {
        let _ = writeln!(out, "  {}. {step}", i + 1);
    }
    let _ = writeln!(out);
    for (i, lesson) in plan.lessons.iter().enumerate() {
        let _ = writeln!(out, "[{}] {} - {}", i + 1, lesson.title, lesson.topic);
        let _ = writeln!(out, "    {}", lesson.summary);
    }
    out
}

pub fn lesson(number: usize, lesson: &Lesson) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Lesson {number}: {} ({})", lesson.title, lesson.topic);
    let _ = writeln!(out, "{}\n", lesson.summary);

    let _ = writeln!(out, "Basics");
    for point in &lesson.basics {
        let _ = writeln!(out, "  - {point}");
    }

    let _ = writeln!(out, "\nSentences");
    for s in &lesson.sentences {
        let _ = writeln!(out, "  {}", s.target);
        let _ = writeln!(out, "    {}", s.translation);
        if let Some(phonetic) = &s.phonetic {
            let _ = writeln!(out, "    /{phonetic}/");
        }
        if let Some(note) = &s.note {
            let _ = writeln!(out, "    note: {note}");
        }
    }

    let _ = writeln!(out, "\nExercises");
    for (i, ex) in lesson.exercises.iter().enumerate() {
        let _ = writeln!(out, "  {}. [{}] {}", i + 1, ex.kind, ex.prompt);
        if let Some(options) = &ex.options {
            let _ = writeln!(out, "     options: {}", options.join(" / "));
        }
    }
    out
}

pub fn sentences(sentences: &[PracticeSentence]) -> String {
    if sentences.is_empty() {
        return "No practice sentences yet.\n".into();
    }
    let mut out = String::new();
    for s in sentences {
        let short_id: String = s.id.chars().take(8).collect();
        let _ = writeln!(out, "{short_id}  {}", s.sentence.target);
        let _ = writeln!(out, "          {}", s.sentence.translation);
        if let Some(phonetic) = &s.sentence.phonetic {
            let _ = writeln!(out, "          /{phonetic}/");
        }
        if let Some(note) = &s.sentence.note {
            let _ = writeln!(out, "          note: {note}");
        }
    }
    out
}

pub fn settings(settings: &Settings) -> String {
    format!(
        "api-key:         {}\nmodel:           {}\nbase-url:        {}\nuser-language:   {}\ntarget-language: {}\n",
        settings.masked_key(),
        settings.model,
        settings.base_url,
        settings.user_language,
        settings.target_language,
    )
}
