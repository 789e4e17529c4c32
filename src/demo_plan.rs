//! Built-in starter plan, used before anything has been generated and as the
//! fallback whenever model output cannot be normalized.

use crate::model::{Exercise, ExerciseKind, Lesson, Sentence, StudyPlan};

fn sentence(target: &str, translation: &str, phonetic: &str) -> Sentence {
    Sentence {
        target: target.into(),
        translation: translation.into(),
        phonetic: Some(phonetic.into()),
        note: None,
    }
}

fn exercise(kind: ExerciseKind, prompt: &str, options: &[&str], answer: Option<&str>) -> Exercise {
    Exercise {
        kind,
        prompt: prompt.into(),
        options: if options.is_empty() {
            None
        } else {
            Some(options.iter().map(|o| o.to_string()).collect())
        },
        answer: answer.map(String::from),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

pub fn demo_plan() -> StudyPlan {
    StudyPlan {
        title: "Two-week Spanish warmup".into(),
        steps: strings(&[
            "Days 1-3: basic greetings and pronunciation.",
            "Days 4-7: daily routines and present tense verbs.",
            "Days 8-10: ordering food and travel basics.",
            "Days 11-14: past tense introduction and storytelling.",
        ]),
        lessons: vec![
            Lesson {
                id: "sounds".into(),
                title: "Saludos y Sonidos".into(),
                topic: "Greetings and Pronunciation".into(),
                summary: "Master the basics of Spanish pronunciation and learn to introduce yourself."
                    .into(),
                basics: strings(&[
                    "Vowels: a, e, i, o, u are always clear and short.",
                    "The letter 'ñ' sounds like 'ny' in canyon.",
                    "Greetings: Hola, Buenos días, Adiós, Hasta luego.",
                ]),
                sentences: vec![
                    sentence(
                        "Hola, me llamo Elena. ¡Mucho gusto!",
                        "Hi, I am Elena. Nice to meet you!",
                        "oh-lah, meh yah-moh eh-leh-nah. moo-choh goos-toh",
                    ),
                    sentence("¿Cómo estás?", "How are you?", "koh-moh ehs-tahs"),
                    sentence(
                        "Soy de México y vivo en Madrid.",
                        "I am from Mexico and I live in Madrid.",
                        "soy deh meh-hee-koh ee bee-boh ehn mah-dreed",
                    ),
                ],
                exercises: vec![
                    exercise(
                        ExerciseKind::Cards,
                        "Select 'See you later'.",
                        &["Hasta luego", "Buenos días", "Por favor"],
                        Some("Hasta luego"),
                    ),
                    exercise(ExerciseKind::Fill, "Complete: Me ____ Elena.", &[], Some("llamo")),
                ],
            },
            Lesson {
                id: "daily-routine".into(),
                title: "Rutina Diaria".into(),
                topic: "Daily Routines".into(),
                summary: "Describe your day and ask others about their schedule.".into(),
                basics: strings(&[
                    "Reflexive verbs: levantarse (to get up), ducharse (to shower).",
                    "Common verbs: comer (to eat), trabajar (to work), dormir (to sleep).",
                    "Time: por la mañana, por la tarde, por la noche.",
                ]),
                sentences: vec![
                    sentence(
                        "Me levanto a las siete y tomo café.",
                        "I get up at seven and drink coffee.",
                        "meh leh-bahn-toh ah lahs syeh-teh ee toh-moh kah-feh",
                    ),
                    sentence(
                        "¿Trabajas hoy o descansas?",
                        "Are you working today or resting?",
                        "trah-bah-has oy oh des-kan-sas",
                    ),
                    sentence(
                        "Después del trabajo voy al gimnasio.",
                        "After work I go to the gym.",
                        "des-pwes del trah-bah-ho boy al him-nah-syoh",
                    ),
                ],
                exercises: vec![
                    exercise(
                        ExerciseKind::Order,
                        "Arrange: yo - como - tarde - más.",
                        &[],
                        Some("Yo como más tarde."),
                    ),
                    exercise(
                        ExerciseKind::Cards,
                        "Translate 'I sleep'.",
                        &["Yo duermo", "Yo corro", "Yo hablo"],
                        Some("Yo duermo"),
                    ),
                ],
            },
            Lesson {
                id: "service".into(),
                title: "En el Restaurante".into(),
                topic: "Ordering Food".into(),
                summary: "Order meals, ask for the bill, and be polite.".into(),
                basics: strings(&[
                    "Polite requests: Quisiera... (I would like...), ¿Me trae...? (Can you bring me...?).",
                    "Numbers for prices.",
                    "Vocabulary: la cuenta (the bill), el menú, agua, postre.",
                ]),
                sentences: vec![
                    sentence(
                        "Quisiera una mesa para dos, por favor.",
                        "I would like a table for two, please.",
                        "kee-syeh-rah oo-nah meh-sah pah-rah dos, por fah-bor",
                    ),
                    sentence("¿Cuánto cuesta esto?", "How much does this cost?", "kwan-toh kwes-ta es-toh"),
                    sentence("La cuenta, por favor.", "The bill, please.", "lah kwen-tah, por fah-bor"),
                ],
                exercises: vec![
                    exercise(ExerciseKind::Fill, "Complete: La ____, por favor.", &[], Some("cuenta")),
                    exercise(ExerciseKind::Match, "Match: Agua -> Water.", &[], None),
                ],
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn lesson_ids_are_unique() {
        let plan = demo_plan();
        let ids: HashSet<_> = plan.lessons.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids.len(), plan.lessons.len());
    }

    #[test]
    fn demo_answers_match_their_options() {
        for lesson in demo_plan().lessons {
            for ex in &lesson.exercises {
                assert!(ex.answer_in_options(), "{} / {}", lesson.id, ex.prompt);
            }
        }
    }
}
