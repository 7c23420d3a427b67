#![allow(dead_code)]

use chrono::NaiveDate;

use learning_history::history::{
    CommitOptions, ContextVerdict, Direction, GradedAnswer, Occurrence, QuizKind, SurfaceForms,
};

pub fn day(offset: i64) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 1).unwrap() + chrono::Duration::days(offset)
}

/// "test" appearing once in each of `scenes` scenes of one story notebook.
pub fn scattered_occurrences(word: &str, scenes: usize) -> Vec<Occurrence> {
    (1..=scenes)
        .map(|n| {
            Occurrence::new("story-1", Some(&format!("scene-{n}")), SurfaceForms::new(word))
                .with_context(format!("Scene {n}: they put the plan to the {word}."), word)
        })
        .collect()
}

pub fn correct_answer() -> GradedAnswer {
    GradedAnswer {
        correct: true,
        quality: 4,
        reason: "matches the meaning".to_string(),
        context_verdicts: Vec::new(),
    }
}

pub fn wrong_answer() -> GradedAnswer {
    GradedAnswer {
        correct: false,
        quality: 1,
        reason: "unrelated meaning".to_string(),
        context_verdicts: Vec::new(),
    }
}

pub fn accepted(context: &str, quality: i32) -> ContextVerdict {
    ContextVerdict {
        context: context.to_string(),
        correct: true,
        reason: String::new(),
        quality,
    }
}

pub fn freeform_options(graded_on: NaiveDate) -> CommitOptions {
    CommitOptions::new(Direction::Forward, QuizKind::Freeform, graded_on)
}
