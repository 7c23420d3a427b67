mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use common::{day, freeform_options, scattered_occurrences};

use learning_history::history::{
    summarize, ContextVerdict, Direction, GradedAnswer, HistoryBook, Occurrence,
    OccurrenceReconciler, RetentionScheduler, SurfaceForms,
};
use learning_history::session::{
    AnswerOutcome, JudgeError, JudgeRequest, LearningSession, SessionError, SharedSession,
};
use learning_history::snapshot;

fn accept_first_context(request: &JudgeRequest) -> Result<GradedAnswer, JudgeError> {
    let first = request.contexts.first().ok_or("no contexts")?;
    Ok(GradedAnswer {
        correct: true,
        quality: 4,
        reason: String::new(),
        context_verdicts: vec![ContextVerdict {
            context: first.text.clone(),
            correct: true,
            reason: "fits the scene".to_string(),
            quality: 4,
        }],
    })
}

#[test]
fn judge_sees_union_of_pending_contexts() {
    let mut session = LearningSession::new(
        HistoryBook::new(),
        scattered_occurrences("test", 3),
        OccurrenceReconciler::default(),
    );

    let seen = AtomicUsize::new(0);
    let judge = |request: &JudgeRequest| -> Result<GradedAnswer, JudgeError> {
        seen.store(request.contexts.len(), Ordering::SeqCst);
        accept_first_context(request)
    };

    session
        .answer(&judge, "test", "an examination", &freeform_options(day(0)))
        .unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 3);

    session
        .answer(&judge, "test", "an examination", &freeform_options(day(0)))
        .unwrap();
    assert_eq!(seen.load(Ordering::SeqCst), 2);
    assert_eq!(
        session.mastery(Direction::Forward, day(0)),
        vec![true, true, false]
    );
}

#[test]
fn out_of_range_judge_quality_aborts_attempt() {
    let mut session = LearningSession::new(
        HistoryBook::new(),
        scattered_occurrences("test", 1),
        OccurrenceReconciler::default(),
    );
    let judge = |_: &JudgeRequest| -> Result<GradedAnswer, JudgeError> {
        Ok(GradedAnswer {
            correct: true,
            quality: 0,
            reason: String::new(),
            context_verdicts: Vec::new(),
        })
    };
    let err = session
        .answer(&judge, "test", "an examination", &freeform_options(day(0)))
        .unwrap_err();
    assert!(matches!(err, SessionError::Engine(_)));
    assert!(session.book().is_empty());
}

#[test]
fn shared_session_commits_from_many_threads() {
    let occurrences: Vec<Occurrence> = ["harbor", "storm", "mutiny", "island"]
        .iter()
        .map(|word| {
            Occurrence::new("story-1", Some("chapter-1"), SurfaceForms::new(*word))
                .with_context(format!("The {word} changed everything."), *word)
        })
        .collect();
    let shared = SharedSession::new(LearningSession::new(
        HistoryBook::new(),
        occurrences,
        OccurrenceReconciler::default(),
    ));

    let handles: Vec<_> = ["harbor", "storm", "mutiny", "island"]
        .into_iter()
        .map(|word| {
            let shared = shared.clone();
            thread::spawn(move || {
                shared
                    .answer(&accept_first_context, word, "meaning", &freeform_options(day(0)))
                    .unwrap()
            })
        })
        .collect();
    for handle in handles {
        assert!(matches!(handle.join().unwrap(), AnswerOutcome::Committed(_)));
    }

    let mastery = shared.with(|session| session.mastery(Direction::Forward, day(0)));
    assert_eq!(mastery, vec![true; 4]);
}

#[test]
fn snapshot_round_trip_through_disk() {
    let mut session = LearningSession::new(
        HistoryBook::new(),
        scattered_occurrences("test", 2),
        OccurrenceReconciler::default(),
    );
    session
        .answer(&accept_first_context, "test", "an examination", &freeform_options(day(0)))
        .unwrap();
    let book = session.into_book();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("history.json");
    snapshot::save(&path, &book).unwrap();
    let restored = snapshot::load(&path).unwrap();
    assert_eq!(restored, book);

    let reloaded = LearningSession::new(
        restored,
        scattered_occurrences("test", 2),
        OccurrenceReconciler::default(),
    );
    assert_eq!(reloaded.pending("test", Direction::Forward, day(0)).len(), 1);
}

#[test]
fn missing_snapshot_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = snapshot::load(&dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, snapshot::SnapshotError::Io(_)));
}

#[test]
fn shared_handle_unwraps_after_threads_finish() {
    let shared = SharedSession::new(LearningSession::new(
        HistoryBook::new(),
        Vec::new(),
        OccurrenceReconciler::default(),
    ));
    let handle = shared.clone();
    assert!(thread::spawn(move || handle.with(|session| session.occurrences().is_empty()))
        .join()
        .unwrap());
    assert!(shared.into_inner().is_some());
}

#[test]
fn shared_session_skips_occurrence_mastered_while_judging() {
    let shared = SharedSession::new(LearningSession::new(
        HistoryBook::new(),
        scattered_occurrences("test", 1),
        OccurrenceReconciler::default(),
    ));

    // Another request on the same session lands while this answer is judged.
    let other = shared.clone();
    let slow_judge = move |request: &JudgeRequest| -> Result<GradedAnswer, JudgeError> {
        let first = other.answer(
            &accept_first_context,
            "test",
            "an examination",
            &freeform_options(day(0)),
        )?;
        assert!(matches!(first, AnswerOutcome::Committed(_)));
        accept_first_context(request)
    };

    let outcome = shared
        .answer(&slow_judge, "test", "an examination", &freeform_options(day(0)))
        .unwrap();
    assert_eq!(outcome, AnswerOutcome::NothingPending);

    let attempts = shared.with(|session| {
        session
            .book()
            .notebook("story-1")
            .map(|notebook| notebook.expressions(Some("scene-1"))[0].forward.len())
    });
    assert_eq!(attempts, Some(1));
}

#[test]
fn oversized_interval_in_snapshot_is_summarized() {
    let raw = r#"{
        "deck": {
            "kind": "flashcard",
            "expressions": [{
                "expression": "lookout",
                "forward": [{
                    "status": "understood",
                    "gradedAt": "2025-01-01",
                    "quizKind": "flashcard",
                    "intervalDays": 100000000
                }]
            }]
        }
    }"#;
    let book = snapshot::from_json(raw).unwrap();
    let stats = summarize(&book, &RetentionScheduler::default(), Direction::Forward, day(30));
    assert_eq!(stats["deck"].mastered, 1);
    assert_eq!(stats["deck"].due, 0);
}
