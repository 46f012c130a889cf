//! Session flows: browsing, deep links and answering.

mod common;

use exercise_catalog::{
    CatalogError, CatalogLoader, CatalogSession, Feedback, LoadState, MemorySource, QuestionKey,
    View, SOLUTION_PLACEHOLDER,
};
use exercise_core::{
    AnswerInput, AnswerPhase, Facet, Grade, MatchingInput, Submission, TypeFacet, Verdict,
};
use std::collections::BTreeMap;
use pretty_assertions::assert_eq;

use common::fixtures;
use common::RecordingPresenter;

type Session = CatalogSession<MemorySource, RecordingPresenter>;

async fn started(source: MemorySource) -> Session {
    let loader = CatalogLoader::new(source, 10);
    let mut session = CatalogSession::new(loader, RecordingPresenter::default());
    session.start().await;
    session
}

/// 20 grade-9 records followed by 5 grade-11 ones.
fn mixed_source() -> MemorySource {
    (20..25).fold(fixtures::numbered_source(20), |source, i| {
        let id = format!("ex-{i}");
        source.with_record(fixtures::entry(&id), fixtures::free_text(&id, 11, "Energija", "1"))
    })
}

fn grade(n: i64) -> Grade {
    Grade::new(n).unwrap()
}

#[tokio::test]
async fn test_start_shows_first_batch() {
    let session = started(fixtures::numbered_source(25)).await;
    let presenter = session.presenter();

    assert_eq!(presenter.controls.len(), 1);
    assert_eq!(presenter.shown_ids(), fixtures::ids(0, 10));
    assert!(presenter.last_view().tags().is_empty());

    let (state, pagination) = presenter.last_load_state();
    assert_eq!(*state, LoadState::Idle);
    assert_eq!(pagination.loaded_count, 10);
    assert_eq!(pagination.manifest_length, Some(25));
    assert!(session.taxonomy().has_topics(grade(11)));
}

#[tokio::test]
async fn test_load_more_until_exhausted() {
    let mut session = started(fixtures::numbered_source(25)).await;

    session.notify_load_more().await;
    assert_eq!(session.presenter().shown_ids(), fixtures::ids(0, 20));
    session.notify_load_more().await;
    assert_eq!(session.presenter().shown_ids(), fixtures::ids(0, 25));
    assert_eq!(session.presenter().last_load_state().0, LoadState::Complete);

    let views = session.presenter().views.len();
    session.notify_load_more().await;
    assert_eq!(session.presenter().views.len(), views);
}

/// Filtering over a partial load pulls in the rest of the manifest first.
#[tokio::test]
async fn test_grade_filter_sees_unloaded_records() {
    let mut session = started(mixed_source()).await;
    assert_eq!(session.loader().pagination().await.loaded_count, 10);

    session.request_facet_toggle(Facet::Grade(grade(11)), true).await;

    assert_eq!(session.loader().pagination().await.loaded_count, 25);
    assert_eq!(session.presenter().shown_ids(), fixtures::ids(20, 25));
    let tags = session.presenter().last_view().tags();
    assert_eq!(tags.len(), 1);
    assert_eq!(tags[0].label, "11 klasė");
    assert_eq!(session.presenter().controls.len(), 2);
}

#[tokio::test]
async fn test_unchanged_toggle_renders_nothing() {
    let mut session = started(mixed_source()).await;
    let views = session.presenter().views.len();

    session.request_facet_toggle(Facet::Grade(grade(12)), false).await;
    session.request_clear_all().await;
    session.set_search("").await;

    assert_eq!(session.presenter().views.len(), views);
    assert_eq!(session.loader().pagination().await.loaded_count, 10);
}

#[tokio::test]
async fn test_no_match_and_clear_all() {
    let mut session = started(mixed_source()).await;

    session.request_facet_toggle(Facet::Grade(grade(12)), true).await;
    assert!(session.presenter().last_view().is_no_match());

    session.request_clear_all().await;
    assert!(!session.facets().is_active());
    assert_eq!(session.presenter().shown_ids(), fixtures::ids(0, 25));
    assert!(session.presenter().last_view().tags().is_empty());
}

#[tokio::test]
async fn test_search_matches_question_text() {
    let mut session = started(mixed_source()).await;

    session.set_search("QUESTION EX-3").await;
    assert_eq!(session.facets().search(), "question ex-3");
    assert_eq!(session.presenter().shown_ids(), vec!["ex-3"]);

    session.set_search("energija").await;
    assert_eq!(session.presenter().shown_ids(), fixtures::ids(20, 25));
}

#[tokio::test]
async fn test_topic_selection_replaces_ancestor() {
    let source = mixed_source().with_record("s1.json", fixtures::structural("s1", 11));
    let mut session = started(source).await;

    session.request_facet_toggle(Facet::Grade(grade(11)), true).await;
    session
        .request_facet_toggle(Facet::Topic("Elektra ir magnetizmas".into()), true)
        .await;
    assert_eq!(session.presenter().shown_ids(), vec!["s1"]);

    session
        .request_facet_toggle(Facet::Topic("Elektros srovės šaltiniai.".into()), true)
        .await;
    assert_eq!(session.facets().topics(), ["Elektros srovės šaltiniai."]);
    assert_eq!(session.presenter().shown_ids(), vec!["s1"]);

    session.request_facet_toggle(Facet::Grade(grade(9)), true).await;
    assert!(session.facets().topics().is_empty());
}

#[tokio::test]
async fn test_type_facet_groups_single_part_kinds() {
    let source = fixtures::numbered_source(3)
        .with_record("mc.json", fixtures::multi_select("mc", 10))
        .with_record("s1.json", fixtures::structural("s1", 11));
    let mut session = started(source).await;

    session
        .request_facet_toggle(Facet::Type(TypeFacet::Normal), true)
        .await;
    assert_eq!(session.presenter().shown_ids(), vec!["ex-0", "ex-1", "ex-2", "mc"]);

    session
        .request_facet_toggle(Facet::Type(TypeFacet::Structural), true)
        .await;
    assert_eq!(session.presenter().last_view().records().len(), 5);
}

#[tokio::test]
async fn test_source_facet_matches_source_or_subsource() {
    let source = MemorySource::new()
        .with_record("a.json", fixtures::with_solution("a", 12, "VBE-2025-2", "s"))
        .with_record("b.json", fixtures::free_text("b", 11, "Energija", "1"))
        .with_record("c.json", fixtures::free_text("c", 9, "Optika", "1"));
    let mut session = started(source).await;

    session.request_facet_toggle(Facet::Source("VBE".into()), true).await;
    assert_eq!(session.presenter().shown_ids(), vec!["a", "b"]);

    session.request_facet_toggle(Facet::Source("VBE".into()), false).await;
    session
        .request_facet_toggle(Facet::Source("2025 (2)".into()), true)
        .await;
    assert_eq!(session.presenter().shown_ids(), vec!["a"]);
}

#[tokio::test]
async fn test_unlisted_facet_values_are_ignored() {
    let source = mixed_source().with_record("s1.json", fixtures::structural("s1", 11));
    let mut session = started(source).await;
    session.request_facet_toggle(Facet::Grade(grade(11)), true).await;
    let views = session.presenter().views.len();
    let controls = session.presenter().controls.len();

    session
        .request_facet_toggle(Facet::Topic("Nežinoma".into()), true)
        .await;
    session
        .request_facet_toggle(Facet::Source("Olimpiada".into()), true)
        .await;

    assert!(session.facets().topics().is_empty());
    assert!(session.facets().sources().is_empty());
    assert_eq!(session.presenter().views.len(), views);
    assert_eq!(session.presenter().controls.len(), controls);

    // Topics outside the selected grade are not offered either.
    session.request_facet_toggle(Facet::Topic("Optika".into()), true).await;
    assert!(session.facets().topics().is_empty());
}

/// A deep link reaches records beyond the loaded prefix.
#[tokio::test]
async fn test_single_record_view() {
    let mut session = started(mixed_source()).await;
    session.request_facet_toggle(Facet::Grade(grade(9)), true).await;

    session.request_single_record("ex-22").await;
    match session.presenter().last_view() {
        View::Single { record } => assert_eq!(record.id, "ex-22"),
        other => panic!("unexpected view {other:?}"),
    }

    session.request_return_to_catalog().await;
    assert_eq!(session.presenter().shown_ids(), fixtures::ids(0, 20));
    assert_eq!(session.presenter().last_view().tags().len(), 1);

    let views = session.presenter().views.len();
    session.request_return_to_catalog().await;
    assert_eq!(session.presenter().views.len(), views);
}

#[tokio::test]
async fn test_unknown_deep_link_is_not_found() {
    let mut session = started(mixed_source()).await;

    session.request_single_record("nope").await;
    let view = session.presenter().last_view();
    assert!(view.is_not_found());
    assert!(!view.is_no_match());
    assert_eq!(session.loader().pagination().await.loaded_count, 25);
}

#[tokio::test]
async fn test_failed_first_batch_reports_state() {
    let source = fixtures::numbered_source(3).with_dangling_entry("gone.json");
    let session = started(source).await;

    assert!(session.presenter().views.is_empty());
    let (state, pagination) = session.presenter().last_load_state();
    assert!(matches!(state, LoadState::Failed { .. }));
    assert_eq!(pagination.loaded_count, 0);
}

#[tokio::test]
async fn test_free_text_answer_flow() {
    let source = MemorySource::new().with_record(
        "e1.json",
        fixtures::with_solution("e1", 11, "VBE-2025", "E = 3,5 J"),
    );
    let mut session = started(source).await;
    let key = QuestionKey::exercise("e1");

    assert_eq!(session.submit_answer(&key).await.unwrap(), Submission::Incomplete);
    assert_eq!(*session.presenter().last_feedback(), Feedback::Incomplete);
    assert_eq!(session.answer_state(&key).unwrap().verdict(), None);

    session
        .set_input(&key, AnswerInput::Text(" 3.5 ".into()))
        .await
        .unwrap();
    let submission = session.submit_answer(&key).await.unwrap();
    assert_eq!(submission, Submission::Graded(Verdict::Correct));

    assert!(session.toggle_solution(&key).await.unwrap());
    assert_eq!(
        *session.presenter().last_feedback(),
        Feedback::SolutionShown {
            solution: "E = 3,5 J".into(),
            input: AnswerInput::Text("3,5".into()),
        }
    );
    assert!(session.answer_state(&key).unwrap().is_showing_answer());

    assert!(!session.toggle_solution(&key).await.unwrap());
    assert_eq!(
        *session.presenter().last_feedback(),
        Feedback::SolutionHidden {
            verdict: Some(Verdict::Correct),
            input: AnswerInput::Text(String::new()),
        }
    );
    let state = session.answer_state(&key).unwrap();
    assert!(state.feedback_visible());
    assert!(!state.is_showing_answer());
}

#[tokio::test]
async fn test_solution_placeholder() {
    let mut session = started(fixtures::numbered_source(1)).await;
    let key = QuestionKey::exercise("ex-0");

    session.toggle_solution(&key).await.unwrap();
    match session.presenter().last_feedback() {
        Feedback::SolutionShown { solution, .. } => assert_eq!(solution, SOLUTION_PLACEHOLDER),
        other => panic!("unexpected feedback {other:?}"),
    }
    assert_eq!(session.answer_state(&key).unwrap().verdict(), None);
}

#[tokio::test]
async fn test_multi_select_cap() {
    let source = MemorySource::new().with_record("mc.json", fixtures::multi_select("mc", 10));
    let mut session = started(source).await;
    let key = QuestionKey::exercise("mc");

    assert!(session.select_option(&key, "A").await.unwrap());
    assert!(session.select_option(&key, "B").await.unwrap());
    assert!(!session.select_option(&key, "C").await.unwrap());
    assert_eq!(
        session.submit_answer(&key).await.unwrap(),
        Submission::Graded(Verdict::Incorrect)
    );

    assert!(session.select_option(&key, "B").await.unwrap());
    assert!(session.select_option(&key, "C").await.unwrap());
    assert_eq!(
        session.submit_answer(&key).await.unwrap(),
        Submission::Graded(Verdict::Correct)
    );
}

#[tokio::test]
async fn test_composite_sub_questions_are_independent() {
    let source = MemorySource::new().with_record("s1.json", fixtures::structural("s1", 11));
    let mut session = started(source).await;
    let a = QuestionKey::sub_question("s1", "a");
    let b = QuestionKey::sub_question("s1", "b");

    session
        .set_input(&a, AnswerInput::Text("0.5".into()))
        .await
        .unwrap();
    assert_eq!(
        session.submit_answer(&a).await.unwrap(),
        Submission::Graded(Verdict::Correct)
    );
    let b_state = session.answer_state(&b).unwrap();
    assert_eq!(b_state.phase(), AnswerPhase::Unanswered);
    assert_eq!(b_state.verdict(), None);
    assert_eq!(
        session.composite_phases("s1").unwrap(),
        vec![
            ("a", AnswerPhase::Attempted(Verdict::Correct)),
            ("b", AnswerPhase::Unanswered),
        ]
    );

    assert!(session.select_option(&b, "x").await.unwrap());
    assert_eq!(
        session.submit_answer(&b).await.unwrap(),
        Submission::Graded(Verdict::Incorrect)
    );
    assert_eq!(
        session.answer_state(&a).unwrap().verdict(),
        Some(Verdict::Correct)
    );

    assert_eq!(
        session.composite_phases("s1").unwrap()[1],
        ("b", AnswerPhase::Attempted(Verdict::Incorrect))
    );
    assert!(session.composite_phases("missing").is_none());

    session.toggle_solution(&a).await.unwrap();
    match session.presenter().last_feedback() {
        Feedback::SolutionShown { solution, .. } => assert_eq!(solution, "I = U / R"),
        other => panic!("unexpected feedback {other:?}"),
    }
}

#[tokio::test]
async fn test_pair_matching_offers_shuffled_values() {
    let source = MemorySource::new()
        .with_record("m1.json", fixtures::pairs_matching("m1", 11))
        .with_record("e1.json", fixtures::free_text("e1", 11, "Energija", "1"));
    let mut session = started(source).await;
    let key = QuestionKey::exercise("m1");

    let mut offered = session.offered_values(&key).await.unwrap().unwrap();
    offered.sort();
    assert_eq!(offered, vec!["A", "V", "Ω"]);
    assert_eq!(
        session
            .offered_values(&QuestionKey::exercise("e1"))
            .await
            .unwrap(),
        None
    );

    let selections: BTreeMap<String, String> = [("R", "Ω"), ("U", "V"), ("I", "A")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    session
        .set_input(&key, AnswerInput::Matching(MatchingInput::Pairs { selections }))
        .await
        .unwrap();
    assert_eq!(
        session.submit_answer(&key).await.unwrap(),
        Submission::Graded(Verdict::Correct)
    );
}

#[tokio::test]
async fn test_answer_errors() {
    let source = MemorySource::new().with_record("s1.json", fixtures::structural("s1", 11));
    let mut session = started(source).await;

    let err = session
        .submit_answer(&QuestionKey::exercise("s1"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::UnknownQuestion { .. }));

    let err = session
        .submit_answer(&QuestionKey::sub_question("s1", "zz"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::UnknownQuestion { .. }));

    let err = session
        .submit_answer(&QuestionKey::exercise("missing"))
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogError::UnknownRecord(_)));

    let a = QuestionKey::sub_question("s1", "a");
    let err = session.select_option(&a, "x").await.unwrap_err();
    assert!(matches!(err, CatalogError::Verify(_)));

    session
        .set_input(&a, AnswerInput::Blanks(vec!["1".into()]))
        .await
        .unwrap();
    let err = session.submit_answer(&a).await.unwrap_err();
    assert!(matches!(err, CatalogError::Verify(_)));
}
