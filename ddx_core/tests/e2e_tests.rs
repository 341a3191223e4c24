//! End-to-end consultation flows through the session API

use std::sync::Arc;

use ddx_core::*;

const TWO_CONDITIONS: &str = r#"
conditions:
  - id: A
    core_symptoms: [fatigue, cold]
    differentiating_symptoms:
      - tag: constipation
        question: "Any {symptom} lately?"
    prevalence_tier: high
  - id: B
    core_symptoms: [fatigue]
    differentiating_symptoms:
      - tag: snoring
        question: "Has anyone told you about {symptom}?"
    prevalence_tier: medium
"#;

fn two_condition_session() -> ConsultationSession {
    let kb = KnowledgeBase::from_yaml_str(TWO_CONDITIONS).unwrap();
    ConsultationSession::new(Arc::new(kb)).unwrap()
}

fn tags(list: &[SymptomTag]) -> Vec<&str> {
    list.iter().map(SymptomTag::as_str).collect()
}

/// Test 1: A leads with both core symptoms, and snoring does not overtake it
#[test]
fn test_two_condition_scenario() {
    let mut session = two_condition_session();
    let a = ConditionId::from("A");
    let b = ConditionId::from("B");

    session
        .record("fatigue", Polarity::Positive, ObservationSource::Spontaneous)
        .unwrap();
    session
        .record("cold", Polarity::Positive, ObservationSource::Spontaneous)
        .unwrap();

    let board = session.leaderboard();
    assert_eq!(board.rank_of(&a), Some(1));
    assert_eq!(board.rank_of(&b), Some(2));
    assert_eq!(tags(&board.entry(&a).unwrap().matched_core), vec!["fatigue", "cold"]);

    session
        .record("snoring", Polarity::Positive, ObservationSource::Spontaneous)
        .unwrap();

    let board = session.leaderboard();
    let entry_a = board.entry(&a).unwrap();
    let entry_b = board.entry(&b).unwrap();
    assert_eq!(board.rank_of(&a), Some(1));
    assert!(entry_a.score > entry_b.score);
    assert_eq!(tags(&entry_b.matched_differentiating), vec!["snoring"]);
    assert_eq!(entry_a.movement(), RankMovement::Unchanged);
}

/// Test 2: The closed loop: question, answer, rescore, next question
#[test]
fn test_question_answer_loop() {
    let mut session = two_condition_session();
    session
        .record_batch(&[
            EvidenceInput::positive("fatigue"),
            EvidenceInput::positive("cold"),
            EvidenceInput::positive("snoring"),
        ])
        .unwrap();

    let question = session.pending_question().cloned().unwrap();
    assert_eq!(question.condition_id, ConditionId::from("A"));
    assert_eq!(question.question_text, "Any constipation lately?");
    assert!(!question.rationale.is_empty());

    // ruling out A's differentiating symptom lets B take the lead
    session.answer(&question, Polarity::Negated).unwrap();
    let board = session.leaderboard();
    assert_eq!(board.leader().unwrap().condition_id, ConditionId::from("B"));
    assert_eq!(
        board.entry(&ConditionId::from("B")).unwrap().movement(),
        RankMovement::Up(1)
    );
    assert_eq!(
        tags(&board.entry(&ConditionId::from("A")).unwrap().negated_differentiating),
        vec!["constipation"]
    );

    // everything differentiating has been observed
    assert!(session.pending_question().is_none());
    assert_eq!(session.answered().len(), 1);
}

/// Test 3: A respiratory consultation on the bundled knowledge base
#[test]
fn test_bundled_respiratory_consultation() {
    let kb = Arc::new(KnowledgeBase::bundled().unwrap());
    let mut session = ConsultationSession::new(kb).unwrap();

    session
        .record_batch(&[
            EvidenceInput::positive("cough"),
            EvidenceInput::positive("shortness of breath"),
            EvidenceInput::positive("chest tightness"),
            EvidenceInput::positive("wheezing"),
            EvidenceInput::positive("nocturnal symptoms"),
        ])
        .unwrap();

    let asthma = ConditionId::from("asthma");
    assert_eq!(session.leaderboard().rank_of(&asthma), Some(1));

    // keep answering until no question remains; each answer is a single step
    let mut asked = 0;
    while let Some(question) = session.pending_question().cloned() {
        session.answer(&question, Polarity::Negated).unwrap();
        asked += 1;
        assert!(asked <= 100, "question loop did not terminate");
    }

    let top = session.leaderboard().top(5);
    assert!(top.iter().all(|e| e.missing_differentiating.is_empty() || e.is_excluded()));
    assert_eq!(session.answered().len(), asked);
}

/// Test 4: Unknown tags are rejected and the leaderboard is retained
#[test]
fn test_invalid_tag_rejected() {
    let mut session = two_condition_session();
    session
        .record("fatigue", Polarity::Positive, ObservationSource::Spontaneous)
        .unwrap();
    let before = session.leaderboard().clone();

    let err = session
        .record_batch(&[EvidenceInput::positive("cold"), EvidenceInput::positive("purple toes")])
        .unwrap_err();

    assert!(matches!(err, DdxError::InvalidSymptomTag { .. }));
    assert_eq!(session.leaderboard(), &before);
    assert_eq!(session.evidence().len(), 1);
}

/// Test 5: An empty knowledge base cannot start a session
#[test]
fn test_empty_knowledge_base_rejected() {
    let err = KnowledgeBase::from_yaml_str("conditions: []\n").unwrap_err();
    assert!(matches!(err, DdxError::EmptyKnowledgeBase));
}
