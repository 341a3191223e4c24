//! Ranking invariants checked against the bundled knowledge base

use std::sync::Arc;

use ddx_core::*;

fn bundled() -> Arc<KnowledgeBase> {
    Arc::new(KnowledgeBase::bundled().unwrap())
}

fn snapshot(kb: &Arc<KnowledgeBase>, inputs: &[EvidenceInput]) -> EvidenceSnapshot {
    let mut acc = EvidenceAccumulator::new(kb.clone());
    acc.record_batch(inputs).unwrap();
    acc.snapshot()
}

/// Test 1: Identical evidence yields byte-identical leaderboards
#[test]
fn test_rescore_is_idempotent() {
    let kb = bundled();
    let engine = ScoringEngine::default();
    let evidence = snapshot(
        &kb,
        &[
            EvidenceInput::positive("cough"),
            EvidenceInput::positive("fatigue"),
            EvidenceInput::negated("high fever"),
            EvidenceInput::positive("wheezing"),
        ],
    );

    let first = engine.score(&evidence, &kb, None);
    let second = engine.score(&evidence, &kb, None);

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

/// Test 2: Negating any core symptom strictly lowers that condition's score
#[test]
fn test_core_negation_strictly_decreases_score() {
    let kb = bundled();
    let engine = ScoringEngine::default();

    for condition in kb.conditions() {
        let cores: Vec<&SymptomTag> = condition.core_symptoms().collect();
        for target in &cores {
            // the other core symptoms present, target unobserved
            let base: Vec<EvidenceInput> = cores
                .iter()
                .filter(|t| *t != target)
                .map(|t| EvidenceInput::positive(t.as_str()))
                .collect();
            let mut with_negation = base.clone();
            with_negation.push(EvidenceInput::negated(target.as_str()));
            let mut with_positive = base.clone();
            with_positive.push(EvidenceInput::positive(target.as_str()));

            let unobserved = engine.score_condition(condition, &snapshot(&kb, &base)).raw;
            let negated = engine.score_condition(condition, &snapshot(&kb, &with_negation)).raw;
            let positive = engine.score_condition(condition, &snapshot(&kb, &with_positive)).raw;

            assert!(negated < unobserved, "{} / {}", condition.id(), target);
            assert!(negated < positive, "{} / {}", condition.id(), target);
        }
    }
}

/// Test 3: Cold start orders by tier, then id
#[test]
fn test_cold_start_orders_by_tier_then_id() {
    let kb = bundled();
    let board = ScoringEngine::default().score(&EvidenceSnapshot::empty(), &kb, None);

    let mut expected: Vec<(PrevalenceTier, &ConditionId)> = kb
        .conditions()
        .iter()
        .map(|c| (c.prevalence_tier(), c.id()))
        .collect();
    expected.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    let expected: Vec<&ConditionId> = expected.into_iter().map(|(_, id)| id).collect();

    assert_eq!(board.ranking(), expected);
}

/// Test 4: A condition with every core symptom negated sinks below every
/// condition that is not fully excluded, even with all its differentiating
/// symptoms present
#[test]
fn test_fully_negated_core_sinks() {
    let kb = bundled();
    let engine = ScoringEngine::default();

    for condition in kb.conditions() {
        let mut inputs: Vec<EvidenceInput> = condition
            .core_symptoms()
            .map(|t| EvidenceInput::negated(t.as_str()))
            .collect();
        inputs.extend(
            condition
                .differentiating_symptoms()
                .map(|t| EvidenceInput::positive(t.as_str())),
        );
        let board = engine.score(&snapshot(&kb, &inputs), &kb, None);

        let target = board.entry(condition.id()).unwrap();
        assert!(target.is_excluded());
        for other in board.entries().iter().filter(|e| !e.is_excluded()) {
            assert!(
                target.score < other.score,
                "{} ({}) should be below {} ({})",
                target.condition_id,
                target.score,
                other.condition_id,
                other.score
            );
        }
    }
}

/// Test 5: Upsert keeps only the latest polarity, and scoring follows it
#[test]
fn test_upsert_negation_replaces_positive() {
    let kb = bundled();
    let engine = ScoringEngine::default();
    let fever = SymptomTag::parse("fever").unwrap();

    let mut acc = EvidenceAccumulator::new(kb.clone());
    acc.record("fever", Polarity::Positive, ObservationSource::Spontaneous)
        .unwrap();
    acc.record("fever", Polarity::Negated, ObservationSource::Spontaneous)
        .unwrap();

    let evidence = acc.snapshot();
    assert_eq!(evidence.len(), 1);
    assert_eq!(evidence.polarity_of(&fever), Some(Polarity::Negated));

    let only_negated = snapshot(&kb, &[EvidenceInput::negated("fever")]);
    assert_eq!(
        engine.score(&evidence, &kb, None).entries(),
        engine.score(&only_negated, &kb, None).entries()
    );
}

/// Test 6: Probabilities are normalised, scores stay in range, and a rare
/// condition climbs once its specific picture appears
#[test]
fn test_probabilities_normalised() {
    let kb = bundled();
    let engine = ScoringEngine::default();
    let cold_start = engine.score(&EvidenceSnapshot::empty(), &kb, None);
    let evidence = snapshot(
        &kb,
        &[
            EvidenceInput::positive("chest pain"),
            EvidenceInput::positive("shortness of breath"),
            EvidenceInput::positive("leg swelling"),
        ],
    );
    let board = engine.score(&evidence, &kb, Some(&cold_start));

    let total: f64 = board.entries().iter().map(|e| e.probability).sum();
    assert!((total - 1.0).abs() < 1e-9);
    for entry in board.entries() {
        assert!((0.0..=1.0).contains(&entry.score));
    }

    let pe = board.entry(&ConditionId::from("pulmonary embolism")).unwrap();
    assert!(matches!(pe.movement(), RankMovement::Up(_)));
    assert_eq!(pe.matched_differentiating.len(), 1);
    assert_eq!(board.revision(), 2);
}

/// Test 7: Ranks are contiguous and 1-based
#[test]
fn test_ranks_contiguous() {
    let kb = bundled();
    let board = ScoringEngine::default().score(&EvidenceSnapshot::empty(), &kb, None);
    let ranks: Vec<usize> = board.entries().iter().map(|e| e.current_rank).collect();
    assert_eq!(ranks, (1..=kb.len()).collect::<Vec<_>>());
}
