//! End-to-end scenarios through the public engine API.

use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use class_composer::models::{
    ClassType, ContentGroup, ContentItem, ContentUrgency, LearningAnalytics, LearningPace,
    LearningStyle, ProgressRecord, SchedulingPriority,
};
use class_composer::providers::InMemoryDataProvider;
use class_composer::{
    ComposerError, CompositionCriteria, CompositionEngine, GroupingOptions, RetryPolicy,
};

fn ids(list: &[&str]) -> Vec<String> {
    list.iter().map(|s| s.to_string()).collect()
}

struct StudentSpec<'a> {
    id: &'a str,
    progress: f64,
    pace: LearningPace,
    style: LearningStyle,
    items: &'a [(u32, u32)],
    urgency: ContentUrgency,
}

impl<'a> StudentSpec<'a> {
    fn new(id: &'a str, progress: f64, pace: LearningPace, style: LearningStyle, items: &'a [(u32, u32)]) -> Self {
        Self {
            id,
            progress,
            pace,
            style,
            items,
            urgency: ContentUrgency::Normal,
        }
    }

    fn urgency(mut self, urgency: ContentUrgency) -> Self {
        self.urgency = urgency;
        self
    }
}

fn provider_of(specs: Vec<StudentSpec<'_>>) -> Arc<InMemoryDataProvider> {
    let mut provider = InMemoryDataProvider::new();
    for spec in specs {
        let mut group = ContentGroup::new("conversation").with_urgency(spec.urgency);
        for &(unit, lesson) in spec.items {
            group = group.with_item(ContentItem::new(unit, lesson));
        }
        provider = provider.with_student(
            spec.id,
            vec![ProgressRecord::new("c1", spec.progress, spec.pace)
                .with_course_type("conversation")],
            vec![group],
            LearningAnalytics::new(spec.style),
        );
    }
    Arc::new(provider)
}

fn engine_of(provider: Arc<InMemoryDataProvider>) -> CompositionEngine {
    CompositionEngine::new(provider.clone(), provider).with_retry_policy(RetryPolicy::none())
}

#[test]
fn identical_needs_pair_scores_ninety() {
    let provider = provider_of(vec![
        StudentSpec::new("s1", 50.0, LearningPace::Fast, LearningStyle::Visual, &[(3, 2)]),
        StudentSpec::new("s2", 50.0, LearningPace::Fast, LearningStyle::Visual, &[(3, 2)]),
    ]);
    let engine = engine_of(provider);

    let ranked = engine
        .find_compatible_students("s1", &ids(&["s2"]), None, 10)
        .unwrap();
    assert_eq!(ranked.len(), 1);
    assert_eq!(ranked[0].score, 90.0);
    assert_eq!(ranked[0].shared_content.len(), 1);
}

#[test]
fn incompatible_pair_stays_apart() {
    // No shared content, opposite styles, opposite paces: pair score 15,
    // well under the social threshold.
    let provider = provider_of(vec![
        StudentSpec::new("s1", 50.0, LearningPace::Slow, LearningStyle::Visual, &[(1, 1)]),
        StudentSpec::new("s2", 50.0, LearningPace::Fast, LearningStyle::Auditory, &[(9, 9)]),
    ]);
    let engine = engine_of(provider);

    let run = engine
        .generate_class_compositions(&ids(&["s1", "s2"]), None, None)
        .unwrap();

    assert_eq!(run.compositions.len(), 2);
    assert!(run
        .compositions
        .iter()
        .all(|c| c.class_type == ClassType::Individual));
}

#[test]
fn nine_compatible_students_fill_one_class() {
    let names: Vec<String> = (1..=9).map(|n| format!("s{n}")).collect();
    let specs = names
        .iter()
        .map(|id| {
            StudentSpec::new(id, 50.0, LearningPace::Average, LearningStyle::Visual, &[(1, 1)])
        })
        .collect();
    let provider = provider_of(specs);
    let engine =
        engine_of(provider).with_criteria(CompositionCriteria::with_size_bounds(2, 9));

    let run = engine.generate_class_compositions(&names, None, None).unwrap();

    assert_eq!(run.compositions.len(), 1);
    assert_eq!(run.compositions[0].size(), 9);
    assert_eq!(run.compositions[0].optimal_size, 9);

    let score = engine.evaluate_composition(&run.compositions[0]).unwrap();
    assert_eq!(score.size_optimization, 100.0);
}

#[test]
fn nothing_in_common_all_unplaced_when_individuals_disallowed() {
    // Five students with disjoint content and distinct progress buckets;
    // no pair can clear the social threshold without shared content.
    let provider = provider_of(vec![
        StudentSpec::new("s1", 10.0, LearningPace::Slow, LearningStyle::Visual, &[(1, 1)]),
        StudentSpec::new("s2", 30.0, LearningPace::Average, LearningStyle::Auditory, &[(3, 1)]),
        StudentSpec::new("s3", 60.0, LearningPace::Fast, LearningStyle::Kinesthetic, &[(5, 1)]),
        StudentSpec::new("s4", 85.0, LearningPace::Slow, LearningStyle::ReadingWriting, &[(7, 1)]),
        StudentSpec::new("s5", 99.0, LearningPace::Fast, LearningStyle::Visual, &[(9, 1)]),
    ]);
    let engine = engine_of(provider)
        .with_criteria(CompositionCriteria::with_size_bounds(2, 4))
        .with_options(GroupingOptions::default().with_individual_classes(false));

    let pool = ids(&["s1", "s2", "s3", "s4", "s5"]);
    let run = engine.generate_class_compositions(&pool, None, None).unwrap();

    assert!(run.compositions.is_empty());
    let mut unplaced = run.unplaced.clone();
    unplaced.sort_unstable();
    assert_eq!(unplaced, pool);
}

#[test]
fn leftover_student_reported_unplaced_when_individuals_disallowed() {
    // Four students share a content key and fill one class; the fifth has
    // nothing in common with anyone and cannot form a group on their own.
    let provider = provider_of(vec![
        StudentSpec::new("s1", 50.0, LearningPace::Average, LearningStyle::Visual, &[(1, 1)]),
        StudentSpec::new("s2", 50.0, LearningPace::Average, LearningStyle::Visual, &[(1, 1)]),
        StudentSpec::new("s3", 50.0, LearningPace::Average, LearningStyle::Visual, &[(1, 1)]),
        StudentSpec::new("s4", 50.0, LearningPace::Average, LearningStyle::Visual, &[(1, 1)]),
        StudentSpec::new("s5", 90.0, LearningPace::Fast, LearningStyle::Auditory, &[(9, 9)]),
    ]);
    let engine = engine_of(provider)
        .with_criteria(CompositionCriteria::with_size_bounds(2, 4))
        .with_options(GroupingOptions::default().with_individual_classes(false));

    let pool = ids(&["s1", "s2", "s3", "s4", "s5"]);
    let run = engine.generate_class_compositions(&pool, None, None).unwrap();

    assert_eq!(run.compositions.len(), 1);
    assert_eq!(run.compositions[0].size(), 4);
    assert!((2..=4).contains(&run.compositions[0].size()));
    assert_eq!(run.unplaced, ids(&["s5"]));
}

#[test]
fn content_key_below_min_contributes_nothing() {
    // Each content key has a single needer, so clustering yields no
    // candidate groups and both students fall through to individuals.
    let provider = provider_of(vec![
        StudentSpec::new("s1", 50.0, LearningPace::Average, LearningStyle::Visual, &[(3, 2)]),
        StudentSpec::new("s2", 50.0, LearningPace::Average, LearningStyle::Visual, &[(7, 7)]),
    ]);
    let engine = engine_of(provider);

    let run = engine
        .generate_class_compositions(&ids(&["s1", "s2"]), None, None)
        .unwrap();

    assert_eq!(run.compositions.len(), 2);
    for composition in &run.compositions {
        assert_eq!(composition.size(), 1);
        assert_eq!(composition.content_focus.len(), 1);
    }
}

#[test]
fn urgent_content_raises_scheduling_priority() {
    let provider = provider_of(vec![
        StudentSpec::new("s1", 50.0, LearningPace::Fast, LearningStyle::Visual, &[(1, 1)]),
        StudentSpec::new("s2", 50.0, LearningPace::Fast, LearningStyle::Visual, &[(1, 1)])
            .urgency(ContentUrgency::Urgent),
    ]);
    let engine = engine_of(provider);

    let run = engine
        .generate_class_compositions(&ids(&["s1", "s2"]), None, None)
        .unwrap();

    let composition = run
        .compositions
        .iter()
        .find(|c| c.size() == 2)
        .expect("compatible pair grouped");
    assert_eq!(composition.scheduling_priority, SchedulingPriority::Urgent);
}

#[test]
fn course_type_filter_limits_grouping_data() {
    // s1 and s2 overlap only in exam content; a conversation-only run
    // must not see it.
    let mut provider = InMemoryDataProvider::new();
    for id in ["s1", "s2"] {
        provider = provider.with_student(
            id,
            vec![ProgressRecord::new("c1", 50.0, LearningPace::Average)
                .with_course_type("conversation")],
            vec![
                ContentGroup::new("conversation").with_item(ContentItem::new(
                    if id == "s1" { 1 } else { 9 },
                    1,
                )),
                ContentGroup::new("exam").with_item(ContentItem::new(5, 5)),
            ],
            LearningAnalytics::new(LearningStyle::Visual),
        );
    }
    let engine = engine_of(Arc::new(provider));

    let ranked = engine
        .find_compatible_students("s1", &ids(&["s2"]), Some("conversation"), 10)
        .unwrap();
    assert!(ranked[0].shared_content.is_empty());

    let ranked = engine
        .find_compatible_students("s1", &ids(&["s2"]), None, 10)
        .unwrap();
    assert_eq!(ranked[0].shared_content.len(), 1);
}

#[test]
fn empty_pool_is_an_error() {
    let provider = provider_of(vec![]);
    let engine = engine_of(provider);
    assert_eq!(
        engine.generate_class_compositions(&[], None, None).unwrap_err(),
        ComposerError::EmptyStudentPool
    );
}

#[test]
fn compositions_and_unplaced_partition_the_pool() {
    let provider = provider_of(vec![
        StudentSpec::new("s1", 50.0, LearningPace::Average, LearningStyle::Visual, &[(1, 1)]),
        StudentSpec::new("s2", 52.0, LearningPace::Average, LearningStyle::Visual, &[(1, 1)]),
        StudentSpec::new("s3", 90.0, LearningPace::Fast, LearningStyle::Auditory, &[(8, 1)]),
    ]);
    let engine = engine_of(provider)
        .with_options(GroupingOptions::default().with_individual_classes(false));

    let pool = ids(&["s1", "s2", "s3"]);
    let run = engine.generate_class_compositions(&pool, None, None).unwrap();

    let mut covered: Vec<String> = run
        .compositions
        .iter()
        .flat_map(|c| c.student_ids.iter().cloned())
        .chain(run.unplaced.iter().cloned())
        .collect();
    covered.sort_unstable();
    assert_eq!(covered, pool);
    assert_eq!(run.unplaced, ids(&["s3"]));
}

fn random_provider(rng: &mut SmallRng, count: usize) -> (Arc<InMemoryDataProvider>, Vec<String>) {
    let paces = [LearningPace::Slow, LearningPace::Average, LearningPace::Fast];
    let styles = [
        LearningStyle::Visual,
        LearningStyle::Auditory,
        LearningStyle::Kinesthetic,
        LearningStyle::ReadingWriting,
        LearningStyle::Mixed,
    ];

    let mut provider = InMemoryDataProvider::new();
    let mut pool = Vec::new();
    for n in 0..count {
        let id = format!("s{n:02}");
        let mut group = ContentGroup::new("conversation");
        for _ in 0..rng.gen_range(1..=3) {
            group = group.with_item(ContentItem::new(
                rng.gen_range(1..=4),
                rng.gen_range(1..=3),
            ));
        }
        provider = provider.with_student(
            &id,
            vec![ProgressRecord::new(
                "c1",
                rng.gen_range(0.0..100.0),
                paces[rng.gen_range(0..paces.len())],
            )
            .with_course_type("conversation")],
            vec![group],
            LearningAnalytics::new(styles[rng.gen_range(0..styles.len())]),
        );
        pool.push(id);
    }
    (Arc::new(provider), pool)
}

#[test]
fn random_pools_preserve_the_partition_invariant() {
    let mut rng = SmallRng::seed_from_u64(42);
    for _ in 0..5 {
        let (provider, pool) = random_provider(&mut rng, 20);
        let engine = engine_of(provider);
        let run = engine.generate_class_compositions(&pool, None, None).unwrap();

        let mut placed: Vec<String> = run
            .compositions
            .iter()
            .flat_map(|c| c.student_ids.iter().cloned())
            .collect();
        placed.sort_unstable();
        let mut expected = pool.clone();
        expected.sort_unstable();
        assert_eq!(placed, expected);
        assert!(run.unplaced.is_empty());

        assert!((0.0..=100.0).contains(&run.score));
        for composition in &run.compositions {
            assert!(composition.size() <= 8);
            assert!(!composition.student_ids.is_empty());
        }
    }
}

#[test]
fn identical_input_yields_identical_output() {
    let mut rng = SmallRng::seed_from_u64(7);
    let (provider, pool) = random_provider(&mut rng, 16);
    let engine = engine_of(provider);

    let first = engine.generate_class_compositions(&pool, None, None).unwrap();
    let second = engine.generate_class_compositions(&pool, None, None).unwrap();

    assert_eq!(first.iterations, second.iterations);
    assert_eq!(first.score, second.score);
    assert_eq!(
        serde_json::to_string(&first.compositions).unwrap(),
        serde_json::to_string(&second.compositions).unwrap()
    );
}

#[test]
fn rerunning_the_optimum_changes_nothing() {
    let provider = provider_of(vec![
        StudentSpec::new("s1", 40.0, LearningPace::Average, LearningStyle::Visual, &[(1, 1)]),
        StudentSpec::new("s2", 45.0, LearningPace::Average, LearningStyle::Visual, &[(1, 1)]),
        StudentSpec::new("s3", 42.0, LearningPace::Average, LearningStyle::Visual, &[(1, 2)]),
    ]);
    let engine = engine_of(provider);

    let pool = ids(&["s1", "s2", "s3"]);
    let first = engine.generate_class_compositions(&pool, None, None).unwrap();
    let second = engine.generate_class_compositions(&pool, None, None).unwrap();

    assert_eq!(
        serde_json::to_string(&first.compositions).unwrap(),
        serde_json::to_string(&second.compositions).unwrap()
    );
}
