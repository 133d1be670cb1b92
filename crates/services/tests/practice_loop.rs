use chrono::Duration;
use practice_core::guidance::GuidanceContext;
use practice_core::level::ComplexityLevel;
use practice_core::model::{CandidateItem, ItemId, LearnerId, Subject};
use practice_core::session::SessionType;
use practice_core::time::fixed_now;
use services::{Clock, LevelAdvance, PracticeError, PracticeService, PracticeSettings};
use storage::repository::{Storage, StorageError};

fn learner() -> LearnerId {
    LearnerId::new("asha").unwrap()
}

fn kannada() -> Subject {
    Subject::new("kannada").unwrap()
}

fn item(id: &str, subject: &Subject, level: u8) -> CandidateItem {
    CandidateItem::new(
        ItemId::new(id).unwrap(),
        subject.clone(),
        ComplexityLevel::new(level).unwrap(),
    )
}

fn catalog() -> Vec<CandidateItem> {
    let math = Subject::new("math").unwrap();
    vec![
        item("a", &kannada(), 1),
        item("b", &kannada(), 1),
        item("c", &kannada(), 1),
        item("d", &kannada(), 2),
        item("m", &math, 1),
    ]
}

fn ids(ids: &[&str]) -> Vec<ItemId> {
    ids.iter().map(|id| ItemId::new(*id).unwrap()).collect()
}

#[tokio::test]
async fn practice_loop_masters_level_and_moves_on() {
    let storage = Storage::in_memory();
    let svc = PracticeService::new(
        Clock::fixed(fixed_now()),
        storage.clone(),
        PracticeSettings::default(),
    );
    let catalog = catalog();

    let plan = svc.plan_session(&learner(), &kannada(), &catalog).await.unwrap();
    assert_eq!(plan.selected_ids, ids(&["a", "b", "c"]));
    assert_eq!(plan.session_type, SessionType::Learning);
    assert_eq!(plan.new_selected, 3);
    assert_eq!(plan.rationale, "Selected 3 words for kannada (Level 1): 3 new words.");

    for id in &plan.selected_ids {
        let first = svc.record_answer(&learner(), id, true).await.unwrap();
        assert_eq!(first.guidance.context, GuidanceContext::FirstSuccess);
    }

    // progress 1 everywhere: the same items come back as struggling
    let again = svc.plan_session(&learner(), &kannada(), &catalog).await.unwrap();
    assert_eq!(again.struggling_selected, 3);

    assert!(!svc
        .advance_level_if_ready(&learner(), &kannada(), &catalog)
        .await
        .unwrap()
        .advanced());

    for id in &again.selected_ids {
        let second = svc.record_answer(&learner(), id, true).await.unwrap();
        assert!(second.mastered_now());
    }

    let cooling = svc.plan_session(&learner(), &kannada(), &catalog).await.unwrap();
    assert!(cooling.selected_ids.is_empty());
    assert_eq!(cooling.total_available, 3);

    let advance = svc
        .advance_level_if_ready(&learner(), &kannada(), &catalog)
        .await
        .unwrap();
    assert_eq!(
        advance,
        LevelAdvance::Advanced {
            from: ComplexityLevel::MIN,
            to: ComplexityLevel::new(2).unwrap(),
        }
    );

    let next = svc.plan_session(&learner(), &kannada(), &catalog).await.unwrap();
    assert_eq!(next.selected_ids, ids(&["d"]));
    assert_eq!(next.level, ComplexityLevel::new(2).unwrap());
}

#[tokio::test]
async fn cooldowns_run_out_into_revision() {
    let storage = Storage::in_memory();
    let svc = PracticeService::new(
        Clock::fixed(fixed_now()),
        storage.clone(),
        PracticeSettings::default(),
    );
    let catalog = catalog();
    let practised = ids(&["a", "b"]);

    for id in &practised {
        svc.record_answer(&learner(), id, true).await.unwrap();
        svc.record_answer(&learner(), id, true).await.unwrap();
    }

    for _ in 0..3 {
        assert_eq!(
            svc.complete_session(&learner(), &kannada(), &catalog).await.unwrap(),
            2
        );
    }
    // nothing left to tick
    assert_eq!(
        svc.complete_session(&learner(), &kannada(), &catalog).await.unwrap(),
        0
    );

    let plan = svc.plan_session(&learner(), &kannada(), &catalog).await.unwrap();
    assert_eq!(plan.session_type, SessionType::Mixed);
    assert_eq!(plan.selected_ids, ids(&["c", "a", "b"]));
    assert_eq!(plan.revision_selected, 2);

    let no_revision = PracticeService::new(
        Clock::fixed(fixed_now()),
        storage,
        PracticeSettings::new(10, false, 16).unwrap(),
    );
    let plan = no_revision
        .plan_session(&learner(), &kannada(), &catalog)
        .await
        .unwrap();
    assert_eq!(plan.revision_selected, 0);
    assert_eq!(plan.selected_ids, ids(&["c"]));
    assert_eq!(plan.session_type, SessionType::Learning);
}

#[tokio::test]
async fn withheld_items_come_back_after_three_empty_sessions() {
    let svc = PracticeService::new(
        Clock::fixed(fixed_now()),
        Storage::in_memory(),
        PracticeSettings::default(),
    );
    let catalog = catalog();

    for id in ids(&["a", "b", "c"]) {
        svc.record_answer(&learner(), &id, true).await.unwrap();
        svc.record_answer(&learner(), &id, true).await.unwrap();
    }

    for _ in 0..3 {
        let plan = svc.plan_session(&learner(), &kannada(), &catalog).await.unwrap();
        assert!(plan.selected_ids.is_empty());
        for id in &plan.selected_ids {
            svc.record_answer(&learner(), id, true).await.unwrap();
        }
        assert_eq!(
            svc.complete_session(&learner(), &kannada(), &catalog).await.unwrap(),
            3
        );
    }

    let plan = svc.plan_session(&learner(), &kannada(), &catalog).await.unwrap();
    assert_eq!(plan.revision_selected, 3);
    assert_eq!(plan.session_type, SessionType::Revision);
    assert_eq!(plan.selected_ids, ids(&["a", "b", "c"]));
}

#[tokio::test]
async fn wrong_answer_after_mastery_drops_back() {
    let svc = PracticeService::new(
        Clock::fixed(fixed_now()),
        Storage::in_memory(),
        PracticeSettings::default(),
    );
    let a = ItemId::new("a").unwrap();
    svc.record_answer(&learner(), &a, true).await.unwrap();
    svc.record_answer(&learner(), &a, true).await.unwrap();

    let lost = svc.record_answer(&learner(), &a, false).await.unwrap();
    assert_eq!(lost.tracker.progress(), 1);
    assert_eq!(lost.tracker.cooldown_sessions_left(), 0);
    assert!(!lost.tracker.is_mastered());
    assert_eq!(lost.guidance.context, GuidanceContext::NeedsPractice);
}

#[tokio::test]
async fn statistics_use_the_clock_and_catalog() {
    let storage = Storage::in_memory();
    let catalog = catalog();
    let day_one = PracticeService::new(
        Clock::fixed(fixed_now()),
        storage.clone(),
        PracticeSettings::default(),
    );

    for id in ids(&["a", "m"]) {
        day_one.record_answer(&learner(), &id, true).await.unwrap();
        day_one.record_answer(&learner(), &id, true).await.unwrap();
    }
    day_one.record_answer(&learner(), &ItemId::new("b").unwrap(), false).await.unwrap();
    // not in the catalog, so it is left out
    day_one.record_answer(&learner(), &ItemId::new("ghost").unwrap(), true).await.unwrap();

    let day_two = PracticeService::new(
        Clock::fixed(fixed_now() + Duration::days(1)),
        storage,
        PracticeSettings::default(),
    );
    let stats = day_two.statistics(&learner(), &catalog).await.unwrap();

    assert_eq!(stats.total_attempted, 3);
    assert_eq!(stats.total_mastered, 2);
    assert_eq!(stats.turnaround_count, 0);
    assert!((stats.average_attempts_to_mastery - 2.0).abs() < 1e-9);
    assert_eq!(stats.current_streak, 1);
    assert_eq!(stats.longest_streak, 1);
    assert_eq!(stats.per_subject[&kannada()].total_attempted, 2);
    assert_eq!(stats.per_subject.len(), 2);
}

#[tokio::test]
async fn snapshots_move_between_stores() {
    let source = PracticeService::new(
        Clock::fixed(fixed_now()),
        Storage::in_memory(),
        PracticeSettings::default(),
    );
    let a = ItemId::new("a").unwrap();
    source.record_answer(&learner(), &a, false).await.unwrap();
    source.record_answer(&learner(), &a, true).await.unwrap();
    source.record_answer(&learner(), &a, true).await.unwrap();

    let exported = source.export_snapshots(&learner()).await.unwrap();
    assert_eq!(exported.len(), 1);

    let target = PracticeService::new(
        Clock::fixed(fixed_now()),
        Storage::in_memory(),
        PracticeSettings::default(),
    );
    let imported = target.import_snapshot(exported[0].clone()).await.unwrap();
    assert!(imported.is_mastered());
    assert!(imported.is_turnaround());
    assert_eq!(target.export_snapshots(&learner()).await.unwrap(), exported);

    let mut shorter = exported[0].clone();
    shorter.attempts.truncate(1);
    shorter.progress = 1;
    shorter.cooldown_sessions_left = 0;
    shorter.mastery_achieved_at = None;
    assert!(matches!(
        target.import_snapshot(shorter).await,
        Err(PracticeError::Storage(StorageError::Conflict))
    ));

    let mut corrupt = exported[0].clone();
    corrupt.progress = 9;
    assert!(matches!(
        target.import_snapshot(corrupt).await,
        Err(PracticeError::Snapshot(_))
    ));
}

#[tokio::test]
async fn reset_item_starts_over() {
    let svc = PracticeService::new(
        Clock::fixed(fixed_now()),
        Storage::in_memory(),
        PracticeSettings::default(),
    );
    let a = ItemId::new("a").unwrap();
    svc.record_answer(&learner(), &a, true).await.unwrap();
    svc.reset_item(&learner(), &a).await.unwrap();

    let guidance = svc.guidance(&learner(), &a).await.unwrap();
    assert_eq!(guidance.context, GuidanceContext::Initial);
    let first = svc.record_answer(&learner(), &a, false).await.unwrap();
    assert_eq!(first.guidance.context, GuidanceContext::FirstAttemptWrong);
}
