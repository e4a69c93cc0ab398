mod support;

use std::sync::{Arc, Mutex};

use feed_session::{
    EnrichmentQueue, FixedCandidates, ItemId, ManualClock, QueueEvent, QueueStats, SessionConfig,
    SessionError, TaskFailure, TaskId, TaskKind, TaskOrigin, TaskState,
};
use support::{
    current_id, generated_story, ids, quotes, recorder, session, session_with_candidates, stories,
    Quote, Story,
};

fn story_candidates() -> FixedCandidates<Story> {
    FixedCandidates::new(vec![
        generated_story("The Drum That Called the Village"),
        generated_story("The Baobab's Shade"),
    ])
}

#[test]
fn generated_stories_are_prepended() {
    let clock = ManualClock::new();
    let mut session =
        session_with_candidates(&clock, SessionConfig::default(), stories(), story_candidates());

    let task = session.generate("a story about sharing".to_string(), 2_000);
    assert_eq!(session.poll(task).unwrap().state(), TaskState::Pending);

    clock.advance_by(2_000);
    let report = session.tick();
    assert_eq!(report.settled, vec![task]);
    assert_eq!(report.inserted, vec![ItemId::from("generated-1")]);
    assert_eq!(ids(&session)[0], "generated-1");
    assert_eq!(current_id(&session).as_deref(), Some("story-1"));

    let result = session.poll(task).unwrap().outcome().unwrap().clone();
    assert_eq!(session.get("generated-1").unwrap().payload(), &result);
    assert_eq!(session.current_value("generated-1", "likes").unwrap(), 0);
}

#[test]
fn empty_candidates_fail_at_submit() {
    let clock = ManualClock::new();
    let mut session = session(&clock, SessionConfig::default(), stories());

    let task = session.generate("anything".to_string(), 1_000);
    let polled = session.poll(task).unwrap();
    assert_eq!(polled.state(), TaskState::Failed);
    assert_eq!(polled.outcome(), Err(SessionError::EmptyCandidates));

    clock.advance_by(1_000);
    assert!(session.tick().inserted.is_empty());
    assert_eq!(session.len(), 3);
}

#[test]
fn cancelled_translation_never_resolves() {
    let clock = ManualClock::new();
    let translations = FixedCandidates::new(vec![]).with_kind(
        TaskKind::Translate,
        vec![generated_story("Omuntu w'omuntu ku bantu")],
    );
    let mut session =
        session_with_candidates(&clock, SessionConfig::default(), stories(), translations);
    let task = session
        .enrich(TaskKind::Translate, "story-2", "lug".to_string(), 1_500)
        .unwrap();

    let (calls, record) = recorder::<TaskState>();
    session.on_resolve(task, move |t| record(t.state())).unwrap();

    clock.advance_by(1_000);
    assert!(session.cancel(task).unwrap());
    clock.advance_by(1_000);
    session.tick();

    assert!(!session.cancel(task).unwrap());
    assert_eq!(*calls.lock().unwrap(), vec![TaskState::Cancelled]);
    assert_eq!(session.poll(task).unwrap().result(), None);
    assert_eq!(session.len(), 3);
}

#[test]
fn resolve_callbacks_fire_exactly_once() {
    let clock = ManualClock::new();
    let mut session =
        session_with_candidates(&clock, SessionConfig::default(), stories(), story_candidates());
    let task = session.generate("x".to_string(), 0);

    let count = Arc::new(Mutex::new(0));
    for _ in 0..2 {
        let count = Arc::clone(&count);
        session
            .on_resolve(task, move |_| *count.lock().unwrap() += 1)
            .unwrap();
    }

    session.tick();
    session.tick();
    assert_eq!(*count.lock().unwrap(), 2);

    // Registering after settlement runs immediately, once.
    let late = Arc::clone(&count);
    session
        .on_resolve(task, move |_| *late.lock().unwrap() += 1)
        .unwrap();
    session.tick();
    assert_eq!(*count.lock().unwrap(), 3);
}

#[test]
fn enriching_missing_items_fails() {
    let clock = ManualClock::new();
    let mut session =
        session_with_candidates(&clock, SessionConfig::default(), stories(), story_candidates());
    assert_eq!(
        session.enrich(TaskKind::Validate, "story-7", "check".to_string(), 100),
        Err(SessionError::ItemNotFound(ItemId::from("story-7")))
    );
    assert_eq!(
        session.poll(TaskId::new(99)).map(|t| t.state()),
        Err(SessionError::TaskNotFound(TaskId::new(99)))
    );
    assert_eq!(
        session.cancel(TaskId::new(99)),
        Err(SessionError::TaskNotFound(TaskId::new(99)))
    );
}

#[test]
fn removing_an_item_cancels_its_tasks() {
    let clock = ManualClock::new();
    let mut session =
        session_with_candidates(&clock, SessionConfig::default(), stories(), story_candidates());
    let bound = session
        .enrich(TaskKind::Moderate, "story-3", "review".to_string(), 5_000)
        .unwrap();
    let unrelated = session
        .enrich(TaskKind::Moderate, "story-1", "review".to_string(), 5_000)
        .unwrap();

    session.remove_by_id("story-3").unwrap();
    clock.advance_by(5_000);
    session.tick();

    assert_eq!(session.poll(bound).unwrap().state(), TaskState::Cancelled);
    assert_eq!(session.poll(unrelated).unwrap().state(), TaskState::Succeeded);
}

#[test]
fn external_backend_results_and_timeouts() {
    let clock = ManualClock::new();
    let mut session = session(&clock, SessionConfig::default(), quotes());

    let approved = session
        .submit_external(TaskKind::Moderate, Some("quote-1"), "approve?".to_string(), 3_000)
        .unwrap();
    let flagged = session
        .submit_external(TaskKind::Moderate, Some("quote-2"), "approve?".to_string(), 3_000)
        .unwrap();
    let slow = session
        .submit_external(TaskKind::Validate, None, "valid?".to_string(), 3_000)
        .unwrap();
    assert_eq!(session.poll(slow).unwrap().origin(), TaskOrigin::External);

    let verdict = Quote {
        text: "Mtu ni watu".to_string(),
        translation: "approved".to_string(),
        language: "Kiswahili".to_string(),
    };
    assert!(session.complete(approved, Ok(verdict.clone())).unwrap());
    assert!(session
        .complete(flagged, Err("moderation service unavailable".to_string()))
        .unwrap());

    clock.advance_by(3_000);
    let report = session.tick();
    assert_eq!(report.settled, vec![slow]);

    assert_eq!(session.poll(approved).unwrap().outcome(), Ok(&verdict));
    assert_eq!(
        session.poll(flagged).unwrap().outcome(),
        Err(SessionError::Backend("moderation service unavailable".to_string()))
    );
    assert_eq!(session.poll(slow).unwrap().failure(), Some(&TaskFailure::Timeout));
    assert_eq!(session.poll(slow).unwrap().outcome(), Err(SessionError::Timeout(slow)));
    assert!(!session.complete(slow, Ok(verdict)).unwrap());

    assert_eq!(
        session.queue().stats(),
        QueueStats {
            pending: 0,
            succeeded: 1,
            failed: 2,
            cancelled: 0,
        }
    );
}

#[test]
fn settled_tasks_are_swept_after_retention() {
    let clock = ManualClock::new();
    let config = SessionConfig::from_json_str(r#"{"taskRetentionMs": 10000}"#).unwrap();
    let mut session = session_with_candidates(&clock, config, stories(), story_candidates());

    let kept = session.generate("keep".to_string(), 0);
    let consumed = session.generate("consume".to_string(), 0);
    session.tick();

    let task = session.consume(consumed).unwrap();
    assert_eq!(task.state(), TaskState::Succeeded);
    assert!(session.poll(consumed).unwrap_err().is_not_found());

    clock.advance_by(9_999);
    assert_eq!(session.tick().swept, 0);
    clock.advance_by(1);
    assert_eq!(session.tick().swept, 1);
    assert!(session.poll(kept).is_err());
}

#[test]
fn consuming_a_pending_task_is_refused() {
    let clock = ManualClock::new();
    let mut session =
        session_with_candidates(&clock, SessionConfig::default(), stories(), story_candidates());
    let task = session.generate("later".to_string(), 1_000);
    assert_eq!(session.consume(task).map(|t| t.id()), Err(SessionError::TaskPending(task)));
}

#[test]
fn standalone_queue_with_closure_candidates() {
    let clock = ManualClock::new();
    let mut queue: EnrichmentQueue<String, String> = EnrichmentQueue::new(clock.shared())
        .with_source(|kind: TaskKind, input: &String| match kind {
            TaskKind::Translate => vec![format!("{input} (translated)")],
            _ => Vec::new(),
        });
    let (events, listener) = recorder::<QueueEvent>();
    let _sub = queue.subscribe(listener);

    let translated = queue.submit(TaskKind::Translate, "Mtu ni watu".to_string(), 200);
    let validated = queue.submit(TaskKind::Validate, "Mtu ni watu".to_string(), 200);

    clock.advance_by(200);
    assert_eq!(queue.run_due(), vec![translated]);
    assert_eq!(
        queue.poll(translated).unwrap().result().map(String::as_str),
        Some("Mtu ni watu (translated)")
    );
    assert_eq!(queue.poll(validated).unwrap().failure(), Some(&TaskFailure::EmptyCandidates));

    let events = events.lock().unwrap();
    assert_eq!(
        events.last(),
        Some(&QueueEvent::Settled {
            task: translated,
            state: TaskState::Succeeded,
        })
    );
    assert_eq!(events.len(), 4);
}
