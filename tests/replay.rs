mod support;

use feed_session::{
    ActorId, FixedCandidates, ManualClock, SessionConfig, SessionSnapshot, TaskKind, TaskState,
    TimerState,
};
use support::{quotes, session_with_candidates, Quote};

fn proverb(text: &str) -> Quote {
    Quote {
        text: text.to_string(),
        translation: String::new(),
        language: "Luganda".to_string(),
    }
}

fn scripted_run(seed: u64) -> SessionSnapshot<Quote> {
    let clock = ManualClock::new();
    let config = SessionConfig::default().with_auto_advance(8_000).with_seed(seed);
    let candidates = FixedCandidates::new(vec![
        proverb("Agali awamu ge galuma enyama"),
        proverb("Kamu kamu gwe muganda"),
        proverb("Ekyalo kye kimu"),
    ]);
    let mut session = session_with_candidates(&clock, config, quotes(), candidates);

    session.toggle("quote-1", "likes").unwrap();
    session
        .toggle_as("quote-3", "bookmarks", &ActorId::from("elder"))
        .unwrap();
    let first = session.generate("unity".to_string(), 2_500);
    let second = session.generate("patience".to_string(), 9_000);
    let third = session.generate("harvest".to_string(), 4_000);
    session
        .enrich(TaskKind::Translate, "quote-2", "lug".to_string(), 1_000)
        .unwrap();

    clock.advance_by(3_000);
    session.tick();
    session.cancel(third).unwrap();
    session.next();

    clock.advance_by(8_000);
    session.tick();
    session.pause_auto_advance();
    clock.advance_by(20_000);
    session.tick();

    assert_eq!(session.poll(first).unwrap().state(), TaskState::Succeeded);
    assert_eq!(session.poll(second).unwrap().state(), TaskState::Succeeded);
    session.snapshot()
}

#[test]
fn identical_inputs_give_identical_sessions() {
    let a = scripted_run(7);
    let b = scripted_run(7);

    assert_eq!(a, b);
    assert_eq!(a.to_bytes().unwrap(), b.to_bytes().unwrap());
}

#[test]
fn snapshot_captures_the_whole_session() {
    let snapshot = scripted_run(7);

    assert_eq!(snapshot.now_ms, 31_000);
    assert_eq!(snapshot.items.len(), 7);
    assert_eq!(snapshot.items[0].id().as_str(), "generated-2");
    assert_eq!(snapshot.items[1].id().as_str(), "generated-1");
    assert_eq!(snapshot.timer, TimerState::Paused);
    assert_eq!(snapshot.toggles.len(), 2);
    assert_eq!(snapshot.tasks.len(), 4);
    assert_eq!(
        snapshot
            .tasks
            .iter()
            .filter(|task| task.state == TaskState::Cancelled)
            .count(),
        1
    );

    let bytes = snapshot.to_bytes().unwrap();
    assert_eq!(SessionSnapshot::<Quote>::from_bytes(&bytes).unwrap(), snapshot);
}
