//! Event stream behavior during engine runs.

use crate::common::{chain, RecordingHandler};
use std::sync::Arc;
use stepwise::{Engine, Event, EventBus, OutputStream};

/// A run emits chain and step events in lifecycle order, ending with
/// RunCompleted.
#[tokio::test]
async fn test_event_lifecycle_order() {
    let handler = RecordingHandler::new();
    let bus = Arc::new(EventBus::new());
    bus.register(handler.clone()).await;

    let report = Engine::new()
        .with_event_bus(bus)
        .run(vec![chain(&[("greet", "echo hi"), ("bye", "echo bye")])])
        .await;
    assert!(report.success);

    let events = handler.events().await;

    assert!(matches!(events.first(), Some(Event::ChainStarted { .. })));
    assert!(matches!(events.last(), Some(Event::RunCompleted { .. })));

    // Step events for each step come as started -> output -> completed.
    let names: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            Event::StepStarted { step, .. } => Some(step.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(names, vec!["greet", "bye"]);

    // The second step never starts before the first completes.
    let greet_done = events
        .iter()
        .position(|e| matches!(e, Event::StepCompleted { step, .. } if step == "greet"))
        .unwrap();
    let bye_started = events
        .iter()
        .position(|e| matches!(e, Event::StepStarted { step, .. } if step == "bye"))
        .unwrap();
    assert!(greet_done < bye_started);
}

/// Output arrives as whole lines tagged with their stream.
#[tokio::test]
async fn test_output_events_are_line_granular() {
    let handler = RecordingHandler::new();
    let bus = Arc::new(EventBus::new());
    bus.register(handler.clone()).await;

    let report = Engine::new()
        .with_event_bus(bus)
        .run(vec![chain(&[(
            "talk",
            "printf 'one\\ntwo\\n'; echo oops >&2",
        )])])
        .await;
    assert!(report.success);

    let events = handler.events().await;
    let stdout_lines: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            Event::StepOutput {
                stream: OutputStream::Stdout,
                line,
                ..
            } => Some(line.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(stdout_lines, vec!["one", "two"]);

    let stderr_lines: Vec<&str> = events
        .iter()
        .filter_map(|e| match e {
            Event::StepOutput {
                stream: OutputStream::Stderr,
                line,
                ..
            } => Some(line.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(stderr_lines, vec!["oops"]);
}

/// A failing run still emits ChainCompleted for every chain, with the
/// right verdicts, before RunCompleted.
#[tokio::test]
async fn test_completion_events_for_mixed_run() {
    let handler = RecordingHandler::new();
    let bus = Arc::new(EventBus::new());
    bus.register(handler.clone()).await;

    let report = Engine::new()
        .with_event_bus(bus)
        .run(vec![
            chain(&[("ok", "true")]),
            chain(&[("bad", "false")]),
        ])
        .await;
    assert!(!report.success);

    let events = handler.events().await;
    let verdicts: Vec<bool> = events
        .iter()
        .filter_map(|e| match e {
            Event::ChainCompleted { success, .. } => Some(*success),
            _ => None,
        })
        .collect();
    assert_eq!(verdicts.len(), 2);
    assert!(verdicts.contains(&true));
    assert!(verdicts.contains(&false));

    match events.last().unwrap() {
        Event::RunCompleted { success, .. } => assert!(!success),
        other => panic!("Expected RunCompleted, got {:?}", other),
    }
}
