use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use rover_console::command::{parse, Action};
use rover_console::config::Config;
use rover_console::sequencer::{Clock, ExecutionOutcome, RunError, Sequencer};
use rover_console::store::{RemoteStore, StoreError};

/// In-process store standing in for the telemetry service
#[derive(Clone, Default)]
struct FakeStore {
    writes: Arc<Mutex<Vec<(String, f64)>>>,
    target_reads: Arc<Mutex<VecDeque<Option<f64>>>>,
    fail_write_after: Arc<Mutex<Option<usize>>>,
}

impl FakeStore {
    fn writes(&self) -> Vec<(String, f64)> {
        self.writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl RemoteStore for FakeStore {
    async fn read_latest(&self, _variable: &str) -> Result<Option<f64>, StoreError> {
        Ok(self
            .target_reads
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Some(0.0)))
    }

    async fn write_latest(
        &self,
        variable: &str,
        value: f64,
    ) -> Result<serde_json::Value, StoreError> {
        let mut writes = self.writes.lock().unwrap();
        if let Some(limit) = *self.fail_write_after.lock().unwrap() {
            if writes.len() >= limit {
                return Err(StoreError::Write {
                    variable: variable.to_string(),
                    message: "service unavailable".to_string(),
                });
            }
        }
        writes.push((variable.to_string(), value));
        Ok(json!({"value": value, "timestamp": 1700000000000u64}))
    }
}

/// Clock that never actually waits
struct InstantClock;

#[async_trait]
impl Clock for InstantClock {
    async fn sleep(&self, _duration: Duration) {}
}

/// Full flow: operator string → parser → sequencer → store writes
#[tokio::test]
async fn test_submit_full_batch() {
    let store = FakeStore::default();
    store
        .target_reads
        .lock()
        .unwrap()
        .extend([Some(90.0), Some(-1.0)]);

    let mut sequencer = Sequencer::new(store.clone(), InstantClock, Config::default());
    let outcome = sequencer.submit("f2,L,H90,X").await;
    assert!(outcome.is_success());

    assert_eq!(
        store.writes(),
        vec![
            ("action".to_string(), 1.0), // forward
            ("action".to_string(), 3.0), // left
            ("target".to_string(), 90.0),
            ("action".to_string(), 5.0), // heading
            ("action".to_string(), 0.0), // unknown 'X' degraded to stop
            ("action".to_string(), 0.0), // final stop
        ]
    );

    // The log carries the plan, each response, and the turn updates
    let rendered = sequencer.log().render();
    assert!(rendered.contains("forward (F2)"));
    assert!(rendered.contains("Turn complete"));
    assert!(rendered.contains("Final STOP sent"));
}

#[tokio::test]
async fn test_submit_mid_run_failure_stops_rover() {
    // First write succeeds, everything after fails
    let store = FakeStore::default();
    *store.fail_write_after.lock().unwrap() = Some(1);

    let mut sequencer = Sequencer::new(store.clone(), InstantClock, Config::default());
    let outcome = sequencer.submit("F1,B1,L1").await;

    match outcome {
        ExecutionOutcome::Failed {
            error: RunError::Store(StoreError::Write { ref message, .. }),
            emergency_stop_sent,
        } => {
            assert_eq!(message, "service unavailable");
            // The emergency stop also failed against the dead service
            assert!(!emergency_stop_sent);
        }
        other => panic!("expected write failure, got {:?}", other),
    }

    // Only the first command ever reached the store
    assert_eq!(store.writes(), vec![("action".to_string(), 1.0)]);

    let rendered = sequencer.log().render();
    assert!(rendered.contains("[error] Execution error"));
    assert!(rendered.contains("[error] Emergency STOP failed"));
}

#[tokio::test]
async fn test_parse_dispatch_clamp_happens_once() {
    // Parser keeps 400 as-is; the sequencer writes the clamped -1
    let commands = parse("h400");
    assert_eq!(commands[0].action, Action::Heading);
    assert_eq!(commands[0].value, 400.0);

    let store = FakeStore::default();
    store.target_reads.lock().unwrap().push_back(Some(-1.0));

    let mut sequencer = Sequencer::new(store.clone(), InstantClock, Config::default());
    let outcome = sequencer.run(&commands).await;
    assert!(outcome.is_success());
    assert_eq!(store.writes()[0], ("target".to_string(), -1.0));
}

#[tokio::test]
async fn test_custom_variable_labels_respected() {
    let mut config = Config::default();
    config.action_label = "motor".to_string();
    config.target_label = "bearing".to_string();

    let store = FakeStore::default();
    store.target_reads.lock().unwrap().push_back(Some(-1.0));

    let mut sequencer = Sequencer::new(store.clone(), InstantClock, config);
    sequencer.submit("H45").await;

    assert_eq!(
        store.writes(),
        vec![
            ("bearing".to_string(), 45.0),
            ("motor".to_string(), 5.0),
            ("motor".to_string(), 0.0),
        ]
    );
}
