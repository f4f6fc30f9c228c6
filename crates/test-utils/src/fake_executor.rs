use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use cascade::dag::ScheduledStep;
use cascade::engine::{RuntimeEvent, StepOutcome};
use cascade::exec::ExecutorBackend;
use cascade::errors::Result;

/// A fake executor that:
/// - records which steps were "run", in dispatch order
/// - reports StepCompleted for each scheduled step from a spawned task, with
///   `Success` unless an outcome was configured for that step name.
///
/// Completions are sent off the runtime's own task, so a batch larger than
/// the event channel cannot block the control loop.
pub struct FakeExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    executed: Arc<Mutex<Vec<String>>>,
    outcomes: HashMap<String, StepOutcome>,
}

impl FakeExecutor {
    pub fn new(
        runtime_tx: mpsc::Sender<RuntimeEvent>,
        executed: Arc<Mutex<Vec<String>>>,
    ) -> Self {
        Self {
            runtime_tx,
            executed,
            outcomes: HashMap::new(),
        }
    }

    pub fn with_outcome(mut self, step: &str, outcome: StepOutcome) -> Self {
        self.outcomes.insert(step.to_string(), outcome);
        self
    }
}

impl ExecutorBackend for FakeExecutor {
    fn spawn_ready_steps(
        &mut self,
        steps: Vec<ScheduledStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let completions: Vec<RuntimeEvent> = {
            let mut guard = self.executed.lock().unwrap();
            steps
                .iter()
                .map(|s| {
                    guard.push(s.name.clone());
                    let outcome = self.outcomes.get(&s.name).copied().unwrap_or(StepOutcome::Success);
                    RuntimeEvent::StepCompleted { step: s.id, outcome }
                })
                .collect()
        };

        let tx = self.runtime_tx.clone();
        tokio::spawn(async move {
            for event in completions {
                if tx.send(event).await.is_err() {
                    break;
                }
            }
        });

        Box::pin(async { Ok(()) })
    }

    fn cancel_running(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Every step completes as soon as it is dispatched; nothing to cancel.
        Box::pin(async { Ok(()) })
    }
}

/// Something observed by a [`TimedExecutor`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecEvent {
    Started(String),
    Finished(String),
    Cancelled(String),
}

/// Shared log of [`ExecEvent`]s plus concurrency bookkeeping.
#[derive(Debug, Default, Clone)]
pub struct ExecLog {
    events: Arc<Mutex<Vec<ExecEvent>>>,
    running: Arc<AtomicUsize>,
    max_running: Arc<AtomicUsize>,
}

impl ExecLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExecEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Highest number of steps observed running at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }

    pub fn position(&self, event: &ExecEvent) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }

    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                ExecEvent::Started(n) => Some(n),
                _ => None,
            })
            .collect()
    }

    fn enter(&self, name: &str) {
        // Record the start under the lock so the log order matches the
        // counter updates.
        let mut events = self.events.lock().unwrap();
        let now = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now, Ordering::SeqCst);
        events.push(ExecEvent::Started(name.to_string()));
    }

    fn leave(&self, event: ExecEvent) {
        let mut events = self.events.lock().unwrap();
        self.running.fetch_sub(1, Ordering::SeqCst);
        events.push(event);
    }
}

/// A fake executor where every step runs in its own Tokio task for a fixed
/// duration before completing. Useful to observe real concurrency.
///
/// `cancel_running` wakes every sleeping step, which then reports
/// `StepOutcome::Cancelled`.
pub struct TimedExecutor {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    log: ExecLog,
    default_duration: Duration,
    durations: HashMap<String, Duration>,
    outcomes: HashMap<String, StepOutcome>,
    cancel_tx: watch::Sender<bool>,
}

impl TimedExecutor {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, log: ExecLog, duration: Duration) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            runtime_tx,
            log,
            default_duration: duration,
            durations: HashMap::new(),
            outcomes: HashMap::new(),
            cancel_tx,
        }
    }

    pub fn with_duration(mut self, step: &str, duration: Duration) -> Self {
        self.durations.insert(step.to_string(), duration);
        self
    }

    pub fn with_outcome(mut self, step: &str, outcome: StepOutcome) -> Self {
        self.outcomes.insert(step.to_string(), outcome);
        self
    }
}

impl ExecutorBackend for TimedExecutor {
    fn spawn_ready_steps(
        &mut self,
        steps: Vec<ScheduledStep>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        for s in steps {
            let tx = self.runtime_tx.clone();
            let log = self.log.clone();
            let duration = self.durations.get(&s.name).copied().unwrap_or(self.default_duration);
            let outcome = self.outcomes.get(&s.name).copied().unwrap_or(StepOutcome::Success);
            let mut cancel_rx = self.cancel_tx.subscribe();

            log.enter(&s.name);

            tokio::spawn(async move {
                let already_cancelled = *cancel_rx.borrow_and_update();
                let cancelled = already_cancelled
                    || tokio::select! {
                        _ = tokio::time::sleep(duration) => false,
                        changed = cancel_rx.changed() => changed.is_ok(),
                    };

                let outcome = if cancelled {
                    log.leave(ExecEvent::Cancelled(s.name.clone()));
                    StepOutcome::Cancelled
                } else {
                    log.leave(ExecEvent::Finished(s.name.clone()));
                    outcome
                };

                let _ = tx.send(RuntimeEvent::StepCompleted { step: s.id, outcome }).await;
            });
        }

        Box::pin(async { Ok(()) })
    }

    fn cancel_running(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        self.cancel_tx.send_replace(true);
        Box::pin(async { Ok(()) })
    }
}
