//! Wall-clock staleness detection for outstanding commands
//!
//! A target can claim a command (moving it to EXECUTING) and then go silent.
//! Nothing in the data model repairs that; the only recovery is operator
//! visibility. The monitor scans the dispatcher's outstanding set and emits
//! one event per command that crosses the age threshold.

use crate::command::dispatcher::{CommandDispatcher, IssuedCommand};
use lodestone_shared::command::CommandStatus;
use lodestone_shared::sync;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Raised once per command that stays non-terminal past the threshold
#[derive(Debug, Clone)]
pub struct StalenessEvent {
    pub command_id: String,
    pub device_id: String,
    pub last_status: CommandStatus,
    pub age_ms: u64,
}

/// Periodic scanner over the dispatcher's outstanding commands
pub struct StalenessMonitor {
    dispatcher: Arc<CommandDispatcher>,
    threshold_ms: u64,
    check_interval: Duration,
    /// Command ids already reported; each command is flagged once
    reported: HashSet<String>,
    events: mpsc::Sender<StalenessEvent>,
}

impl StalenessMonitor {
    pub fn new(dispatcher: Arc<CommandDispatcher>, events: mpsc::Sender<StalenessEvent>) -> Self {
        Self {
            dispatcher,
            threshold_ms: sync::EXECUTING_STALE_MS,
            check_interval: Duration::from_millis(sync::STALE_CHECK_INTERVAL_MS),
            reported: HashSet::new(),
            events,
        }
    }

    pub fn with_threshold(mut self, threshold_ms: u64, check_interval: Duration) -> Self {
        self.threshold_ms = threshold_ms;
        self.check_interval = check_interval;
        self
    }

    /// Scan until the receiver side of `shutdown` is dropped or signalled
    pub async fn run(mut self, mut shutdown: mpsc::Receiver<()>) {
        let mut ticker = tokio::time::interval(self.check_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = ticker.tick() => self.scan().await,
            }
        }
    }

    /// One pass over outstanding commands
    pub async fn scan(&mut self) {
        let now = lodestone_shared::now_ms();
        for command in self.dispatcher.stale_commands(self.threshold_ms).await {
            if self.reported.insert(command.command_id.clone()) {
                self.report(command, now).await;
            }
        }
    }

    async fn report(&self, command: IssuedCommand, now: u64) {
        let event = StalenessEvent {
            command_id: command.command_id,
            device_id: command.device_id,
            last_status: command.last_status,
            age_ms: now.saturating_sub(command.issued_at_ms),
        };
        eprintln!(
            "!!! Command {} on {} stuck in {} for {}ms",
            event.command_id, event.device_id, event.last_status, event.age_ms
        );
        // Receiver gone means nobody is listening; drop the event
        let _ = self.events.send(event).await;
    }
}
