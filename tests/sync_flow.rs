//! End-to-end flows between a controller and a target agent sharing one
//! in-memory store and wake channel

use controller::{CommandDispatcher, StalenessMonitor};
use lodestone_agent::command::handlers::HandlerContext;
use lodestone_agent::{
    AgentConfig, CommandExecutor, DeviceState, Identity, StaticLocationSource, StatusReporter,
    SyncLoop, WakeRegistrar,
};
use lodestone_shared::command::{Command, CommandParams, CommandStatus, CommandType};
use lodestone_shared::emulator::{MemoryStore, MemoryWakeChannel};
use lodestone_shared::store::DocumentStore;
use lodestone_shared::{paths, sync};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use tokio::time::timeout;

struct Rig {
    store: Arc<MemoryStore>,
    wake: Arc<MemoryWakeChannel>,
    config: AgentConfig,
    state: Arc<RwLock<DeviceState>>,
    dispatcher: Arc<CommandDispatcher>,
}

impl Rig {
    async fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let wake = Arc::new(MemoryWakeChannel::new());
        let config = AgentConfig {
            poll_interval: Duration::from_millis(20),
            heartbeat_interval: Duration::from_millis(50),
            ..Default::default()
        };
        let dispatcher = Arc::new(CommandDispatcher::new(
            store.clone(),
            wake.clone(),
            &config.uid,
        ));
        Self {
            store,
            wake,
            config,
            state: Arc::new(RwLock::new(DeviceState::default())),
            dispatcher,
        }
    }

    fn handler_ctx(&self) -> HandlerContext {
        HandlerContext {
            device_id: self.config.device_id.clone(),
            state: self.state.clone(),
            location: Arc::new(StaticLocationSource::new(48.8584, 2.2945, 12.0)),
        }
    }

    fn executor(&self) -> Arc<CommandExecutor> {
        Arc::new(CommandExecutor::new(
            self.store.clone(),
            paths::commands(&self.config.uid, &self.config.device_id),
            self.handler_ctx(),
        ))
    }

    /// Register the delivery address and start the sync loop, wake-wired
    /// through the in-memory channel. Returns the shutdown handle.
    async fn start_agent(&self) -> mpsc::Sender<()> {
        let registrar = WakeRegistrar::new(self.store.clone(), self.wake.clone());
        let identity = Identity::signed_in(&self.config.uid, "owner@example.com");
        registrar
            .register_delivery_address(&identity, &self.config.delivery_token)
            .await
            .unwrap();
        registrar
            .subscribe(
                &self.config.delivery_token,
                &paths::device_topic(&self.config.device_id),
            )
            .await
            .unwrap();

        let wake_rx = self.wake.attach(&self.config.delivery_token).await;
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        tokio::spawn(
            SyncLoop::new(self.executor(), self.config.poll_interval).run(wake_rx, shutdown_rx),
        );
        shutdown_tx
    }
}

/// Collect statuses from a command watch until a terminal one arrives
async fn status_trace(
    mut updates: controller::CommandUpdates,
) -> Vec<CommandStatus> {
    timeout(Duration::from_secs(5), async {
        let mut seen = Vec::new();
        while let Some(command) = updates.next().await {
            if let Some(status) = command.status.known() {
                if seen.last() != Some(&status) {
                    seen.push(status);
                }
                if status.is_terminal() {
                    break;
                }
            }
        }
        seen
    })
    .await
    .expect("command never reached a terminal status")
}

#[tokio::test]
async fn test_ring_command_runs_to_executed() {
    let rig = Rig::new().await;

    let id = rig
        .dispatcher
        .issue(&rig.config.device_id, CommandType::Ring, None)
        .await
        .unwrap();
    let updates = rig
        .dispatcher
        .watch_command(&rig.config.device_id, &id)
        .await
        .unwrap();
    // Subscribed before the agent starts, so every transition is observed
    let _agent = rig.start_agent().await;

    let trace = status_trace(updates).await;
    assert_eq!(trace.first(), Some(&CommandStatus::Pending));
    assert_eq!(trace.last(), Some(&CommandStatus::Executed));
    // EXECUTING always precedes a handler-produced terminal status
    assert!(trace.contains(&CommandStatus::Executing));

    let doc = rig
        .store
        .get(&paths::command(&rig.config.uid, &rig.config.device_id, &id))
        .await
        .unwrap()
        .unwrap();
    let command = Command::from_document(&doc).unwrap();
    assert!(command.executed_at_ms.is_some());
    assert!(command.device_response.is_some());
    assert!(rig.state.read().await.last_ring.unwrap().is_active());
}

#[tokio::test]
async fn test_duplicate_wakes_execute_once() {
    let rig = Rig::new().await;
    // Long poll interval so only wake signals drive the loop
    let executor = rig.executor();
    let wake_rx = rig.wake.attach("t-dup").await;
    let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
    tokio::spawn(SyncLoop::new(executor, Duration::from_secs(3600)).run(wake_rx, shutdown_rx));

    let collection = paths::commands(&rig.config.uid, &rig.config.device_id);
    let id = rig
        .store
        .create(&collection, Command::new(CommandType::Ring).to_document())
        .await
        .unwrap();
    let mut watch = rig
        .store
        .watch(&format!("{collection}/{id}"))
        .await
        .unwrap();

    use lodestone_shared::notify::WakeChannel;
    rig.wake.notify_token("t-dup").await.unwrap();
    rig.wake.notify_token("t-dup").await.unwrap();

    let mut executing = 0;
    let found = timeout(Duration::from_secs(5), async {
        while let Some(event) = watch.next().await {
            match event.doc.get("status").and_then(|v| v.as_str()) {
                Some("EXECUTING") => executing += 1,
                Some(s) if s == "EXECUTED" || s == "FAILED" => return s.to_string(),
                _ => {}
            }
        }
        unreachable!("watch closed early")
    })
    .await
    .unwrap();

    assert_eq!(found, "EXECUTED");
    assert_eq!(executing, 1, "command was claimed more than once");
    drop(shutdown_tx);
}

#[tokio::test]
async fn test_unrecognized_command_fails_without_claim() {
    let rig = Rig::new().await;
    let _agent = rig.start_agent().await;

    // A command kind from a newer build, written raw
    let collection = paths::commands(&rig.config.uid, &rig.config.device_id);
    let mut doc = lodestone_shared::document::Document::new();
    doc.insert("type".into(), json!("RESTART"));
    doc.insert("status".into(), json!("PENDING"));
    let id = rig.store.create(&collection, doc).await.unwrap();

    let updates = rig
        .dispatcher
        .watch_command(&rig.config.device_id, &id)
        .await
        .unwrap();
    let trace = status_trace(updates).await;

    assert_eq!(trace.last(), Some(&CommandStatus::Failed));
    assert!(!trace.contains(&CommandStatus::Executing));

    let stored = rig
        .store
        .get(&format!("{collection}/{id}"))
        .await
        .unwrap()
        .unwrap();
    let command = Command::from_document(&stored).unwrap();
    // The raw wire string survives the round trip
    assert_eq!(command.kind.wire_str(), "RESTART");
    let response = command.device_response.unwrap();
    assert!(response["error"]
        .as_str()
        .unwrap()
        .contains("RESTART"));
}

#[tokio::test]
async fn test_locate_reports_fix_and_status_projection() {
    let rig = Rig::new().await;
    let _agent = rig.start_agent().await;

    let reporter = StatusReporter::new(
        rig.store.clone(),
        &rig.config,
        rig.state.clone(),
        Arc::new(StaticLocationSource::new(48.8584, 2.2945, 12.0)),
    );

    let id = rig
        .dispatcher
        .issue(&rig.config.device_id, CommandType::Locate, None)
        .await
        .unwrap();
    let updates = rig
        .dispatcher
        .watch_command(&rig.config.device_id, &id)
        .await
        .unwrap();
    let trace = status_trace(updates).await;
    assert_eq!(trace.last(), Some(&CommandStatus::Executed));

    reporter.publish().await.unwrap();
    let mut status_updates = rig
        .dispatcher
        .watch_device(&rig.config.device_id)
        .await
        .unwrap();
    let status = status_updates.next().await.unwrap();
    assert!(status.online);
    let fix = status.last_location.unwrap();
    assert!((fix.latitude - 48.8584).abs() < 1e-9);
}

#[tokio::test]
async fn test_lock_then_unlock_round_trip() {
    let rig = Rig::new().await;
    let _agent = rig.start_agent().await;

    let params = CommandParams {
        message: Some("Return to the front desk".into()),
        phone_number: Some("+15550100".into()),
        ..Default::default()
    };
    let id = rig
        .dispatcher
        .issue(&rig.config.device_id, CommandType::Lock, Some(params))
        .await
        .unwrap();
    let trace = status_trace(
        rig.dispatcher
            .watch_command(&rig.config.device_id, &id)
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(trace.last(), Some(&CommandStatus::Executed));
    assert!(rig.state.read().await.lost_mode.as_ref().unwrap().enabled);

    let id = rig
        .dispatcher
        .issue(&rig.config.device_id, CommandType::Unlock, None)
        .await
        .unwrap();
    let trace = status_trace(
        rig.dispatcher
            .watch_command(&rig.config.device_id, &id)
            .await
            .unwrap(),
    )
    .await;
    assert_eq!(trace.last(), Some(&CommandStatus::Executed));
    assert!(!rig.state.read().await.lost_mode.as_ref().unwrap().enabled);
}

#[tokio::test]
async fn test_unanswered_command_goes_stale() {
    // No agent is ever started
    let rig = Rig::new().await;
    rig.dispatcher
        .issue(&rig.config.device_id, CommandType::Ring, None)
        .await
        .unwrap();

    let (events_tx, mut events_rx) = mpsc::channel(4);
    let (_shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let monitor = StalenessMonitor::new(rig.dispatcher.clone(), events_tx)
        .with_threshold(0, Duration::from_millis(10));
    tokio::spawn(monitor.run(shutdown_rx));

    let event = timeout(Duration::from_secs(5), events_rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.last_status, CommandStatus::Pending);
}

#[tokio::test]
async fn test_registration_survives_restart() {
    // Two registrations with the same token leave a single entry
    let rig = Rig::new().await;
    let registrar = WakeRegistrar::new(rig.store.clone(), rig.wake.clone());
    let identity = Identity::signed_in(&rig.config.uid, "owner@example.com");

    for _ in 0..2 {
        registrar
            .register_delivery_address(&identity, &rig.config.delivery_token)
            .await
            .unwrap();
    }

    let doc = rig
        .store
        .get(&paths::user(&rig.config.uid))
        .await
        .unwrap()
        .unwrap();
    let tokens = doc["fcm_tokens"].as_array().unwrap();
    assert_eq!(tokens.len(), 1);
}

#[tokio::test]
async fn test_default_poll_cadence_is_sane() {
    // Wake hints must be strictly an accelerant over the poll cadence
    assert!(sync::POLL_INTERVAL_MS >= 1_000);
    assert!(sync::EXECUTING_STALE_MS >= sync::STALE_CHECK_INTERVAL_MS);
}
