use controller::{CommandDispatcher, StalenessMonitor};
use lodestone_shared::command::{CommandParams, CommandType};
use lodestone_shared::emulator::{MemoryStore, MemoryWakeChannel};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// Issues a RING command against a device that never answers, then waits for
/// the staleness monitor to flag it. Runs entirely against the in-memory
/// store; no agent process is involved.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let store = Arc::new(MemoryStore::new());
    let wake = Arc::new(MemoryWakeChannel::new());

    let dispatcher = Arc::new(CommandDispatcher::new(store, wake, "demo-user"));

    let params = CommandParams {
        message: Some("Where are you?".to_string()),
        ..Default::default()
    };
    let id = dispatcher
        .issue("demo-device", CommandType::Ring, Some(params))
        .await?;
    println!("Waiting for demo-device to pick up command {id}...");

    let (events_tx, mut events_rx) = mpsc::channel(4);
    let (_shutdown_tx, shutdown_rx) = mpsc::channel(1);
    let monitor = StalenessMonitor::new(dispatcher.clone(), events_tx)
        .with_threshold(3_000, Duration::from_millis(500));
    tokio::spawn(monitor.run(shutdown_rx));

    match events_rx.recv().await {
        Some(event) => {
            println!(
                "No response after {}ms; command {} is stuck in {}",
                event.age_ms, event.command_id, event.last_status
            );
        }
        None => println!("Monitor stopped without reporting"),
    }

    Ok(())
}
