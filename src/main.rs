//! Target device agent demo
//!
//! Runs the agent against the in-memory emulator. Production deployments
//! wire real store and push implementations behind the same contracts.

use lodestone_agent::command::handlers::HandlerContext;
use lodestone_agent::{
    AgentConfig, CommandExecutor, DeviceState, Identity, StaticLocationSource, StatusReporter,
    SyncLoop, WakeRegistrar,
};
use lodestone_shared::emulator::{MemoryStore, MemoryWakeChannel};
use lodestone_shared::notify::WakeChannel;
use lodestone_shared::paths;
use lodestone_shared::store::DocumentStore;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let config = AgentConfig::default();
    info!("agent starting: {} (owner {})", config.device_id, config.uid);

    let store: Arc<dyn DocumentStore> = Arc::new(MemoryStore::new());
    let channel = Arc::new(MemoryWakeChannel::new());
    let wake_rx = channel.attach(&config.delivery_token).await;

    // Register the delivery address and the device topic
    let identity = Identity::signed_in(&config.uid, "owner@example.com");
    let registrar = WakeRegistrar::new(store.clone(), channel.clone() as Arc<dyn WakeChannel>);
    registrar
        .register_delivery_address(&identity, &config.delivery_token)
        .await?;
    registrar
        .subscribe(&config.delivery_token, &paths::device_topic(&config.device_id))
        .await?;
    info!("wake registration complete");

    let state = Arc::new(RwLock::new(DeviceState::default()));
    let location = Arc::new(StaticLocationSource::new(48.2082, 16.3738, 12.0));
    let ctx = HandlerContext {
        device_id: config.device_id.clone(),
        state: state.clone(),
        location: location.clone(),
    };
    let executor = Arc::new(CommandExecutor::new(
        store.clone(),
        paths::commands(&config.uid, &config.device_id),
        ctx,
    ));
    let reporter = Arc::new(StatusReporter::new(
        store.clone(),
        &config,
        state,
        location,
    ));

    // Initial presence before the first heartbeat
    reporter.publish().await?;

    let (_status_shutdown, status_shutdown_rx) = mpsc::channel::<()>(1);
    let (_sync_shutdown, sync_shutdown_rx) = mpsc::channel::<()>(1);

    let reporter_task = reporter.clone();
    tokio::spawn(async move { reporter_task.run(status_shutdown_rx).await });

    let sync_loop = SyncLoop::new(executor, config.poll_interval);
    tokio::spawn(sync_loop.run(wake_rx, sync_shutdown_rx));

    info!("agent running, ctrl-c to stop");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    Ok(())
}
