use analyzer_core::{
    config::AnalyzerConfig,
    diagnostics::Diagnostics,
    frontends::provider_embed::EmbedFrontend,
    presence::PresenceTracker,
    records::AccessPointStore,
    scan::ScanOrchestrator,
    traits::RadioScanner,
    web_server,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[cfg(not(any(feature = "backend_mock", feature = "backend_nmcli")))]
compile_error!("No backend feature selected. Please choose one, e.g., --features analyzer-daemon/backend_nmcli");

// --- 1. 选择扫描后端 ---
#[cfg(feature = "backend_nmcli")]
fn create_scanner() -> Arc<dyn RadioScanner> {
    tracing::info!("🚀 Using nmcli scanner");
    Arc::new(analyzer_core::backends::nmcli::NmcliScanner::new())
}

#[cfg(all(feature = "backend_mock", not(feature = "backend_nmcli")))]
fn create_scanner() -> Arc<dyn RadioScanner> {
    tracing::info!("🚀 Using mock scanner");
    Arc::new(analyzer_core::backends::mock::MockScanner::new())
}

// --- 2. 抓包来源 ---
#[cfg(feature = "backend_mock")]
fn spawn_capture(tracker: Arc<PresenceTracker>) {
    analyzer_core::backends::mock::MockCapture::spawn(tracker, Duration::from_secs(2));
}

#[cfg(not(feature = "backend_mock"))]
fn spawn_capture(_tracker: Arc<PresenceTracker>) {
    tracing::warn!("No frame capture source in this build; client list stays empty");
}

/// Builds the engine from config, starts the background tasks and serves
/// HTTP until the server stops or Ctrl-C arrives.
pub async fn run(config: AnalyzerConfig) -> anyhow::Result<()> {
    let diagnostics = Arc::new(Diagnostics::new());
    let store = Arc::new(AccessPointStore::new(config.scan.capacity));

    let mut orchestrator = ScanOrchestrator::new(create_scanner(), store)
        .with_diagnostics(diagnostics.clone())
        .with_tier_policy(config.scan.tier_policy)
        .with_max_channel(config.scan.max_channel);

    if let Some(presence) = &config.presence {
        let tracker = Arc::new(
            PresenceTracker::new(presence.eviction_window, presence.count_window)
                .with_diagnostics(diagnostics.clone()),
        );
        if presence.start_tracking {
            tracker.start(Instant::now());
        }
        spawn_capture(tracker.clone());
        orchestrator = orchestrator.with_presence(tracker);
    }
    let orchestrator = Arc::new(orchestrator);

    if let Some(period) = config.scan.auto_interval {
        spawn_auto_scan(orchestrator.clone(), period);
    }

    let server = web_server::start_web_server(
        config.server.bind_addr,
        orchestrator,
        Arc::new(EmbedFrontend::new()),
    );

    tokio::select! {
        res = server => {
            res??;
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("🛑 Ctrl-C received, shutting down.");
        }
    }
    Ok(())
}

/// Periodic scan trigger. Each tick waits for the previous scan to finish.
fn spawn_auto_scan(orchestrator: Arc<ScanOrchestrator>, period: Duration) {
    tracing::info!("⏱️ Auto scan every {:?}", period);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            orchestrator.run_scan().await;
        }
    });
}
