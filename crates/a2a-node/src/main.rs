//! a2a-node: the ai2ai agent-to-agent messaging daemon.
//!
//! Single OS process running a Tokio async runtime. Hosts get at it either
//! by embedding this crate as a library or by talking to the HTTP surface
//! this binary exposes on `network.port`.

use std::future::IntoFuture;
use std::sync::Arc;

use a2a_node::{ingress, queue_worker, Node, NodeConfig};
use tokio::sync::broadcast;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (config, data_dir) = NodeConfig::load(std::env::args().nth(1).as_deref())?;

    let _log_guard = init_logging(&data_dir, &config.advanced.log_level)?;

    info!(agent = %config.identity.name, data_dir = %data_dir.display(), "ai2ai node starting");

    let node = Node::open(config, data_dir)?;

    let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);

    let queue_task = tokio::spawn(queue_worker::run(node.clone(), shutdown_tx.subscribe()));
    let sweep_task = tokio::spawn(run_maintenance_loop(node.clone(), shutdown_tx.subscribe()));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], node.config().network.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "ai2ai ingress listening");

    let router = ingress::router(node.clone());
    let mut shutdown_rx = shutdown_tx.subscribe();

    tokio::select! {
        result = axum::serve(listener, router).into_future() => {
            if let Err(e) = result {
                error!(error = %e, "ingress server error");
            }
        }
        _ = shutdown_rx.recv() => {
            info!("shutdown signal received");
        }
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, shutting down");
        }
    }

    info!("draining background tasks");
    let _ = shutdown_tx.send(());
    let _ = queue_task.await;
    let _ = sweep_task.await;

    info!("ai2ai node stopped");
    Ok(())
}

/// Runs the hourly conversation/approval sweep and the key-rotation check
/// on the same ticker, until `shutdown` fires.
async fn run_maintenance_loop(node: Arc<Node>, mut shutdown: broadcast::Receiver<()>) {
    let mut ticker = tokio::time::interval(std::time::Duration::from_secs(60 * 60));
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match node.run_maintenance_sweep().await {
                    Ok(report) => tracing::debug!(
                        expired = report.conversations_expired,
                        auto_rejected = report.approvals_auto_rejected,
                        purged = report.approvals_purged,
                        "maintenance sweep complete",
                    ),
                    Err(e) => tracing::warn!(error = %e, "maintenance sweep failed"),
                }
                match node.rotate_keys_if_needed().await {
                    Ok(true) => tracing::info!("signing key rotated"),
                    Ok(false) => {}
                    Err(e) => tracing::warn!(error = %e, "key rotation check failed"),
                }
            }
            _ = shutdown.recv() => {
                info!("maintenance sweeper stopping");
                return;
            }
        }
    }
}

/// `tracing-appender` rotates by date but never deletes old files itself;
/// this sweeps anything past the retention window on startup.
fn prune_old_logs(logs_dir: &std::path::Path, retention: chrono::Duration) {
    let cutoff = std::time::SystemTime::now().checked_sub(
        retention.to_std().unwrap_or(std::time::Duration::from_secs(30 * 86_400)),
    );
    let Some(cutoff) = cutoff else { return };
    let Ok(entries) = std::fs::read_dir(logs_dir) else { return };
    for entry in entries.flatten() {
        let Ok(metadata) = entry.metadata() else { continue };
        let Ok(modified) = metadata.modified() else { continue };
        if modified < cutoff {
            let _ = std::fs::remove_file(entry.path());
        }
    }
}

/// Daily-rotating JSON-lines file logger under `<data_dir>/logs/`, mirrored
/// to stdout. The returned guard must stay alive for the process lifetime —
/// dropping it stops the background flush thread.
fn init_logging(data_dir: &std::path::Path, log_level: &str) -> anyhow::Result<tracing_appender::non_blocking::WorkerGuard> {
    let logs_dir = data_dir.join("logs");
    std::fs::create_dir_all(&logs_dir)?;
    prune_old_logs(&logs_dir, chrono::Duration::days(30));

    let file_appender = tracing_appender::rolling::daily(&logs_dir, "ai2ai");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::fmt::writer::MakeWriterExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(format!("a2a={log_level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking.and(std::io::stdout))
        .json()
        .init();

    Ok(guard)
}
